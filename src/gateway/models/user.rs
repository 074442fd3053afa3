//! User identity and notification-preference types.
//!
//! This module provides the structures for managing user accounts on the
//! internal contract: registration, login, profile reads, patch updates and
//! the notification preference block. The key rule of the identity model is
//! the dual-ID scheme: the numeric `id` column never crosses the external
//! API; the `external_id` UUID is the only user identifier clients see, and
//! it is resolved back to the numeric key inside the gateway.
//!
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{de_opt_utc, double_option};

/// Full database row for a user, including the password hash.
///
/// Store-internal; never serialized onto any wire.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub external_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_notifications_viewed_at: DateTime<Utc>,
    pub days_between_order_notifications: i32,
    pub order_notifications_start_at: DateTime<Utc>,
    pub order_notifications_next_at: DateTime<Utc>,
    pub pending_order_notification: bool,
    pub order_notifications_via_email: bool,
    pub last_notification_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The external view of a user.
///
/// `user_id` carries the external UUID; the numeric key is deliberately
/// absent from this structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_notifications_viewed_at: DateTime<Utc>,
    pub days_between_order_notifications: i32,
    pub order_notifications_start_at: DateTime<Utc>,
    pub order_notifications_next_at: DateTime<Utc>,
    pub pending_order_notification: bool,
    pub order_notifications_via_email: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.external_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            street: row.street,
            city: row.city,
            postal_code: row.postal_code,
            country: row.country,
            last_login_at: row.last_login_at,
            last_notifications_viewed_at: row.last_notifications_viewed_at,
            days_between_order_notifications: row.days_between_order_notifications,
            order_notifications_start_at: row.order_notifications_start_at,
            order_notifications_next_at: row.order_notifications_next_at,
            pending_order_notification: row.pending_order_notification,
            order_notifications_via_email: row.order_notifications_via_email,
            created_at: row.created_at,
        }
    }
}

/// Registration payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub days_between_order_notifications: Option<i32>,
    #[serde(default, deserialize_with = "de_opt_utc")]
    pub order_notifications_start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_notifications_via_email: Option<bool>,
}

/// Login payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login result: the full profile plus the derived cart flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSuccess {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub has_active_cart: bool,
}

/// Explicit per-field patch for the generic profile update.
///
/// "Field not provided" is distinct from "field set to null": nullable
/// columns use the double-`Option` encoding, where the outer `None` means
/// untouched and `Some(None)` clears the column. Email and password are not
/// representable here; they have dedicated password-gated operations.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserPatch {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub street: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub postal_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub country: Option<Option<String>>,
    #[serde(default)]
    pub days_between_order_notifications: Option<i32>,
    #[serde(default, deserialize_with = "de_opt_utc")]
    pub order_notifications_start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_notifications_via_email: Option<bool>,
}

impl UserPatch {
    /// True when no field was provided at all. An empty patch is an input
    /// error, not a no-op success.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.street.is_none()
            && self.city.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
            && self.days_between_order_notifications.is_none()
            && self.order_notifications_start_at.is_none()
            && self.order_notifications_via_email.is_none()
    }

    /// True when the patch changes a field that feeds the reminder schedule,
    /// requiring `order_notifications_next_at` to be recomputed.
    pub fn touches_notification_schedule(&self) -> bool {
        self.days_between_order_notifications.is_some()
            || self.order_notifications_start_at.is_some()
    }
}

/// Password change payload; requires a fresh verification of the current
/// password in the same request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// Email change payload; password-gated and uniqueness-checked.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailChange {
    pub current_password: String,
    pub new_email: String,
}

/// Account deletion payload; password-gated.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountDeletion {
    pub password: String,
}

/// The notification preference block as read or written through the
/// dedicated settings endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub days_between_order_notifications: i32,
    pub order_notifications_start_at: DateTime<Utc>,
    pub order_notifications_next_at: DateTime<Utc>,
    pub pending_order_notification: bool,
    pub order_notifications_via_email: bool,
    pub last_notification_sent_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for NotificationSettings {
    fn from(row: UserRow) -> Self {
        Self {
            days_between_order_notifications: row.days_between_order_notifications,
            order_notifications_start_at: row.order_notifications_start_at,
            order_notifications_next_at: row.order_notifications_next_at,
            pending_order_notification: row.pending_order_notification,
            order_notifications_via_email: row.order_notifications_via_email,
            last_notification_sent_at: row.last_notification_sent_at,
        }
    }
}

/// Settings update; provided fields win, the rest stay.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotificationSettingsPatch {
    #[serde(default)]
    pub days_between_order_notifications: Option<i32>,
    #[serde(default, deserialize_with = "de_opt_utc")]
    pub order_notifications_start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_notifications_via_email: Option<bool>,
}

impl NotificationSettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.days_between_order_notifications.is_none()
            && self.order_notifications_start_at.is_none()
            && self.order_notifications_via_email.is_none()
    }
}

/// Resolution of an external UUID to the numeric key, used by the edge when
/// calling the recommender. This value stays on the internal network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedUser {
    pub internal_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_absent_vs_null() {
        let patch: UserPatch = serde_json::from_str(r#"{"first_name":"Ada"}"#).unwrap();
        assert_eq!(patch.first_name.as_deref(), Some("Ada"));
        assert!(patch.phone.is_none());

        let patch: UserPatch = serde_json::from_str(r#"{"phone":null}"#).unwrap();
        assert_eq!(patch.phone, Some(None));
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_empty_patch_detected() {
        let patch: UserPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_schedule_touch_detection() {
        let patch: UserPatch =
            serde_json::from_str(r#"{"days_between_order_notifications":3}"#).unwrap();
        assert!(patch.touches_notification_schedule());

        let patch: UserPatch = serde_json::from_str(r#"{"first_name":"Ada"}"#).unwrap();
        assert!(!patch.touches_notification_schedule());
    }

    #[test]
    fn test_new_user_accepts_naive_start_instant() {
        let body = r#"{
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "password": "p@ss1234",
            "order_notifications_start_at": "2025-01-01T00:00:00"
        }"#;
        let user: NewUser = serde_json::from_str(body).unwrap();
        let start = user.order_notifications_start_at.unwrap();
        assert_eq!(start.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_login_success_flattens_profile() {
        use chrono::TimeZone;
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let profile = UserProfile {
            user_id: Uuid::nil(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: None,
            street: None,
            city: None,
            postal_code: None,
            country: None,
            last_login_at: None,
            last_notifications_viewed_at: now,
            days_between_order_notifications: 7,
            order_notifications_start_at: now,
            order_notifications_next_at: now,
            pending_order_notification: false,
            order_notifications_via_email: false,
            created_at: now,
        };
        let value = serde_json::to_value(LoginSuccess {
            profile,
            has_active_cart: false,
        })
        .unwrap();
        assert_eq!(value["has_active_cart"], false);
        assert_eq!(value["email"], "ada@example.com");
        assert!(value.get("internal_id").is_none());
        assert!(value.get("id").is_none());
    }
}
