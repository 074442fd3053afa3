//! External user types.
//!
//! CamelCase twins of the internal identity models. The external field
//! names follow the browser contract: `emailAddress` for the email,
//! `orderNotificationsStartDateTime` / `orderNotificationsNextScheduledTime`
//! for the schedule instants.
//!
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gateway::models::{
    de_opt_utc, double_option, AccountDeletion, EmailChange, LoginRequest, LoginSuccess, NewUser,
    NotificationSettings, NotificationSettingsPatch, PasswordChange, UserPatch, UserProfile,
};

/// External profile view. The numeric internal id has no representation
/// here by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileExternal {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_notifications_viewed_at: DateTime<Utc>,
    pub days_between_order_notifications: i32,
    pub order_notifications_start_date_time: DateTime<Utc>,
    pub order_notifications_next_scheduled_time: DateTime<Utc>,
    pub pending_order_notification: bool,
    pub order_notifications_via_email: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserProfile> for UserProfileExternal {
    fn from(p: UserProfile) -> Self {
        Self {
            user_id: p.user_id,
            first_name: p.first_name,
            last_name: p.last_name,
            email_address: p.email,
            phone: p.phone,
            street: p.street,
            city: p.city,
            postal_code: p.postal_code,
            country: p.country,
            last_login_at: p.last_login_at,
            last_notifications_viewed_at: p.last_notifications_viewed_at,
            days_between_order_notifications: p.days_between_order_notifications,
            order_notifications_start_date_time: p.order_notifications_start_at,
            order_notifications_next_scheduled_time: p.order_notifications_next_at,
            pending_order_notification: p.pending_order_notification,
            order_notifications_via_email: p.order_notifications_via_email,
            created_at: p.created_at,
        }
    }
}

/// Registration request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
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
    pub order_notifications_start_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_notifications_via_email: Option<bool>,
}

impl From<RegisterRequest> for NewUser {
    fn from(r: RegisterRequest) -> Self {
        Self {
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email_address,
            password: r.password,
            phone: r.phone,
            street: r.street,
            city: r.city,
            postal_code: r.postal_code,
            country: r.country,
            days_between_order_notifications: r.days_between_order_notifications,
            order_notifications_start_at: r.order_notifications_start_date_time,
            order_notifications_via_email: r.order_notifications_via_email,
        }
    }
}

/// Login request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequestExternal {
    pub email_address: String,
    pub password: String,
}

impl From<LoginRequestExternal> for LoginRequest {
    fn from(r: LoginRequestExternal) -> Self {
        Self {
            email: r.email_address,
            password: r.password,
        }
    }
}

/// Login response: the profile plus the derived cart flag.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponseExternal {
    #[serde(flatten)]
    pub profile: UserProfileExternal,
    pub has_active_cart: bool,
}

impl From<LoginSuccess> for LoginResponseExternal {
    fn from(s: LoginSuccess) -> Self {
        Self {
            profile: s.profile.into(),
            has_active_cart: s.has_active_cart,
        }
    }
}

/// Partial profile update. Email and password are not accepted here; their
/// dedicated endpoints require password re-verification.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatchExternal {
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
    pub order_notifications_start_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_notifications_via_email: Option<bool>,
}

impl From<UserPatchExternal> for UserPatch {
    fn from(p: UserPatchExternal) -> Self {
        Self {
            first_name: p.first_name,
            last_name: p.last_name,
            phone: p.phone,
            street: p.street,
            city: p.city,
            postal_code: p.postal_code,
            country: p.country,
            days_between_order_notifications: p.days_between_order_notifications,
            order_notifications_start_at: p.order_notifications_start_date_time,
            order_notifications_via_email: p.order_notifications_via_email,
        }
    }
}

/// Password change request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

impl From<PasswordChangeRequest> for PasswordChange {
    fn from(r: PasswordChangeRequest) -> Self {
        Self {
            current_password: r.current_password,
            new_password: r.new_password,
        }
    }
}

/// Email change request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailChangeRequest {
    pub current_password: String,
    pub new_email: String,
}

impl From<EmailChangeRequest> for EmailChange {
    fn from(r: EmailChangeRequest) -> Self {
        Self {
            current_password: r.current_password,
            new_email: r.new_email,
        }
    }
}

/// Account deletion request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountRequest {
    pub password: String,
}

impl From<DeleteAccountRequest> for AccountDeletion {
    fn from(r: DeleteAccountRequest) -> Self {
        Self {
            password: r.password,
        }
    }
}

/// Notification settings view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettingsExternal {
    pub days_between_order_notifications: i32,
    pub order_notifications_start_date_time: DateTime<Utc>,
    pub order_notifications_next_scheduled_time: DateTime<Utc>,
    pub pending_order_notification: bool,
    pub order_notifications_via_email: bool,
    pub last_notification_sent_at: Option<DateTime<Utc>>,
}

impl From<NotificationSettings> for NotificationSettingsExternal {
    fn from(s: NotificationSettings) -> Self {
        Self {
            days_between_order_notifications: s.days_between_order_notifications,
            order_notifications_start_date_time: s.order_notifications_start_at,
            order_notifications_next_scheduled_time: s.order_notifications_next_at,
            pending_order_notification: s.pending_order_notification,
            order_notifications_via_email: s.order_notifications_via_email,
            last_notification_sent_at: s.last_notification_sent_at,
        }
    }
}

/// Notification settings update.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettingsPatchExternal {
    #[serde(default)]
    pub days_between_order_notifications: Option<i32>,
    #[serde(default, deserialize_with = "de_opt_utc")]
    pub order_notifications_start_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_notifications_via_email: Option<bool>,
}

impl From<NotificationSettingsPatchExternal> for NotificationSettingsPatch {
    fn from(p: NotificationSettingsPatchExternal) -> Self {
        Self {
            days_between_order_notifications: p.days_between_order_notifications,
            order_notifications_start_at: p.order_notifications_start_date_time,
            order_notifications_via_email: p.order_notifications_via_email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_profile() -> UserProfile {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        UserProfile {
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
        }
    }

    #[test]
    fn test_profile_renders_camel_case_only() {
        let value = serde_json::to_value(UserProfileExternal::from(sample_profile())).unwrap();
        for key in [
            "userId",
            "firstName",
            "lastName",
            "emailAddress",
            "daysBetweenOrderNotifications",
            "orderNotificationsStartDateTime",
            "orderNotificationsNextScheduledTime",
            "pendingOrderNotification",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        for key in ["first_name", "email", "internal_id", "id"] {
            assert!(value.get(key).is_none(), "leaked key {key}");
        }
    }

    #[test]
    fn test_case_rendering_round_trip_preserves_fields() {
        // External -> internal -> external must reproduce the field set.
        let external = UserProfileExternal::from(sample_profile());
        let json = serde_json::to_value(&external).unwrap();
        let reparsed: UserProfileExternal = serde_json::from_value(json.clone()).unwrap();
        let json_again = serde_json::to_value(&reparsed).unwrap();
        assert_eq!(json, json_again);
    }

    #[test]
    fn test_register_request_translates_email_field() {
        let body = r#"{
            "firstName": "Ada",
            "lastName": "Lovelace",
            "emailAddress": "Ada@Example.com",
            "password": "p@ss1234"
        }"#;
        let request: RegisterRequest = serde_json::from_str(body).unwrap();
        let internal = NewUser::from(request);
        assert_eq!(internal.email, "Ada@Example.com");
        assert_eq!(internal.first_name, "Ada");
    }

    #[test]
    fn test_patch_null_clears_and_absent_skips() {
        let patch: UserPatchExternal =
            serde_json::from_str(r#"{"phone": null, "firstName": "Grace"}"#).unwrap();
        let internal = UserPatch::from(patch);
        assert_eq!(internal.phone, Some(None));
        assert_eq!(internal.first_name.as_deref(), Some("Grace"));
        assert!(internal.street.is_none());
    }
}
