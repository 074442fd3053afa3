//! Identity operations: `/users/` group.
//!
//! This group owns the dual-ID scheme. Internally every user is a
//! monotonically assigned 64-bit integer; externally the only identifier ever
//! serialized is a UUID. Users imported from the legacy CSVs derive their
//! UUID deterministically from the integer key (`uuid_v5` under the
//! application namespace) so re-imports are stable; users registered at
//! runtime receive a random UUID. Passwords are hashed with Argon2id, one
//! salt per user.
//!
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::error::{ErrorKind, Result, TimeleError};
use crate::gateway::models::{
    AccountDeletion, EmailChange, LoginRequest, LoginSuccess, NewUser, PasswordChange, ResolvedUser,
    UserPatch, UserProfile, UserRow,
};
use crate::gateway::store::notifications::next_occurrence;
use crate::gateway::store::{is_unique_violation, parse_external_id, resolve_user, Store};

/// Namespace for deriving external UUIDs of legacy-imported users. Changing
/// this value breaks the id-mapping stability of every migrated row.
pub const APP_NAMESPACE: Uuid = Uuid::from_u128(0x0e3b_5fd1_94ac_4f0e_9d27_63a1_0c58_2e4f);

/// Derives the stable external UUID for a legacy internal id:
/// `uuid_v5(APP_NAMESPACE, decimal(internal_id))`.
pub fn derive_legacy_external_id(internal_id: i64) -> Uuid {
    Uuid::new_v5(&APP_NAMESPACE, internal_id.to_string().as_bytes())
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| TimeleError::Internal(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| TimeleError::Internal(format!("stored password hash unreadable: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn validate_days(days: i32) -> Result<()> {
    if !(1..=365).contains(&days) {
        return Err(TimeleError::service(
            ErrorKind::InvalidInput,
            "days_between_order_notifications must be between 1 and 365",
        ));
    }
    Ok(())
}

const USER_COLUMNS: &str = "id, external_id, first_name, last_name, email, password_hash, \
     phone, street, city, postal_code, country, last_login_at, \
     last_notifications_viewed_at, days_between_order_notifications, \
     order_notifications_start_at, order_notifications_next_at, \
     pending_order_notification, order_notifications_via_email, \
     last_notification_sent_at, created_at, updated_at";

/// Identity operations.
///
pub struct Users<'s> {
    store: &'s Store,
}

impl<'s> Users<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Registers a new user.
    ///
    /// Validates email uniqueness (case-insensitive), hashes the password
    /// with Argon2id, assigns the internal id from the sequence, computes a
    /// random external UUID and initializes notification preferences.
    ///
    /// # Arguments
    ///
    /// * `new_user` - The registration payload.
    ///
    /// # Returns
    ///
    /// The full external view of the created user.
    ///
    pub async fn register(&self, new_user: &NewUser) -> Result<UserProfile> {
        let email = new_user.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(TimeleError::service(
                ErrorKind::InvalidInput,
                "a valid email address is required",
            ));
        }
        if new_user.first_name.trim().is_empty() || new_user.last_name.trim().is_empty() {
            return Err(TimeleError::service(
                ErrorKind::InvalidInput,
                "first and last name are required",
            ));
        }
        if new_user.password.len() < 8 {
            return Err(TimeleError::service(
                ErrorKind::InvalidInput,
                "password must be at least 8 characters",
            ));
        }
        let days = new_user.days_between_order_notifications.unwrap_or(7);
        validate_days(days)?;

        let now = Utc::now();
        let start_at = new_user.order_notifications_start_at.unwrap_or(now);
        let next_at = next_occurrence(start_at, days, now);
        let password_hash = hash_password(&new_user.password)?;
        let external_id = Uuid::new_v4();

        let inserted: std::result::Result<UserRow, sqlx::Error> = sqlx::query_as(&format!(
            "INSERT INTO users (external_id, first_name, last_name, email, password_hash, \
                 phone, street, city, postal_code, country, \
                 days_between_order_notifications, order_notifications_start_at, \
                 order_notifications_next_at, order_notifications_via_email, \
                 last_notifications_viewed_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15, $15) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(external_id)
        .bind(new_user.first_name.trim())
        .bind(new_user.last_name.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(&new_user.phone)
        .bind(&new_user.street)
        .bind(&new_user.city)
        .bind(&new_user.postal_code)
        .bind(&new_user.country)
        .bind(days)
        .bind(start_at)
        .bind(next_at)
        .bind(new_user.order_notifications_via_email.unwrap_or(false))
        .bind(now)
        .fetch_one(self.store.pool())
        .await;

        match inserted {
            Ok(row) => Ok(UserProfile::from(row)),
            Err(e) if is_unique_violation(&e) => Err(TimeleError::service(
                ErrorKind::Conflict,
                "an account with this email already exists",
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Authenticates a user and returns the full profile plus the derived
    /// `has_active_cart` flag. Updates `last_login_at` on success.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginSuccess> {
        let email = request.email.trim().to_lowercase();
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(&email)
                .fetch_optional(self.store.pool())
                .await?;
        let row = row.ok_or_else(|| {
            TimeleError::service(ErrorKind::AuthFailed, "invalid email or password")
        })?;
        if !verify_password(&request.password, &row.password_hash)? {
            return Err(TimeleError::service(
                ErrorKind::AuthFailed,
                "invalid email or password",
            ));
        }

        let now = Utc::now();
        sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2")
            .bind(now)
            .bind(row.id)
            .execute(self.store.pool())
            .await?;

        let (has_active_cart,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(\
                 SELECT 1 FROM carts c \
                 JOIN cart_items ci ON ci.cart_id = c.id \
                 WHERE c.user_id = $1)",
        )
        .bind(row.id)
        .fetch_one(self.store.pool())
        .await?;

        let mut profile = UserProfile::from(row);
        profile.last_login_at = Some(now);
        Ok(LoginSuccess {
            profile,
            has_active_cart,
        })
    }

    /// Fetches the external view of a user by UUID string.
    pub async fn get(&self, raw_external_id: &str) -> Result<UserProfile> {
        let external_id = parse_external_id(raw_external_id)?;
        self.get_by_uuid(external_id).await
    }

    pub async fn get_by_uuid(&self, external_id: Uuid) -> Result<UserProfile> {
        Ok(UserProfile::from(self.row_by_uuid(external_id).await?))
    }

    pub(crate) async fn row_by_uuid(&self, external_id: Uuid) -> Result<UserRow> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE external_id = $1"))
                .bind(external_id)
                .fetch_optional(self.store.pool())
                .await?;
        row.ok_or_else(|| TimeleError::service(ErrorKind::NotFound, "user not found"))
    }

    /// Resolves an external UUID string to the internal numeric key. The
    /// result stays on the internal network; it feeds the recommender, whose
    /// feature tables are keyed by the legacy integer ids.
    pub async fn resolve(&self, raw_external_id: &str) -> Result<ResolvedUser> {
        let external_id = parse_external_id(raw_external_id)?;
        let internal_id = resolve_user(self.store.pool(), external_id).await?;
        Ok(ResolvedUser { internal_id })
    }

    /// Applies a partial profile update.
    ///
    /// Only provided fields change; email and password are not reachable from
    /// here. An empty patch is rejected with `InvalidInput`. Whenever a field
    /// feeding the reminder schedule changes, `order_notifications_next_at`
    /// is recomputed.
    pub async fn update(&self, raw_external_id: &str, patch: &UserPatch) -> Result<UserProfile> {
        let external_id = parse_external_id(raw_external_id)?;
        if patch.is_empty() {
            return Err(TimeleError::service(
                ErrorKind::InvalidInput,
                "update patch contains no fields",
            ));
        }
        if let Some(days) = patch.days_between_order_notifications {
            validate_days(days)?;
        }
        let internal_id = resolve_user(self.store.pool(), external_id).await?;

        let mut qb = QueryBuilder::new("UPDATE users SET updated_at = now()");
        if let Some(v) = &patch.first_name {
            qb.push(", first_name = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.last_name {
            qb.push(", last_name = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.phone {
            qb.push(", phone = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.street {
            qb.push(", street = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.city {
            qb.push(", city = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.postal_code {
            qb.push(", postal_code = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.country {
            qb.push(", country = ").push_bind(v.clone());
        }
        if let Some(v) = patch.days_between_order_notifications {
            qb.push(", days_between_order_notifications = ").push_bind(v);
        }
        if let Some(v) = patch.order_notifications_start_at {
            qb.push(", order_notifications_start_at = ").push_bind(v);
        }
        if let Some(v) = patch.order_notifications_via_email {
            qb.push(", order_notifications_via_email = ").push_bind(v);
        }
        qb.push(" WHERE id = ").push_bind(internal_id);
        qb.build().execute(self.store.pool()).await?;

        if patch.touches_notification_schedule() {
            self.recompute_next_at(internal_id).await?;
        }
        self.get_by_uuid(external_id).await
    }

    /// Recomputes `order_notifications_next_at` from the stored preference
    /// fields and the current instant.
    pub(crate) async fn recompute_next_at(&self, internal_id: i64) -> Result<()> {
        let (start_at, days): (chrono::DateTime<Utc>, i32) = sqlx::query_as(
            "SELECT order_notifications_start_at, days_between_order_notifications \
             FROM users WHERE id = $1",
        )
        .bind(internal_id)
        .fetch_one(self.store.pool())
        .await?;
        let next_at = next_occurrence(start_at, days, Utc::now());
        sqlx::query("UPDATE users SET order_notifications_next_at = $1 WHERE id = $2")
            .bind(next_at)
            .bind(internal_id)
            .execute(self.store.pool())
            .await?;
        Ok(())
    }

    /// Changes the password after verifying the current one.
    pub async fn change_password(
        &self,
        raw_external_id: &str,
        change: &PasswordChange,
    ) -> Result<()> {
        let external_id = parse_external_id(raw_external_id)?;
        let row = self.row_by_uuid(external_id).await?;
        if !verify_password(&change.current_password, &row.password_hash)? {
            return Err(TimeleError::service(
                ErrorKind::AuthFailed,
                "current password is incorrect",
            ));
        }
        if change.new_password.len() < 8 {
            return Err(TimeleError::service(
                ErrorKind::InvalidInput,
                "password must be at least 8 characters",
            ));
        }
        let new_hash = hash_password(&change.new_password)?;
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
            .bind(&new_hash)
            .bind(row.id)
            .execute(self.store.pool())
            .await?;
        Ok(())
    }

    /// Changes the email after verifying the password; enforces uniqueness.
    pub async fn change_email(
        &self,
        raw_external_id: &str,
        change: &EmailChange,
    ) -> Result<UserProfile> {
        let external_id = parse_external_id(raw_external_id)?;
        let row = self.row_by_uuid(external_id).await?;
        if !verify_password(&change.current_password, &row.password_hash)? {
            return Err(TimeleError::service(
                ErrorKind::AuthFailed,
                "current password is incorrect",
            ));
        }
        let new_email = change.new_email.trim().to_lowercase();
        if new_email.is_empty() || !new_email.contains('@') {
            return Err(TimeleError::service(
                ErrorKind::InvalidInput,
                "a valid email address is required",
            ));
        }
        let updated = sqlx::query("UPDATE users SET email = $1, updated_at = now() WHERE id = $2")
            .bind(&new_email)
            .bind(row.id)
            .execute(self.store.pool())
            .await;
        match updated {
            Ok(_) => self.get_by_uuid(external_id).await,
            Err(e) if is_unique_violation(&e) => Err(TimeleError::service(
                ErrorKind::Conflict,
                "an account with this email already exists",
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes the account after verifying the password.
    ///
    /// The cart cascades away with the user; orders are retained with a
    /// tombstoned (NULL) owner for historical reporting.
    pub async fn delete(&self, raw_external_id: &str, request: &AccountDeletion) -> Result<()> {
        let external_id = parse_external_id(raw_external_id)?;
        let row = self.row_by_uuid(external_id).await?;
        if !verify_password(&request.password, &row.password_hash)? {
            return Err(TimeleError::service(
                ErrorKind::AuthFailed,
                "password is incorrect",
            ));
        }
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(row.id)
            .execute(self.store.pool())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_external_id_is_stable() {
        let a = derive_legacy_external_id(42);
        let b = derive_legacy_external_id(42);
        assert_eq!(a, b);
        assert_ne!(a, derive_legacy_external_id(43));
    }

    #[test]
    fn test_legacy_external_id_uses_decimal_name() {
        // The derivation hashes the decimal rendering of the internal id, so
        // it must agree with a by-hand uuid_v5 over the same bytes.
        let expected = Uuid::new_v5(&APP_NAMESPACE, b"200000");
        assert_eq!(derive_legacy_external_id(200_000), expected);
    }

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("p@ss1234").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("p@ss1234", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_salts_are_per_user() {
        let a = hash_password("p@ss1234").unwrap();
        let b = hash_password("p@ss1234").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_days_validation() {
        assert!(validate_days(1).is_ok());
        assert!(validate_days(365).is_ok());
        assert!(validate_days(0).is_err());
        assert!(validate_days(366).is_err());
    }
}
