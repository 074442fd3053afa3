//! Store operation groups for the data gateway.
//!
//! This module organizes the persistence operations of the gateway. It
//! includes groups for identity, catalog, carts, orders and notifications.
//! Each group corresponds to a table cluster and the invariants it owns,
//! making it the single place where those invariants are enforced.
//!
//! # Groups
//!
//! - `users`: identity operations and the dual-ID scheme.
//! - `catalog`: catalog queries and the CSV bootstrap.
//! - `carts`: cart mutations, serialized by a row-level lock per cart.
//! - `orders`: checkout, direct creation, the status state machine and reads.
//! - `notifications`: preference updates, the reminder sweep and the derived
//!     notification stream.
//!
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ErrorKind, Result, TimeleError};

// Identity operations and the dual-ID scheme.
mod users;
pub use users::{derive_legacy_external_id, Users, APP_NAMESPACE};

// Catalog queries and the CSV bootstrap.
mod catalog;
pub use catalog::Catalog;

// Cart mutations, serialized by a row-level lock per cart.
mod carts;
pub use carts::Carts;

// Checkout, direct creation, the status state machine and reads.
mod orders;
pub use orders::Orders;

// Preference updates, the reminder sweep and the derived notification stream.
mod notifications;
pub use notifications::{next_occurrence, Notifications};

/// Handle to the relational store.
///
/// `Store` is a thin wrapper over a `PgPool`, which holds a connection pool
/// internally. It is advisable to create one and **reuse** it; cloning is
/// cheap and shares the pool.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Identity operations: `/users/` group.
    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    /// Catalog operations: `/products/` group and the CSV bootstrap.
    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(self)
    }

    /// Cart operations: `/carts/` group.
    pub fn carts(&self) -> Carts<'_> {
        Carts::new(self)
    }

    /// Order operations: `/orders/` group.
    pub fn orders(&self) -> Orders<'_> {
        Orders::new(self)
    }

    /// Notification operations: settings, sweep and the derived stream.
    pub fn notifications(&self) -> Notifications<'_> {
        Notifications::new(self)
    }
}

/// Resolves an external UUID to the internal numeric key.
///
/// Every external-facing operation funnels through this lookup; the numeric
/// key then drives all foreign-key traffic. A missing id is `NotFound`,
/// distinct from the `InvalidIdFormat` raised by the id parsers.
pub(crate) async fn resolve_user<'e, E>(executor: E, external_id: Uuid) -> Result<i64>
where
    E: sqlx::PgExecutor<'e>,
{
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE external_id = $1")
        .bind(external_id)
        .fetch_optional(executor)
        .await?;
    row.map(|r| r.0)
        .ok_or_else(|| TimeleError::service(ErrorKind::NotFound, "user not found"))
}

/// Parses an external user id string, distinguishing malformed input from a
/// missing user.
pub(crate) fn parse_external_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| {
        TimeleError::service(
            ErrorKind::InvalidIdFormat,
            format!("`{raw}` is not a valid user id"),
        )
    })
}

/// True when a database error is a unique-constraint violation, used to remap
/// races on unique columns into `Conflict` instead of `Internal`.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_external_id() {
        assert!(parse_external_id("bb4f0f04-6695-5f26-a652-b2ed8e0e20fa").is_ok());
        let err = parse_external_id("not-a-uuid").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidIdFormat);
    }
}
