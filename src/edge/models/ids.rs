//! Typed parsing of external path identifiers.
//!
//! Each id class on the external surface has its own wire type: user ids are
//! UUID strings, order and cart ids are integers rendered as strings, and
//! product ids are plain integers. Parsing is a small sum-type decision made
//! before any upstream call; a mismatch is a 422, never a 500, and never an
//! upstream round-trip.
//!
use uuid::Uuid;

use crate::error::{ErrorKind, Result, TimeleError};

/// A parsed external identifier, tagged by its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalId {
    User(Uuid),
    Order(i64),
    Cart(i64),
    Product(i32),
}

impl ExternalId {
    /// Parses a user id: a canonical UUID string.
    pub fn user(raw: &str) -> Result<Self> {
        Uuid::parse_str(raw)
            .map(ExternalId::User)
            .map_err(|_| bad_id(raw, "user id (UUID)"))
    }

    /// Parses an order id: an integer rendered as a string.
    pub fn order(raw: &str) -> Result<Self> {
        raw.parse::<i64>()
            .map(ExternalId::Order)
            .map_err(|_| bad_id(raw, "order id"))
    }

    /// Parses a cart id: an integer rendered as a string.
    pub fn cart(raw: &str) -> Result<Self> {
        raw.parse::<i64>()
            .map(ExternalId::Cart)
            .map_err(|_| bad_id(raw, "cart id"))
    }

    /// Parses a product id: a plain integer.
    pub fn product(raw: &str) -> Result<Self> {
        raw.parse::<i32>()
            .map(ExternalId::Product)
            .map_err(|_| bad_id(raw, "product id"))
    }

    pub fn as_user(&self) -> Option<Uuid> {
        match self {
            ExternalId::User(id) => Some(*id),
            _ => None,
        }
    }
}

fn bad_id(raw: &str, what: &str) -> TimeleError {
    TimeleError::service(
        ErrorKind::InvalidIdFormat,
        format!("`{raw}` is not a valid {what}"),
    )
}

/// Convenience parser for the user-id path segment.
pub fn parse_user_id(raw: &str) -> Result<Uuid> {
    match ExternalId::user(raw)? {
        ExternalId::User(id) => Ok(id),
        _ => unreachable!(),
    }
}

/// Convenience parser for the order-id path segment.
pub fn parse_order_id(raw: &str) -> Result<i64> {
    match ExternalId::order(raw)? {
        ExternalId::Order(id) => Ok(id),
        _ => unreachable!(),
    }
}

/// Convenience parser for the product-id path segment.
pub fn parse_product_id(raw: &str) -> Result<i32> {
    match ExternalId::product(raw)? {
        ExternalId::Product(id) => Ok(id),
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_must_be_uuid() {
        assert!(ExternalId::user("bb4f0f04-6695-5f26-a652-b2ed8e0e20fa").is_ok());
        let err = ExternalId::user("12345").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidIdFormat);
    }

    #[test]
    fn test_order_and_cart_ids_are_stringly_integers() {
        assert_eq!(ExternalId::order("3422001").unwrap(), ExternalId::Order(3_422_001));
        assert_eq!(ExternalId::cart("17").unwrap(), ExternalId::Cart(17));
        assert!(ExternalId::order("bb4f0f04").is_err());
        assert!(ExternalId::cart("").is_err());
    }

    #[test]
    fn test_product_id_is_integer() {
        assert_eq!(ExternalId::product("42").unwrap(), ExternalId::Product(42));
        assert!(ExternalId::product("4.2").is_err());
    }

    #[test]
    fn test_mismatches_map_to_422() {
        for err in [
            ExternalId::user("not-a-uuid").unwrap_err(),
            ExternalId::order("x").unwrap_err(),
            ExternalId::product("x").unwrap_err(),
        ] {
            assert_eq!(err.kind().http_status(), 422);
        }
    }
}
