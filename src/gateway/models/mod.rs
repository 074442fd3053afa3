//! Data types for the internal (snake_case) contract of the data gateway.
//!
//! This module defines the data models used on the internal HTTP API between
//! the edge and the data gateway, and the row types the store maps Postgres
//! results onto. These models represent the various structures used in
//! requests and responses, making it easier to work with the gateway in a
//! type-safe manner.
//!
//! # Submodules and Types
//!
//! - `user`: models for the `/users/` API group, handling identity, profile
//!     patches and notification preferences.
//! - `cart`: models for the `/carts/` API group, including the enriched item
//!     representation shared with orders.
//! - `order`: models for the `/orders/` API group, facilitating checkout,
//!     direct creation and status history reads.
//! - `order_enums`: the order status enumeration and its transition table.
//! - `catalog`: models for the `/products/` API group and the CSV bootstrap.
//!
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ErrorKind;

/// Represents the default response structure used by the gateway API.
///
/// The generic type `T` is the payload of the specific endpoint. Errors carry
/// the wire name of their `ErrorKind` so the edge can re-type them without
/// guessing from the HTTP status alone.
///
#[derive(Serialize, Deserialize, Debug)]
pub struct GatewayResponse<T> {
    pub status: String,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error_kind: Option<String>,
}

impl<T> GatewayResponse<T> {
    /// Builds a success envelope around `data`.
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            message: None,
            error_kind: None,
        }
    }

    /// Builds an error envelope carrying a typed kind and a sanitized detail.
    pub fn error(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            message: Some(detail.into()),
            error_kind: Some(kind.as_str().to_string()),
        }
    }
}

/// Parses an ISO-8601 instant, accepting a missing offset.
///
/// Inputs with an explicit offset (`...Z` or `±HH:MM`) are converted to UTC;
/// naive inputs are interpreted as UTC per the platform's time handling rule.
pub fn parse_utc_flexible(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(format!("unrecognized datetime `{s}`"))
}

/// Serde adapter for `Option<DateTime<Utc>>` fields that must accept naive
/// inputs. Use with `#[serde(default, deserialize_with = "de_opt_utc")]`.
pub fn de_opt_utc<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value {
        Some(s) => parse_utc_flexible(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Serde adapter distinguishing an absent field from an explicit `null`.
///
/// A field declared as `Option<Option<T>>` with
/// `#[serde(default, deserialize_with = "double_option")]` deserializes to
/// `None` when absent, `Some(None)` on `null`, and `Some(Some(v))` otherwise.
/// Patch records need the distinction: `null` clears a nullable column, an
/// absent field leaves it untouched.
pub fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Models for the `/users/` API group.
///
mod user;
pub use user::{
    AccountDeletion, EmailChange, LoginRequest, LoginSuccess, NewUser, NotificationSettings,
    NotificationSettingsPatch, PasswordChange, ResolvedUser, UserPatch, UserProfile, UserRow,
};

/// Models for the `/carts/` API group, including the enriched item shared
/// with orders.
///
mod cart;
pub use cart::{AddItem, CartItemSpec, CartView, EnrichedItem, NewCart, ReplaceCart, SetQuantity};

/// Models for the `/orders/` API group.
///
mod order;
pub use order::{
    DeliveryInfo, NewOrder, OrderPage, OrderRow, OrderView, StatusChange, StatusHistoryEntry,
    StatusHistoryRow, TrackingInfo,
};

/// The order status enumeration and its transition table.
mod order_enums;
pub use order_enums::OrderStatus;

/// Models for the `/products/` API group and the CSV bootstrap.
///
mod catalog;
pub use catalog::{
    Aisle, Department, Product, ProductDetail, ProductEnriched, ProductLookup, ProductPage,
    ProductQuery, ProductSort,
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_utc_flexible_with_offset() {
        let dt = parse_utc_flexible("2025-01-01T00:00:00Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());

        let dt = parse_utc_flexible("2025-01-01T05:30:00+05:30").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_utc_flexible_naive_is_utc() {
        let dt = parse_utc_flexible("2025-01-01T12:00:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_utc_flexible_rejects_garbage() {
        assert!(parse_utc_flexible("next tuesday").is_err());
    }

    #[test]
    fn test_envelope_success_and_error_shapes() {
        let ok: GatewayResponse<i32> = GatewayResponse::success(7);
        assert_eq!(ok.status, "success");
        assert_eq!(ok.data, Some(7));
        assert!(ok.error_kind.is_none());

        let err: GatewayResponse<i32> =
            GatewayResponse::error(crate::error::ErrorKind::EmptyCart, "cart has no items");
        assert_eq!(err.status, "error");
        assert!(err.data.is_none());
        assert_eq!(err.error_kind.as_deref(), Some("empty_cart"));
    }
}
