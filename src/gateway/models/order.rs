//! Order types.
//!
//! Orders reference their owner by the internal numeric key in the database;
//! on the wire they carry the owner's external UUID (or nothing, for orders
//! whose owner was deleted and tombstoned). Items are stored raw and joined
//! with the catalog at read time; the status history is append-only and
//! complete from the `pending` row written at creation.
//!
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CartItemSpec, EnrichedItem, OrderStatus};

/// Delivery snapshot captured on the order at creation time.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeliveryInfo {
    #[serde(default)]
    pub name: Option<String>,
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
}

/// Shipment tracking fields, populated by operational tooling after dispatch.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrackingInfo {
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
}

/// Raw database row for an order, joined with the owner's external UUID.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub user_external_id: Option<Uuid>,
    pub order_number: i32,
    pub status: String,
    pub delivery_name: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub tracking_url: Option<String>,
    pub invoice: Option<String>,
    pub total_items: i32,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw database row for one status-history entry.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusHistoryRow {
    pub history_id: i64,
    pub order_id: i64,
    pub status: String,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<String>,
    pub note: Option<String>,
}

/// One entry of an order's immutable status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub history_id: i64,
    pub order_id: i64,
    pub status: OrderStatus,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<String>,
    pub note: Option<String>,
}

/// The read representation of an order.
///
/// List reads leave `status_history` empty; the detail read carries the
/// complete history sorted by `changed_at` ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub order_id: i64,
    pub user_id: Option<Uuid>,
    pub order_number: i32,
    pub status: OrderStatus,
    pub total_items: i32,
    pub total_price: Decimal,
    pub delivery: DeliveryInfo,
    pub tracking: TrackingInfo,
    pub invoice: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<EnrichedItem>,
    #[serde(default)]
    pub status_history: Vec<StatusHistoryEntry>,
}

/// A page of orders for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<OrderView>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Direct order creation payload; identical to checkout except items come
/// from the request and the cart is untouched.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub items: Vec<CartItemSpec>,
    #[serde(default)]
    pub delivery: DeliveryInfo,
}

/// Status transition request, applied through the state machine only.
///
/// Tracking fields ride along when operational tooling marks an order
/// shipped; they are ignored unless provided.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    #[serde(default)]
    pub changed_by: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub tracking: Option<TrackingInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_change_defaults() {
        let change: StatusChange = serde_json::from_str(r#"{"status":"processing"}"#).unwrap();
        assert_eq!(change.status, OrderStatus::Processing);
        assert!(change.changed_by.is_none());
        assert!(change.note.is_none());
        assert!(change.tracking.is_none());
    }

    #[test]
    fn test_status_change_carries_tracking() {
        let change: StatusChange = serde_json::from_str(
            r#"{"status":"shipped","changed_by":"ops:warehouse","tracking":{"tracking_number":"TRK-9","carrier":"DHL"}}"#,
        )
        .unwrap();
        let tracking = change.tracking.unwrap();
        assert_eq!(tracking.tracking_number.as_deref(), Some("TRK-9"));
        assert_eq!(tracking.carrier.as_deref(), Some("DHL"));
        assert!(tracking.tracking_url.is_none());
    }

    #[test]
    fn test_order_view_tolerates_missing_history_field() {
        let body = r#"{
            "order_id": 3422000,
            "user_id": null,
            "order_number": 1,
            "status": "pending",
            "total_items": 2,
            "total_price": "9.98",
            "delivery": {},
            "tracking": {},
            "invoice": null,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z",
            "items": []
        }"#;
        let view: OrderView = serde_json::from_str(body).unwrap();
        assert!(view.status_history.is_empty());
        assert_eq!(view.order_id, 3422000);
    }
}
