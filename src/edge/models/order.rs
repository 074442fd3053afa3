//! External order types.
//!
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gateway::models::{
    DeliveryInfo, NewOrder, OrderView, StatusHistoryEntry, TrackingInfo,
};

use super::CartItemSpecExternal;

/// Delivery snapshot on the external wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryExternal {
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

impl From<DeliveryExternal> for DeliveryInfo {
    fn from(d: DeliveryExternal) -> Self {
        Self {
            name: d.name,
            phone: d.phone,
            street: d.street,
            city: d.city,
            postal_code: d.postal_code,
            country: d.country,
        }
    }
}

impl From<DeliveryInfo> for DeliveryExternal {
    fn from(d: DeliveryInfo) -> Self {
        Self {
            name: d.name,
            phone: d.phone,
            street: d.street,
            city: d.city,
            postal_code: d.postal_code,
            country: d.country,
        }
    }
}

/// Tracking fields on the external wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingExternal {
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub tracking_url: Option<String>,
}

impl From<TrackingInfo> for TrackingExternal {
    fn from(t: TrackingInfo) -> Self {
        Self {
            tracking_number: t.tracking_number,
            carrier: t.carrier,
            tracking_url: t.tracking_url,
        }
    }
}

/// One status-history entry on the external wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryExternal {
    pub history_id: i64,
    pub order_id: String,
    pub status: String,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<String>,
    pub note: Option<String>,
}

impl From<StatusHistoryEntry> for StatusHistoryExternal {
    fn from(e: StatusHistoryEntry) -> Self {
        Self {
            history_id: e.history_id,
            order_id: e.order_id.to_string(),
            status: e.status.to_string(),
            changed_at: e.changed_at,
            changed_by: e.changed_by,
            note: e.note,
        }
    }
}

/// The external order view; the order id is an integer rendered as a string.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderViewExternal {
    pub order_id: String,
    pub user_id: Option<Uuid>,
    pub order_number: i32,
    pub status: String,
    pub total_items: i32,
    pub total_price: Decimal,
    pub delivery: DeliveryExternal,
    pub tracking: TrackingExternal,
    pub invoice: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<super::CartItemExternal>,
    pub status_history: Vec<StatusHistoryExternal>,
}

impl From<OrderView> for OrderViewExternal {
    fn from(o: OrderView) -> Self {
        Self {
            order_id: o.order_id.to_string(),
            user_id: o.user_id,
            order_number: o.order_number,
            status: o.status.to_string(),
            total_items: o.total_items,
            total_price: o.total_price,
            delivery: o.delivery.into(),
            tracking: o.tracking.into(),
            invoice: o.invoice,
            created_at: o.created_at,
            updated_at: o.updated_at,
            items: o.items.into_iter().map(Into::into).collect(),
            status_history: o.status_history.into_iter().map(Into::into).collect(),
        }
    }
}

/// Direct order creation request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    pub items: Vec<CartItemSpecExternal>,
    #[serde(default)]
    pub delivery: DeliveryExternal,
}

impl From<CreateOrderRequest> for NewOrder {
    fn from(r: CreateOrderRequest) -> Self {
        Self {
            user_id: r.user_id,
            items: r.items.into_iter().map(Into::into).collect(),
            delivery: r.delivery.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::models::OrderStatus;

    #[test]
    fn test_order_id_renders_as_string() {
        let view = OrderViewExternal::from(OrderView {
            order_id: 3_422_001,
            user_id: Some(Uuid::nil()),
            order_number: 1,
            status: OrderStatus::Pending,
            total_items: 1,
            total_price: "4.99".parse().unwrap(),
            delivery: DeliveryInfo::default(),
            tracking: TrackingInfo::default(),
            invoice: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            items: vec![],
            status_history: vec![],
        });
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["orderId"], "3422001");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["totalItems"], 1);
        assert_eq!(value["totalPrice"], "4.99");
    }

    #[test]
    fn test_history_entry_renders_order_id_as_string() {
        let entry = StatusHistoryExternal::from(StatusHistoryEntry {
            history_id: 9,
            order_id: 3_422_001,
            status: OrderStatus::Processing,
            changed_at: Utc::now(),
            changed_by: Some("system".into()),
            note: None,
        });
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["orderId"], "3422001");
        assert_eq!(value["status"], "processing");
        assert_eq!(value["changedBy"], "system");
    }
}
