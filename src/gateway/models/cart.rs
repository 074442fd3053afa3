//! Cart types.
//!
//! A user owns at most one cart. Items are stored raw (product id, quantity,
//! position) and are enriched at read time by joining the catalog; the
//! `EnrichedItem` shape is shared with order reads so catalog edits propagate
//! to both.
//!
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One incoming item specification on a cart or direct-order write.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CartItemSpec {
    pub product_id: i32,
    pub quantity: i32,
}

/// A cart or order item joined with its catalog attributes.
///
/// `description`, `price` and `image_url` come from the optional enrichment
/// side-table and may be absent for never-enriched products.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EnrichedItem {
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub add_to_cart_order: i32,
    pub reordered: bool,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub aisle: String,
    pub department: String,
}

/// The read representation of a cart.
///
/// A user without a cart row gets `cart_id: None`, an empty item list and the
/// current instant; no row is created by reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub cart_id: Option<i64>,
    pub user_id: Uuid,
    pub items: Vec<EnrichedItem>,
    pub updated_at: DateTime<Utc>,
}

/// Cart creation payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewCart {
    pub user_id: Uuid,
    #[serde(default)]
    pub items: Vec<CartItemSpec>,
}

/// Full cart replacement payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplaceCart {
    #[serde(default)]
    pub items: Vec<CartItemSpec>,
}

/// Item addition payload. Adding a product already in the cart increments its
/// quantity rather than duplicating the row.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddItem {
    pub product_id: i32,
    pub quantity: i32,
}

/// Quantity update payload; a value of zero or less removes the item.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SetQuantity {
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_view_serializes_missing_cart_as_null_id() {
        let view = CartView {
            cart_id: None,
            user_id: Uuid::nil(),
            items: vec![],
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&view).unwrap();
        assert!(value["cart_id"].is_null());
        assert_eq!(value["items"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_new_cart_items_default_to_empty() {
        let cart: NewCart =
            serde_json::from_str(r#"{"user_id":"00000000-0000-0000-0000-000000000000"}"#).unwrap();
        assert!(cart.items.is_empty());
    }
}
