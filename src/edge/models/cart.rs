//! External cart types.
//!
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gateway::models::{AddItem, CartItemSpec, CartView, EnrichedItem, NewCart, SetQuantity};

/// An enriched cart or order item on the external wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemExternal {
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

impl From<EnrichedItem> for CartItemExternal {
    fn from(i: EnrichedItem) -> Self {
        Self {
            product_id: i.product_id,
            product_name: i.product_name,
            quantity: i.quantity,
            add_to_cart_order: i.add_to_cart_order,
            reordered: i.reordered,
            description: i.description,
            price: i.price,
            image_url: i.image_url,
            aisle: i.aisle,
            department: i.department,
        }
    }
}

/// The external cart view; the cart id is an opaque integer rendered as a
/// string, absent for users who have no cart row yet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartViewExternal {
    pub cart_id: Option<String>,
    pub user_id: Uuid,
    pub items: Vec<CartItemExternal>,
    pub updated_at: DateTime<Utc>,
}

impl From<CartView> for CartViewExternal {
    fn from(c: CartView) -> Self {
        Self {
            cart_id: c.cart_id.map(|id| id.to_string()),
            user_id: c.user_id,
            items: c.items.into_iter().map(Into::into).collect(),
            updated_at: c.updated_at,
        }
    }
}

/// One incoming item on cart creation or replacement.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemSpecExternal {
    pub product_id: i32,
    pub quantity: i32,
}

impl From<CartItemSpecExternal> for CartItemSpec {
    fn from(s: CartItemSpecExternal) -> Self {
        Self {
            product_id: s.product_id,
            quantity: s.quantity,
        }
    }
}

/// Cart creation request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCartRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub items: Vec<CartItemSpecExternal>,
}

impl From<CreateCartRequest> for NewCart {
    fn from(r: CreateCartRequest) -> Self {
        Self {
            user_id: r.user_id,
            items: r.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Full replacement of the item set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceCartRequest {
    #[serde(default)]
    pub items: Vec<CartItemSpecExternal>,
}

/// Item addition request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: i32,
    pub quantity: i32,
}

impl From<AddItemRequest> for AddItem {
    fn from(r: AddItemRequest) -> Self {
        Self {
            product_id: r.product_id,
            quantity: r.quantity,
        }
    }
}

/// Quantity update request; zero or less removes the item.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantityRequest {
    pub quantity: i32,
}

impl From<SetQuantityRequest> for SetQuantity {
    fn from(r: SetQuantityRequest) -> Self {
        Self {
            quantity: r.quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_id_renders_as_string() {
        let view = CartViewExternal::from(CartView {
            cart_id: Some(17),
            user_id: Uuid::nil(),
            items: vec![],
            updated_at: Utc::now(),
        });
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["cartId"], "17");
        assert!(value.get("cart_id").is_none());
    }

    #[test]
    fn test_create_request_parses_camel_case() {
        let body = r#"{
            "userId": "00000000-0000-0000-0000-000000000000",
            "items": [{"productId": 1, "quantity": 2}]
        }"#;
        let request: CreateCartRequest = serde_json::from_str(body).unwrap();
        let internal = NewCart::from(request);
        assert_eq!(internal.items.len(), 1);
        assert_eq!(internal.items[0].product_id, 1);
    }
}
