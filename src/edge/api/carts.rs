//! Carts API group: `/carts/`
//!
//! Cart reads, mutations and checkout. The gateway serializes concurrent
//! mutations per user; the edge only translates and forwards.
//!
use uuid::Uuid;

use crate::edge::client::GatewayClient;
use crate::error::Result;
use crate::gateway::models::{
    AddItem, CartItemSpec, CartView, DeliveryInfo, NewCart, OrderView, SetQuantity,
};

/// Cart related endpoints on the data gateway.
///
pub struct Carts<'c> {
    /// Reference to the HTTP client used for making API requests.
    pub client: &'c GatewayClient,
}

impl<'c> Carts<'c> {
    /// Creates a new instance of `Carts`.
    ///
    /// # Arguments
    ///
    /// * `client` - A reference to the `GatewayClient` used for making API requests.
    ///
    pub fn new(client: &'c GatewayClient) -> Self {
        Self { client }
    }

    // ===== [ Gateway API endpoints ] =====

    /// Reads the cart via `GET /carts/{user_id}`.
    pub async fn get(&self, user_id: Uuid) -> Result<CartView> {
        self.client.get(&format!("/carts/{user_id}")).await
    }

    /// Creates a cart via `POST /carts`; conflicts if one exists.
    pub async fn create(&self, request: &NewCart) -> Result<CartView> {
        self.client.post("/carts", request).await
    }

    /// Replaces the item set via `PUT /carts/{user_id}`.
    pub async fn replace(&self, user_id: Uuid, items: &[CartItemSpec]) -> Result<CartView> {
        self.client
            .put(
                &format!("/carts/{user_id}"),
                &serde_json::json!({ "items": items }),
            )
            .await
    }

    /// Deletes the cart via `DELETE /carts/{user_id}`.
    pub async fn delete(&self, user_id: Uuid) -> Result<serde_json::Value> {
        self.client.delete(&format!("/carts/{user_id}")).await
    }

    /// Adds an item via `POST /carts/{user_id}/items`.
    pub async fn add_item(&self, user_id: Uuid, item: &AddItem) -> Result<CartView> {
        self.client
            .post(&format!("/carts/{user_id}/items"), item)
            .await
    }

    /// Sets an item quantity via `PUT /carts/{user_id}/items/{product_id}`;
    /// zero or less removes the item.
    pub async fn set_item_quantity(
        &self,
        user_id: Uuid,
        product_id: i32,
        update: &SetQuantity,
    ) -> Result<CartView> {
        self.client
            .put(&format!("/carts/{user_id}/items/{product_id}"), update)
            .await
    }

    /// Removes an item via `DELETE /carts/{user_id}/items/{product_id}`.
    pub async fn remove_item(&self, user_id: Uuid, product_id: i32) -> Result<CartView> {
        self.client
            .delete(&format!("/carts/{user_id}/items/{product_id}"))
            .await
    }

    /// Empties the cart via `DELETE /carts/{user_id}/clear`, keeping the row.
    pub async fn clear(&self, user_id: Uuid) -> Result<CartView> {
        self.client.delete(&format!("/carts/{user_id}/clear")).await
    }

    /// Converts the cart to an order via `POST /carts/{user_id}/checkout`.
    pub async fn checkout(&self, user_id: Uuid, delivery: &DeliveryInfo) -> Result<OrderView> {
        self.client
            .post(
                &format!("/carts/{user_id}/checkout"),
                &serde_json::json!({ "delivery": delivery }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::client::test_utils::{error_body, get_test_client, success_body};
    use crate::error::ErrorKind;

    const USER: &str = "bb4f0f04-6695-5f26-a652-b2ed8e0e20fa";

    #[tokio::test]
    async fn test_get_cart_parses_enriched_items() {
        let (mut server, client) = get_test_client().await;
        server
            .mock("GET", format!("/carts/{USER}").as_str())
            .with_status(200)
            .with_body(success_body(serde_json::json!({
                "cart_id": 17,
                "user_id": USER,
                "items": [{
                    "product_id": 2,
                    "product_name": "All-Seasons Salt",
                    "quantity": 3,
                    "add_to_cart_order": 1,
                    "reordered": false,
                    "description": null,
                    "price": "4.99",
                    "image_url": null,
                    "aisle": "spices seasonings",
                    "department": "pantry"
                }],
                "updated_at": "2025-01-01T00:00:00Z"
            })))
            .create_async()
            .await;

        let cart = client
            .carts()
            .get(Uuid::parse_str(USER).unwrap())
            .await
            .unwrap();
        assert_eq!(cart.cart_id, Some(17));
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.items[0].price, Some("4.99".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_surfaces_typed_error() {
        let (mut server, client) = get_test_client().await;
        server
            .mock("POST", format!("/carts/{USER}/checkout").as_str())
            .with_status(400)
            .with_body(error_body("empty_cart", "cart has no items"))
            .create_async()
            .await;

        let err = client
            .carts()
            .checkout(Uuid::parse_str(USER).unwrap(), &DeliveryInfo::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyCart);
    }
}
