//! Orders API group: `/orders/`
//!
//! Direct creation and reads. Status transitions are an internal-only
//! concern of the gateway; the edge exposes no route for them.
//!
use uuid::Uuid;

use crate::edge::client::GatewayClient;
use crate::error::Result;
use crate::gateway::models::{NewOrder, OrderPage, OrderView};

/// Order related endpoints on the data gateway.
///
pub struct Orders<'c> {
    /// Reference to the HTTP client used for making API requests.
    pub client: &'c GatewayClient,
}

impl<'c> Orders<'c> {
    /// Creates a new instance of `Orders`.
    ///
    /// # Arguments
    ///
    /// * `client` - A reference to the `GatewayClient` used for making API requests.
    ///
    pub fn new(client: &'c GatewayClient) -> Self {
        Self { client }
    }

    // ===== [ Gateway API endpoints ] =====

    /// Creates an order directly via `POST /orders`.
    pub async fn create(&self, request: &NewOrder) -> Result<OrderView> {
        self.client.post("/orders", request).await
    }

    /// Fetches the full order, items and history, via
    /// `GET /orders/{order_id}`.
    pub async fn get(&self, order_id: i64) -> Result<OrderView> {
        self.client.get(&format!("/orders/{order_id}")).await
    }

    /// Paginates one user's orders via `GET /orders/user/{user_id}`.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<OrderPage> {
        self.client
            .get(&format!(
                "/orders/user/{user_id}?limit={limit}&offset={offset}"
            ))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::client::test_utils::{get_test_client, success_body};
    use crate::gateway::models::OrderStatus;

    #[tokio::test]
    async fn test_get_order_parses_history() {
        let (mut server, client) = get_test_client().await;
        server
            .mock("GET", "/orders/3422001")
            .with_status(200)
            .with_body(success_body(serde_json::json!({
                "order_id": 3422001,
                "user_id": "bb4f0f04-6695-5f26-a652-b2ed8e0e20fa",
                "order_number": 1,
                "status": "processing",
                "total_items": 2,
                "total_price": "9.98",
                "delivery": {},
                "tracking": {},
                "invoice": null,
                "created_at": "2025-01-01T00:00:00Z",
                "updated_at": "2025-01-02T00:00:00Z",
                "items": [],
                "status_history": [
                    {
                        "history_id": 1,
                        "order_id": 3422001,
                        "status": "pending",
                        "changed_at": "2025-01-01T00:00:00Z",
                        "changed_by": null,
                        "note": "Order created"
                    },
                    {
                        "history_id": 2,
                        "order_id": 3422001,
                        "status": "processing",
                        "changed_at": "2025-01-02T00:00:00Z",
                        "changed_by": "system",
                        "note": null
                    }
                ]
            })))
            .create_async()
            .await;

        let order = client.orders().get(3_422_001).await.unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.status_history.len(), 2);
        assert_eq!(order.status_history[0].status, OrderStatus::Pending);
    }
}
