//! Products API group: `/products/`
//!
//! Catalog browse, search and the bulk id-set lookup. The lookup exists so
//! response composition at the edge costs one round-trip per id set, never
//! one per item.
//!
use crate::edge::client::GatewayClient;
use crate::error::Result;
use crate::gateway::models::{ProductDetail, ProductPage, ProductQuery};

/// Catalog related endpoints on the data gateway.
///
pub struct Products<'c> {
    /// Reference to the HTTP client used for making API requests.
    pub client: &'c GatewayClient,
}

impl<'c> Products<'c> {
    /// Creates a new instance of `Products`.
    ///
    /// # Arguments
    ///
    /// * `client` - A reference to the `GatewayClient` used for making API requests.
    ///
    pub fn new(client: &'c GatewayClient) -> Self {
        Self { client }
    }

    fn query_string(query: &ProductQuery) -> String {
        let mut pairs = vec![
            format!("limit={}", query.limit),
            format!("offset={}", query.offset),
        ];
        if let Some(sort) = query.sort {
            pairs.push(format!("sort={sort}"));
        }
        if !query.categories.is_empty() {
            pairs.push(format!("categories={}", query.categories.join(",")));
        }
        if let Some(q) = &query.search {
            let encoded: String =
                url::form_urlencoded::byte_serialize(q.as_bytes()).collect();
            pairs.push(format!("q={encoded}"));
        }
        pairs.join("&")
    }

    // ===== [ Gateway API endpoints ] =====

    /// Lists products via `GET /products`.
    pub async fn list(&self, query: &ProductQuery) -> Result<ProductPage> {
        self.client
            .get(&format!("/products?{}", Self::query_string(query)))
            .await
    }

    /// Searches products via `GET /products/search`.
    pub async fn search(&self, query: &ProductQuery) -> Result<ProductPage> {
        self.client
            .get(&format!("/products/search?{}", Self::query_string(query)))
            .await
    }

    /// Fetches one product via `GET /products/{product_id}`.
    pub async fn get(&self, product_id: i32) -> Result<ProductDetail> {
        self.client.get(&format!("/products/{product_id}")).await
    }

    /// Lists a department via `GET /products/department/{department_id}`.
    pub async fn by_department(
        &self,
        department_id: i32,
        query: &ProductQuery,
    ) -> Result<ProductPage> {
        self.client
            .get(&format!(
                "/products/department/{department_id}?{}",
                Self::query_string(query)
            ))
            .await
    }

    /// Lists an aisle via `GET /products/aisle/{aisle_id}`.
    pub async fn by_aisle(&self, aisle_id: i32, query: &ProductQuery) -> Result<ProductPage> {
        self.client
            .get(&format!(
                "/products/aisle/{aisle_id}?{}",
                Self::query_string(query)
            ))
            .await
    }

    /// Bulk id-set lookup via `POST /products/lookup`.
    pub async fn lookup(&self, product_ids: &[i32]) -> Result<Vec<ProductDetail>> {
        self.client
            .post(
                "/products/lookup",
                &serde_json::json!({ "product_ids": product_ids }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::client::test_utils::{get_test_client, success_body};
    use crate::gateway::models::ProductSort;

    #[test]
    fn test_query_string_folds_categories() {
        let query = ProductQuery {
            limit: 20,
            offset: 40,
            sort: Some(ProductSort::Price),
            categories: vec!["pantry".into(), "frozen".into()],
            search: None,
            department_id: None,
            aisle_id: None,
        };
        assert_eq!(
            Products::query_string(&query),
            "limit=20&offset=40&sort=price&categories=pantry,frozen"
        );
    }

    #[test]
    fn test_query_string_encodes_search() {
        let query = ProductQuery {
            search: Some("ice cream".into()),
            ..ProductQuery::clamped(None, None)
        };
        assert_eq!(
            Products::query_string(&query),
            "limit=20&offset=0&q=ice+cream"
        );
    }

    #[tokio::test]
    async fn test_lookup_round_trip() {
        let (mut server, client) = get_test_client().await;
        server
            .mock("POST", "/products/lookup")
            .with_status(200)
            .with_body(success_body(serde_json::json!([{
                "product_id": 2,
                "product_name": "All-Seasons Salt",
                "aisle_id": 104,
                "aisle": "spices seasonings",
                "department_id": 13,
                "department": "pantry",
                "description": null,
                "price": "4.99",
                "image_url": null
            }])))
            .create_async()
            .await;

        let products = client.products().lookup(&[2]).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].product_name, "All-Seasons Salt");
    }
}
