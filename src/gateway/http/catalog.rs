//! Catalog handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::gateway::models::{
    ProductDetail, ProductLookup, ProductPage, ProductQuery, ProductSort,
};
use crate::gateway::store::Store;

use super::{ok, parse_numeric_id, GatewayError, GatewayResult};

/// Listing parameters on the internal wire. `categories` travels as one
/// comma-separated value; the edge folds its repeated external parameter
/// into it.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ListParams {
    limit: Option<i64>,
    offset: Option<i64>,
    sort: Option<String>,
    categories: Option<String>,
    q: Option<String>,
}

impl ListParams {
    fn into_query(self) -> Result<ProductQuery, GatewayError> {
        let mut query = ProductQuery::clamped(self.limit, self.offset);
        if let Some(sort) = self.sort.as_deref() {
            query.sort = Some(sort.parse::<ProductSort>().map_err(GatewayError::from)?);
        }
        if let Some(categories) = self.categories.as_deref() {
            query.categories = categories
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
        }
        query.search = self.q.filter(|q| !q.trim().is_empty());
        Ok(query)
    }
}

pub(super) async fn list_products(
    State(store): State<Store>,
    Query(params): Query<ListParams>,
) -> GatewayResult<ProductPage> {
    let query = params.into_query()?;
    ok(store.catalog().list(&query).await?)
}

pub(super) async fn search_products(
    State(store): State<Store>,
    Query(params): Query<ListParams>,
) -> GatewayResult<ProductPage> {
    let query = params.into_query()?;
    ok(store.catalog().list(&query).await?)
}

pub(super) async fn get_product(
    State(store): State<Store>,
    Path(product_id): Path<String>,
) -> GatewayResult<ProductDetail> {
    let product_id: i32 = parse_numeric_id(&product_id, "product id")?;
    ok(store.catalog().get(product_id).await?)
}

pub(super) async fn list_by_department(
    State(store): State<Store>,
    Path(department_id): Path<String>,
    Query(params): Query<ListParams>,
) -> GatewayResult<ProductPage> {
    let department_id: i32 = parse_numeric_id(&department_id, "department id")?;
    let mut query = params.into_query()?;
    query.department_id = Some(department_id);
    ok(store.catalog().list(&query).await?)
}

pub(super) async fn list_by_aisle(
    State(store): State<Store>,
    Path(aisle_id): Path<String>,
    Query(params): Query<ListParams>,
) -> GatewayResult<ProductPage> {
    let aisle_id: i32 = parse_numeric_id(&aisle_id, "aisle id")?;
    let mut query = params.into_query()?;
    query.aisle_id = Some(aisle_id);
    ok(store.catalog().list(&query).await?)
}

/// Bulk id-set lookup for enrichment composition at the edge.
pub(super) async fn lookup_products(
    State(store): State<Store>,
    Json(body): Json<ProductLookup>,
) -> GatewayResult<Vec<ProductDetail>> {
    ok(store.catalog().lookup(&body.product_ids).await?)
}
