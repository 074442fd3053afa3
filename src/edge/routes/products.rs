//! Product handlers on the external surface.
//!
//! The listing parameters need hand parsing: `categories` repeats on the
//! external wire (`?categories=pantry&categories=frozen`), which the form
//! decoder cannot express as a struct field. The parsed set folds into the
//! internal comma-separated parameter.
//!
use axum::extract::{Path, RawQuery, State};
use axum::Json;

use crate::edge::error::EdgeResult;
use crate::edge::models::ids::parse_product_id;
use crate::edge::models::{ApiEnvelope, Page, ProductExternal};
use crate::error::Result;
use crate::gateway::models::{ProductPage, ProductQuery, ProductSort};

use super::EdgeState;

/// Parses a catalog grouping id (department or aisle) from its path segment.
fn parse_grouping_id(raw: &str, what: &str) -> Result<i32> {
    raw.parse::<i32>().map_err(|_| {
        crate::error::TimeleError::service(
            crate::error::ErrorKind::InvalidIdFormat,
            format!("`{raw}` is not a valid {what}"),
        )
    })
}

/// Parses the external listing parameters from the raw query string.
fn parse_listing_query(raw: Option<&str>) -> Result<ProductQuery> {
    let mut limit = None;
    let mut offset = None;
    let mut sort = None;
    let mut categories = Vec::new();
    let mut search = None;

    for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
        match key.as_ref() {
            "limit" => limit = value.parse::<i64>().ok(),
            "offset" => offset = value.parse::<i64>().ok(),
            "sort" => sort = Some(value.parse::<ProductSort>()?),
            "categories" => {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    categories.push(trimmed.to_string());
                }
            }
            "q" => {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    search = Some(trimmed.to_string());
                }
            }
            _ => {}
        }
    }

    let mut query = ProductQuery::clamped(limit, offset);
    query.sort = sort;
    query.categories = categories;
    query.search = search;
    Ok(query)
}

fn page_envelope(page: ProductPage) -> ApiEnvelope<Page<ProductExternal>> {
    let items: Vec<ProductExternal> = page.products.into_iter().map(Into::into).collect();
    ApiEnvelope::new(
        "products",
        Page::from_window(items, page.total, page.limit, page.offset),
    )
}

pub(super) async fn list_products(
    State(state): State<EdgeState>,
    RawQuery(raw): RawQuery,
) -> EdgeResult<Json<ApiEnvelope<Page<ProductExternal>>>> {
    let query = parse_listing_query(raw.as_deref())?;
    let page = state.gateway.products().list(&query).await?;
    Ok(Json(page_envelope(page)))
}

pub(super) async fn search_products(
    State(state): State<EdgeState>,
    RawQuery(raw): RawQuery,
) -> EdgeResult<Json<ApiEnvelope<Page<ProductExternal>>>> {
    let query = parse_listing_query(raw.as_deref())?;
    let page = state.gateway.products().search(&query).await?;
    Ok(Json(page_envelope(page)))
}

pub(super) async fn get_product(
    State(state): State<EdgeState>,
    Path(product_id): Path<String>,
) -> EdgeResult<Json<ApiEnvelope<ProductExternal>>> {
    let product_id = parse_product_id(&product_id)?;
    let product = state.gateway.products().get(product_id).await?;
    Ok(Json(ApiEnvelope::new("product", product.into())))
}

pub(super) async fn list_by_department(
    State(state): State<EdgeState>,
    Path(department_id): Path<String>,
    RawQuery(raw): RawQuery,
) -> EdgeResult<Json<ApiEnvelope<Page<ProductExternal>>>> {
    let department_id = parse_grouping_id(&department_id, "department id")?;
    let query = parse_listing_query(raw.as_deref())?;
    let page = state
        .gateway
        .products()
        .by_department(department_id, &query)
        .await?;
    Ok(Json(page_envelope(page)))
}

pub(super) async fn list_by_aisle(
    State(state): State<EdgeState>,
    Path(aisle_id): Path<String>,
    RawQuery(raw): RawQuery,
) -> EdgeResult<Json<ApiEnvelope<Page<ProductExternal>>>> {
    let aisle_id = parse_grouping_id(&aisle_id, "aisle id")?;
    let query = parse_listing_query(raw.as_deref())?;
    let page = state.gateway.products().by_aisle(aisle_id, &query).await?;
    Ok(Json(page_envelope(page)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_categories_collect() {
        let query =
            parse_listing_query(Some("categories=Pantry&categories=Frozen&limit=10")).unwrap();
        assert_eq!(query.categories, vec!["Pantry", "Frozen"]);
        assert_eq!(query.limit, 10);
    }

    #[test]
    fn test_unknown_sort_is_invalid_input() {
        let err = parse_listing_query(Some("sort=bestseller")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_defaults_apply_without_query() {
        let query = parse_listing_query(None).unwrap();
        assert_eq!(query.limit, 20);
        assert_eq!(query.offset, 0);
        assert!(query.categories.is_empty());
        assert!(query.sort.is_none());
    }

    #[test]
    fn test_search_term_is_url_decoded() {
        let query = parse_listing_query(Some("q=ice+cream")).unwrap();
        assert_eq!(query.search.as_deref(), Some("ice cream"));
    }
}
