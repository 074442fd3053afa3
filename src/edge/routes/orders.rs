//! Order handlers on the external surface.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::edge::error::EdgeResult;
use crate::edge::models::ids::{parse_order_id, parse_user_id};
use crate::edge::models::{ApiEnvelope, CreateOrderRequest, OrderViewExternal, Page};

use super::EdgeState;

#[derive(Debug, Deserialize)]
pub(super) struct PageParams {
    limit: Option<i64>,
    offset: Option<i64>,
}

pub(super) async fn create_order(
    State(state): State<EdgeState>,
    Json(body): Json<CreateOrderRequest>,
) -> EdgeResult<Json<ApiEnvelope<OrderViewExternal>>> {
    let order = state.gateway.orders().create(&body.into()).await?;
    Ok(Json(ApiEnvelope::new("order created", order.into())))
}

pub(super) async fn get_order(
    State(state): State<EdgeState>,
    Path(order_id): Path<String>,
) -> EdgeResult<Json<ApiEnvelope<OrderViewExternal>>> {
    let order_id = parse_order_id(&order_id)?;
    let order = state.gateway.orders().get(order_id).await?;
    Ok(Json(ApiEnvelope::new("order", order.into())))
}

pub(super) async fn list_user_orders(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
    Query(params): Query<PageParams>,
) -> EdgeResult<Json<ApiEnvelope<Page<OrderViewExternal>>>> {
    let user_id = parse_user_id(&user_id)?;
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);
    let page = state
        .gateway
        .orders()
        .list_for_user(user_id, limit, offset)
        .await?;
    let items: Vec<OrderViewExternal> = page.orders.into_iter().map(Into::into).collect();
    Ok(Json(ApiEnvelope::new(
        "orders",
        Page::from_window(items, page.total, page.limit, page.offset),
    )))
}
