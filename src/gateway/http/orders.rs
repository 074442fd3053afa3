//! Order handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::gateway::models::{NewOrder, OrderPage, OrderView, StatusChange};
use crate::gateway::store::Store;

use super::{ok, parse_numeric_id, GatewayResult};

#[derive(Debug, Deserialize)]
pub(super) struct PageParams {
    limit: Option<i64>,
    offset: Option<i64>,
}

pub(super) async fn create_order(
    State(store): State<Store>,
    Json(body): Json<NewOrder>,
) -> GatewayResult<OrderView> {
    ok(store.orders().create(&body).await?)
}

pub(super) async fn get_order(
    State(store): State<Store>,
    Path(order_id): Path<String>,
) -> GatewayResult<OrderView> {
    let order_id: i64 = parse_numeric_id(&order_id, "order id")?;
    ok(store.orders().get(order_id).await?)
}

pub(super) async fn list_user_orders(
    State(store): State<Store>,
    Path(user_id): Path<String>,
    Query(page): Query<PageParams>,
) -> GatewayResult<OrderPage> {
    ok(store
        .orders()
        .list_for_user(&user_id, page.limit.unwrap_or(20), page.offset.unwrap_or(0))
        .await?)
}

/// Status transition endpoint used by operational tooling; not exposed on
/// the external surface.
pub(super) async fn change_status(
    State(store): State<Store>,
    Path(order_id): Path<String>,
    Json(body): Json<StatusChange>,
) -> GatewayResult<OrderView> {
    let order_id: i64 = parse_numeric_id(&order_id, "order id")?;
    ok(store.orders().transition(order_id, &body).await?)
}
