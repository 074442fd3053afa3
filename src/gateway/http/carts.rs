//! Cart handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::gateway::models::{AddItem, CartView, DeliveryInfo, NewCart, OrderView, ReplaceCart, SetQuantity};
use crate::gateway::store::Store;

use super::{ok, parse_numeric_id, GatewayResult};

pub(super) async fn get_cart(
    State(store): State<Store>,
    Path(user_id): Path<String>,
) -> GatewayResult<CartView> {
    ok(store.carts().get(&user_id).await?)
}

pub(super) async fn create_cart(
    State(store): State<Store>,
    Json(body): Json<NewCart>,
) -> GatewayResult<CartView> {
    ok(store.carts().create(&body).await?)
}

pub(super) async fn replace_cart(
    State(store): State<Store>,
    Path(user_id): Path<String>,
    Json(body): Json<ReplaceCart>,
) -> GatewayResult<CartView> {
    ok(store.carts().replace(&user_id, &body.items).await?)
}

pub(super) async fn delete_cart(
    State(store): State<Store>,
    Path(user_id): Path<String>,
) -> GatewayResult<serde_json::Value> {
    store.carts().delete(&user_id).await?;
    ok(serde_json::json!({ "deleted": true }))
}

pub(super) async fn add_item(
    State(store): State<Store>,
    Path(user_id): Path<String>,
    Json(body): Json<AddItem>,
) -> GatewayResult<CartView> {
    ok(store
        .carts()
        .add_item(&user_id, body.product_id, body.quantity)
        .await?)
}

pub(super) async fn set_item_quantity(
    State(store): State<Store>,
    Path((user_id, product_id)): Path<(String, String)>,
    Json(body): Json<SetQuantity>,
) -> GatewayResult<CartView> {
    let product_id: i32 = parse_numeric_id(&product_id, "product id")?;
    ok(store
        .carts()
        .set_item_quantity(&user_id, product_id, body.quantity)
        .await?)
}

pub(super) async fn remove_item(
    State(store): State<Store>,
    Path((user_id, product_id)): Path<(String, String)>,
) -> GatewayResult<CartView> {
    let product_id: i32 = parse_numeric_id(&product_id, "product id")?;
    ok(store.carts().remove_item(&user_id, product_id).await?)
}

pub(super) async fn clear_cart(
    State(store): State<Store>,
    Path(user_id): Path<String>,
) -> GatewayResult<CartView> {
    ok(store.carts().clear(&user_id).await?)
}

/// Optional checkout body carrying the delivery snapshot.
#[derive(Debug, Default, Deserialize)]
pub(super) struct CheckoutRequest {
    #[serde(default)]
    delivery: DeliveryInfo,
}

pub(super) async fn checkout(
    State(store): State<Store>,
    Path(user_id): Path<String>,
    Json(body): Json<CheckoutRequest>,
) -> GatewayResult<OrderView> {
    ok(store.orders().checkout(&user_id, &body.delivery).await?)
}
