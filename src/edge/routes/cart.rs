//! Cart handlers on the external surface.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::edge::error::EdgeResult;
use crate::edge::models::ids::{parse_product_id, parse_user_id};
use crate::edge::models::{
    AddItemRequest, ApiEnvelope, CartViewExternal, CreateCartRequest, OrderViewExternal,
    ReplaceCartRequest, SetQuantityRequest,
};
use crate::gateway::models::{CartItemSpec, DeliveryInfo};

use super::EdgeState;

pub(super) async fn get_cart(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
) -> EdgeResult<Json<ApiEnvelope<CartViewExternal>>> {
    let user_id = parse_user_id(&user_id)?;
    let cart = state.gateway.carts().get(user_id).await?;
    Ok(Json(ApiEnvelope::new("cart", cart.into())))
}

pub(super) async fn create_cart(
    State(state): State<EdgeState>,
    Json(body): Json<CreateCartRequest>,
) -> EdgeResult<(StatusCode, Json<ApiEnvelope<CartViewExternal>>)> {
    let cart = state.gateway.carts().create(&body.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::new("cart created", cart.into())),
    ))
}

pub(super) async fn replace_cart(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
    Json(body): Json<ReplaceCartRequest>,
) -> EdgeResult<Json<ApiEnvelope<CartViewExternal>>> {
    let user_id = parse_user_id(&user_id)?;
    let items: Vec<CartItemSpec> = body.items.into_iter().map(Into::into).collect();
    let cart = state.gateway.carts().replace(user_id, &items).await?;
    Ok(Json(ApiEnvelope::new("cart replaced", cart.into())))
}

pub(super) async fn delete_cart(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
) -> EdgeResult<Json<ApiEnvelope<serde_json::Value>>> {
    let user_id = parse_user_id(&user_id)?;
    state.gateway.carts().delete(user_id).await?;
    Ok(Json(ApiEnvelope::new(
        "cart deleted",
        serde_json::json!({ "deleted": true }),
    )))
}

pub(super) async fn add_item(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
    Json(body): Json<AddItemRequest>,
) -> EdgeResult<Json<ApiEnvelope<CartViewExternal>>> {
    let user_id = parse_user_id(&user_id)?;
    let cart = state.gateway.carts().add_item(user_id, &body.into()).await?;
    Ok(Json(ApiEnvelope::new("item added", cart.into())))
}

pub(super) async fn set_item_quantity(
    State(state): State<EdgeState>,
    Path((user_id, product_id)): Path<(String, String)>,
    Json(body): Json<SetQuantityRequest>,
) -> EdgeResult<Json<ApiEnvelope<CartViewExternal>>> {
    let user_id = parse_user_id(&user_id)?;
    let product_id = parse_product_id(&product_id)?;
    let cart = state
        .gateway
        .carts()
        .set_item_quantity(user_id, product_id, &body.into())
        .await?;
    Ok(Json(ApiEnvelope::new("item updated", cart.into())))
}

pub(super) async fn remove_item(
    State(state): State<EdgeState>,
    Path((user_id, product_id)): Path<(String, String)>,
) -> EdgeResult<Json<ApiEnvelope<CartViewExternal>>> {
    let user_id = parse_user_id(&user_id)?;
    let product_id = parse_product_id(&product_id)?;
    let cart = state.gateway.carts().remove_item(user_id, product_id).await?;
    Ok(Json(ApiEnvelope::new("item removed", cart.into())))
}

pub(super) async fn clear_cart(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
) -> EdgeResult<Json<ApiEnvelope<CartViewExternal>>> {
    let user_id = parse_user_id(&user_id)?;
    let cart = state.gateway.carts().clear(user_id).await?;
    Ok(Json(ApiEnvelope::new("cart cleared", cart.into())))
}

pub(super) async fn checkout(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
    body: Option<Json<crate::edge::models::DeliveryExternal>>,
) -> EdgeResult<Json<ApiEnvelope<OrderViewExternal>>> {
    let user_id = parse_user_id(&user_id)?;
    let delivery: DeliveryInfo = body.map(|Json(d)| d.into()).unwrap_or_default();
    let order = state.gateway.carts().checkout(user_id, &delivery).await?;
    Ok(Json(ApiEnvelope::new("order created", order.into())))
}
