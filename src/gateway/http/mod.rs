//! Internal HTTP API of the data gateway.
//!
//! Serves the snake_case contract consumed by the edge. Every handler
//! delegates to a store group and wraps the result in the shared
//! `GatewayResponse` envelope; errors carry their `ErrorKind` by wire name so
//! the edge can re-type them without guessing from the status code.
//!
//! # Submodules
//!
//! - `users`: identity, profile patches, notification settings and the
//!     derived notification stream.
//! - `carts`: cart CRUD, item operations and checkout.
//! - `orders`: direct creation, reads and the status transition endpoint
//!     used by operational tooling.
//! - `catalog`: product browse, search and the bulk lookup.
//!
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{ErrorKind, TimeleError};
use crate::gateway::db;
use crate::gateway::models::GatewayResponse;
use crate::gateway::store::Store;

mod carts;
mod catalog;
mod orders;
mod users;

/// Error wrapper translating `TimeleError` into the envelope + status.
///
/// Untyped errors (database, IO) log at error level and surface as a generic
/// internal failure; their messages never reach the wire.
pub struct GatewayError(TimeleError);

impl<E: Into<TimeleError>> From<E> for GatewayError {
    fn from(err: E) -> Self {
        GatewayError(err.into())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        if kind == ErrorKind::Internal {
            tracing::error!(error = %self.0, "internal gateway error");
        }
        let status = StatusCode::from_u16(kind.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body: GatewayResponse<()> = GatewayResponse::error(kind, self.0.detail());
        (status, Json(body)).into_response()
    }
}

pub type GatewayResult<T> = std::result::Result<Json<GatewayResponse<T>>, GatewayError>;

pub(crate) fn ok<T>(data: T) -> GatewayResult<T> {
    Ok(Json(GatewayResponse::success(data)))
}

async fn health(State(store): State<Store>) -> GatewayResult<serde_json::Value> {
    db::ping(store.pool()).await?;
    ok(serde_json::json!({ "status": "healthy", "service": "timele-gateway" }))
}

/// Builds the internal router over a connected store.
pub fn router(store: Store) -> Router {
    Router::new()
        .route("/health", get(health))
        // Identity
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route(
            "/users/{user_id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/users/{user_id}/password", put(users::change_password))
        .route("/users/{user_id}/email", put(users::change_email))
        .route(
            "/users/{user_id}/notification-settings",
            get(users::notification_settings).put(users::update_notification_settings),
        )
        .route(
            "/users/{user_id}/order-status-notifications",
            get(users::order_status_notifications),
        )
        .route(
            "/users/{user_id}/notifications/viewed",
            post(users::mark_notifications_viewed),
        )
        .route("/users/{user_id}/resolve", get(users::resolve_user))
        // Carts
        .route("/carts", post(carts::create_cart))
        .route(
            "/carts/{user_id}",
            get(carts::get_cart).put(carts::replace_cart).delete(carts::delete_cart),
        )
        .route("/carts/{user_id}/items", post(carts::add_item))
        .route(
            "/carts/{user_id}/items/{product_id}",
            put(carts::set_item_quantity).delete(carts::remove_item),
        )
        .route("/carts/{user_id}/clear", delete(carts::clear_cart))
        .route("/carts/{user_id}/checkout", post(carts::checkout))
        // Orders
        .route("/orders", post(orders::create_order))
        .route("/orders/user/{user_id}", get(orders::list_user_orders))
        .route("/orders/{order_id}", get(orders::get_order))
        .route("/orders/{order_id}/status", post(orders::change_status))
        // Catalog
        .route("/products", get(catalog::list_products))
        .route("/products/search", get(catalog::search_products))
        .route("/products/lookup", post(catalog::lookup_products))
        .route("/products/{product_id}", get(catalog::get_product))
        .route(
            "/products/department/{department_id}",
            get(catalog::list_by_department),
        )
        .route("/products/aisle/{aisle_id}", get(catalog::list_by_aisle))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(store)
}

/// Parses a path segment as a numeric id, reporting a typed format error
/// instead of a routing 400.
pub(crate) fn parse_numeric_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, GatewayError> {
    raw.parse::<T>().map_err(|_| {
        GatewayError(TimeleError::service(
            ErrorKind::InvalidIdFormat,
            format!("`{raw}` is not a valid {what}"),
        ))
    })
}
