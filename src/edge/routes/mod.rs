//! External HTTP routes of the edge API.
//!
//! All paths live under `/api`. Handlers parse and type-check identifiers,
//! translate camelCase bodies onto the internal contract, call the gateway
//! (and, for predictions, the recommender), and wrap results in the
//! `{ message, data }` envelope. No business state lives here.
//!
//! # Submodules
//!
//! - `users`: registration, login/logout, profile, password/email changes,
//!     notification settings and the notification stream.
//! - `cart`: cart CRUD, item operations, clear and checkout.
//! - `orders`: direct creation, per-user listing and detail.
//! - `products`: catalog browse and search.
//! - `predictions`: best-effort recommendations with enrichment splicing.
//!
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::edge::client::GatewayClient;
use crate::edge::models::ApiEnvelope;
use crate::recommend::RecommenderClient;

mod cart;
mod orders;
mod predictions;
mod products;
mod users;

/// Shared state of the edge process: the two upstream clients.
#[derive(Clone)]
pub struct EdgeState {
    pub gateway: GatewayClient,
    pub recommender: RecommenderClient,
}

async fn health() -> Json<ApiEnvelope<serde_json::Value>> {
    Json(ApiEnvelope::new(
        "ok",
        serde_json::json!({ "status": "healthy", "service": "timele-edge" }),
    ))
}

/// Builds the external router over the upstream clients.
pub fn router(state: EdgeState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        // Users
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login))
        .route("/api/users/logout", post(users::logout))
        .route(
            "/api/users/{user_id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/api/users/{user_id}/password", put(users::change_password))
        .route("/api/users/{user_id}/email", put(users::change_email))
        .route(
            "/api/users/{user_id}/notification-settings",
            get(users::notification_settings).put(users::update_notification_settings),
        )
        .route(
            "/api/users/{user_id}/order-status-notifications",
            get(users::order_status_notifications),
        )
        .route(
            "/api/users/{user_id}/notifications/viewed",
            post(users::mark_notifications_viewed),
        )
        // Cart
        .route("/api/cart", post(cart::create_cart))
        .route(
            "/api/cart/{user_id}",
            get(cart::get_cart).put(cart::replace_cart).delete(cart::delete_cart),
        )
        .route("/api/cart/{user_id}/items", post(cart::add_item))
        .route(
            "/api/cart/{user_id}/items/{product_id}",
            put(cart::set_item_quantity).delete(cart::remove_item),
        )
        .route("/api/cart/{user_id}/clear", delete(cart::clear_cart))
        .route("/api/cart/{user_id}/checkout", post(cart::checkout))
        // Orders
        .route("/api/orders", post(orders::create_order))
        .route("/api/orders/user/{user_id}", get(orders::list_user_orders))
        .route("/api/orders/{order_id}", get(orders::get_order))
        // Products
        .route("/api/products", get(products::list_products))
        .route("/api/products/search", get(products::search_products))
        .route("/api/products/{product_id}", get(products::get_product))
        .route(
            "/api/products/department/{department_id}",
            get(products::list_by_department),
        )
        .route("/api/products/aisle/{aisle_id}", get(products::list_by_aisle))
        // Predictions
        .route(
            "/api/predictions/user/{user_id}",
            get(predictions::predictions_for_user),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
