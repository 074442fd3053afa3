//! **TimeL-E** core: the server-side system of a predictive grocery
//! e-commerce platform.
//!
//! Three cooperating processes form the core, all built from this crate:
//!
//! - **Edge API** (`timele-edge`) — the only process reachable by the
//!   browser. Translates the external camelCase JSON contract into internal
//!   snake_case calls, types every path identifier before any upstream
//!   round-trip, and maps typed errors onto HTTP statuses through one
//!   central table. Stateless.
//! - **Data Gateway** (`timele-gateway`) — owns the Postgres store: the
//!   dual-ID identity model (numeric keys inside, UUIDs outside), the CSV
//!   catalog bootstrap, carts with row-lock serialized mutations, the order
//!   lifecycle with its append-only status history, and the notification
//!   scheduler with its coalescing catch-up semantics.
//! - **Recommender client** — best-effort access to the external ranker;
//!   failure degrades to empty predictions, never a 5xx at the edge.
//!
//! # `timele` Features
//!
//! - **Type safe**
//!    - *Typed identifiers*: user UUIDs, stringly-rendered order/cart
//!      integers and plain product integers each parse into their own
//!      variant before any upstream call; mismatches are 422s, never 500s.
//!    - *Typed errors*: one `ErrorKind` taxonomy travels across the
//!      edge/gateway hop inside the response envelope, so context survives
//!      the service boundary.
//!    - *Automatic serialization/deserialization*: the camelCase/snake_case
//!      translation is mechanical serde renaming; external -> internal ->
//!      external round-trips preserve the field set.
//!
//! - **Asynchronous**: built on the `tokio` runtime; every database
//!   round-trip, inter-service call and email send is a suspension point.
//!
//! - **Distributed logging** with the `tracing` crate across all three
//!   processes.
//!
//! # Example
//! ```ignore
//! use timele::config::EdgeConfig;
//! use timele::edge::routes::{router, EdgeState};
//! use timele::edge::GatewayClient;
//! use timele::recommend::RecommenderClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Setup tracing
//!     tracing_subscriber::fmt()
//!         .with_max_level(tracing::Level::INFO)
//!         .init();
//!
//!     // Load env vars
//!     dotenv::dotenv().ok();
//!
//!     let config = EdgeConfig::default();
//!     let gateway = GatewayClient::new(&config)?;
//!     let recommender = RecommenderClient::new(&config)?;
//!
//!     // The edge refuses traffic until the gateway answers its probe.
//!     gateway
//!         .wait_until_healthy(30, std::time::Duration::from_secs(2))
//!         .await?;
//!
//!     let app = router(EdgeState { gateway, recommender });
//!     let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
#![warn(rust_2018_idioms)]

pub mod config;
pub mod edge;
pub mod error;
pub mod gateway;
pub mod recommend;
