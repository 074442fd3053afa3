//! The edge API (E): the only process reachable by the browser.
//!
//! Translates the external camelCase contract into internal snake_case calls
//! to the data gateway and the recommender. Stateless: field translation,
//! id typing, error remapping and fan-out composition, nothing else.
//!
pub mod api;
pub mod client;
pub mod error;
pub mod models;
pub mod routes;

pub use client::GatewayClient;
