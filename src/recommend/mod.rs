//! The recommender client (M): best-effort access to the external ranker.
//!
//! Given a user identifier, the recommender returns a product list ranked by
//! scores in [0, 1]. Failure always degrades to empty predictions at the
//! edge, never a 5xx.
//!
pub mod client;
pub mod models;

pub use client::RecommenderClient;
pub use models::{Prediction, UserPredictions};
