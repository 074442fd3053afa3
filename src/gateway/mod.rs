//! The data gateway (D): the process that owns the relational store.
//!
//! Hosts the identity model with its dual-ID scheme, the catalog with its
//! CSV bootstrap, carts, the order lifecycle with immutable status history,
//! and the notification scheduler. All write paths flow through this process
//! so invariants are enforced in one place; the edge talks to it over the
//! internal snake_case HTTP API in [`http`].
//!
pub mod db;
pub mod http;
pub mod mailer;
pub mod models;
pub mod scheduler;
pub mod store;
