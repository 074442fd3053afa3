//! API group definitions for the internal gateway contract.
//!
//! This module organizes the edge's typed view of the data gateway. Each
//! submodule corresponds to a group of endpoints on the gateway's internal
//! API, mirroring the path structure the gateway serves.
//!
//! # Submodules
//!
//! - `users`: the `/users/` group, covering identity, profile patches,
//!     notification settings and the derived notification stream.
//! - `carts`: the `/carts/` group, covering cart CRUD, item operations and
//!     checkout.
//! - `orders`: the `/orders/` group, covering direct creation and reads.
//! - `products`: the `/products/` group, covering browse, search and the
//!     bulk lookup used for enrichment composition.
//!

// The `/users/` API group.
mod users;
pub use users::Users;

// The `/carts/` API group.
mod carts;
pub use carts::Carts;

// The `/orders/` API group.
mod orders;
pub use orders::Orders;

// The `/products/` API group.
mod products;
pub use products::Products;
