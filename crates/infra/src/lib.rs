//! `bazaar-infra` — storage backends and application services.
//!
//! The `store` module defines the storage traits plus two backends: an
//! in-memory one (tests/dev) and a Postgres one (behind the `postgres`
//! feature; see `schema.sql` at the crate root). The service modules compose
//! those traits into the operations the HTTP layer exposes; `checkout` is the
//! order-placement transaction boundary.
//!
//! This crate contains no HTTP concerns.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod reviews;
pub mod store;

pub use cart::CartService;
pub use catalog::Catalog;
pub use checkout::Checkout;
pub use error::ServiceError;
pub use reviews::{PostedReview, ReviewService};
#[cfg(feature = "postgres")]
pub use store::PostgresStore;
pub use store::{
    CartStore, InMemoryStore, MarketStore, OrderStore, Pagination, ProductStore, ReviewStore,
    StoreError,
};
