//! Storage traits and backends.
//!
//! The traits model what the marketplace requires of its durable store: plain
//! keyed reads and writes for catalog, cart and review rows, plus two
//! operations with stronger contracts on the order path:
//!
//! - [`OrderStore::commit_order`] — the atomic multi-row commit: every stock
//!   decrement is applied with a compare-and-swap on the product's version and
//!   the order with all its lines is persisted, as one indivisible unit.
//! - [`OrderStore::has_purchased`] — a read over committed state only, with no
//!   staleness: it reflects every commit that completed before the read began.

use async_trait::async_trait;
use thiserror::Error;

use bazaar_cart::{CartEntry, CartEntryId};
use bazaar_catalog::{Product, ProductFilter, ProductId, StockReservation};
use bazaar_core::{DomainError, UserId, Version};
use bazaar_orders::{Order, OrderId};
use bazaar_reviews::{Review, ReviewId};

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

/// Storage operation error.
///
/// `Conflict` and `InsufficientStock` mirror the domain-level classification:
/// backends produce them by re-running the stock ledger decision against the
/// stored row inside their commit. Everything environmental (connection loss,
/// poisoned lock, corrupt row) is `Backend`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Optimistic concurrency check failed (stale version presented).
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    /// Requested decrement exceeds the currently stored stock.
    #[error("insufficient stock: {0}")]
    InsufficientStock(String),

    /// A row this operation requires does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend itself failed; nothing was committed.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<DomainError> for StoreError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::InsufficientStock(msg) => Self::InsufficientStock(msg),
            DomainError::NotFound => Self::NotFound("row not found".to_string()),
            other => Self::Backend(other.to_string()),
        }
    }
}

/// Offset/limit window for listing reads.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
}

impl Pagination {
    pub const DEFAULT_LIMIT: usize = 20;

    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Zero-based page of `size` rows.
    pub fn page(page: usize, size: usize) -> Self {
        Self {
            offset: page.saturating_mul(size),
            limit: size,
        }
    }

    /// Apply the window to an already-ordered collection (in-memory backends).
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Catalog rows (products double as the authoritative inventory records).
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert_product(&self, product: Product) -> Result<(), StoreError>;

    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Replace the stored row with `product`, conditional on the stored
    /// version still being `expected`. A stale `expected` is a `Conflict`.
    async fn update_product(&self, product: &Product, expected: Version) -> Result<(), StoreError>;

    /// Returns whether a row was deleted. Committed orders are unaffected:
    /// their lines are self-contained snapshots.
    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError>;

    /// Filtered listing, newest first.
    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<Vec<Product>, StoreError>;
}

/// Committed orders and the purchase-history read derived from them.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// The atomic commit of an order placement.
    ///
    /// Applies every reservation as a compare-and-swap decrement (re-running
    /// the stock ledger classification against the stored rows) and persists
    /// the order together with all its lines. All of it commits, or none of
    /// it: any `Conflict`, `InsufficientStock` or `NotFound` leaves no
    /// observable effect.
    ///
    /// Reservations for the same product must be ordered as issued; each one
    /// expects the version produced by the previous.
    async fn commit_order(
        &self,
        order: Order,
        reservations: Vec<StockReservation>,
    ) -> Result<(), StoreError>;

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// A buyer's committed orders, most recent first.
    async fn orders_for(&self, buyer: UserId, page: Pagination) -> Result<Vec<Order>, StoreError>;

    /// True iff some committed order of `buyer` contains a line for `product`.
    async fn has_purchased(&self, buyer: UserId, product: ProductId) -> Result<bool, StoreError>;
}

/// Cart rows. A user holds at most one entry per product.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn insert_cart_entry(&self, entry: CartEntry) -> Result<(), StoreError>;

    async fn update_cart_entry(&self, entry: &CartEntry) -> Result<(), StoreError>;

    async fn cart_entry(&self, id: CartEntryId) -> Result<Option<CartEntry>, StoreError>;

    async fn cart_entry_for_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Option<CartEntry>, StoreError>;

    /// A user's cart, newest entries first.
    async fn cart_entries_for(&self, user: UserId) -> Result<Vec<CartEntry>, StoreError>;

    /// Returns whether an entry was deleted.
    async fn delete_cart_entry(&self, id: CartEntryId) -> Result<bool, StoreError>;

    /// Best-effort removal keyed by (user, product); absence is not an error.
    async fn remove_cart_entry_for_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, StoreError>;
}

/// Review rows.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert_review(&self, review: Review) -> Result<(), StoreError>;

    async fn review(&self, id: ReviewId) -> Result<Option<Review>, StoreError>;

    async fn update_review(&self, review: &Review) -> Result<(), StoreError>;

    async fn delete_review(&self, id: ReviewId) -> Result<bool, StoreError>;

    async fn reviews_for_product(
        &self,
        product: ProductId,
        page: Pagination,
    ) -> Result<Vec<Review>, StoreError>;

    async fn reviews_by_author(
        &self,
        author: UserId,
        page: Pagination,
    ) -> Result<Vec<Review>, StoreError>;
}

/// Everything the full application needs from one backend.
pub trait MarketStore: ProductStore + OrderStore + CartStore + ReviewStore {}

impl<T: ProductStore + OrderStore + CartStore + ReviewStore> MarketStore for T {}
