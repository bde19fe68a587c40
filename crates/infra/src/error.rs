//! Application-level error model shared by the services in this crate.

use thiserror::Error;

use bazaar_core::DomainError;

use crate::store::StoreError;

/// Error surfaced by the application services.
///
/// `InsufficientStock` and `Conflict` stay distinct all the way to the API
/// boundary: the first tells the caller to stop, the second that re-issuing
/// the whole request against fresh state may succeed. Conflicts are never
/// retried inside the services — a stock race is the buyer's to see.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error("insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized")]
    Unauthorized,

    /// Storage failure unrelated to the request's semantics.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::NotFound => Self::NotFound,
            DomainError::InsufficientStock(msg) => Self::InsufficientStock(msg),
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::Unauthorized => Self::Unauthorized,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::InsufficientStock(msg) => Self::InsufficientStock(msg),
            StoreError::NotFound(_) => Self::NotFound,
            other => Self::Store(other),
        }
    }
}
