//! Cart domain module.
//!
//! A cart entry is a buyer's pre-checkout intent to buy a product at a given
//! quantity. Cart state is advisory: checkout consumes it best-effort and never
//! depends on it being consistent.

pub mod entry;

pub use entry::{CartEntry, CartEntryId};
