//! Product catalog domain module.
//!
//! This crate contains business rules for products, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). A product row is
//! also the authoritative inventory record: it carries the stock count and the
//! version stamp that the stock ledger's compare-and-swap discipline is built
//! on.

pub mod product;

pub use product::{
    NewProduct, Product, ProductFilter, ProductId, ProductUpdate, StockReservation,
};
