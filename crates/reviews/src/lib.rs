//! Reviews domain module.
//!
//! Review authorship is gated on purchase history: only a user who has a
//! committed order containing the product may review it. The gate itself is
//! applied in the service layer; this crate holds the review rules.

pub mod review;

pub use review::{Review, ReviewDraft, ReviewId};
