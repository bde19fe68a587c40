use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_catalog::ProductId;
use bazaar_core::{DomainError, DomainResult, EntityId, UserId};

/// Cart entry identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartEntryId(pub EntityId);

impl CartEntryId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CartEntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// One product a user intends to buy, at a given quantity.
///
/// A user holds at most one entry per product; adding the same product again
/// merges into the existing entry via [`CartEntry::merge_quantity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub id: CartEntryId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

impl CartEntry {
    pub fn new(
        id: CartEntryId,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        ensure_positive(quantity)?;
        Ok(Self {
            id,
            user_id,
            product_id,
            quantity,
            created_at,
        })
    }

    /// Add `additional` units to the entry (same product added again).
    pub fn merge_quantity(&mut self, additional: u32) -> DomainResult<()> {
        ensure_positive(additional)?;
        self.quantity = self.quantity.checked_add(additional).ok_or_else(|| {
            DomainError::validation("cart quantity out of range")
        })?;
        Ok(())
    }

    /// Replace the quantity outright (cart edit, not an add).
    pub fn set_quantity(&mut self, quantity: u32) -> DomainResult<()> {
        ensure_positive(quantity)?;
        self.quantity = quantity;
        Ok(())
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user_id == user
    }
}

fn ensure_positive(quantity: u32) -> DomainResult<()> {
    if quantity == 0 {
        return Err(DomainError::validation("quantity must be positive"));
    }
    Ok(())
}
