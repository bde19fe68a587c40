//! Cart management: add-or-merge, listing, owner-only edits.

use chrono::Utc;

use bazaar_cart::{CartEntry, CartEntryId};
use bazaar_catalog::ProductId;
use bazaar_core::{EntityId, UserId};

use crate::error::ServiceError;
use crate::store::{CartStore, ProductStore};

#[derive(Debug, Clone)]
pub struct CartService<S> {
    store: S,
}

impl<S> CartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: CartStore + ProductStore> CartService<S> {
    /// Put `quantity` units of a product into the user's cart. If the product
    /// is already in the cart the quantities merge instead of duplicating the
    /// entry.
    pub async fn add_item(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartEntry, ServiceError> {
        self.store
            .product(product_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        match self.store.cart_entry_for_product(user, product_id).await? {
            Some(mut entry) => {
                entry.merge_quantity(quantity)?;
                self.store.update_cart_entry(&entry).await?;
                Ok(entry)
            }
            None => {
                let entry = CartEntry::new(
                    CartEntryId::new(EntityId::new()),
                    user,
                    product_id,
                    quantity,
                    Utc::now(),
                )?;
                self.store.insert_cart_entry(entry.clone()).await?;
                Ok(entry)
            }
        }
    }

    /// The user's cart, newest entries first.
    pub async fn items(&self, user: UserId) -> Result<Vec<CartEntry>, ServiceError> {
        Ok(self.store.cart_entries_for(user).await?)
    }

    pub async fn update_quantity(
        &self,
        user: UserId,
        entry_id: CartEntryId,
        quantity: u32,
    ) -> Result<CartEntry, ServiceError> {
        let mut entry = self
            .store
            .cart_entry(entry_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if !entry.is_owned_by(user) {
            return Err(ServiceError::Unauthorized);
        }

        entry.set_quantity(quantity)?;
        self.store.update_cart_entry(&entry).await?;
        Ok(entry)
    }

    pub async fn remove_item(&self, user: UserId, entry_id: CartEntryId) -> Result<(), ServiceError> {
        let entry = self
            .store
            .cart_entry(entry_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if !entry.is_owned_by(user) {
            return Err(ServiceError::Unauthorized);
        }

        self.store.delete_cart_entry(entry_id).await?;
        Ok(())
    }
}
