//! Catalog management: seller-owned product CRUD and the public listing.

use chrono::Utc;

use bazaar_catalog::{NewProduct, Product, ProductFilter, ProductId, ProductUpdate};
use bazaar_core::{EntityId, UserId};

use crate::error::ServiceError;
use crate::store::{Pagination, ProductStore};

#[derive(Debug, Clone)]
pub struct Catalog<S> {
    store: S,
}

impl<S> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: ProductStore> Catalog<S> {
    pub async fn register(&self, seller: UserId, details: NewProduct) -> Result<Product, ServiceError> {
        let product = Product::create(ProductId::new(EntityId::new()), seller, details, Utc::now())?;
        self.store.insert_product(product.clone()).await?;
        Ok(product)
    }

    pub async fn product(&self, id: ProductId) -> Result<Product, ServiceError> {
        self.store.product(id).await?.ok_or(ServiceError::NotFound)
    }

    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store.list_products(filter, page).await?)
    }

    /// Replace a product's catalog data. Seller-only; racing writers are
    /// rejected with a conflict via the version the row carried when read.
    pub async fn update(
        &self,
        seller: UserId,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, ServiceError> {
        let mut product = self.product(id).await?;
        if !product.is_sold_by(seller) {
            return Err(ServiceError::Unauthorized);
        }

        let expected = product.version;
        product.apply_update(update)?;
        self.store.update_product(&product, expected).await?;
        Ok(product)
    }

    /// Delete a product from the catalog. Seller-only. Committed orders keep
    /// their frozen snapshots regardless.
    pub async fn remove(&self, seller: UserId, id: ProductId) -> Result<(), ServiceError> {
        let product = self.product(id).await?;
        if !product.is_sold_by(seller) {
            return Err(ServiceError::Unauthorized);
        }
        self.store.delete_product(id).await?;
        Ok(())
    }
}
