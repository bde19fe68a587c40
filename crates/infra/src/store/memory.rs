use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use bazaar_cart::{CartEntry, CartEntryId};
use bazaar_catalog::{Product, ProductFilter, ProductId, StockReservation};
use bazaar_core::{UserId, Version};
use bazaar_orders::{Order, OrderId};
use bazaar_reviews::{Review, ReviewId};

use super::{CartStore, OrderStore, Pagination, ProductStore, ReviewStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    /// Purchase-history index, maintained inside `commit_order` so it can
    /// never lag behind committed orders.
    purchases: HashSet<(UserId, ProductId)>,
    cart_entries: HashMap<CartEntryId, CartEntry>,
    reviews: HashMap<ReviewId, Review>,
}

/// In-memory market store.
///
/// Intended for tests/dev. All writes take the single `RwLock`, which is what
/// makes `commit_order`'s check-then-write indivisible here; the Postgres
/// backend gets the same guarantee from a transaction plus conditional
/// updates. Cloning is cheap and clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner.products.insert(product.id, product);
        Ok(())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn update_product(&self, product: &Product, expected: Version) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let row = inner
            .products
            .get_mut(&product.id)
            .ok_or_else(|| StoreError::NotFound(format!("product {}", product.id)))?;
        expected.check(row.version)?;
        *row = product.clone();
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        Ok(self.write()?.products.remove(&id).is_some())
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<Vec<Product>, StoreError> {
        let inner = self.read()?;
        let mut matched: Vec<Product> = inner
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(page.apply(matched))
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn commit_order(
        &self,
        order: Order,
        reservations: Vec<StockReservation>,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;

        // Stage every decrement before touching the live rows, so a failure on
        // any reservation leaves nothing applied. Staged rows feed later
        // reservations for the same product (their expected versions chain).
        let mut staged: HashMap<ProductId, Product> = HashMap::new();
        for reservation in &reservations {
            let current = staged
                .get(&reservation.product_id)
                .or_else(|| inner.products.get(&reservation.product_id))
                .ok_or_else(|| {
                    StoreError::NotFound(format!("product {}", reservation.product_id))
                })?;
            let mut updated = current.clone();
            updated.apply_decrement(reservation)?;
            staged.insert(reservation.product_id, updated);
        }

        for (id, product) in staged {
            inner.products.insert(id, product);
        }
        for line in order.lines() {
            inner.purchases.insert((order.buyer_id(), line.product_id));
        }
        inner.orders.insert(order.id(), order);
        Ok(())
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    async fn orders_for(&self, buyer: UserId, page: Pagination) -> Result<Vec<Order>, StoreError> {
        let inner = self.read()?;
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.buyer_id() == buyer)
            .cloned()
            .collect();
        orders.sort_by(|a, b| {
            b.placed_at()
                .cmp(&a.placed_at())
                .then(b.id().0.cmp(&a.id().0))
        });
        Ok(page.apply(orders))
    }

    async fn has_purchased(&self, buyer: UserId, product: ProductId) -> Result<bool, StoreError> {
        Ok(self.read()?.purchases.contains(&(buyer, product)))
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn insert_cart_entry(&self, entry: CartEntry) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let duplicate = inner
            .cart_entries
            .values()
            .any(|e| e.user_id == entry.user_id && e.product_id == entry.product_id);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "cart entry for product {} already exists",
                entry.product_id
            )));
        }
        inner.cart_entries.insert(entry.id, entry);
        Ok(())
    }

    async fn update_cart_entry(&self, entry: &CartEntry) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let row = inner
            .cart_entries
            .get_mut(&entry.id)
            .ok_or_else(|| StoreError::NotFound(format!("cart entry {}", entry.id)))?;
        *row = entry.clone();
        Ok(())
    }

    async fn cart_entry(&self, id: CartEntryId) -> Result<Option<CartEntry>, StoreError> {
        Ok(self.read()?.cart_entries.get(&id).cloned())
    }

    async fn cart_entry_for_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Option<CartEntry>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .cart_entries
            .values()
            .find(|e| e.user_id == user && e.product_id == product)
            .cloned())
    }

    async fn cart_entries_for(&self, user: UserId) -> Result<Vec<CartEntry>, StoreError> {
        let inner = self.read()?;
        let mut entries: Vec<CartEntry> = inner
            .cart_entries
            .values()
            .filter(|e| e.user_id == user)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(entries)
    }

    async fn delete_cart_entry(&self, id: CartEntryId) -> Result<bool, StoreError> {
        Ok(self.write()?.cart_entries.remove(&id).is_some())
    }

    async fn remove_cart_entry_for_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, StoreError> {
        let mut inner = self.write()?;
        let id = inner
            .cart_entries
            .values()
            .find(|e| e.user_id == user && e.product_id == product)
            .map(|e| e.id);
        match id {
            Some(id) => {
                inner.cart_entries.remove(&id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn insert_review(&self, review: Review) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner.reviews.insert(review.id, review);
        Ok(())
    }

    async fn review(&self, id: ReviewId) -> Result<Option<Review>, StoreError> {
        Ok(self.read()?.reviews.get(&id).cloned())
    }

    async fn update_review(&self, review: &Review) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let row = inner
            .reviews
            .get_mut(&review.id)
            .ok_or_else(|| StoreError::NotFound(format!("review {}", review.id)))?;
        *row = review.clone();
        Ok(())
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool, StoreError> {
        Ok(self.write()?.reviews.remove(&id).is_some())
    }

    async fn reviews_for_product(
        &self,
        product: ProductId,
        page: Pagination,
    ) -> Result<Vec<Review>, StoreError> {
        let inner = self.read()?;
        let mut reviews: Vec<Review> = inner
            .reviews
            .values()
            .filter(|r| r.product_id == product)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(page.apply(reviews))
    }

    async fn reviews_by_author(
        &self,
        author: UserId,
        page: Pagination,
    ) -> Result<Vec<Review>, StoreError> {
        let inner = self.read()?;
        let mut reviews: Vec<Review> = inner
            .reviews
            .values()
            .filter(|r| r.author_id == author)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(page.apply(reviews))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_catalog::NewProduct;
    use bazaar_core::EntityId;
    use bazaar_orders::OrderLine;
    use chrono::Utc;

    fn seeded_product(stock: u32) -> Product {
        Product::create(
            ProductId::new(EntityId::new()),
            UserId::new(),
            NewProduct {
                name: "Desk lamp".to_string(),
                description: String::new(),
                price: 2_500,
                stock,
                category: "home".to_string(),
                image_url: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn update_product_rejects_stale_expected_version() {
        let store = InMemoryStore::new();
        let mut product = seeded_product(3);
        store.insert_product(product.clone()).await.unwrap();

        let expected = product.version;
        product
            .apply_update(bazaar_catalog::ProductUpdate {
                name: "Desk lamp".to_string(),
                description: String::new(),
                price: 2_000,
                stock: 3,
                category: "home".to_string(),
                image_url: None,
            })
            .unwrap();
        store.update_product(&product, expected).await.unwrap();

        // Same expected version again: the row has moved on.
        let err = store.update_product(&product, expected).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn commit_order_rejects_stale_reservation_and_applies_nothing() {
        let store = InMemoryStore::new();
        let product = seeded_product(5);
        store.insert_product(product.clone()).await.unwrap();

        let buyer = UserId::new();
        let reservation = product.reserve(2, product.version).unwrap();
        let order = Order::new(
            OrderId::new(EntityId::new()),
            buyer,
            vec![OrderLine::freeze(&product, 2).unwrap()],
            Utc::now(),
        )
        .unwrap();
        store
            .commit_order(order, vec![reservation.clone()])
            .await
            .unwrap();

        // Re-using the reservation presents a version that already moved on.
        let retry = Order::new(
            OrderId::new(EntityId::new()),
            buyer,
            vec![OrderLine::freeze(&product, 2).unwrap()],
            Utc::now(),
        )
        .unwrap();
        let err = store
            .commit_order(retry.clone(), vec![reservation])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let row = store.product(product.id).await.unwrap().unwrap();
        assert_eq!(row.stock, 3);
        assert_eq!(row.version, Version::new(1));
        assert!(store.order(retry.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_cart_entry_per_product_is_a_conflict() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let product = ProductId::new(EntityId::new());

        let entry = CartEntry::new(
            CartEntryId::new(EntityId::new()),
            user,
            product,
            1,
            Utc::now(),
        )
        .unwrap();
        store.insert_cart_entry(entry).await.unwrap();

        let second = CartEntry::new(
            CartEntryId::new(EntityId::new()),
            user,
            product,
            2,
            Utc::now(),
        )
        .unwrap();
        let err = store.insert_cart_entry(second).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
