//! Order placement (the checkout transaction boundary).
//!
//! `Checkout` turns a buyer's requested (product, quantity) pairs into a
//! committed order:
//!
//! ```text
//! request items
//!   ↓
//! 1. Resolve each product and run the stock ledger decision, in request order
//!   ↓
//! 2. Freeze a price-snapshot line per item (nothing written yet)
//!   ↓
//! 3. Commit the aggregate: CAS stock decrements + order + lines, atomically
//!   ↓
//! 4. Best-effort cart reconciliation (never part of the atomic unit)
//! ```
//!
//! Because steps 1–2 only read, an abort at any point — insufficient stock, a
//! vanished product, a version conflict at commit — leaves no observable
//! effect. Conflicts are surfaced, not retried: retrying silently could hide
//! a genuine "someone else bought the last unit" from the buyer.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, instrument};

use bazaar_catalog::{Product, ProductId};
use bazaar_core::{EntityId, UserId};
use bazaar_orders::{ItemRequest, Order, OrderId, OrderLine};

use crate::error::ServiceError;
use crate::store::{CartStore, OrderStore, Pagination, ProductStore};

/// The order-placement orchestrator and purchase-history read.
#[derive(Debug, Clone)]
pub struct Checkout<S> {
    store: S,
}

impl<S> Checkout<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S> Checkout<S>
where
    S: ProductStore + OrderStore + CartStore,
{
    /// Place an order for `buyer`.
    ///
    /// Items are processed strictly in request order and the resulting lines
    /// pair 1:1 with the input. On success the committed order is returned and
    /// the buyer's cart no longer contains the ordered products; on any error
    /// nothing changed.
    #[instrument(skip(self, items), fields(buyer = %buyer, item_count = items.len()), err)]
    pub async fn place_order(
        &self,
        buyer: UserId,
        items: &[ItemRequest],
    ) -> Result<Order, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::Validation(
                "order must contain at least one item".to_string(),
            ));
        }

        // Build the aggregate in memory first. Working copies thread the
        // effect of earlier reservations into later ones, so a product that
        // appears twice in one request checks against its remaining stock and
        // the reservations' expected versions chain correctly.
        let mut working: HashMap<ProductId, Product> = HashMap::new();
        let mut lines = Vec::with_capacity(items.len());
        let mut reservations = Vec::with_capacity(items.len());

        for item in items {
            let product = match working.get(&item.product_id) {
                Some(known) => known.clone(),
                None => self
                    .store
                    .product(item.product_id)
                    .await?
                    .ok_or(ServiceError::NotFound)?,
            };

            let reservation = product.reserve(item.quantity, product.version)?;
            lines.push(OrderLine::freeze(&product, item.quantity)?);

            let mut advanced = product;
            advanced.apply_decrement(&reservation)?;
            working.insert(item.product_id, advanced);
            reservations.push(reservation);
        }

        let order = Order::new(OrderId::new(EntityId::new()), buyer, lines, Utc::now())?;
        self.store.commit_order(order.clone(), reservations).await?;

        // Cart state is advisory: reconcile after the commit and tolerate
        // anything, including the entry never having existed.
        for line in order.lines() {
            if let Err(err) = self
                .store
                .remove_cart_entry_for_product(buyer, line.product_id)
                .await
            {
                debug!(product_id = %line.product_id, error = %err, "cart reconciliation skipped");
            }
        }

        Ok(order)
    }

    /// True iff `buyer` has a committed order containing `product`.
    pub async fn has_purchased(
        &self,
        buyer: UserId,
        product: ProductId,
    ) -> Result<bool, ServiceError> {
        Ok(self.store.has_purchased(buyer, product).await?)
    }

    /// The buyer's committed orders, most recent first.
    pub async fn orders_for(
        &self,
        buyer: UserId,
        page: Pagination,
    ) -> Result<Vec<Order>, ServiceError> {
        Ok(self.store.orders_for(buyer, page).await?)
    }

    /// One committed order, visible to its buyer only.
    pub async fn order(&self, buyer: UserId, id: OrderId) -> Result<Order, ServiceError> {
        let order = self.store.order(id).await?.ok_or(ServiceError::NotFound)?;
        if order.buyer_id() != buyer {
            return Err(ServiceError::NotFound);
        }
        Ok(order)
    }
}
