use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_catalog::{Product, ProductId};
use bazaar_core::{DomainError, DomainResult, EntityId, UserId};

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub EntityId);

impl OrderId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// One requested (product, quantity) pair of a placement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Order line: product, quantity, and the unit price frozen at purchase time.
///
/// `unit_price` is a snapshot taken the instant the order was assembled. It is
/// never recomputed from the live product, so later catalog changes (or the
/// product's deletion) leave committed orders untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

impl OrderLine {
    /// Build a line for `quantity` units of `product`, freezing its current
    /// price into the line.
    pub fn freeze(product: &Product, quantity: u32) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(Self {
            product_id: product.id,
            quantity,
            unit_price: product.price,
        })
    }

    pub fn subtotal(&self) -> u64 {
        self.unit_price * u64::from(self.quantity)
    }
}

/// Aggregate root: Order.
///
/// Fields are private: once assembled an order never changes, and no update or
/// delete operation exists on it anywhere in the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    buyer_id: UserId,
    placed_at: DateTime<Utc>,
    lines: Vec<OrderLine>,
}

impl Order {
    /// Assemble the aggregate. An order with zero lines is never allowed to
    /// exist, so the invariant is enforced here rather than at commit time.
    pub fn new(
        id: OrderId,
        buyer_id: UserId,
        lines: Vec<OrderLine>,
        placed_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation(
                "order must contain at least one line",
            ));
        }
        Ok(Self {
            id,
            buyer_id,
            placed_at,
            lines,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn buyer_id(&self) -> UserId {
        self.buyer_id
    }

    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }

    /// Lines in the order they were requested.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn contains_product(&self, product_id: ProductId) -> bool {
        self.lines.iter().any(|line| line.product_id == product_id)
    }

    pub fn total(&self) -> u64 {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_catalog::NewProduct;

    fn test_product(price: u64) -> Product {
        Product::create(
            ProductId::new(EntityId::new()),
            UserId::new(),
            NewProduct {
                name: "Field notebook".to_string(),
                description: String::new(),
                price,
                stock: 10,
                category: "stationery".to_string(),
                image_url: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn empty_order_is_rejected() {
        let err = Order::new(
            OrderId::new(EntityId::new()),
            UserId::new(),
            Vec::new(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn freeze_rejects_zero_quantity() {
        let product = test_product(900);
        let err = OrderLine::freeze(&product, 0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn line_price_is_frozen_against_later_catalog_changes() {
        let mut product = test_product(900);
        let line = OrderLine::freeze(&product, 2).unwrap();

        product.price = 1_500;

        assert_eq!(line.unit_price, 900);
        assert_eq!(line.subtotal(), 1_800);
    }

    #[test]
    fn lines_preserve_request_order() {
        let first = test_product(100);
        let second = test_product(200);
        let lines = vec![
            OrderLine::freeze(&first, 1).unwrap(),
            OrderLine::freeze(&second, 3).unwrap(),
        ];

        let order = Order::new(
            OrderId::new(EntityId::new()),
            UserId::new(),
            lines,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(order.lines()[0].product_id, first.id);
        assert_eq!(order.lines()[1].product_id, second.id);
        assert_eq!(order.total(), 100 + 3 * 200);
        assert!(order.contains_product(second.id));
    }
}
