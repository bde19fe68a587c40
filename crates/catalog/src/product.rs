use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, EntityId, UserId, Version};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_CATEGORY_LEN: usize = 50;
const MAX_IMAGE_URL_LEN: usize = 500;

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub EntityId);

impl ProductId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Product row: catalog data plus the authoritative inventory record.
///
/// `stock` and `version` together implement optimistic concurrency for stock
/// mutations: every committed write bumps `version` by exactly 1, and a writer
/// must present the version it observed. Mutate only through the methods on
/// this type so that discipline holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: UserId,
    pub name: String,
    pub description: String,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub stock: u32,
    pub category: String,
    pub image_url: Option<String>,
    pub version: Version,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: u64,
    pub stock: u32,
    pub category: String,
    pub image_url: Option<String>,
}

/// Full-replacement update of a product's catalog data.
///
/// `image_url: None` keeps the existing image (the request layer only sends a
/// URL when a new image was provided).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: String,
    pub description: String,
    pub price: u64,
    pub stock: u32,
    pub category: String,
    pub image_url: Option<String>,
}

/// A checked, not-yet-committed stock decrement.
///
/// Produced by [`Product::reserve`]; consumed by a storage backend, which must
/// re-run [`StockReservation::check_against`] on the currently stored row
/// inside its commit before applying the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockReservation {
    pub product_id: ProductId,
    pub quantity: u32,
    pub expected_version: Version,
}

impl StockReservation {
    /// Classify this reservation against the currently stored stock/version.
    ///
    /// A stale version is a `Conflict` (another writer committed since the
    /// read); a matching version with too little stock is `InsufficientStock`.
    /// The order of the two checks matters: stale reads must never be reported
    /// as an out-of-stock condition.
    pub fn check_against(&self, stock: u32, stored: Version) -> DomainResult<()> {
        self.expected_version.check(stored)?;
        if stock < self.quantity {
            return Err(DomainError::insufficient_stock(format!(
                "product {}: requested {}, available {}",
                self.product_id, self.quantity, stock
            )));
        }
        Ok(())
    }
}

impl Product {
    /// Register a new product with validated catalog data. Stock starts at the
    /// given count and the version stamp at zero.
    pub fn create(
        id: ProductId,
        seller_id: UserId,
        details: NewProduct,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_catalog_data(&details.name, &details.description, &details.category, &details.image_url)?;

        Ok(Self {
            id,
            seller_id,
            name: details.name,
            description: details.description,
            price: details.price,
            stock: details.stock,
            category: details.category,
            image_url: details.image_url,
            version: Version::ZERO,
            created_at,
        })
    }

    /// Replace the catalog data, bumping the version stamp.
    ///
    /// Callers persist the result with a conditional write on the version they
    /// observed before calling this; racing updates surface as conflicts.
    pub fn apply_update(&mut self, update: ProductUpdate) -> DomainResult<()> {
        validate_catalog_data(
            &update.name,
            &update.description,
            &update.category,
            &update.image_url,
        )?;

        self.name = update.name;
        self.description = update.description;
        self.price = update.price;
        self.stock = update.stock;
        self.category = update.category;
        if let Some(url) = update.image_url {
            self.image_url = Some(url);
        }
        self.version = self.version.next();
        Ok(())
    }

    /// The stock ledger decision: verify that `quantity` units can be taken
    /// from this product as observed at `observed`, without writing anything.
    ///
    /// Returns the reservation describing the conditional decrement, or the
    /// error the whole enclosing order placement must abort with.
    pub fn reserve(&self, quantity: u32, observed: Version) -> DomainResult<StockReservation> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        let reservation = StockReservation {
            product_id: self.id,
            quantity,
            expected_version: observed,
        };
        reservation.check_against(self.stock, self.version)?;
        Ok(reservation)
    }

    /// Apply a checked decrement to this row: re-classify against the current
    /// state, then take the stock and bump the version by exactly 1.
    ///
    /// This is the check-then-write half of the stock ledger; storage backends
    /// call it while they hold whatever makes the write indivisible (a write
    /// lock, a transaction with a conditional update).
    pub fn apply_decrement(&mut self, reservation: &StockReservation) -> DomainResult<()> {
        debug_assert_eq!(self.id, reservation.product_id);
        reservation.check_against(self.stock, self.version)?;
        self.stock -= reservation.quantity;
        self.version = self.version.next();
        Ok(())
    }

    /// Whether `user` is the seller who owns this product.
    pub fn is_sold_by(&self, user: UserId) -> bool {
        self.seller_id == user
    }
}

/// Catalog listing filter: category plus an optional price band.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        true
    }
}

fn validate_catalog_data(
    name: &str,
    description: &str,
    category: &str,
    image_url: &Option<String>,
) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("product name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "product name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(DomainError::validation(format!(
            "product description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    if category.trim().is_empty() {
        return Err(DomainError::validation("product category must not be empty"));
    }
    if category.chars().count() > MAX_CATEGORY_LEN {
        return Err(DomainError::validation(format!(
            "product category must be at most {MAX_CATEGORY_LEN} characters"
        )));
    }
    if let Some(url) = image_url {
        if url.chars().count() > MAX_IMAGE_URL_LEN {
            return Err(DomainError::validation(format!(
                "image url must be at most {MAX_IMAGE_URL_LEN} characters"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_seller() -> UserId {
        UserId::new()
    }

    fn test_product(stock: u32, price: u64) -> Product {
        Product::create(
            ProductId::new(EntityId::new()),
            test_seller(),
            NewProduct {
                name: "Mechanical keyboard".to_string(),
                description: "Tenkeyless, brown switches".to_string(),
                price,
                stock,
                category: "electronics".to_string(),
                image_url: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn create_starts_at_version_zero() {
        let product = test_product(10, 4_500);
        assert_eq!(product.version, Version::ZERO);
        assert_eq!(product.stock, 10);
    }

    #[test]
    fn create_rejects_empty_name() {
        let err = Product::create(
            ProductId::new(EntityId::new()),
            test_seller(),
            NewProduct {
                name: "   ".to_string(),
                description: String::new(),
                price: 100,
                stock: 1,
                category: "misc".to_string(),
                image_url: None,
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn reserve_accepts_quantity_within_stock() {
        let product = test_product(5, 1_000);
        let reservation = product.reserve(5, product.version).unwrap();
        assert_eq!(reservation.quantity, 5);
        assert_eq!(reservation.expected_version, Version::ZERO);
    }

    #[test]
    fn reserve_rejects_zero_quantity() {
        let product = test_product(5, 1_000);
        let err = product.reserve(0, product.version).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn reserve_reports_insufficient_stock() {
        let product = test_product(2, 1_000);
        let err = product.reserve(3, product.version).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock(_)));
    }

    #[test]
    fn reserve_reports_stale_version_as_conflict() {
        let product = test_product(2, 1_000);
        let err = product.reserve(1, product.version.next()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn stale_version_wins_over_insufficient_stock() {
        // A stale read must never be reported as out-of-stock.
        let product = test_product(0, 1_000);
        let err = product.reserve(1, Version::new(7)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn apply_decrement_takes_stock_and_bumps_version() {
        let mut product = test_product(4, 1_000);
        let reservation = product.reserve(3, product.version).unwrap();
        product.apply_decrement(&reservation).unwrap();
        assert_eq!(product.stock, 1);
        assert_eq!(product.version, Version::new(1));
    }

    #[test]
    fn apply_decrement_rejects_reuse_of_stale_reservation() {
        let mut product = test_product(4, 1_000);
        let reservation = product.reserve(1, product.version).unwrap();
        product.apply_decrement(&reservation).unwrap();

        // The row moved on; re-applying the same reservation must conflict.
        let err = product.apply_decrement(&reservation).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(product.stock, 3);
        assert_eq!(product.version, Version::new(1));
    }

    #[test]
    fn apply_update_bumps_version_and_keeps_image_when_absent() {
        let mut product = test_product(4, 1_000);
        product.image_url = Some("https://img.example/kb.png".to_string());

        product
            .apply_update(ProductUpdate {
                name: "Mechanical keyboard v2".to_string(),
                description: "Now with red switches".to_string(),
                price: 5_500,
                stock: 9,
                category: "electronics".to_string(),
                image_url: None,
            })
            .unwrap();

        assert_eq!(product.price, 5_500);
        assert_eq!(product.stock, 9);
        assert_eq!(product.version, Version::new(1));
        assert_eq!(
            product.image_url.as_deref(),
            Some("https://img.example/kb.png")
        );
    }

    #[test]
    fn filter_matches_category_and_price_band() {
        let product = test_product(1, 2_000);

        let mut filter = ProductFilter::default();
        assert!(filter.matches(&product));

        filter.category = Some("electronics".to_string());
        filter.min_price = Some(1_500);
        filter.max_price = Some(2_500);
        assert!(filter.matches(&product));

        filter.max_price = Some(1_999);
        assert!(!filter.matches(&product));

        filter.max_price = None;
        filter.category = Some("books".to_string());
        assert!(!filter.matches(&product));
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: a reservation is only granted when stock suffices, so
            /// applying it can never drive stock negative.
            #[test]
            fn reserve_never_grants_more_than_stock(stock in 0u32..10_000, quantity in 1u32..10_000) {
                let product = test_product(stock, 1_000);
                match product.reserve(quantity, product.version) {
                    Ok(reservation) => {
                        prop_assert!(quantity <= stock);
                        prop_assert_eq!(reservation.quantity, quantity);
                    }
                    Err(DomainError::InsufficientStock(_)) => prop_assert!(quantity > stock),
                    Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
                }
            }

            /// Property: a chain of committed decrements leaves stock at
            /// initial - sum and the version at exactly the decrement count.
            #[test]
            fn decrement_chain_is_accounted_exactly(
                initial in 0u32..1_000,
                quantities in proptest::collection::vec(1u32..50, 0..20)
            ) {
                let mut product = test_product(initial, 1_000);
                let mut taken: u32 = 0;
                let mut committed: u64 = 0;

                for quantity in quantities {
                    let observed = product.version;
                    match product.reserve(quantity, observed) {
                        Ok(reservation) => {
                            product.apply_decrement(&reservation).unwrap();
                            taken += quantity;
                            committed += 1;
                        }
                        Err(DomainError::InsufficientStock(_)) => {
                            prop_assert!(quantity > product.stock);
                        }
                        Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
                    }
                }

                prop_assert_eq!(product.stock, initial - taken);
                prop_assert_eq!(product.version, Version::new(committed));
            }
        }
    }
}
