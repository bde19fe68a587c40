use bazaar_infra::{CartService, Catalog, Checkout, MarketStore, ReviewService};

/// The application services behind the HTTP handlers, all sharing one storage
/// backend.
#[derive(Debug, Clone)]
pub struct Services<S> {
    pub checkout: Checkout<S>,
    pub catalog: Catalog<S>,
    pub cart: CartService<S>,
    pub reviews: ReviewService<S>,
}

impl<S: MarketStore + Clone> Services<S> {
    pub fn new(store: S) -> Self {
        Self {
            checkout: Checkout::new(store.clone()),
            catalog: Catalog::new(store.clone()),
            cart: CartService::new(store.clone()),
            reviews: ReviewService::new(store),
        }
    }
}
