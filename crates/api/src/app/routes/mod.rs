use axum::Router;

use bazaar_infra::MarketStore;

pub mod cart;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod system;

/// All domain routes (identity-protected).
pub fn router<S: MarketStore + 'static>() -> Router {
    Router::new()
        .merge(products::router::<S>())
        .merge(cart::router::<S>())
        .merge(orders::router::<S>())
        .merge(reviews::router::<S>())
}
