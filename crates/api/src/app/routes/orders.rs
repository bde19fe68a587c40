use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use bazaar_core::EntityId;
use bazaar_infra::MarketStore;
use bazaar_orders::{ItemRequest, OrderId};

use crate::app::routes::products::parse_product_id;
use crate::app::services::Services;
use crate::app::{dto, errors};
use crate::context::UserContext;

pub fn router<S: MarketStore + 'static>() -> Router {
    Router::new()
        .route("/orders", get(list_my_orders::<S>).post(place_order::<S>))
        .route("/orders/:id", get(get_order::<S>))
}

/// The checkout entry point. A conflict (409) means a concurrent buyer got
/// there first and the client may re-submit; insufficient stock (422) means
/// the request can never succeed at current stock and must not be retried.
pub async fn place_order<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::PlaceOrderRequest>,
) -> axum::response::Response {
    let mut items = Vec::with_capacity(body.items.len());
    for item in &body.items {
        let product_id = match parse_product_id(&item.product_id) {
            Ok(v) => v,
            Err(response) => return response,
        };
        items.push(ItemRequest {
            product_id,
            quantity: item.quantity,
        });
    }

    match services.checkout.place_order(user.user_id(), &items).await {
        Ok(order) => {
            (StatusCode::CREATED, Json(dto::OrderResponse::from(&order))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_my_orders<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(user): Extension<UserContext>,
    Query(query): Query<dto::PageQuery>,
) -> axum::response::Response {
    match services
        .checkout
        .orders_for(user.user_id(), query.pagination())
        .await
    {
        Ok(orders) => {
            let body: Vec<dto::OrderResponse> =
                orders.iter().map(dto::OrderResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_order<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match id.parse::<EntityId>() {
        Ok(v) => OrderId::new(v),
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
        }
    };

    match services.checkout.order(user.user_id(), order_id).await {
        Ok(order) => (StatusCode::OK, Json(dto::OrderResponse::from(&order))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
