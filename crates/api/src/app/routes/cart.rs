use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use bazaar_cart::CartEntryId;
use bazaar_core::EntityId;
use bazaar_infra::MarketStore;

use crate::app::routes::products::parse_product_id;
use crate::app::services::Services;
use crate::app::{dto, errors};
use crate::context::UserContext;

pub fn router<S: MarketStore + 'static>() -> Router {
    Router::new()
        .route("/cart", get(get_cart::<S>))
        .route("/cart/items", post(add_item::<S>))
        .route(
            "/cart/items/:id",
            axum::routing::patch(update_item::<S>).delete(delete_item::<S>),
        )
}

pub async fn get_cart<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    match services.cart.items(user.user_id()).await {
        Ok(entries) => {
            let body: Vec<dto::CartItemResponse> = entries.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_item<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::AddCartItemRequest>,
) -> axum::response::Response {
    let product_id = match parse_product_id(&body.product_id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services
        .cart
        .add_item(user.user_id(), product_id, body.quantity)
        .await
    {
        Ok(entry) => {
            (StatusCode::CREATED, Json(dto::CartItemResponse::from(entry))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_item<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateCartItemRequest>,
) -> axum::response::Response {
    let entry_id = match parse_entry_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services
        .cart
        .update_quantity(user.user_id(), entry_id, body.quantity)
        .await
    {
        Ok(entry) => (StatusCode::OK, Json(dto::CartItemResponse::from(entry))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_item<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let entry_id = match parse_entry_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services.cart.remove_item(user.user_id(), entry_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

fn parse_entry_id(raw: &str) -> Result<CartEntryId, axum::response::Response> {
    let id: EntityId = raw.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid cart entry id")
    })?;
    Ok(CartEntryId::new(id))
}
