use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use bazaar_catalog::ProductId;
use bazaar_core::EntityId;
use bazaar_infra::MarketStore;

use crate::app::services::Services;
use crate::app::{dto, errors};
use crate::context::UserContext;

pub fn router<S: MarketStore + 'static>() -> Router {
    Router::new()
        .route(
            "/products",
            get(list_products::<S>).post(create_product::<S>),
        )
        .route(
            "/products/:id",
            get(get_product::<S>)
                .put(update_product::<S>)
                .delete(delete_product::<S>),
        )
        .route("/products/:id/purchased", get(check_purchased::<S>))
}

pub async fn list_products<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Query(query): Query<dto::ListProductsQuery>,
) -> axum::response::Response {
    let products = match services
        .catalog
        .list(&query.filter(), query.pagination())
        .await
    {
        Ok(products) => products,
        Err(e) => return errors::service_error_to_response(e),
    };

    let body: Vec<dto::ProductResponse> = products.into_iter().map(Into::into).collect();
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn get_product<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services.catalog.product(product_id).await {
        Ok(product) => {
            (StatusCode::OK, Json(dto::ProductResponse::from(product))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_product<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    match services.catalog.register(user.user_id(), body.into()).await {
        Ok(product) => {
            (StatusCode::CREATED, Json(dto::ProductResponse::from(product))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateProductRequest>,
) -> axum::response::Response {
    let product_id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services
        .catalog
        .update(user.user_id(), product_id, body.into())
        .await
    {
        Ok(product) => {
            (StatusCode::OK, Json(dto::ProductResponse::from(product))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_product<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services.catalog.remove(user.user_id(), product_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn check_purchased<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services
        .checkout
        .has_purchased(user.user_id(), product_id)
        .await
    {
        Ok(purchased) => (
            StatusCode::OK,
            Json(dto::PurchaseCheckResponse { purchased }),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub(super) fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    let id: EntityId = raw.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
    })?;
    Ok(ProductId::new(id))
}
