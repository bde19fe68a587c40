use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use bazaar_core::EntityId;
use bazaar_infra::{MarketStore, PostedReview};
use bazaar_reviews::{ReviewDraft, ReviewId};

use crate::app::routes::products::parse_product_id;
use crate::app::services::Services;
use crate::app::{dto, errors};
use crate::context::UserContext;

pub fn router<S: MarketStore + 'static>() -> Router {
    Router::new()
        .route(
            "/products/:id/reviews",
            get(list_product_reviews::<S>).post(create_review::<S>),
        )
        .route("/reviews/mine", get(list_my_reviews::<S>))
        .route(
            "/reviews/:id",
            axum::routing::put(update_review::<S>).delete(delete_review::<S>),
        )
}

pub async fn create_review<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReviewRequest>,
) -> axum::response::Response {
    let product_id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    let draft = ReviewDraft {
        content: body.content,
        rating: body.rating,
    };
    match services.reviews.post(user.user_id(), product_id, draft).await {
        Ok(posted) => {
            (StatusCode::CREATED, Json(dto::ReviewResponse::from(posted))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_product_reviews<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(id): Path<String>,
    Query(query): Query<dto::PageQuery>,
) -> axum::response::Response {
    let product_id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services
        .reviews
        .for_product(product_id, query.pagination())
        .await
    {
        Ok(reviews) => {
            let body: Vec<dto::ReviewResponse> = reviews.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_my_reviews<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(user): Extension<UserContext>,
    Query(query): Query<dto::PageQuery>,
) -> axum::response::Response {
    match services
        .reviews
        .by_author(user.user_id(), query.pagination())
        .await
    {
        Ok(reviews) => {
            let body: Vec<dto::ReviewResponse> = reviews.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_review<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReviewRequest>,
) -> axum::response::Response {
    let review_id = match parse_review_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    let draft = ReviewDraft {
        content: body.content,
        rating: body.rating,
    };
    match services.reviews.edit(user.user_id(), review_id, draft).await {
        // Authoring is purchase-gated, so the badge holds for the author.
        Ok(review) => (
            StatusCode::OK,
            Json(dto::ReviewResponse::from(PostedReview {
                review,
                verified_purchase: true,
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_review<S: MarketStore + 'static>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let review_id = match parse_review_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services.reviews.remove(user.user_id(), review_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

fn parse_review_id(raw: &str) -> Result<ReviewId, axum::response::Response> {
    let id: EntityId = raw.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid review id")
    })?;
    Ok(ReviewId::new(id))
}
