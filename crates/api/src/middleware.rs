use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use bazaar_core::UserId;

use crate::context::UserContext;

/// Header carrying the already-authenticated caller identity, set by the
/// upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

pub async fn identity_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let user_id = extract_user_id(req.headers())?;

    req.extensions_mut().insert(UserContext::new(user_id));

    Ok(next.run(req).await)
}

fn extract_user_id(headers: &HeaderMap) -> Result<UserId, StatusCode> {
    let header = headers
        .get(USER_ID_HEADER)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let value = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    value
        .trim()
        .parse()
        .map_err(|_| StatusCode::UNAUTHORIZED)
}
