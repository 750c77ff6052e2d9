pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;
pub mod profile;

use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;

use crate::domain::session::SessionUser;
use crate::errors::AppError;
use crate::AppState;

/// Header carrying the client-generated cart key. Carts exist for anonymous
/// visitors too, so the key is not an account property.
pub const SESSION_HEADER: &str = "X-Session-Id";

/// The cart session key, required on every cart and checkout route.
pub(crate) fn session_id(req: &HttpRequest) -> Result<String, AppError> {
    req.headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(format!("{} header is required", SESSION_HEADER)))
}

pub(crate) fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Resolves the bearer token, if any, against the backend. A missing header
/// and an expired token both come back as `None`.
pub(crate) async fn maybe_user(
    state: &AppState,
    req: &HttpRequest,
) -> Result<Option<SessionUser>, AppError> {
    match bearer_token(req) {
        Some(token) => Ok(state.accounts.current_user(&token).await?),
        None => Ok(None),
    }
}

pub(crate) async fn require_user(
    state: &AppState,
    req: &HttpRequest,
) -> Result<SessionUser, AppError> {
    maybe_user(state, req).await?.ok_or(AppError::AuthRequired)
}
