use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::session::AuthSession;
use crate::errors::AppError;
use crate::AppState;

use super::{bearer_token, require_user};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Bearer token for subsequent requests.
    pub access_token: String,
    pub user_id: Uuid,
    pub email: String,
}

impl From<AuthSession> for SessionResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            access_token: session.access_token,
            user_id: session.user.id,
            email: session.user.email,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /auth/signup
///
/// Registers an account with the hosted backend, which also provisions the
/// profile record. Account rules (password strength, duplicate emails) are
/// the backend's; its rejection message is passed through.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = SessionResponse),
        (status = 400, description = "Rejected by the backend"),
    ),
    tag = "auth"
)]
pub async fn sign_up(
    state: web::Data<AppState>,
    body: web::Json<SignUpRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let session = state
        .accounts
        .sign_up(&body.email, &body.password, &body.full_name)
        .await?;
    Ok(HttpResponse::Created().json(SessionResponse::from(session)))
}

/// POST /auth/signin
#[utoipa::path(
    post,
    path = "/auth/signin",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 400, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn sign_in(
    state: web::Data<AppState>,
    body: web::Json<SignInRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let session = state.accounts.sign_in(&body.email, &body.password).await?;
    Ok(HttpResponse::Ok().json(SessionResponse::from(session)))
}

/// POST /auth/signout
#[utoipa::path(
    post,
    path = "/auth/signout",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "No bearer token"),
    ),
    tag = "auth"
)]
pub async fn sign_out(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let token = bearer_token(&req).ok_or(AppError::AuthRequired)?;
    state.accounts.sign_out(&token).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /auth/session
///
/// Resolves the bearer token to its account.
#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "The signed-in account", body = UserResponse),
        (status = 401, description = "Missing or expired token"),
    ),
    tag = "auth"
)]
pub async fn session(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let user = require_user(&state, &req).await?;
    Ok(HttpResponse::Ok().json(UserResponse {
        user_id: user.id,
        email: user.email,
    }))
}
