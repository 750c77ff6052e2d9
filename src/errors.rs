use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

use crate::application::admin::AdminError;
use crate::application::checkout::CheckoutError;
use crate::domain::errors::BackendError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Authentication required")]
    AuthRequired,

    #[error("Access denied")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Checkout(#[from] CheckoutError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::NotFound => AppError::NotFound,
            BackendError::Rejected(msg) => AppError::Validation(msg),
            BackendError::Service(msg) | BackendError::Decode(msg) => AppError::Internal(msg),
        }
    }
}

impl From<AdminError> for AppError {
    fn from(e: AdminError) -> Self {
        match e {
            AdminError::AccessDenied => AppError::Forbidden,
            AdminError::Backend(e) => e.into(),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound => HttpResponse::NotFound().json(json!({
                "error": self.to_string()
            })),
            AppError::AuthRequired => HttpResponse::Unauthorized().json(json!({
                "error": self.to_string()
            })),
            AppError::Forbidden => HttpResponse::Forbidden().json(json!({
                "error": self.to_string()
            })),
            AppError::Validation(_) => HttpResponse::BadRequest().json(json!({
                "error": self.to_string()
            })),
            AppError::Checkout(e) => checkout_response(e),
            AppError::Internal(_) => HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            })),
        }
    }
}

/// Checkout failures carry their own status split: refusals are the client's
/// to fix, while a write failure is a gateway problem and names the stranded
/// order once one exists.
fn checkout_response(e: &CheckoutError) -> HttpResponse {
    match e {
        CheckoutError::AuthenticationRequired => HttpResponse::Unauthorized().json(json!({
            "error": e.to_string()
        })),
        CheckoutError::EmptyCart | CheckoutError::MissingField(_) => {
            HttpResponse::BadRequest().json(json!({
                "error": e.to_string()
            }))
        }
        CheckoutError::Write { order_id, .. } => {
            let mut body = json!({ "error": e.to_string() });
            if let Some(id) = order_id {
                body["order_id"] = json!(id);
            }
            HttpResponse::BadGateway().json(body)
        }
    }
}
