use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::ShippingForm;
use crate::errors::AppError;
use crate::AppState;

use super::cart::CartLineResponse;
use super::{maybe_user, session_id};

// ── Request / response DTOs ──────────────────────────────────────────────────

/// Contact and shipping details. Payment is settled outside this service;
/// card data never reaches it.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order_id: Uuid,
    /// Decimal amount as a string to avoid floating-point issues, e.g. "250.00"
    pub subtotal: String,
    pub shipping_fee: String,
    pub total: String,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutSummaryResponse {
    pub lines: Vec<CartLineResponse>,
    pub subtotal: String,
    pub shipping_fee: String,
    pub total: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /checkout/summary
///
/// What a submission would charge right now: the cart lines, their subtotal,
/// and the flat shipping fee. Nothing is written.
#[utoipa::path(
    get,
    path = "/checkout/summary",
    params(
        ("X-Session-Id" = String, Header, description = "Cart session key"),
    ),
    responses(
        (status = 200, description = "Current order summary", body = CheckoutSummaryResponse),
        (status = 400, description = "Missing session header"),
    ),
    tag = "checkout"
)]
pub async fn summary(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = session_id(&req)?;
    let summary = state.checkout.preview(&session);

    Ok(HttpResponse::Ok().json(CheckoutSummaryResponse {
        lines: summary.cart.lines.iter().map(CartLineResponse::from).collect(),
        subtotal: summary.subtotal.to_string(),
        shipping_fee: summary.shipping_fee.to_string(),
        total: summary.total.to_string(),
    }))
}

/// POST /checkout
///
/// Turns the session's cart into an order for the signed-in account. On
/// success the cart is emptied and the order is `processing`. A backend
/// failure partway through answers 502 and, once the order header exists,
/// names the stranded order id.
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutRequest,
    params(
        ("X-Session-Id" = String, Header, description = "Cart session key"),
    ),
    responses(
        (status = 201, description = "Order placed", body = CheckoutResponse),
        (status = 400, description = "Empty cart or missing shipping field"),
        (status = 401, description = "Not signed in"),
        (status = 502, description = "A backend write failed partway through"),
    ),
    tag = "checkout"
)]
pub async fn submit(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let session = session_id(&req)?;
    let user = maybe_user(&state, &req).await?;
    let body = body.into_inner();

    let form = ShippingForm {
        email: body.email,
        first_name: body.first_name,
        last_name: body.last_name,
        address: body.address,
        city: body.city,
        zip: body.zip,
        country: body.country,
    };

    let receipt = state.checkout.submit(user.as_ref(), &session, &form).await?;

    Ok(HttpResponse::Created().json(CheckoutResponse {
        order_id: receipt.order_id,
        subtotal: receipt.subtotal.to_string(),
        shipping_fee: receipt.shipping_fee.to_string(),
        total: receipt.total.to_string(),
        status: receipt.status.to_string(),
    }))
}
