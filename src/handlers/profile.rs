use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{Order, OrderWithItems};
use crate::domain::profile::{Profile, ProfileUpdate};
use crate::errors::AppError;
use crate::AppState;

use super::require_user;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            email: p.email,
            full_name: p.full_name,
            phone: p.phone,
            address: p.address,
            city: p.city,
            zip_code: p.zip_code,
            country: p.country,
        }
    }
}

/// Fields to change; omitted fields keep their current value.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub product_image: String,
    pub quantity: i32,
    /// Decimal price as a string to avoid floating-point issues, e.g. "85.00"
    pub unit_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    /// Decimal amount as a string to avoid floating-point issues, e.g. "250.00"
    pub subtotal: String,
    pub shipping_fee: String,
    pub total: String,
    pub shipping_name: String,
    pub shipping_email: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_zip: String,
    pub shipping_country: String,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderWithItems> for OrderResponse {
    fn from(o: OrderWithItems) -> Self {
        let mut response = OrderResponse::from(o.order);
        response.items = o
            .items
            .into_iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id,
                product_name: item.product_name,
                product_image: item.product_image,
                quantity: item.quantity,
                unit_price: item.unit_price.to_string(),
            })
            .collect();
        response
    }
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            status: o.status.to_string(),
            subtotal: o.subtotal.to_string(),
            shipping_fee: o.shipping_fee.to_string(),
            total: o.total.to_string(),
            shipping_name: o.shipping_name,
            shipping_email: o.shipping_email,
            shipping_address: o.shipping_address,
            shipping_city: o.shipping_city,
            shipping_zip: o.shipping_zip,
            shipping_country: o.shipping_country,
            created_at: o.created_at.to_rfc3339(),
            items: vec![],
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /profile
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "The account's profile", body = ProfileResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No profile provisioned for this account"),
    ),
    tag = "profile"
)]
pub async fn get_profile(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let user = require_user(&state, &req).await?;
    let profile = state.accounts.profile(&user).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(profile)))
}

/// PUT /profile
///
/// Partial update; only the submitted fields change.
#[utoipa::path(
    put,
    path = "/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "The profile after the update", body = ProfileResponse),
        (status = 401, description = "Not signed in"),
    ),
    tag = "profile"
)]
pub async fn update_profile(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let user = require_user(&state, &req).await?;
    let body = body.into_inner();

    let update = ProfileUpdate {
        full_name: body.full_name,
        phone: body.phone,
        address: body.address,
        city: body.city,
        zip_code: body.zip_code,
        country: body.country,
    };
    let profile = state.accounts.update_profile(&user, update).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(profile)))
}

/// GET /profile/orders
///
/// The account's order history with items, newest first.
#[utoipa::path(
    get,
    path = "/profile/orders",
    responses(
        (status = 200, description = "The account's orders", body = [OrderResponse]),
        (status = 401, description = "Not signed in"),
    ),
    tag = "profile"
)]
pub async fn order_history(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let user = require_user(&state, &req).await?;
    let orders = state.accounts.order_history(&user).await?;
    let items: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(items))
}
