use std::str::FromStr;

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{web, HttpRequest, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::OrderStatus;
use crate::domain::product::{NewProduct, ProductPatch};
use crate::domain::session::SessionUser;
use crate::errors::AppError;
use crate::AppState;

use super::products::ProductResponse;
use super::profile::OrderResponse;
use super::require_user;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecentOrdersParams {
    /// Number of orders to return. Defaults to 10, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StaleOrdersParams {
    /// Age threshold in hours. Defaults to 24.
    #[serde(default = "default_hours")]
    pub hours: i64,
}

fn default_hours() -> i64 {
    24
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStatusRequest {
    /// One of: pending, processing, shipped, delivered, cancelled.
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "1250.00"
    pub price: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub origin: String,
    pub category: String,
    pub age: Option<String>,
    pub weight: Option<String>,
    pub dimensions: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_stock")]
    pub stock: i32,
}

fn default_stock() -> i32 {
    1
}

/// Fields to change; omitted fields keep their current value.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    /// Decimal price as a string, e.g. "1250.00"
    pub price: Option<String>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub origin: Option<String>,
    pub category: Option<String>,
    pub age: Option<String>,
    pub weight: Option<String>,
    pub dimensions: Option<String>,
    pub description: Option<String>,
    pub story: Option<String>,
    pub featured: Option<bool>,
    pub stock: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadImageParams {
    /// Original file name; it is sanitised and prefixed before storage.
    pub filename: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadImageResponse {
    pub url: String,
}

async fn admin_gate(state: &AppState, req: &HttpRequest) -> Result<SessionUser, AppError> {
    let user = require_user(state, req).await?;
    state.admin.require_admin(&user).await?;
    Ok(user)
}

fn parse_price(price: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(price)
        .map_err(|_| AppError::Validation(format!("Invalid price '{}'", price)))
}

// ── Order handlers ───────────────────────────────────────────────────────────

/// GET /admin/orders
#[utoipa::path(
    get,
    path = "/admin/orders",
    params(
        ("limit" = Option<i64>, Query, description = "Number of orders (default 10, max 100)"),
    ),
    responses(
        (status = 200, description = "Most recent orders across all accounts", body = [OrderResponse]),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in but not an admin"),
    ),
    tag = "admin"
)]
pub async fn recent_orders(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<RecentOrdersParams>,
) -> Result<HttpResponse, AppError> {
    admin_gate(&state, &req).await?;
    let limit = query.limit.clamp(1, 100);

    let orders = state.admin.recent_orders(limit).await?;
    let items: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// GET /admin/orders/stale
///
/// Orders stuck in `pending` past the age threshold. These come from
/// checkouts whose item or status write failed and are the queue for manual
/// review.
#[utoipa::path(
    get,
    path = "/admin/orders/stale",
    params(
        ("hours" = Option<i64>, Query, description = "Age threshold in hours (default 24)"),
    ),
    responses(
        (status = 200, description = "Stale pending orders, oldest first", body = [OrderResponse]),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in but not an admin"),
    ),
    tag = "admin"
)]
pub async fn stale_orders(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<StaleOrdersParams>,
) -> Result<HttpResponse, AppError> {
    admin_gate(&state, &req).await?;
    let cutoff = Utc::now() - Duration::hours(query.hours.max(0));

    let orders = state.admin.stale_pending(cutoff).await?;
    let items: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// PUT /admin/orders/{id}/status
///
/// Overwrites the order status. Any status may follow any other.
#[utoipa::path(
    put,
    path = "/admin/orders/{id}/status",
    request_body = SetStatusRequest,
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 204, description = "Status updated"),
        (status = 400, description = "Unknown status value"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in but not an admin"),
        (status = 404, description = "Order not found"),
    ),
    tag = "admin"
)]
pub async fn set_status(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<SetStatusRequest>,
) -> Result<HttpResponse, AppError> {
    admin_gate(&state, &req).await?;
    let status = OrderStatus::from_str(&body.status).map_err(AppError::Validation)?;

    state.admin.set_status(path.into_inner(), status).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ── Product handlers ─────────────────────────────────────────────────────────

/// POST /admin/products
#[utoipa::path(
    post,
    path = "/admin/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid price"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in but not an admin"),
    ),
    tag = "admin"
)]
pub async fn create_product(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    admin_gate(&state, &req).await?;
    let body = body.into_inner();
    let price = parse_price(&body.price)?;

    let product = state
        .catalog
        .create(NewProduct {
            name: body.name,
            price,
            image: body.image,
            images: body.images,
            origin: body.origin,
            category: body.category,
            age: body.age,
            weight: body.weight,
            dimensions: body.dimensions,
            description: body.description,
            story: body.story,
            featured: body.featured,
            stock: body.stock,
        })
        .await?;
    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

/// PUT /admin/products/{id}
#[utoipa::path(
    put,
    path = "/admin/products/{id}",
    request_body = UpdateProductRequest,
    params(
        ("id" = String, Path, description = "Product id"),
    ),
    responses(
        (status = 200, description = "Product after the update", body = ProductResponse),
        (status = 400, description = "Invalid price"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in but not an admin"),
        (status = 404, description = "Product not found"),
    ),
    tag = "admin"
)]
pub async fn update_product(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    admin_gate(&state, &req).await?;
    let body = body.into_inner();
    let price = body.price.as_deref().map(parse_price).transpose()?;

    let patch = ProductPatch {
        name: body.name,
        price,
        image: body.image,
        images: body.images,
        origin: body.origin,
        category: body.category,
        age: body.age,
        weight: body.weight,
        dimensions: body.dimensions,
        description: body.description,
        story: body.story,
        featured: body.featured,
        stock: body.stock,
    };
    let product = state.catalog.update(&path.into_inner(), patch).await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// DELETE /admin/products/{id}
///
/// Removes the product and its stored images. Image cleanup is best effort;
/// the record is removed even if storage misbehaves.
#[utoipa::path(
    delete,
    path = "/admin/products/{id}",
    params(
        ("id" = String, Path, description = "Product id"),
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in but not an admin"),
        (status = 404, description = "Product not found"),
    ),
    tag = "admin"
)]
pub async fn delete_product(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    admin_gate(&state, &req).await?;
    state.catalog.delete(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /admin/products/images
///
/// Raw image bytes in the body; the stored object keeps the request's
/// Content-Type. Answers with the public URL to put on a product.
#[utoipa::path(
    post,
    path = "/admin/products/images",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    params(
        ("filename" = String, Query, description = "Original file name"),
    ),
    responses(
        (status = 201, description = "Image stored", body = UploadImageResponse),
        (status = 400, description = "Empty payload"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in but not an admin"),
    ),
    tag = "admin"
)]
pub async fn upload_image(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<UploadImageParams>,
    bytes: web::Bytes,
) -> Result<HttpResponse, AppError> {
    admin_gate(&state, &req).await?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Image payload is empty".to_string()));
    }
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let url = state
        .catalog
        .upload_image(&query.filename, bytes.to_vec(), &content_type)
        .await?;
    Ok(HttpResponse::Created().json(UploadImageResponse { url }))
}
