use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::cart::{Cart, CartLine, CartProduct};
use crate::errors::AppError;
use crate::AppState;

use super::session_id;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub product_id: String,
    /// How many to add. Defaults to 1; values below 1 count as 1.
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    /// New line quantity. Zero or below removes the line.
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    pub product_id: String,
    pub name: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "85.00"
    pub unit_price: String,
    pub image: String,
    pub origin: String,
    pub quantity: i32,
    pub line_total: String,
}

impl From<&CartLine> for CartLineResponse {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            unit_price: line.unit_price.to_string(),
            image: line.image.clone(),
            origin: line.origin.clone(),
            quantity: line.quantity,
            line_total: line.line_total().to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub lines: Vec<CartLineResponse>,
    pub item_count: i32,
    pub total: String,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        Self {
            item_count: cart.item_count(),
            total: cart.total().to_string(),
            lines: cart.lines.iter().map(CartLineResponse::from).collect(),
        }
    }
}

fn cart_body(state: &AppState, session: &str) -> HttpResponse {
    HttpResponse::Ok().json(CartResponse::from(state.carts.snapshot(session)))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /cart
#[utoipa::path(
    get,
    path = "/cart",
    params(
        ("X-Session-Id" = String, Header, description = "Cart session key"),
    ),
    responses(
        (status = 200, description = "The session's cart", body = CartResponse),
        (status = 400, description = "Missing session header"),
    ),
    tag = "cart"
)]
pub async fn view_cart(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = session_id(&req)?;
    Ok(cart_body(&state, &session))
}

/// POST /cart/items
///
/// Adds a product to the cart. The product is looked up here and its name,
/// price, image, and origin are frozen into the line; a repeated add for the
/// same product merges into the existing line.
#[utoipa::path(
    post,
    path = "/cart/items",
    request_body = AddItemRequest,
    params(
        ("X-Session-Id" = String, Header, description = "Cart session key"),
    ),
    responses(
        (status = 200, description = "Cart after the add", body = CartResponse),
        (status = 400, description = "Missing session header"),
        (status = 404, description = "Product not found"),
    ),
    tag = "cart"
)]
pub async fn add_item(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let session = session_id(&req)?;
    let body = body.into_inner();

    let product = state.catalog.find(&body.product_id).await?;
    let snapshot = CartProduct {
        product_id: product.id,
        name: product.name,
        unit_price: product.price,
        image: product.image,
        origin: product.origin,
    };
    state.carts.add_item(&session, &snapshot, body.quantity);

    Ok(cart_body(&state, &session))
}

/// PATCH /cart/items/{product_id}
#[utoipa::path(
    patch,
    path = "/cart/items/{product_id}",
    request_body = UpdateQuantityRequest,
    params(
        ("product_id" = String, Path, description = "Product id of the line"),
        ("X-Session-Id" = String, Header, description = "Cart session key"),
    ),
    responses(
        (status = 200, description = "Cart after the change", body = CartResponse),
        (status = 400, description = "Missing session header"),
    ),
    tag = "cart"
)]
pub async fn update_item(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateQuantityRequest>,
) -> Result<HttpResponse, AppError> {
    let session = session_id(&req)?;
    state
        .carts
        .update_quantity(&session, &path.into_inner(), body.quantity);
    Ok(cart_body(&state, &session))
}

/// DELETE /cart/items/{product_id}
///
/// Removes the line. Removing a product that is not in the cart leaves the
/// cart as it is.
#[utoipa::path(
    delete,
    path = "/cart/items/{product_id}",
    params(
        ("product_id" = String, Path, description = "Product id of the line"),
        ("X-Session-Id" = String, Header, description = "Cart session key"),
    ),
    responses(
        (status = 200, description = "Cart after the removal", body = CartResponse),
        (status = 400, description = "Missing session header"),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = session_id(&req)?;
    state.carts.remove_item(&session, &path.into_inner());
    Ok(cart_body(&state, &session))
}

/// DELETE /cart
#[utoipa::path(
    delete,
    path = "/cart",
    params(
        ("X-Session-Id" = String, Header, description = "Cart session key"),
    ),
    responses(
        (status = 200, description = "The emptied cart", body = CartResponse),
        (status = 400, description = "Missing session header"),
    ),
    tag = "cart"
)]
pub async fn clear_cart(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = session_id(&req)?;
    state.carts.clear(&session);
    Ok(cart_body(&state, &session))
}
