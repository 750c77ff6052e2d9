use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::product::{Product, ProductFilter};
use crate::errors::AppError;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListProductsParams {
    /// Exact category name, e.g. "Crystal".
    pub category: Option<String>,
    /// Only featured products when true.
    #[serde(default)]
    pub featured: bool,
    /// Case-insensitive substring match against name or category.
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "1250.00"
    pub price: String,
    pub image: String,
    pub images: Vec<String>,
    pub origin: String,
    pub category: String,
    pub age: Option<String>,
    pub weight: Option<String>,
    pub dimensions: Option<String>,
    pub description: String,
    pub story: String,
    pub featured: bool,
    pub stock: i32,
    pub created_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            price: p.price.to_string(),
            image: p.image,
            images: p.images,
            origin: p.origin,
            category: p.category,
            age: p.age,
            weight: p.weight,
            dimensions: p.dimensions,
            description: p.description,
            story: p.story,
            featured: p.featured,
            stock: p.stock,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /products
///
/// Lists the catalog, newest first. `category`, `featured`, and `search`
/// combine; omitting them all returns everything.
#[utoipa::path(
    get,
    path = "/products",
    params(
        ("category" = Option<String>, Query, description = "Exact category name"),
        ("featured" = Option<bool>, Query, description = "Only featured products"),
        ("search" = Option<String>, Query, description = "Name or category substring, case-insensitive"),
    ),
    responses(
        (status = 200, description = "Matching products, newest first", body = [ProductResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "catalog"
)]
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ListProductsParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let filter = ProductFilter {
        category: params.category,
        featured_only: params.featured,
        search: params.search,
    };

    let products = state.catalog.list(&filter).await?;
    let items: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(
        ("id" = String, Path, description = "Product id"),
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "catalog"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let product = state.catalog.find(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}
