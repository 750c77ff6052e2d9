use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

/// A catalog entry. Identifiers are backend-assigned strings; they double as
/// the cart line key.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: BigDecimal,
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
    pub created_at: DateTime<Utc>,
}

/// Insert shape; id and creation time are assigned by the backend.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: BigDecimal,
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
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<BigDecimal>,
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

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.image.is_none()
            && self.images.is_none()
            && self.origin.is_none()
            && self.category.is_none()
            && self.age.is_none()
            && self.weight.is_none()
            && self.dimensions.is_none()
            && self.description.is_none()
            && self.story.is_none()
            && self.featured.is_none()
            && self.stock.is_none()
    }
}

/// Catalog listing filter. Filters combine; results are always newest first.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Exact category match.
    pub category: Option<String>,
    /// Restrict to featured products.
    pub featured_only: bool,
    /// Case-insensitive substring match against name or category.
    pub search: Option<String>,
}
