//! Wire shapes of the hosted backend where they diverge from the domain
//! types: the order fee column is called `shipping`, the item price column is
//! called `price`, and monetary columns arrive as JSON numbers that must not
//! pass through binary floats unrounded.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, OrderWithItems};
use crate::domain::product::{NewProduct, Product, ProductPatch};
use crate::domain::session::{AuthSession, SessionUser};

/// Money decoding for numeric columns. The backend serialises `numeric` as a
/// JSON number; going through the float's shortest decimal rendering recovers
/// the stored digits instead of the binary expansion.
pub(crate) mod money {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = match Wire::deserialize(deserializer)? {
            Wire::Number(n) => n.to_string(),
            Wire::Text(t) => t,
        };
        BigDecimal::from_str(&text).map_err(D::Error::custom)
    }
}

// ── products ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "money::deserialize")]
    pub price: BigDecimal,
    pub image: String,
    #[serde(default)]
    pub images: Option<Vec<String>>,
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
    pub featured: Option<bool>,
    #[serde(default)]
    pub stock: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price: row.price,
            image: row.image,
            images: row.images.unwrap_or_default(),
            origin: row.origin,
            category: row.category,
            age: row.age,
            weight: row.weight,
            dimensions: row.dimensions,
            description: row.description,
            story: row.story,
            featured: row.featured.unwrap_or(false),
            stock: row.stock.unwrap_or(0),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewProductRow {
    pub name: String,
    pub price: BigDecimal,
    pub image: String,
    /// Null rather than an empty array, matching how the column is used.
    pub images: Option<Vec<String>>,
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

impl From<NewProduct> for NewProductRow {
    fn from(p: NewProduct) -> Self {
        NewProductRow {
            name: p.name,
            price: p.price,
            image: p.image,
            images: if p.images.is_empty() {
                None
            } else {
                Some(p.images)
            },
            origin: p.origin,
            category: p.category,
            age: p.age,
            weight: p.weight,
            dimensions: p.dimensions,
            description: p.description,
            story: p.story,
            featured: p.featured,
            stock: p.stock,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductPatchRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<BigDecimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
}

impl From<ProductPatch> for ProductPatchRow {
    fn from(p: ProductPatch) -> Self {
        ProductPatchRow {
            name: p.name,
            price: p.price,
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
        }
    }
}

// ── orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    #[serde(deserialize_with = "money::deserialize")]
    pub subtotal: BigDecimal,
    #[serde(deserialize_with = "money::deserialize")]
    pub shipping: BigDecimal,
    #[serde(deserialize_with = "money::deserialize")]
    pub total: BigDecimal,
    #[serde(default)]
    pub shipping_name: Option<String>,
    #[serde(default)]
    pub shipping_email: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub shipping_city: Option<String>,
    #[serde(default)]
    pub shipping_zip: Option<String>,
    #[serde(default)]
    pub shipping_country: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            subtotal: row.subtotal,
            shipping_fee: row.shipping,
            total: row.total,
            shipping_name: row.shipping_name.unwrap_or_default(),
            shipping_email: row.shipping_email.unwrap_or_default(),
            shipping_address: row.shipping_address.unwrap_or_default(),
            shipping_city: row.shipping_city.unwrap_or_default(),
            shipping_zip: row.shipping_zip.unwrap_or_default(),
            shipping_country: row.shipping_country.unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewOrderRow {
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub subtotal: BigDecimal,
    pub shipping: BigDecimal,
    pub total: BigDecimal,
    pub shipping_name: String,
    pub shipping_email: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_zip: String,
    pub shipping_country: String,
}

impl From<NewOrder> for NewOrderRow {
    fn from(o: NewOrder) -> Self {
        NewOrderRow {
            user_id: o.user_id,
            status: o.status,
            subtotal: o.subtotal,
            shipping: o.shipping_fee,
            total: o.total,
            shipping_name: o.shipping_name,
            shipping_email: o.shipping_email,
            shipping_address: o.shipping_address,
            shipping_city: o.shipping_city,
            shipping_zip: o.shipping_zip,
            shipping_country: o.shipping_country,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: String,
    pub product_name: String,
    #[serde(default)]
    pub product_image: Option<String>,
    pub quantity: i32,
    #[serde(deserialize_with = "money::deserialize")]
    pub price: BigDecimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_image: row.product_image.unwrap_or_default(),
            quantity: row.quantity,
            unit_price: row.price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewOrderItemRow {
    pub order_id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub product_image: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

impl From<NewOrderItem> for NewOrderItemRow {
    fn from(i: NewOrderItem) -> Self {
        NewOrderItemRow {
            order_id: i.order_id,
            product_id: i.product_id,
            product_name: i.product_name,
            product_image: i.product_image,
            quantity: i.quantity,
            price: i.unit_price,
        }
    }
}

/// An order with its embedded `order_items`, as returned by the relational
/// select.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderWithItemsRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    #[serde(deserialize_with = "money::deserialize")]
    pub subtotal: BigDecimal,
    #[serde(deserialize_with = "money::deserialize")]
    pub shipping: BigDecimal,
    #[serde(deserialize_with = "money::deserialize")]
    pub total: BigDecimal,
    #[serde(default)]
    pub shipping_name: Option<String>,
    #[serde(default)]
    pub shipping_email: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub shipping_city: Option<String>,
    #[serde(default)]
    pub shipping_zip: Option<String>,
    #[serde(default)]
    pub shipping_country: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub order_items: Vec<OrderItemRow>,
}

impl From<OrderWithItemsRow> for OrderWithItems {
    fn from(row: OrderWithItemsRow) -> Self {
        OrderWithItems {
            order: Order {
                id: row.id,
                user_id: row.user_id,
                status: row.status,
                subtotal: row.subtotal,
                shipping_fee: row.shipping,
                total: row.total,
                shipping_name: row.shipping_name.unwrap_or_default(),
                shipping_email: row.shipping_email.unwrap_or_default(),
                shipping_address: row.shipping_address.unwrap_or_default(),
                shipping_city: row.shipping_city.unwrap_or_default(),
                shipping_zip: row.shipping_zip.unwrap_or_default(),
                shipping_country: row.shipping_country.unwrap_or_default(),
                created_at: row.created_at,
            },
            items: row.order_items.into_iter().map(OrderItem::from).collect(),
        }
    }
}

// ── auth ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserRow {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<UserRow> for SessionUser {
    fn from(row: UserRow) -> Self {
        SessionUser {
            id: row.id,
            email: row.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionRow {
    pub access_token: String,
    pub user: UserRow,
}

impl From<SessionRow> for AuthSession {
    fn from(row: SessionRow) -> Self {
        AuthSession {
            access_token: row.access_token,
            user: row.user.into(),
        }
    }
}
