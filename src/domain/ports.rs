use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::cart::Cart;
use super::errors::BackendError;
use super::order::{NewOrder, NewOrderItem, Order, OrderStatus, OrderWithItems};
use super::product::{NewProduct, Product, ProductFilter, ProductPatch};
use super::profile::{Profile, ProfileUpdate};
use super::session::{AuthSession, SessionUser};

/// Account and session operations of the hosted backend.
#[async_trait]
pub trait AuthApi: Send + Sync + 'static {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthSession, BackendError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;

    /// Resolves a bearer token; `None` for invalid or expired tokens.
    async fn current_user(&self, access_token: &str)
        -> Result<Option<SessionUser>, BackendError>;

    async fn has_role(&self, user_id: Uuid, role: &str) -> Result<bool, BackendError>;
}

/// Record operations against the hosted `products` collection.
#[async_trait]
pub trait ProductStore: Send + Sync + 'static {
    /// All matching products, newest first.
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, BackendError>;

    async fn find(&self, id: &str) -> Result<Option<Product>, BackendError>;

    async fn insert(&self, product: NewProduct) -> Result<Product, BackendError>;

    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Product, BackendError>;

    async fn delete(&self, id: &str) -> Result<(), BackendError>;
}

/// Record operations against the hosted `orders` and `order_items`
/// collections. Header, items, and status writes are separate calls with no
/// transaction spanning them.
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, BackendError>;

    async fn insert_items(&self, items: Vec<NewOrderItem>) -> Result<(), BackendError>;

    async fn update_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<(), BackendError>;

    /// The user's orders with their items, newest first.
    async fn orders_for_user(&self, user_id: Uuid)
        -> Result<Vec<OrderWithItems>, BackendError>;

    /// The newest orders across all users, with items.
    async fn recent_orders(&self, limit: i64) -> Result<Vec<OrderWithItems>, BackendError>;

    /// Orders still pending that were created before `cutoff`, oldest first.
    async fn pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Order>, BackendError>;
}

/// Record operations against the hosted `profiles` collection.
#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    async fn find(&self, user_id: Uuid) -> Result<Option<Profile>, BackendError>;

    async fn update(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Profile, BackendError>;
}

/// Binary object storage with public URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Stores `bytes` under `bucket/path` and returns the public URL.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError>;

    /// Removes the given in-bucket paths. Unknown paths are not an error.
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError>;
}

/// Durable per-session cart snapshots, keyed by session id. Synchronous on
/// purpose: cart mutations happen under the registry lock.
pub trait CartArchive: Send + Sync + 'static {
    fn load(&self, session: &str) -> std::io::Result<Option<Cart>>;

    fn save(&self, session: &str, cart: &Cart) -> std::io::Result<()>;

    fn remove(&self, session: &str) -> std::io::Result<()>;
}

/// The full set of backend capabilities a running storefront needs, bundled
/// so construction sites pass one value around.
#[derive(Clone)]
pub struct Backend {
    pub auth: Arc<dyn AuthApi>,
    pub products: Arc<dyn ProductStore>,
    pub orders: Arc<dyn OrderStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub objects: Arc<dyn ObjectStore>,
}
