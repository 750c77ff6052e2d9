//! In-memory stand-in for the hosted backend, shared by the service tests
//! and the API tests. It mirrors the observable behaviour of the real
//! endpoints: newest-first listings, profile provisioning on sign-up, role
//! lookups, and public object URLs.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::BackendError;
use crate::domain::order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, OrderWithItems};
use crate::domain::ports::{
    AuthApi, Backend, ObjectStore, OrderStore, ProductStore, ProfileStore,
};
use crate::domain::product::{NewProduct, Product, ProductFilter, ProductPatch};
use crate::domain::profile::{Profile, ProfileUpdate};
use crate::domain::session::{AuthSession, SessionUser};

/// Order write that should fail until further notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    InsertOrder,
    InsertItems,
    UpdateStatus,
}

struct UserRecord {
    id: Uuid,
    email: String,
    password: String,
}

#[derive(Default)]
struct State {
    users: Vec<UserRecord>,
    tokens: HashMap<String, Uuid>,
    roles: Vec<(Uuid, String)>,
    profiles: HashMap<Uuid, Profile>,
    products: Vec<Product>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    objects: HashMap<String, HashMap<String, Vec<u8>>>,
    fail: Option<FailurePoint>,
}

pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// All five port slots backed by this one fake.
    pub fn into_backend(self: std::sync::Arc<Self>) -> Backend {
        Backend {
            auth: self.clone(),
            products: self.clone(),
            orders: self.clone(),
            profiles: self.clone(),
            objects: self,
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers an account the way the hosted signup would, including the
    /// provisioned profile, and returns the new user id.
    pub fn add_user(&self, email: &str, password: &str, full_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = self.state();
        state.users.push(UserRecord {
            id,
            email: email.to_string(),
            password: password.to_string(),
        });
        state.profiles.insert(
            id,
            Profile {
                id,
                email: Some(email.to_string()),
                full_name: Some(full_name.to_string()),
                phone: None,
                address: None,
                city: None,
                zip_code: None,
                country: None,
            },
        );
        id
    }

    pub fn grant_role(&self, user_id: Uuid, role: &str) {
        self.state().roles.push((user_id, role.to_string()));
    }

    /// Makes the given order write fail until overwritten.
    pub fn fail_at(&self, point: FailurePoint) {
        self.state().fail = Some(point);
    }

    pub fn clear_failure(&self) {
        self.state().fail = None;
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state().orders.clone()
    }

    pub fn items_for(&self, order_id: Uuid) -> Vec<OrderItem> {
        self.state()
            .order_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect()
    }

    /// Paths currently stored in a bucket, sorted.
    pub fn stored_objects(&self, bucket: &str) -> Vec<String> {
        let state = self.state();
        let mut paths: Vec<String> = state
            .objects
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }

    fn injected(&self, point: FailurePoint) -> Result<(), BackendError> {
        if self.state().fail == Some(point) {
            return Err(BackendError::Service(format!(
                "injected failure at {:?}",
                point
            )));
        }
        Ok(())
    }

    fn issue_token(state: &mut State, user_id: Uuid) -> String {
        let token = format!("tok-{}", Uuid::new_v4());
        state.tokens.insert(token.clone(), user_id);
        token
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthApi for MemoryBackend {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthSession, BackendError> {
        if self.state().users.iter().any(|u| u.email == email) {
            return Err(BackendError::Rejected("User already registered".to_string()));
        }
        let id = self.add_user(email, password, full_name);
        let mut state = self.state();
        let access_token = Self::issue_token(&mut state, id);
        Ok(AuthSession {
            access_token,
            user: SessionUser {
                id,
                email: email.to_string(),
            },
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let mut state = self.state();
        // Passwords are compared in plain text; nothing outside tests ever
        // reaches this type.
        let user = state
            .users
            .iter()
            .find(|u| u.email == email && u.password == password)
            .map(|u| SessionUser {
                id: u.id,
                email: u.email.clone(),
            })
            .ok_or_else(|| BackendError::Rejected("Invalid login credentials".to_string()))?;
        let access_token = Self::issue_token(&mut state, user.id);
        Ok(AuthSession { access_token, user })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        self.state().tokens.remove(access_token);
        Ok(())
    }

    async fn current_user(
        &self,
        access_token: &str,
    ) -> Result<Option<SessionUser>, BackendError> {
        let state = self.state();
        let Some(user_id) = state.tokens.get(access_token) else {
            return Ok(None);
        };
        Ok(state
            .users
            .iter()
            .find(|u| u.id == *user_id)
            .map(|u| SessionUser {
                id: u.id,
                email: u.email.clone(),
            }))
    }

    async fn has_role(&self, user_id: Uuid, role: &str) -> Result<bool, BackendError> {
        Ok(self
            .state()
            .roles
            .iter()
            .any(|(id, granted)| *id == user_id && granted == role))
    }
}

#[async_trait]
impl ProductStore for MemoryBackend {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, BackendError> {
        let state = self.state();
        let needle = filter.search.as_ref().map(|term| term.to_lowercase());
        Ok(state
            .products
            .iter()
            .rev()
            .filter(|p| match &filter.category {
                Some(category) => p.category == *category,
                None => true,
            })
            .filter(|p| !filter.featured_only || p.featured)
            .filter(|p| match &needle {
                Some(needle) => {
                    p.name.to_lowercase().contains(needle)
                        || p.category.to_lowercase().contains(needle)
                }
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn find(&self, id: &str) -> Result<Option<Product>, BackendError> {
        Ok(self.state().products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, BackendError> {
        let stored = Product {
            id: Uuid::new_v4().to_string(),
            name: product.name,
            price: product.price,
            image: product.image,
            images: product.images,
            origin: product.origin,
            category: product.category,
            age: product.age,
            weight: product.weight,
            dimensions: product.dimensions,
            description: product.description,
            story: product.story,
            featured: product.featured,
            stock: product.stock,
            created_at: Utc::now(),
        };
        self.state().products.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Product, BackendError> {
        let mut state = self.state();
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(BackendError::NotFound)?;
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(image) = patch.image {
            product.image = image;
        }
        if let Some(images) = patch.images {
            product.images = images;
        }
        if let Some(origin) = patch.origin {
            product.origin = origin;
        }
        if let Some(category) = patch.category {
            product.category = category;
        }
        if let Some(age) = patch.age {
            product.age = Some(age);
        }
        if let Some(weight) = patch.weight {
            product.weight = Some(weight);
        }
        if let Some(dimensions) = patch.dimensions {
            product.dimensions = Some(dimensions);
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(story) = patch.story {
            product.story = story;
        }
        if let Some(featured) = patch.featured {
            product.featured = featured;
        }
        if let Some(stock) = patch.stock {
            product.stock = stock;
        }
        Ok(product.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        self.state().products.retain(|p| p.id != id);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryBackend {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, BackendError> {
        self.injected(FailurePoint::InsertOrder)?;
        let stored = Order {
            id: Uuid::new_v4(),
            user_id: order.user_id,
            status: order.status,
            subtotal: order.subtotal,
            shipping_fee: order.shipping_fee,
            total: order.total,
            shipping_name: order.shipping_name,
            shipping_email: order.shipping_email,
            shipping_address: order.shipping_address,
            shipping_city: order.shipping_city,
            shipping_zip: order.shipping_zip,
            shipping_country: order.shipping_country,
            created_at: Utc::now(),
        };
        self.state().orders.push(stored.clone());
        Ok(stored)
    }

    async fn insert_items(&self, items: Vec<NewOrderItem>) -> Result<(), BackendError> {
        self.injected(FailurePoint::InsertItems)?;
        let mut state = self.state();
        for item in items {
            state.order_items.push(OrderItem {
                id: Uuid::new_v4(),
                order_id: item.order_id,
                product_id: item.product_id,
                product_name: item.product_name,
                product_image: item.product_image,
                quantity: item.quantity,
                unit_price: item.unit_price,
            });
        }
        Ok(())
    }

    async fn update_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<(), BackendError> {
        self.injected(FailurePoint::UpdateStatus)?;
        let mut state = self.state();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(BackendError::NotFound)?;
        order.status = status;
        Ok(())
    }

    async fn orders_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<OrderWithItems>, BackendError> {
        let state = self.state();
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .map(|order| OrderWithItems {
                order: order.clone(),
                items: state
                    .order_items
                    .iter()
                    .filter(|item| item.order_id == order.id)
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    async fn recent_orders(&self, limit: i64) -> Result<Vec<OrderWithItems>, BackendError> {
        let state = self.state();
        Ok(state
            .orders
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .map(|order| OrderWithItems {
                order: order.clone(),
                items: state
                    .order_items
                    .iter()
                    .filter(|item| item.order_id == order.id)
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    async fn pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Order>, BackendError> {
        Ok(self
            .state()
            .orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending && o.created_at < cutoff)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProfileStore for MemoryBackend {
    async fn find(&self, user_id: Uuid) -> Result<Option<Profile>, BackendError> {
        Ok(self.state().profiles.get(&user_id).cloned())
    }

    async fn update(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Profile, BackendError> {
        let mut state = self.state();
        let profile = state
            .profiles
            .get_mut(&user_id)
            .ok_or(BackendError::NotFound)?;
        if let Some(full_name) = update.full_name {
            profile.full_name = Some(full_name);
        }
        if let Some(phone) = update.phone {
            profile.phone = Some(phone);
        }
        if let Some(address) = update.address {
            profile.address = Some(address);
        }
        if let Some(city) = update.city {
            profile.city = Some(city);
        }
        if let Some(zip_code) = update.zip_code {
            profile.zip_code = Some(zip_code);
        }
        if let Some(country) = update.country {
            profile.country = Some(country);
        }
        Ok(profile.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, BackendError> {
        self.state()
            .objects
            .entry(bucket.to_string())
            .or_default()
            .insert(path.to_string(), bytes);
        Ok(format!(
            "https://backend.test/storage/v1/object/public/{}/{}",
            bucket, path
        ))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError> {
        let mut state = self.state();
        if let Some(objects) = state.objects.get_mut(bucket) {
            for path in paths {
                objects.remove(path);
            }
        }
        Ok(())
    }
}
