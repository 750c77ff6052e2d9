use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::domain::errors::BackendError;
use crate::domain::order::{NewOrder, NewOrderItem, Order, OrderStatus, OrderWithItems};
use crate::domain::ports::{
    AuthApi, Backend, ObjectStore, OrderStore, ProductStore, ProfileStore,
};
use crate::domain::product::{NewProduct, Product, ProductFilter, ProductPatch};
use crate::domain::profile::{Profile, ProfileUpdate};
use crate::domain::session::{AuthSession, SessionUser};

use super::rows::{
    NewOrderItemRow, NewOrderRow, NewProductRow, OrderRow, OrderWithItemsRow, ProductPatchRow,
    ProductRow, SessionRow, UserRow,
};

/// Backend calls that hang are failures; nothing this service does should
/// wait longer than this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the hosted backend: record API under `/rest/v1`, auth under
/// `/auth/v1`, object storage under `/storage/v1`.
///
/// Record and storage calls run with the service key; row-level policy is
/// enforced by explicit user-id scoping on this side. User tokens are only
/// forwarded for session operations.
pub struct RestBackend {
    http: Client,
    base_url: String,
    service_key: String,
}

impl RestBackend {
    pub fn new(base_url: &str, service_key: &str) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Service(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        })
    }

    /// One shared client wired into every port slot.
    pub fn into_backend(self) -> Backend {
        let shared = Arc::new(self);
        Backend {
            auth: shared.clone(),
            products: shared.clone(),
            orders: shared.clone(),
            profiles: shared.clone(),
            objects: shared,
        }
    }

    fn data_request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", self.service_key.as_str())
            .bearer_auth(&self.service_key)
    }

    fn auth_request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/auth/v1/{}", self.base_url, endpoint))
            .header("apikey", self.service_key.as_str())
    }

    fn storage_request(&self, method: Method, bucket: &str, path: &str) -> RequestBuilder {
        let url = if path.is_empty() {
            format!("{}/storage/v1/object/{}", self.base_url, bucket)
        } else {
            format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)
        };
        self.http
            .request(method, url)
            .header("apikey", self.service_key.as_str())
            .bearer_auth(&self.service_key)
    }

    async fn check(resp: Response) -> Result<Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| status.to_string());
        match status {
            StatusCode::NOT_FOUND => Err(BackendError::NotFound),
            s if s.is_client_error() => Err(BackendError::Rejected(message)),
            _ => Err(BackendError::Service(message)),
        }
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, BackendError> {
        let resp = Self::check(resp).await?;
        resp.json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// Pulls the human-readable message out of a backend error body. The record,
/// auth, and storage APIs each use a different key for it.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    for key in ["message", "msg", "error_description", "error"] {
        if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
            return Some(text.to_string());
        }
    }
    None
}

fn net(e: reqwest::Error) -> BackendError {
    BackendError::Service(e.to_string())
}

/// Builds the `*term*` pattern for an ilike filter, dropping characters that
/// belong to the filter grammar itself.
fn ilike_pattern(term: &str) -> String {
    let cleaned: String = term
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '"'))
        .collect();
    format!("*{}*", cleaned.trim())
}

#[async_trait]
impl ProductStore for RestBackend {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, BackendError> {
        let mut query: Vec<(String, String)> = vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "created_at.desc".to_string()),
        ];
        if let Some(category) = &filter.category {
            query.push(("category".to_string(), format!("eq.{}", category)));
        }
        if filter.featured_only {
            query.push(("featured".to_string(), "eq.true".to_string()));
        }
        if let Some(term) = &filter.search {
            let pattern = ilike_pattern(term);
            query.push((
                "or".to_string(),
                format!("(name.ilike.{},category.ilike.{})", pattern, pattern),
            ));
        }

        let resp = self
            .data_request(Method::GET, "products")
            .query(&query)
            .send()
            .await
            .map_err(net)?;
        let rows: Vec<ProductRow> = Self::decode(resp).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find(&self, id: &str) -> Result<Option<Product>, BackendError> {
        let id_filter = format!("eq.{}", id);
        let resp = self
            .data_request(Method::GET, "products")
            .query(&[("select", "*"), ("id", id_filter.as_str())])
            .send()
            .await
            .map_err(net)?;
        let rows: Vec<ProductRow> = Self::decode(resp).await?;
        Ok(rows.into_iter().next().map(Product::from))
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, BackendError> {
        let resp = self
            .data_request(Method::POST, "products")
            .header("Prefer", "return=representation")
            .json(&NewProductRow::from(product))
            .send()
            .await
            .map_err(net)?;
        let rows: Vec<ProductRow> = Self::decode(resp).await?;
        rows.into_iter()
            .next()
            .map(Product::from)
            .ok_or_else(|| BackendError::Decode("insert returned no row".to_string()))
    }

    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Product, BackendError> {
        let id_filter = format!("eq.{}", id);
        let resp = self
            .data_request(Method::PATCH, "products")
            .query(&[("id", id_filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&ProductPatchRow::from(patch))
            .send()
            .await
            .map_err(net)?;
        let rows: Vec<ProductRow> = Self::decode(resp).await?;
        rows.into_iter()
            .next()
            .map(Product::from)
            .ok_or(BackendError::NotFound)
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        let id_filter = format!("eq.{}", id);
        let resp = self
            .data_request(Method::DELETE, "products")
            .query(&[("id", id_filter.as_str())])
            .send()
            .await
            .map_err(net)?;
        Self::check(resp).await.map(|_| ())
    }
}

#[async_trait]
impl OrderStore for RestBackend {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, BackendError> {
        let resp = self
            .data_request(Method::POST, "orders")
            .header("Prefer", "return=representation")
            .json(&NewOrderRow::from(order))
            .send()
            .await
            .map_err(net)?;
        let rows: Vec<OrderRow> = Self::decode(resp).await?;
        rows.into_iter()
            .next()
            .map(Order::from)
            .ok_or_else(|| BackendError::Decode("insert returned no row".to_string()))
    }

    async fn insert_items(&self, items: Vec<NewOrderItem>) -> Result<(), BackendError> {
        let rows: Vec<NewOrderItemRow> = items.into_iter().map(NewOrderItemRow::from).collect();
        let resp = self
            .data_request(Method::POST, "order_items")
            .json(&rows)
            .send()
            .await
            .map_err(net)?;
        Self::check(resp).await.map(|_| ())
    }

    async fn update_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<(), BackendError> {
        let id_filter = format!("eq.{}", order_id);
        let resp = self
            .data_request(Method::PATCH, "orders")
            .query(&[("id", id_filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&json!({ "status": status.as_str() }))
            .send()
            .await
            .map_err(net)?;
        let rows: Vec<OrderRow> = Self::decode(resp).await?;
        if rows.is_empty() {
            return Err(BackendError::NotFound);
        }
        Ok(())
    }

    async fn orders_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<OrderWithItems>, BackendError> {
        let user_filter = format!("eq.{}", user_id);
        let resp = self
            .data_request(Method::GET, "orders")
            .query(&[
                ("select", "*,order_items(*)"),
                ("user_id", user_filter.as_str()),
                ("order", "created_at.desc"),
            ])
            .send()
            .await
            .map_err(net)?;
        let rows: Vec<OrderWithItemsRow> = Self::decode(resp).await?;
        Ok(rows.into_iter().map(OrderWithItems::from).collect())
    }

    async fn recent_orders(&self, limit: i64) -> Result<Vec<OrderWithItems>, BackendError> {
        let limit = limit.to_string();
        let resp = self
            .data_request(Method::GET, "orders")
            .query(&[
                ("select", "*,order_items(*)"),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(net)?;
        let rows: Vec<OrderWithItemsRow> = Self::decode(resp).await?;
        Ok(rows.into_iter().map(OrderWithItems::from).collect())
    }

    async fn pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Order>, BackendError> {
        let cutoff_filter = format!("lt.{}", cutoff.to_rfc3339());
        let resp = self
            .data_request(Method::GET, "orders")
            .query(&[
                ("select", "*"),
                ("status", "eq.pending"),
                ("created_at", cutoff_filter.as_str()),
                ("order", "created_at.asc"),
            ])
            .send()
            .await
            .map_err(net)?;
        let rows: Vec<OrderRow> = Self::decode(resp).await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }
}

#[async_trait]
impl ProfileStore for RestBackend {
    async fn find(&self, user_id: Uuid) -> Result<Option<Profile>, BackendError> {
        let id_filter = format!("eq.{}", user_id);
        let resp = self
            .data_request(Method::GET, "profiles")
            .query(&[("select", "*"), ("id", id_filter.as_str())])
            .send()
            .await
            .map_err(net)?;
        let rows: Vec<Profile> = Self::decode(resp).await?;
        Ok(rows.into_iter().next())
    }

    async fn update(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Profile, BackendError> {
        let id_filter = format!("eq.{}", user_id);
        let resp = self
            .data_request(Method::PATCH, "profiles")
            .query(&[("id", id_filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&update)
            .send()
            .await
            .map_err(net)?;
        let rows: Vec<Profile> = Self::decode(resp).await?;
        rows.into_iter().next().ok_or(BackendError::NotFound)
    }
}

#[async_trait]
impl AuthApi for RestBackend {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthSession, BackendError> {
        let resp = self
            .auth_request(Method::POST, "signup")
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name }
            }))
            .send()
            .await
            .map_err(net)?;
        let session: SessionRow = Self::decode(resp).await?;
        Ok(session.into())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let resp = self
            .auth_request(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(net)?;
        let session: SessionRow = Self::decode(resp).await?;
        Ok(session.into())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let resp = self
            .auth_request(Method::POST, "logout")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(net)?;
        Self::check(resp).await.map(|_| ())
    }

    async fn current_user(
        &self,
        access_token: &str,
    ) -> Result<Option<SessionUser>, BackendError> {
        let resp = self
            .auth_request(Method::GET, "user")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(net)?;
        // An unusable token is an anonymous caller, not a failure.
        if matches!(
            resp.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }
        let user: UserRow = Self::decode(resp).await?;
        Ok(Some(user.into()))
    }

    async fn has_role(&self, user_id: Uuid, role: &str) -> Result<bool, BackendError> {
        let resp = self
            .data_request(Method::POST, "rpc/has_role")
            .json(&json!({ "_user_id": user_id, "_role": role }))
            .send()
            .await
            .map_err(net)?;
        let allowed: bool = Self::decode(resp).await?;
        Ok(allowed)
    }
}

#[async_trait]
impl ObjectStore for RestBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError> {
        let resp = self
            .storage_request(Method::POST, bucket, path)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(net)?;
        Self::check(resp).await?;
        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, path
        ))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError> {
        let resp = self
            .storage_request(Method::DELETE, bucket, "")
            .json(&json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(net)?;
        Self::check(resp).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_its_trailing_slash() {
        let backend = RestBackend::new("https://backend.test/", "key").unwrap();
        assert_eq!(backend.base_url, "https://backend.test");
    }

    #[test]
    fn ilike_pattern_drops_filter_grammar_characters() {
        assert_eq!(ilike_pattern("geode"), "*geode*");
        assert_eq!(ilike_pattern("a,b(c)\"d"), "*abcd*");
        assert_eq!(ilike_pattern("  quartz  "), "*quartz*");
    }

    #[test]
    fn error_message_reads_each_api_dialect() {
        assert_eq!(
            error_message(r#"{"message":"duplicate key"}"#).as_deref(),
            Some("duplicate key")
        );
        assert_eq!(
            error_message(r#"{"error_description":"Invalid login credentials"}"#).as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(
            error_message(r#"{"msg":"bad token"}"#).as_deref(),
            Some("bad token")
        );
        assert_eq!(error_message("not json"), None);
    }
}
