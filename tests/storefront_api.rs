//! API tests: every test boots the real actix-web server on a free port,
//! backed by the in-memory backend, and talks to it over HTTP.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;
use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

use storefront_service::domain::order::OrderStatus;
use storefront_service::domain::ports::ProductStore;
use storefront_service::domain::product::NewProduct;
use storefront_service::infrastructure::cart_archive::MemoryCartArchive;
use storefront_service::infrastructure::memory::{FailurePoint, MemoryBackend};
use storefront_service::{build_server, AppState};

const SESSION_HEADER: &str = "X-Session-Id";

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("failed to bind a probe socket")
        .local_addr()
        .expect("probe socket has no local address")
        .port()
}

/// Wait until `url` answers at all, retrying until `timeout`. Panics if the
/// server never comes up.
async fn wait_for_http(url: &str, timeout: Duration) {
    let client = Client::new();
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if tokio::time::Instant::now() > deadline {
            panic!("server at {} did not become ready within {:?}", url, timeout);
        }
        // Any HTTP response (even 4xx) means the server is up.
        if client.get(url).send().await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

struct TestApp {
    url: String,
    http: Client,
    backend: Arc<MemoryBackend>,
}

async fn spawn_app() -> TestApp {
    let backend = Arc::new(MemoryBackend::new());
    let state = AppState::new(
        backend.clone().into_backend(),
        Arc::new(MemoryCartArchive::default()),
        BigDecimal::from(75),
    );

    let port = free_port();
    let server = build_server(state, "127.0.0.1", port).expect("failed to bind the test server");
    tokio::spawn(server);

    let url = format!("http://127.0.0.1:{}", port);
    wait_for_http(&format!("{}/products", url), Duration::from_secs(5)).await;

    TestApp {
        url,
        http: Client::new(),
        backend,
    }
}

fn shipping_form() -> Value {
    json!({
        "email": "ada@example.com",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "address": "1 Analytical Way",
        "city": "London",
        "zip": "N1 9GU",
        "country": "United Kingdom"
    })
}

impl TestApp {
    /// Seeds a product straight into the backend and returns its id.
    async fn seed_product(
        &self,
        name: &str,
        category: &str,
        price: i32,
        featured: bool,
    ) -> String {
        self.backend
            .insert(NewProduct {
                name: name.to_string(),
                price: BigDecimal::from(price),
                image: format!("https://images.test/{}.jpg", name.replace(' ', "-")),
                images: vec![],
                origin: "Brazil".to_string(),
                category: category.to_string(),
                age: None,
                weight: None,
                dimensions: None,
                description: "A fine specimen".to_string(),
                story: "Dug up with care".to_string(),
                featured,
                stock: 3,
            })
            .await
            .expect("seeding a product failed")
            .id
    }

    async fn sign_up(&self, email: &str) -> Value {
        let resp = self
            .http
            .post(format!("{}/auth/signup", self.url))
            .json(&json!({
                "email": email,
                "password": "correct-horse",
                "full_name": "Ada Lovelace"
            }))
            .send()
            .await
            .expect("signup request failed");
        assert_eq!(resp.status(), 201);
        resp.json().await.expect("signup body was not json")
    }

    async fn user_token(&self, email: &str) -> String {
        self.sign_up(email).await["access_token"]
            .as_str()
            .expect("signup response missing access_token")
            .to_string()
    }

    /// Registers an account and grants it the admin role.
    async fn admin_token(&self) -> String {
        let session = self.sign_up("curator@example.com").await;
        let user_id = Uuid::parse_str(session["user_id"].as_str().expect("missing user_id"))
            .expect("user_id was not a uuid");
        self.backend.grant_role(user_id, "admin");
        session["access_token"]
            .as_str()
            .expect("signup response missing access_token")
            .to_string()
    }

    async fn add_to_cart(&self, session: &str, product_id: &str, quantity: i32) -> Value {
        let resp = self
            .http
            .post(format!("{}/cart/items", self.url))
            .header(SESSION_HEADER, session)
            .json(&json!({ "product_id": product_id, "quantity": quantity }))
            .send()
            .await
            .expect("cart add request failed");
        assert_eq!(resp.status(), 200);
        resp.json().await.expect("cart body was not json")
    }

    async fn cart(&self, session: &str) -> Value {
        let resp = self
            .http
            .get(format!("{}/cart", self.url))
            .header(SESSION_HEADER, session)
            .send()
            .await
            .expect("cart request failed");
        assert_eq!(resp.status(), 200);
        resp.json().await.expect("cart body was not json")
    }

    async fn checkout(
        &self,
        session: &str,
        token: Option<&str>,
        form: &Value,
    ) -> reqwest::Response {
        let mut req = self
            .http
            .post(format!("{}/checkout", self.url))
            .header(SESSION_HEADER, session)
            .json(form);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("checkout request failed")
    }
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn products_are_listed_newest_first() {
    let app = spawn_app().await;
    app.seed_product("Amethyst Geode", "Crystal", 100, true).await;
    app.seed_product("Trilobite", "Fossil", 60, false).await;

    let resp = app
        .http
        .get(format!("{}/products", app.url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "Trilobite");
    assert_eq!(items[1]["name"], "Amethyst Geode");
    assert_eq!(items[1]["price"], "100");
    assert!(items[1]["created_at"].as_str().is_some());
}

#[tokio::test]
async fn category_featured_and_search_filters_apply() {
    let app = spawn_app().await;
    app.seed_product("Amethyst Geode", "Crystal", 100, true).await;
    app.seed_product("Quartz Cluster", "Crystal", 40, false).await;
    app.seed_product("Trilobite", "Fossil", 60, false).await;

    let by_category: Value = app
        .http
        .get(format!("{}/products?category=Crystal", app.url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_category.as_array().unwrap().len(), 2);

    let featured: Value = app
        .http
        .get(format!("{}/products?featured=true", app.url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(featured.as_array().unwrap().len(), 1);
    assert_eq!(featured[0]["name"], "Amethyst Geode");

    let searched: Value = app
        .http
        .get(format!("{}/products?search=trilo", app.url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(searched.as_array().unwrap().len(), 1);
    assert_eq!(searched[0]["name"], "Trilobite");
}

#[tokio::test]
async fn unknown_product_answers_404() {
    let app = spawn_app().await;

    let resp = app
        .http
        .get(format!("{}/products/{}", app.url, Uuid::new_v4()))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Not found");
}

// ── Cart ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cart_routes_require_the_session_header() {
    let app = spawn_app().await;

    let resp = app.http.get(format!("{}/cart", app.url)).send().await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "X-Session-Id header is required");

    let resp = app
        .http
        .post(format!("{}/cart/items", app.url))
        .json(&json!({ "product_id": "p1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn repeated_adds_merge_and_the_total_follows() {
    let app = spawn_app().await;
    let geode = app.seed_product("Amethyst Geode", "Crystal", 100, false).await;
    let fossil = app.seed_product("Trilobite", "Fossil", 50, false).await;

    app.add_to_cart("s1", &geode, 2).await;
    app.add_to_cart("s1", &geode, 1).await;
    let cart = app.add_to_cart("s1", &fossil, 1).await;

    let lines = cart["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["quantity"], 3);
    assert_eq!(lines[0]["line_total"], "300");
    assert_eq!(cart["item_count"], 4);
    assert_eq!(cart["total"], "350");
}

#[tokio::test]
async fn quantity_zero_or_below_removes_the_line() {
    let app = spawn_app().await;
    let geode = app.seed_product("Amethyst Geode", "Crystal", 100, false).await;
    app.add_to_cart("s1", &geode, 2).await;

    let resp = app
        .http
        .patch(format!("{}/cart/items/{}", app.url, geode))
        .header(SESSION_HEADER, "s1")
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let cart: Value = resp.json().await.unwrap();
    assert!(cart["lines"].as_array().unwrap().is_empty());

    app.add_to_cart("s1", &geode, 2).await;
    let resp = app
        .http
        .patch(format!("{}/cart/items/{}", app.url, geode))
        .header(SESSION_HEADER, "s1")
        .json(&json!({ "quantity": -3 }))
        .send()
        .await
        .unwrap();
    let cart: Value = resp.json().await.unwrap();
    assert!(cart["lines"].as_array().unwrap().is_empty());
    assert_eq!(cart["total"], "0");
}

#[tokio::test]
async fn removing_an_absent_product_leaves_the_cart_alone() {
    let app = spawn_app().await;
    let geode = app.seed_product("Amethyst Geode", "Crystal", 100, false).await;
    app.add_to_cart("s1", &geode, 1).await;

    let resp = app
        .http
        .delete(format!("{}/cart/items/not-in-the-cart", app.url))
        .header(SESSION_HEADER, "s1")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn carts_are_isolated_per_session() {
    let app = spawn_app().await;
    let geode = app.seed_product("Amethyst Geode", "Crystal", 100, false).await;
    let fossil = app.seed_product("Trilobite", "Fossil", 50, false).await;

    app.add_to_cart("s1", &geode, 1).await;
    app.add_to_cart("s2", &fossil, 2).await;

    let first = app.cart("s1").await;
    let second = app.cart("s2").await;
    assert_eq!(first["lines"][0]["name"], "Amethyst Geode");
    assert_eq!(second["lines"][0]["name"], "Trilobite");
    assert_eq!(second["total"], "100");
}

#[tokio::test]
async fn adding_an_unknown_product_is_404() {
    let app = spawn_app().await;

    let resp = app
        .http
        .post(format!("{}/cart/items", app.url))
        .header(SESSION_HEADER, "s1")
        .json(&json!({ "product_id": "ghost" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
}

// ── Checkout ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn checkout_summary_previews_the_flat_fee() {
    let app = spawn_app().await;
    let geode = app.seed_product("Amethyst Geode", "Crystal", 100, false).await;
    app.add_to_cart("s1", &geode, 2).await;

    let resp = app
        .http
        .get(format!("{}/checkout/summary", app.url))
        .header(SESSION_HEADER, "s1")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["subtotal"], "200");
    assert_eq!(body["shipping_fee"], "75");
    assert_eq!(body["total"], "275");
    assert!(app.backend.orders().is_empty());
}

#[tokio::test]
async fn checkout_requires_a_signed_in_account() {
    let app = spawn_app().await;
    let geode = app.seed_product("Amethyst Geode", "Crystal", 100, false).await;
    app.add_to_cart("s1", &geode, 1).await;

    let resp = app.checkout("s1", None, &shipping_form()).await;

    assert_eq!(resp.status(), 401);
    assert!(app.backend.orders().is_empty());
    assert_eq!(app.cart("s1").await["lines"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn checkout_with_an_empty_cart_is_rejected() {
    let app = spawn_app().await;
    let token = app.user_token("ada@example.com").await;

    let resp = app.checkout("s1", Some(&token), &shipping_form()).await;

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Cart is empty");
    assert!(app.backend.orders().is_empty());
}

#[tokio::test]
async fn checkout_with_a_blank_field_is_rejected() {
    let app = spawn_app().await;
    let geode = app.seed_product("Amethyst Geode", "Crystal", 100, false).await;
    app.add_to_cart("s1", &geode, 1).await;
    let token = app.user_token("ada@example.com").await;

    let mut form = shipping_form();
    form["zip"] = json!("   ");
    let resp = app.checkout("s1", Some(&token), &form).await;

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Missing required field: zip");
    assert!(app.backend.orders().is_empty());
}

#[tokio::test]
async fn successful_checkout_creates_a_processing_order_and_empties_the_cart() {
    let app = spawn_app().await;
    let geode = app.seed_product("Amethyst Geode", "Crystal", 100, false).await;
    app.add_to_cart("s1", &geode, 1).await;
    let token = app.user_token("ada@example.com").await;

    let resp = app.checkout("s1", Some(&token), &shipping_form()).await;
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["subtotal"], "100");
    assert_eq!(body["shipping_fee"], "75");
    assert_eq!(body["total"], "175");
    assert_eq!(body["status"], "processing");
    let order_id = Uuid::parse_str(body["order_id"].as_str().unwrap()).unwrap();

    assert!(app.cart("s1").await["lines"].as_array().unwrap().is_empty());

    let orders = app.backend.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, order_id);
    assert_eq!(orders[0].status, OrderStatus::Processing);
    assert_eq!(orders[0].shipping_name, "Ada Lovelace");
    assert_eq!(app.backend.items_for(order_id).len(), 1);

    // The order shows up in the account's history with its item snapshot.
    let history: Value = app
        .http
        .get(format!("{}/profile/orders", app.url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["status"], "processing");
    assert_eq!(history[0]["items"][0]["product_name"], "Amethyst Geode");
}

#[tokio::test]
async fn failed_item_write_answers_502_and_preserves_the_cart() {
    let app = spawn_app().await;
    let geode = app.seed_product("Amethyst Geode", "Crystal", 100, false).await;
    app.add_to_cart("s1", &geode, 1).await;
    let token = app.user_token("ada@example.com").await;
    app.backend.fail_at(FailurePoint::InsertItems);

    let resp = app.checkout("s1", Some(&token), &shipping_form()).await;

    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    let stranded = Uuid::parse_str(body["order_id"].as_str().unwrap()).unwrap();

    let orders = app.backend.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Pending);
    assert!(app.backend.items_for(stranded).is_empty());
    assert_eq!(app.cart("s1").await["lines"].as_array().unwrap().len(), 1);

    // Once the backend recovers the same cart checks out cleanly; the
    // stranded header stays pending for the back office.
    app.backend.clear_failure();
    let resp = app.checkout("s1", Some(&token), &shipping_form()).await;
    assert_eq!(resp.status(), 201);
    assert_eq!(app.backend.orders().len(), 2);
}

#[tokio::test]
async fn cart_lines_keep_their_snapshot_through_catalog_changes() {
    let app = spawn_app().await;
    let geode = app.seed_product("Amethyst Geode", "Crystal", 100, false).await;
    app.add_to_cart("s1", &geode, 1).await;
    let admin = app.admin_token().await;

    let resp = app
        .http
        .put(format!("{}/admin/products/{}", app.url, geode))
        .bearer_auth(&admin)
        .json(&json!({ "price": "999", "name": "Renamed Geode" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let cart = app.cart("s1").await;
    assert_eq!(cart["lines"][0]["unit_price"], "100");
    assert_eq!(cart["lines"][0]["name"], "Amethyst Geode");

    let resp = app
        .http
        .delete(format!("{}/admin/products/{}", app.url, geode))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    // The deleted product still checks out at its captured price, and the
    // persisted item carries the original snapshot.
    let resp = app.checkout("s1", Some(&admin), &shipping_form()).await;
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["subtotal"], "100");

    let order_id = Uuid::parse_str(body["order_id"].as_str().unwrap()).unwrap();
    let items = app.backend.items_for(order_id);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_name, "Amethyst Geode");
    assert_eq!(items[0].unit_price, BigDecimal::from(100));
}

// ── Accounts ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_is_provisioned_and_updates_merge() {
    let app = spawn_app().await;
    let token = app.user_token("ada@example.com").await;

    let profile: Value = app
        .http
        .get(format!("{}/profile", app.url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["full_name"], "Ada Lovelace");
    assert_eq!(profile["email"], "ada@example.com");

    let updated: Value = app
        .http
        .put(format!("{}/profile", app.url))
        .bearer_auth(&token)
        .json(&json!({ "city": "London", "phone": "+44 20 7946 0000" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["city"], "London");
    assert_eq!(updated["full_name"], "Ada Lovelace");

    let resp = app.http.get(format!("{}/profile", app.url)).send().await.unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn signout_invalidates_the_token() {
    let app = spawn_app().await;
    let token = app.user_token("ada@example.com").await;

    let resp = app
        .http
        .post(format!("{}/auth/signout", app.url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = app
        .http
        .get(format!("{}/auth/session", app.url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn signin_with_wrong_credentials_is_rejected() {
    let app = spawn_app().await;
    app.user_token("ada@example.com").await;

    let resp = app
        .http
        .post(format!("{}/auth/signin", app.url))
        .json(&json!({ "email": "ada@example.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid login credentials");
}

// ── Back office ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_routes_are_gated_by_role() {
    let app = spawn_app().await;

    let resp = app
        .http
        .get(format!("{}/admin/orders", app.url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let token = app.user_token("visitor@example.com").await;
    let resp = app
        .http
        .get(format!("{}/admin/orders", app.url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Access denied");
}

#[tokio::test]
async fn admin_sees_recent_orders_and_overwrites_status() {
    let app = spawn_app().await;
    let geode = app.seed_product("Amethyst Geode", "Crystal", 100, false).await;
    app.add_to_cart("s1", &geode, 1).await;
    let token = app.user_token("ada@example.com").await;
    let resp = app.checkout("s1", Some(&token), &shipping_form()).await;
    let order_id = resp.json::<Value>().await.unwrap()["order_id"]
        .as_str()
        .unwrap()
        .to_string();

    let admin = app.admin_token().await;
    let orders: Value = app
        .http
        .get(format!("{}/admin/orders", app.url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["id"], order_id.as_str());
    assert_eq!(orders[0]["items"].as_array().unwrap().len(), 1);

    // Any status may follow any other, including going backwards.
    for status in ["shipped", "pending", "delivered"] {
        let resp = app
            .http
            .put(format!("{}/admin/orders/{}/status", app.url, order_id))
            .bearer_auth(&admin)
            .json(&json!({ "status": status }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);
    }
    assert_eq!(app.backend.orders()[0].status, OrderStatus::Delivered);

    let resp = app
        .http
        .put(format!("{}/admin/orders/{}/status", app.url, order_id))
        .bearer_auth(&admin)
        .json(&json!({ "status": "refunded" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = app
        .http
        .put(format!("{}/admin/orders/{}/status", app.url, Uuid::new_v4()))
        .bearer_auth(&admin)
        .json(&json!({ "status": "shipped" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn stale_pending_orders_are_listed_for_review() {
    let app = spawn_app().await;
    let geode = app.seed_product("Amethyst Geode", "Crystal", 100, false).await;
    app.add_to_cart("s1", &geode, 1).await;
    let token = app.user_token("ada@example.com").await;
    app.backend.fail_at(FailurePoint::InsertItems);
    let resp = app.checkout("s1", Some(&token), &shipping_form()).await;
    assert_eq!(resp.status(), 502);

    let admin = app.admin_token().await;
    let stale: Value = app
        .http
        .get(format!("{}/admin/orders/stale?hours=0", app.url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(stale.as_array().unwrap().len(), 1);
    assert_eq!(stale[0]["status"], "pending");
    assert!(stale[0]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn admin_uploads_an_image_and_manages_the_product() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let resp = app
        .http
        .post(format!(
            "{}/admin/products/images?filename=geode front.jpg",
            app.url
        ))
        .bearer_auth(&admin)
        .header("Content-Type", "image/jpeg")
        .body(vec![0xffu8, 0xd8, 0xff, 0xe0])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let upload: Value = resp.json().await.unwrap();
    let url = upload["url"].as_str().unwrap().to_string();
    assert!(url.contains("/product-images/products/"));
    assert!(url.ends_with("geode_front.jpg"));

    let resp = app
        .http
        .post(format!("{}/admin/products", app.url))
        .bearer_auth(&admin)
        .json(&json!({
            "name": "Amethyst Geode",
            "price": "1250.50",
            "image": url,
            "origin": "Uruguay",
            "category": "Crystal",
            "description": "Deep purple points",
            "featured": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["price"], "1250.50");
    assert_eq!(created["stock"], 1);
    let id = created["id"].as_str().unwrap().to_string();

    let fetched: Value = app
        .http
        .get(format!("{}/products/{}", app.url, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["image"], url.as_str());

    // Deleting the product also clears its stored image.
    assert_eq!(app.backend.stored_objects("product-images").len(), 1);
    let resp = app
        .http
        .delete(format!("{}/admin/products/{}", app.url, id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
    assert!(app.backend.stored_objects("product-images").is_empty());
}

#[tokio::test]
async fn product_create_rejects_an_unparseable_price() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let resp = app
        .http
        .post(format!("{}/admin/products", app.url))
        .bearer_auth(&admin)
        .json(&json!({
            "name": "Mystery Rock",
            "price": "a lot",
            "origin": "Unknown",
            "category": "Crystal"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid price 'a lot'");
}
