pub mod application;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use bigdecimal::BigDecimal;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::accounts::AccountService;
use application::admin::AdminService;
use application::cart_store::CartStore;
use application::catalog::CatalogService;
use application::checkout::CheckoutSequence;
use domain::ports::{Backend, CartArchive};

/// Image uploads arrive as raw request bodies.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared handles behind every request handler.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub carts: Arc<CartStore>,
    pub checkout: Arc<CheckoutSequence>,
    pub accounts: Arc<AccountService>,
    pub admin: Arc<AdminService>,
}

impl AppState {
    /// Wires every service to one backend. `shipping_fee` is the flat
    /// per-order delivery charge added at checkout.
    pub fn new(
        backend: Backend,
        archive: Arc<dyn CartArchive>,
        shipping_fee: BigDecimal,
    ) -> Self {
        let carts = Arc::new(CartStore::new(archive));
        let catalog = Arc::new(CatalogService::new(
            backend.products.clone(),
            backend.objects.clone(),
        ));
        let checkout = Arc::new(CheckoutSequence::new(
            backend.orders.clone(),
            carts.clone(),
            shipping_fee,
        ));
        let accounts = Arc::new(AccountService::new(
            backend.auth.clone(),
            backend.profiles.clone(),
            backend.orders.clone(),
        ));
        let admin = Arc::new(AdminService::new(backend.auth, backend.orders));

        Self {
            catalog,
            carts,
            checkout,
            accounts,
            admin,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::cart::view_cart,
        handlers::cart::add_item,
        handlers::cart::update_item,
        handlers::cart::remove_item,
        handlers::cart::clear_cart,
        handlers::checkout::summary,
        handlers::checkout::submit,
        handlers::auth::sign_up,
        handlers::auth::sign_in,
        handlers::auth::sign_out,
        handlers::auth::session,
        handlers::profile::get_profile,
        handlers::profile::update_profile,
        handlers::profile::order_history,
        handlers::admin::recent_orders,
        handlers::admin::stale_orders,
        handlers::admin::set_status,
        handlers::admin::create_product,
        handlers::admin::update_product,
        handlers::admin::delete_product,
        handlers::admin::upload_image,
    ),
    tags(
        (name = "catalog", description = "Browse the specimen catalog"),
        (name = "cart", description = "Per-session shopping cart"),
        (name = "checkout", description = "Turn a cart into an order"),
        (name = "auth", description = "Accounts and sessions"),
        (name = "profile", description = "The signed-in account's profile and orders"),
        (name = "admin", description = "Back office, requires the admin role"),
    )
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
            .service(
                web::scope("/products")
                    .route("", web::get().to(handlers::products::list_products))
                    .route("/{id}", web::get().to(handlers::products::get_product)),
            )
            .service(
                web::scope("/cart")
                    .route("", web::get().to(handlers::cart::view_cart))
                    .route("", web::delete().to(handlers::cart::clear_cart))
                    .route("/items", web::post().to(handlers::cart::add_item))
                    .route("/items/{product_id}", web::patch().to(handlers::cart::update_item))
                    .route(
                        "/items/{product_id}",
                        web::delete().to(handlers::cart::remove_item),
                    ),
            )
            .service(
                web::scope("/checkout")
                    .route("", web::post().to(handlers::checkout::submit))
                    .route("/summary", web::get().to(handlers::checkout::summary)),
            )
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(handlers::auth::sign_up))
                    .route("/signin", web::post().to(handlers::auth::sign_in))
                    .route("/signout", web::post().to(handlers::auth::sign_out))
                    .route("/session", web::get().to(handlers::auth::session)),
            )
            .service(
                web::scope("/profile")
                    .route("", web::get().to(handlers::profile::get_profile))
                    .route("", web::put().to(handlers::profile::update_profile))
                    .route("/orders", web::get().to(handlers::profile::order_history)),
            )
            .service(
                // "/products/images" is registered before "/products/{id}" so
                // the literal segment wins the match.
                web::scope("/admin")
                    .route("/orders", web::get().to(handlers::admin::recent_orders))
                    .route("/orders/stale", web::get().to(handlers::admin::stale_orders))
                    .route(
                        "/orders/{id}/status",
                        web::put().to(handlers::admin::set_status),
                    )
                    .route("/products", web::post().to(handlers::admin::create_product))
                    .route(
                        "/products/images",
                        web::post().to(handlers::admin::upload_image),
                    )
                    .route(
                        "/products/{id}",
                        web::put().to(handlers::admin::update_product),
                    )
                    .route(
                        "/products/{id}",
                        web::delete().to(handlers::admin::delete_product),
                    ),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
