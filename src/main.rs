use std::env;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use dotenvy::dotenv;
use storefront_service::infrastructure::cart_archive::JsonCartArchive;
use storefront_service::infrastructure::rest::RestBackend;
use storefront_service::{build_server, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let backend_url = env::var("BACKEND_URL").expect("BACKEND_URL must be set");
    let service_key = env::var("BACKEND_SERVICE_KEY").expect("BACKEND_SERVICE_KEY must be set");
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .expect("PORT must be a valid number");
    let shipping_fee =
        BigDecimal::from_str(&env::var("SHIPPING_FEE").unwrap_or_else(|_| "75".to_string()))
            .expect("SHIPPING_FEE must be a decimal number");
    let cart_dir = env::var("CART_DIR").unwrap_or_else(|_| "./carts".to_string());

    let backend = RestBackend::new(&backend_url, &service_key)
        .expect("Failed to build the backend client")
        .into_backend();
    let archive = Arc::new(JsonCartArchive::new(cart_dir)?);

    let state = AppState::new(backend, archive, shipping_fee);

    log::info!("Starting server at http://{}:{}", host, port);

    build_server(state, &host, port)?.await
}
