//! Router fixtures shared by the handler tests.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use ordersync_core::{AppConfig, Environment};
use ordersync_metafield::MetafieldClient;
use ordersync_shopify::AdminClient;
use tower::ServiceExt;

use super::{build_app, default_rate_limit_state, AppState};
use crate::middleware::AuthState;

pub const API_SECRET: &str = "shpss_test_secret";
pub const SHOP: &str = "demo.myshopify.com";
pub const SHOP_TOKEN: &str = "shpat_demo";
pub const OPERATOR_KEY: &str = "operator-key";

/// Config pointing the metafield client at `metafield_url` and, when given,
/// the Admin API client at `admin_url`.
pub fn test_config(metafield_url: &str, admin_url: Option<&str>) -> AppConfig {
    AppConfig {
        env: Environment::Test,
        bind_addr: "127.0.0.1:0".parse().expect("socket addr"),
        log_level: "debug".to_owned(),
        shopify_api_secret: API_SECRET.to_owned(),
        shopify_api_version: "2025-01".to_owned(),
        shopify_admin_base_url: admin_url.map(ToOwned::to_owned),
        shop_access_tokens: HashMap::from([(SHOP.to_owned(), SHOP_TOKEN.to_owned())]),
        shopify_request_timeout_secs: 5,
        flow_webhook_secret: None,
        metafield_api_url: metafield_url.to_owned(),
        metafield_request_timeout_secs: 5,
    }
}

/// Base URL of a local port with nothing listening on it.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

pub fn test_app(config: AppConfig) -> Router {
    let metafield = MetafieldClient::new(
        &config.metafield_api_url,
        config.metafield_request_timeout_secs,
    )
    .expect("metafield client");
    let admin = match config.shopify_admin_base_url.as_deref() {
        Some(base_url) => AdminClient::with_base_url(
            &config.shopify_api_version,
            config.shopify_request_timeout_secs,
            base_url,
        ),
        None => AdminClient::new(
            &config.shopify_api_version,
            config.shopify_request_timeout_secs,
        ),
    }
    .expect("admin client");

    let auth = AuthState::from_keys(OPERATOR_KEY, false).expect("auth");
    build_app(
        AppState {
            config: Arc::new(config),
            metafield: Arc::new(metafield),
            admin: Arc::new(admin),
        },
        auth,
        default_rate_limit_state(),
    )
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    (status, headers, body.to_vec())
}

pub fn json_body(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).expect("json body")
}
