//! `orders/create` webhook.
//!
//! Shopify retries any non-2xx answer, so once the payload has been
//! authenticated and normalized the handler always answers 200. Downstream
//! failures are logged and dropped.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use ordersync_shopify::{normalize_order, verify, OrderPayload, SourceOrder};

use super::{forward_order, AppState};

const HMAC_HEADER: &str = "x-shopify-hmac-sha256";
const TOPIC_HEADER: &str = "x-shopify-topic";
const SHOP_HEADER: &str = "x-shopify-shop-domain";
const ORDERS_CREATE_TOPIC: &str = "orders/create";

pub(super) async fn orders_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Err(e) = verify::verify_webhook_hmac(
        &state.config.shopify_api_secret,
        &body,
        header_text(&headers, HMAC_HEADER),
    ) {
        tracing::warn!(error = %e, "webhook rejected: HMAC verification failed");
        return StatusCode::UNAUTHORIZED;
    }

    let topic = header_text(&headers, TOPIC_HEADER).unwrap_or_default();
    if topic != ORDERS_CREATE_TOPIC {
        tracing::warn!(topic, "webhook rejected: unexpected topic");
        return StatusCode::BAD_REQUEST;
    }

    let Some(shop) = header_text(&headers, SHOP_HEADER).filter(|s| !s.is_empty()) else {
        tracing::warn!("webhook rejected: missing shop domain");
        return StatusCode::BAD_REQUEST;
    };

    let order = match serde_json::from_slice::<SourceOrder>(&body) {
        Ok(order) => order,
        Err(e) => {
            tracing::warn!(%shop, error = %e, "webhook rejected: payload is not an order");
            return StatusCode::BAD_REQUEST;
        }
    };

    let order = match normalize_order(shop, OrderPayload::Webhook(order)) {
        Ok(order) => order,
        Err(e) => {
            tracing::error!(%shop, error = %e, "webhook rejected: no order id in payload");
            return StatusCode::BAD_REQUEST;
        }
    };

    forward_order(&state, "webhook", order).await;
    StatusCode::OK
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
}
