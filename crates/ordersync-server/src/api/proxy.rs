//! Storefront app proxy channel, called from the order confirmation page.
//!
//! Shopify forwards `GET /apps/<prefix>/save-order-metafield?order_id=...`
//! here with `shop`, `timestamp` and a `signature` appended. The storefront
//! only knows the order id, so the order is loaded from the Admin API with
//! the shop's offline token before it is normalized.

use axum::{extract::Query, extract::State, http::StatusCode, Json};
use ordersync_core::ExternalId;
use ordersync_metafield::SyncOutcome;
use ordersync_shopify::{normalize_order, verify, OrderPayload};
use serde::Serialize;

use super::{forward_order, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ProxyReply {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_id: Option<ExternalId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
}

fn saved(order_id: ExternalId) -> (StatusCode, Json<ProxyReply>) {
    (
        StatusCode::OK,
        Json(ProxyReply {
            ok: true,
            order_id: Some(order_id),
            error: None,
        }),
    )
}

fn failed(status: StatusCode, error: &'static str) -> (StatusCode, Json<ProxyReply>) {
    (
        status,
        Json(ProxyReply {
            ok: false,
            order_id: None,
            error: Some(error),
        }),
    )
}

pub(super) async fn save_order_metafield(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> (StatusCode, Json<ProxyReply>) {
    let Some(order_id) = verify::query_value(&query, "order_id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
    else {
        return failed(StatusCode::BAD_REQUEST, "missing order_id");
    };

    if let Err(e) = verify::verify_proxy_signature(&state.config.shopify_api_secret, &query) {
        tracing::warn!(error = %e, "app proxy rejected: signature verification failed");
        return failed(StatusCode::FORBIDDEN, "invalid app proxy");
    }

    let shop = verify::query_value(&query, "shop")
        .map(|s| s.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let Some(access_token) = state.config.shop_access_tokens.get(&shop) else {
        tracing::warn!(%shop, "app proxy rejected: no access token for shop");
        return failed(StatusCode::FORBIDDEN, "app not installed or session missing");
    };

    let response = match state.admin.fetch_order(&shop, access_token, order_id).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(%shop, order_id, error = %e, "order query failed");
            return failed(StatusCode::BAD_GATEWAY, "failed to load order");
        }
    };

    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        tracing::error!(%shop, order_id, errors = ?messages, "order query returned errors");
        return failed(StatusCode::NOT_FOUND, "order not found or access denied");
    }

    let Some(order) = response.data.and_then(|data| data.order) else {
        return failed(StatusCode::NOT_FOUND, "order not found");
    };

    let normalized = match normalize_order(&shop, OrderPayload::Query(order)) {
        Ok(normalized) => normalized,
        Err(e) => {
            tracing::error!(%shop, order_id, error = %e, "queried order has no id");
            return failed(StatusCode::BAD_REQUEST, "order id missing");
        }
    };
    let resolved_id = normalized.order_id.clone();

    match forward_order(&state, "app_proxy", normalized).await {
        SyncOutcome::Accepted => saved(resolved_id),
        SyncOutcome::DownstreamRejected { .. } => {
            failed(StatusCode::BAD_GATEWAY, "backend error")
        }
        SyncOutcome::TransportFailure { .. } => {
            failed(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}
