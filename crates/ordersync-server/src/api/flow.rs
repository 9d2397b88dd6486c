//! Shopify Flow "Send HTTP request" channel.
//!
//! Expected body: `{"shop": "<shop>.myshopify.com", "order": {...}}` where
//! `order` is mapped by the merchant to the webhook shape. The shared secret
//! is checked by middleware before this handler runs.

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use ordersync_metafield::SyncOutcome;
use ordersync_shopify::{normalize_order, resolve_order_id, OrderPayload, SourceOrder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{forward_order, AppState};

#[derive(Debug, Default, Serialize)]
pub(super) struct FlowReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
}

impl FlowReply {
    fn ok() -> (StatusCode, Json<Self>) {
        (
            StatusCode::OK,
            Json(Self {
                ok: Some(true),
                ..Self::default()
            }),
        )
    }

    fn error(status: StatusCode, message: &'static str) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                error: Some(message),
                ..Self::default()
            }),
        )
    }
}

pub(super) async fn order_created(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<FlowReply>) {
    let Ok(body) = serde_json::from_slice::<Value>(&body) else {
        return FlowReply::error(StatusCode::BAD_REQUEST, "Invalid JSON");
    };

    let shop = body
        .get("shop")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let order = body.get("order").filter(|order| is_present(order));
    let (Some(shop), Some(order)) = (shop, order) else {
        return FlowReply::error(StatusCode::BAD_REQUEST, "Missing shop or order in body");
    };

    if resolve_order_id(order).is_err() {
        tracing::warn!(%shop, "flow request rejected: no order id in payload");
        return FlowReply::error(StatusCode::BAD_REQUEST, "Order id not found in order payload");
    }

    let normalized = SourceOrder::deserialize(order)
        .ok()
        .and_then(|order| normalize_order(shop, OrderPayload::Automation(order)).ok());
    let Some(normalized) = normalized else {
        return FlowReply::error(StatusCode::BAD_REQUEST, "Order id not found in order payload");
    };

    match forward_order(&state, "flow", normalized).await {
        SyncOutcome::Accepted => FlowReply::ok(),
        SyncOutcome::DownstreamRejected { status, .. } => (
            StatusCode::BAD_GATEWAY,
            Json(FlowReply {
                error: Some("Downstream API error"),
                status: Some(status),
                ..FlowReply::default()
            }),
        ),
        SyncOutcome::TransportFailure { .. } => {
            FlowReply::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

/// `null`, `false`, `0` and `""` count as a missing order.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
