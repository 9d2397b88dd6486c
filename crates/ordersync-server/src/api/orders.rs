use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use ordersync_metafield::{body_excerpt, PassthroughResponse};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// Characters of a non-2xx downstream body echoed back to the operator.
const ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub(super) struct OrderLookupQuery {
    pub shop: Option<String>,
    pub order_id: Option<String>,
}

impl OrderLookupQuery {
    fn require(self, request_id: &str) -> Result<(String, String), ApiError> {
        let trimmed = |value: Option<String>| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        match (trimmed(self.shop), trimmed(self.order_id)) {
            (Some(shop), Some(order_id)) => Ok((shop, order_id)),
            (None, _) => Err(ApiError::new(
                request_id,
                "validation_error",
                "missing shop",
            )),
            (_, None) => Err(ApiError::new(
                request_id,
                "validation_error",
                "missing order_id",
            )),
        }
    }
}

pub(super) async fn get_order_metafield(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OrderLookupQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let (shop, order_id) = query.require(&req_id.0)?;

    let response = state
        .metafield
        .get_order_metafield(&shop, &order_id)
        .await
        .map_err(|e| {
            tracing::error!(%shop, %order_id, error = %e, "order metafield lookup failed");
            ApiError::new(
                req_id.0.clone(),
                "bad_gateway",
                "failed to fetch order metafield",
            )
        })?;

    if !response.is_success() {
        let text = response.text();
        return Err(ApiError::new(
            req_id.0,
            "bad_gateway",
            format!(
                "API returned {}: {}",
                response.status,
                body_excerpt(&text, ERROR_BODY_CHARS)
            ),
        ));
    }

    // A 2xx body that is not JSON is reported as `null` data.
    let data = serde_json::from_slice(&response.body).unwrap_or(serde_json::Value::Null);

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_order_images_zip(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OrderLookupQuery>,
) -> Result<Response, ApiError> {
    let (shop, order_id) = query.require(&req_id.0)?;

    let response = state
        .metafield
        .get_order_images_zip(&shop, &order_id)
        .await
        .map_err(|e| {
            tracing::error!(%shop, %order_id, error = %e, "order images zip download failed");
            ApiError::new(
                req_id.0.clone(),
                "bad_gateway",
                "failed to fetch order images",
            )
        })?;

    Ok(zip_response(response, &order_id))
}

fn zip_response(upstream: PassthroughResponse, order_id: &str) -> Response {
    if !upstream.is_success() {
        let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let text = upstream.text();
        let message = if text.is_empty() {
            format!("Upstream error {}", upstream.status)
        } else {
            text
        };
        return (status, message).into_response();
    }

    let content_type = upstream
        .content_type
        .unwrap_or_else(|| "application/zip".to_owned());
    let content_disposition = upstream
        .content_disposition
        .unwrap_or_else(|| format!("attachment; filename=\"order-{order_id}-images.zip\""));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, content_disposition),
        ],
        upstream.body,
    )
        .into_response()
}
