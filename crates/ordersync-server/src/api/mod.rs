mod flow;
mod orders;
mod proxy;
mod webhooks;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use ordersync_core::{AppConfig, NormalizedOrder};
use ordersync_metafield::{body_excerpt, MetafieldClient, SyncOutcome};
use ordersync_shopify::AdminClient;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, require_flow_secret, AuthState,
    FlowSecret, RateLimitState, RequestId,
};

/// Maximum characters of a rejected downstream body written to the log.
const LOGGED_BODY_CHARS: usize = 500;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub metafield: Arc<MetafieldClient>,
    pub admin: Arc<AdminClient>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    environment: String,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "bad_gateway" => StatusCode::BAD_GATEWAY,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Forwards `order` downstream once and logs the outcome for `channel`.
///
/// Handlers only map the returned outcome to their own response shape.
pub(super) async fn forward_order(
    state: &AppState,
    channel: &'static str,
    order: NormalizedOrder,
) -> SyncOutcome {
    let shop = order.shop.clone();
    let order_id = order.order_id.to_string();
    let images = order.image_count();

    let outcome = state.metafield.forward(order).await;
    match &outcome {
        SyncOutcome::Accepted => {
            tracing::info!(channel, %shop, %order_id, images, "order metafield saved");
        }
        SyncOutcome::DownstreamRejected { status, body } => {
            tracing::error!(
                channel,
                %shop,
                %order_id,
                status,
                body = body_excerpt(body, LOGGED_BODY_CHARS),
                "order metafield API rejected order"
            );
        }
        SyncOutcome::TransportFailure { cause } => {
            tracing::error!(
                channel,
                %shop,
                %order_id,
                error = %cause,
                "failed to call order metafield API"
            );
        }
    }
    outcome
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/order-metafield",
            get(orders::get_order_metafield),
        )
        .route(
            "/api/v1/order-images-zip",
            get(orders::get_order_images_zip),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

/// Ingestion channels. Each one authenticates its own caller.
fn ingestion_router(flow_secret: FlowSecret) -> Router<AppState> {
    Router::new()
        .route("/webhooks/orders/create", post(webhooks::orders_create))
        .route(
            "/api/flow/order-created",
            post(flow::order_created).route_layer(axum::middleware::from_fn_with_state(
                flow_secret,
                require_flow_secret,
            )),
        )
        .route(
            "/apps/save-order-metafield",
            get(proxy::save_order_metafield),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));
    let flow_secret = FlowSecret::new(state.config.flow_webhook_secret.as_deref());

    Router::new()
        .merge(public_routes)
        .merge(ingestion_router(flow_secret))
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            environment: state.config.env.to_string(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::test_support::{send, test_app, test_config};
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("validation_error", StatusCode::BAD_REQUEST),
            ("bad_request", StatusCode::BAD_REQUEST),
            ("not_found", StatusCode::NOT_FOUND),
            ("bad_gateway", StatusCode::BAD_GATEWAY),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, expected) in cases {
            let response = ApiError::new("req-1", code, "message").into_response();
            assert_eq!(response.status(), expected, "code {code}");
        }
    }

    #[tokio::test]
    async fn health_reports_ok_with_request_id() {
        let app = test_app(test_config("http://127.0.0.1:9", None));
        let (status, headers, body) = send(
            app,
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-health")
                .body(Body::empty())
                .expect("request"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers.get("x-request-id").and_then(|v| v.to_str().ok()),
            Some("req-health")
        );
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["environment"], "test");
        assert_eq!(json["meta"]["request_id"], "req-health");
    }

    #[tokio::test]
    async fn health_generates_request_id_when_absent() {
        let app = test_app(test_config("http://127.0.0.1:9", None));
        let (status, headers, _) = send(
            app,
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let id = headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .expect("generated request id");
        assert_eq!(id.len(), 36);
    }
}
