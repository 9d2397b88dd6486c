//! HTTP client for the order metafield API, the system of record for
//! orders and their customer images.
//!
//! Endpoints, relative to the configured base URL:
//! - `POST api/order-metafield`: upsert by `(shop, order_id)`.
//! - `GET api/order-metafield?shop=&order_id=`: stored data.
//! - `GET order-images-zip?shop=&order_id=`: zip archive of the images.

use std::time::Duration;

use ordersync_core::NormalizedOrder;
use reqwest::{header, Client, Url};

use crate::error::MetafieldError;
use crate::outcome::SyncOutcome;

/// A downstream response relayed to an operator route.
#[derive(Debug, Clone)]
pub struct PassthroughResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl PassthroughResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, lossily.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub struct MetafieldClient {
    client: Client,
    metafield_url: Url,
    images_zip_url: Url,
}

impl MetafieldClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// `timeout_secs` bounds every call; a forward that hits it is reported
    /// as [`SyncOutcome::TransportFailure`].
    ///
    /// # Errors
    ///
    /// Returns [`MetafieldError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`MetafieldError::InvalidBaseUrl`] if `base_url` does
    /// not parse.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, MetafieldError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("ordersync/0.1 (order-metafield-sync)")
            .build()?;

        // Keep exactly one trailing slash so `join` appends below the base
        // path instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base = Url::parse(&normalised).map_err(|e| MetafieldError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(MetafieldError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: "URL cannot be used as a base".to_owned(),
            });
        }

        let join = |path: &str| -> Result<Url, MetafieldError> {
            base.join(path).map_err(|e| MetafieldError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: e.to_string(),
            })
        };

        Ok(Self {
            client,
            metafield_url: join("api/order-metafield")?,
            images_zip_url: join("order-images-zip")?,
        })
    }

    /// Sends `order` to `POST api/order-metafield`, once.
    ///
    /// The request body is the serde form of [`NormalizedOrder`]:
    /// `{shop, order_id, line_items, images}`.
    pub async fn forward(&self, order: NormalizedOrder) -> SyncOutcome {
        let response = match self
            .client
            .post(self.metafield_url.clone())
            .json(&order)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return SyncOutcome::TransportFailure {
                    cause: e.to_string(),
                }
            }
        };

        let status = response.status();
        if status.is_success() {
            tracing::debug!(
                shop = %order.shop,
                order_id = %order.order_id,
                status = status.as_u16(),
                "order metafield accepted"
            );
            return SyncOutcome::Accepted;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "could not read rejected response body");
                String::new()
            }
        };
        SyncOutcome::DownstreamRejected {
            status: status.as_u16(),
            body,
        }
    }

    /// Fetches previously stored data for an order, passed through verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`MetafieldError::Http`] if no response could be obtained.
    pub async fn get_order_metafield(
        &self,
        shop: &str,
        order_id: &str,
    ) -> Result<PassthroughResponse, MetafieldError> {
        self.passthrough(Self::with_order_query(&self.metafield_url, shop, order_id))
            .await
    }

    /// Fetches the zip archive of an order's images, passed through verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`MetafieldError::Http`] if no response could be obtained.
    pub async fn get_order_images_zip(
        &self,
        shop: &str,
        order_id: &str,
    ) -> Result<PassthroughResponse, MetafieldError> {
        self.passthrough(Self::with_order_query(&self.images_zip_url, shop, order_id))
            .await
    }

    fn with_order_query(endpoint: &Url, shop: &str, order_id: &str) -> Url {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("shop", shop)
            .append_pair("order_id", order_id);
        url
    }

    async fn passthrough(&self, url: Url) -> Result<PassthroughResponse, MetafieldError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let header_text = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let content_type = header_text(header::CONTENT_TYPE);
        let content_disposition = header_text(header::CONTENT_DISPOSITION);
        let body = response.bytes().await?.to_vec();

        Ok(PassthroughResponse {
            status,
            content_type,
            content_disposition,
            body,
        })
    }
}
