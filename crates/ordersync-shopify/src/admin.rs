//! Admin GraphQL client for the order-detail lookup behind the storefront
//! proxy channel.

use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::json;

use crate::error::ShopifyError;
use crate::types::OrderQueryResponse;

const ORDER_GID_PREFIX: &str = "gid://shopify/Order/";

const ORDER_QUERY: &str = r"query getOrder($id: ID!) {
  order(id: $id) {
    id
    lineItems(first: 60) {
      edges {
        node {
          id
          name
          title
          quantity
          sku
          variant { id }
          customAttributes { key value }
        }
      }
    }
  }
}";

/// Client for `POST /admin/api/{version}/graphql.json`.
///
/// Requests go to `https://{shop}` unless a base URL override is set with
/// [`AdminClient::with_base_url`] (wiremock in tests, egress proxies in
/// deployment).
pub struct AdminClient {
    client: Client,
    api_version: String,
    base_url: Option<Url>,
}

impl AdminClient {
    /// Creates a client that talks to each shop's own Admin API origin.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_version: &str, timeout_secs: u64) -> Result<Self, ShopifyError> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            api_version: api_version.to_owned(),
            base_url: None,
        })
    }

    /// Creates a client that sends every shop's queries to `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`ShopifyError::InvalidBaseUrl`] if `base_url` does
    /// not parse.
    pub fn with_base_url(
        api_version: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ShopifyError> {
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ShopifyError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client: build_http_client(timeout_secs)?,
            api_version: api_version.to_owned(),
            base_url: Some(parsed),
        })
    }

    /// Fetches an order's line items by id.
    ///
    /// `order_id` may be a bare numeric id or a full global identifier. The
    /// GraphQL envelope is returned as-is; callers decide what `errors` or a
    /// `null` order mean for them.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::InvalidBaseUrl`] if `shop` does not form a valid origin.
    /// - [`ShopifyError::Http`] on network failure or timeout.
    /// - [`ShopifyError::UnexpectedStatus`] on a non-2xx response.
    /// - [`ShopifyError::Deserialize`] if the body is not a GraphQL envelope.
    pub async fn fetch_order(
        &self,
        shop: &str,
        access_token: &str,
        order_id: &str,
    ) -> Result<OrderQueryResponse, ShopifyError> {
        let url = self.graphql_url(shop)?;
        let order_gid = order_global_id(order_id);
        let payload = json!({
            "query": ORDER_QUERY,
            "variables": { "id": order_gid },
        });

        let response = self
            .client
            .post(url.clone())
            .header("X-Shopify-Access-Token", access_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ShopifyError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str::<OrderQueryResponse>(&body).map_err(|e| {
            ShopifyError::Deserialize {
                context: format!("order query for {order_gid} on {shop}"),
                source: e,
            }
        })?;
        tracing::debug!(
            shop,
            %order_gid,
            errors = parsed.errors.len(),
            found = parsed.data.as_ref().is_some_and(|d| d.order.is_some()),
            "order query completed"
        );
        Ok(parsed)
    }

    fn graphql_url(&self, shop: &str) -> Result<Url, ShopifyError> {
        let base = match &self.base_url {
            Some(base) => base.clone(),
            None => {
                let origin = format!("https://{}/", shop.trim().trim_end_matches('/'));
                Url::parse(&origin).map_err(|e| ShopifyError::InvalidBaseUrl {
                    base_url: origin.clone(),
                    reason: e.to_string(),
                })?
            }
        };

        base.join(&format!("admin/api/{}/graphql.json", self.api_version))
            .map_err(|e| ShopifyError::InvalidBaseUrl {
                base_url: base.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Expands a bare order id to `gid://shopify/Order/{id}`; global ids pass
/// through unchanged.
#[must_use]
pub fn order_global_id(order_id: &str) -> String {
    let order_id = order_id.trim();
    if order_id.starts_with("gid://") {
        order_id.to_owned()
    } else {
        format!("{ORDER_GID_PREFIX}{order_id}")
    }
}

fn build_http_client(timeout_secs: u64) -> Result<Client, ShopifyError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent("ordersync/0.1 (order-metafield-sync)")
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_global_id_expands_bare_ids() {
        assert_eq!(order_global_id("999"), "gid://shopify/Order/999");
        assert_eq!(order_global_id(" 999 "), "gid://shopify/Order/999");
    }

    #[test]
    fn order_global_id_keeps_global_ids() {
        assert_eq!(
            order_global_id("gid://shopify/Order/999"),
            "gid://shopify/Order/999"
        );
    }

    #[test]
    fn graphql_url_targets_shop_origin() {
        let client = AdminClient::new("2025-01", 5).expect("client");
        let url = client.graphql_url("demo.myshopify.com").expect("url");
        assert_eq!(
            url.as_str(),
            "https://demo.myshopify.com/admin/api/2025-01/graphql.json"
        );
    }

    #[test]
    fn graphql_url_uses_base_override() {
        let client =
            AdminClient::with_base_url("2025-01", 5, "http://127.0.0.1:9999/").expect("client");
        let url = client.graphql_url("demo.myshopify.com").expect("url");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9999/admin/api/2025-01/graphql.json"
        );
    }

    #[test]
    fn with_base_url_rejects_garbage() {
        let result = AdminClient::with_base_url("2025-01", 5, "not a url");
        assert!(matches!(result, Err(ShopifyError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn order_query_requests_custom_attributes() {
        assert!(ORDER_QUERY.contains("customAttributes { key value }"));
        assert!(ORDER_QUERY.contains("lineItems(first: 60)"));
    }
}
