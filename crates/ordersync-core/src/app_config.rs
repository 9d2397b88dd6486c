use std::collections::HashMap;
use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Shared app secret used to verify webhook HMACs and app proxy signatures.
    pub shopify_api_secret: String,
    pub shopify_api_version: String,
    /// Overrides `https://{shop}` as the Admin API origin when set.
    pub shopify_admin_base_url: Option<String>,
    /// Offline access tokens keyed by `*.myshopify.com` domain.
    pub shop_access_tokens: HashMap<String, String>,
    pub shopify_request_timeout_secs: u64,
    /// Shared secret for the Flow "Send HTTP request" channel. `None` disables the check.
    pub flow_webhook_secret: Option<String>,
    pub metafield_api_url: String,
    pub metafield_request_timeout_secs: u64,
}

impl AppConfig {
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut shops: Vec<&str> = self.shop_access_tokens.keys().map(String::as_str).collect();
        shops.sort_unstable();

        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("shopify_api_secret", &"[redacted]")
            .field("shopify_api_version", &self.shopify_api_version)
            .field("shopify_admin_base_url", &self.shopify_admin_base_url)
            .field("shop_access_tokens", &shops)
            .field(
                "shopify_request_timeout_secs",
                &self.shopify_request_timeout_secs,
            )
            .field(
                "flow_webhook_secret",
                &self.flow_webhook_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("metafield_api_url", &self.metafield_api_url)
            .field(
                "metafield_request_timeout_secs",
                &self.metafield_request_timeout_secs,
            )
            .finish()
    }
}
