use std::collections::HashMap;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_METAFIELD_API_URL: &str = "https://highquality.allgovjobs.com/backend";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let shopify_api_secret = require("SHOPIFY_API_SECRET")?;

    let env = parse_environment(&or_default("ORDERSYNC_ENV", "development"))?;
    let bind_addr = parse_addr("ORDERSYNC_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("ORDERSYNC_LOG_LEVEL", "info");

    let shopify_api_version = or_default("SHOPIFY_API_VERSION", "2025-01");
    let shopify_admin_base_url = optional("SHOPIFY_ADMIN_BASE_URL");
    let shop_access_tokens = parse_shop_tokens(&or_default("SHOPIFY_SHOP_TOKENS", ""))?;
    let shopify_request_timeout_secs = parse_u64("SHOPIFY_REQUEST_TIMEOUT_SECS", "15")?;

    let flow_webhook_secret = optional("FLOW_WEBHOOK_SECRET");

    let metafield_api_url = or_default("ORDERSYNC_METAFIELD_API_URL", DEFAULT_METAFIELD_API_URL);
    let metafield_request_timeout_secs = parse_u64("ORDERSYNC_METAFIELD_TIMEOUT_SECS", "15")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        shopify_api_secret,
        shopify_api_version,
        shopify_admin_base_url,
        shop_access_tokens,
        shopify_request_timeout_secs,
        flow_webhook_secret,
        metafield_api_url,
        metafield_request_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ORDERSYNC_ENV".to_string(),
            reason: format!("expected development, test, or production, got '{other}'"),
        }),
    }
}

/// Parse `shop=token` pairs separated by commas.
///
/// Shop domains are lower-cased so lookups match the `shop` value Shopify
/// appends to proxied requests.
fn parse_shop_tokens(raw: &str) -> Result<HashMap<String, String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (shop, token) = entry
                .split_once('=')
                .map(|(s, t)| (s.trim(), t.trim()))
                .filter(|(s, t)| !s.is_empty() && !t.is_empty())
                .ok_or_else(|| ConfigError::InvalidEnvVar {
                    var: "SHOPIFY_SHOP_TOKENS".to_string(),
                    reason: format!("expected 'shop=token', got '{entry}'"),
                })?;
            Ok((shop.to_ascii_lowercase(), token.to_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    /// Returns a map with all required env vars populated.
    fn full_env<'a>() -> HashMap<&'a str, &'a str> {
        let mut m = HashMap::new();
        m.insert("SHOPIFY_API_SECRET", "shpss_test");
        m
    }

    #[test]
    fn parse_environment_known_values() {
        assert_eq!(
            parse_environment("development").unwrap(),
            Environment::Development
        );
        assert_eq!(parse_environment("test").unwrap(), Environment::Test);
        assert_eq!(
            parse_environment("production").unwrap(),
            Environment::Production
        );
    }

    #[test]
    fn parse_environment_unknown_fails() {
        let err = parse_environment("staging").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "ORDERSYNC_ENV"));
    }

    #[test]
    fn build_app_config_fails_without_api_secret() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "SHOPIFY_API_SECRET"),
            "expected MissingEnvVar(SHOPIFY_API_SECRET), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_treats_blank_api_secret_as_missing() {
        let mut map = HashMap::new();
        map.insert("SHOPIFY_API_SECRET", "   ");
        let result = build_app_config(lookup_from_map(&map));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn build_app_config_succeeds_with_defaults() {
        let map = full_env();
        let cfg = build_app_config(lookup_from_map(&map)).expect("config");
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.shopify_api_version, "2025-01");
        assert!(cfg.shopify_admin_base_url.is_none());
        assert!(cfg.shop_access_tokens.is_empty());
        assert_eq!(cfg.shopify_request_timeout_secs, 15);
        assert!(cfg.flow_webhook_secret.is_none());
        assert_eq!(cfg.metafield_api_url, DEFAULT_METAFIELD_API_URL);
        assert_eq!(cfg.metafield_request_timeout_secs, 15);
    }

    #[test]
    fn build_app_config_fails_with_invalid_bind_addr() {
        let mut map = full_env();
        map.insert("ORDERSYNC_BIND_ADDR", "not-a-socket-addr");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ORDERSYNC_BIND_ADDR"),
            "expected InvalidEnvVar(ORDERSYNC_BIND_ADDR), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_fails_with_invalid_metafield_timeout() {
        let mut map = full_env();
        map.insert("ORDERSYNC_METAFIELD_TIMEOUT_SECS", "soon");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ORDERSYNC_METAFIELD_TIMEOUT_SECS"),
            "got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_blank_flow_secret_disables_check() {
        let mut map = full_env();
        map.insert("FLOW_WEBHOOK_SECRET", "");
        let cfg = build_app_config(lookup_from_map(&map)).expect("config");
        assert!(cfg.flow_webhook_secret.is_none());
    }

    #[test]
    fn build_app_config_reads_flow_secret() {
        let mut map = full_env();
        map.insert("FLOW_WEBHOOK_SECRET", "s3cret");
        let cfg = build_app_config(lookup_from_map(&map)).expect("config");
        assert_eq!(cfg.flow_webhook_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn parse_shop_tokens_reads_pairs() {
        let tokens =
            parse_shop_tokens("Demo.myshopify.com=shpat_a, other.myshopify.com = shpat_b ,")
                .expect("tokens");
        assert_eq!(tokens.len(), 2);
        assert_eq!(
            tokens.get("demo.myshopify.com").map(String::as_str),
            Some("shpat_a")
        );
        assert_eq!(
            tokens.get("other.myshopify.com").map(String::as_str),
            Some("shpat_b")
        );
    }

    #[test]
    fn parse_shop_tokens_rejects_entry_without_token() {
        let err = parse_shop_tokens("demo.myshopify.com").unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "SHOPIFY_SHOP_TOKENS")
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut map = full_env();
        map.insert("FLOW_WEBHOOK_SECRET", "flow-secret-value");
        map.insert("SHOPIFY_SHOP_TOKENS", "demo.myshopify.com=shpat_hidden");
        let cfg = build_app_config(lookup_from_map(&map)).expect("config");
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("shpss_test"));
        assert!(!rendered.contains("flow-secret-value"));
        assert!(!rendered.contains("shpat_hidden"));
        assert!(rendered.contains("demo.myshopify.com"));
    }
}
