//! Request authenticity checks for Shopify-originated traffic.
//!
//! - Webhooks carry `X-Shopify-Hmac-Sha256`: base64 HMAC-SHA256 of the raw
//!   body, keyed by the app's API secret.
//! - App proxy requests carry a `signature` query parameter: hex HMAC-SHA256
//!   over every other parameter, sorted by key, rendered as `key=value`
//!   (repeated keys joined with `,`) and concatenated without separators.
//!
//! Comparison goes through [`Mac::verify_slice`], which is constant time.

use std::collections::BTreeMap;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::VerifyError;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PARAM: &str = "signature";

fn keyed_mac(secret: &str) -> Result<HmacSha256, VerifyError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| VerifyError::Malformed("secret"))
}

/// Verifies a webhook body against its `X-Shopify-Hmac-Sha256` header value.
///
/// # Errors
///
/// - [`VerifyError::Missing`] if the header is absent or blank.
/// - [`VerifyError::Malformed`] if the header is not base64.
/// - [`VerifyError::Mismatch`] if the digest does not match.
pub fn verify_webhook_hmac(
    secret: &str,
    body: &[u8],
    header: Option<&str>,
) -> Result<(), VerifyError> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(VerifyError::Missing("webhook HMAC header"))?;
    let expected = BASE64_STANDARD
        .decode(header)
        .map_err(|_| VerifyError::Malformed("webhook HMAC header"))?;

    let mut mac = keyed_mac(secret)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| VerifyError::Mismatch)
}

/// Computes the `X-Shopify-Hmac-Sha256` value for `body`.
///
/// # Errors
///
/// Returns [`VerifyError::Malformed`] if the secret cannot key the MAC.
pub fn webhook_hmac(secret: &str, body: &[u8]) -> Result<String, VerifyError> {
    let mut mac = keyed_mac(secret)?;
    mac.update(body);
    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verifies the `signature` parameter of an app proxy query string.
///
/// # Errors
///
/// - [`VerifyError::Missing`] if there is no `signature` parameter.
/// - [`VerifyError::Malformed`] if the signature is not hex.
/// - [`VerifyError::Mismatch`] if the digest does not match.
pub fn verify_proxy_signature(
    secret: &str,
    query: &[(String, String)],
) -> Result<(), VerifyError> {
    let signature =
        query_value(query, SIGNATURE_PARAM).ok_or(VerifyError::Missing("signature"))?;
    let expected =
        hex::decode(signature.trim()).map_err(|_| VerifyError::Malformed("signature"))?;

    let mut mac = keyed_mac(secret)?;
    mac.update(proxy_signing_message(query).as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| VerifyError::Mismatch)
}

/// Computes the app proxy `signature` for `query`, ignoring any existing
/// `signature` parameter.
///
/// # Errors
///
/// Returns [`VerifyError::Malformed`] if the secret cannot key the MAC.
pub fn proxy_signature(secret: &str, query: &[(String, String)]) -> Result<String, VerifyError> {
    let mut mac = keyed_mac(secret)?;
    mac.update(proxy_signing_message(query).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Returns the first value of `key` in a decoded query string.
#[must_use]
pub fn query_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn proxy_signing_message(query: &[(String, String)]) -> String {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, value) in query {
        if key != SIGNATURE_PARAM {
            grouped.entry(key.as_str()).or_default().push(value.as_str());
        }
    }
    grouped
        .into_iter()
        .map(|(key, values)| format!("{key}={}", values.join(",")))
        .collect()
}
