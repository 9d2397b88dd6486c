//! Image reference extraction from checkout line-item properties.
//!
//! Storefront themes attach the customer's uploaded artwork as a line-item
//! property, usually named `CustomImage`, but names vary by theme and app.
//! A property is an image reference when:
//!
//! 1. the property name, lower-cased with all whitespace removed, is
//!    `customimage` or contains `image`; or
//! 2. the trimmed value starts with `http://` or `https://` (any case),
//!    whatever the name.
//!
//! Matches with a blank value are dropped. Rule 2 also matches unrelated
//! URL-valued properties such as tracking links; narrow it if downstream
//! starts seeing false positives.

use std::sync::LazyLock;

use ordersync_core::LineItemProperty;
use regex::Regex;

static ABSOLUTE_HTTP_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://").expect("valid regex"));

/// Returns the trimmed value of every property that looks like an image
/// reference, in input order.
///
/// Duplicates are kept; deduplication happens once per order in
/// [`crate::normalize`].
#[must_use]
pub fn extract_image_references(properties: &[LineItemProperty]) -> Vec<String> {
    properties
        .iter()
        .filter_map(|property| {
            let value = property.value.trim();
            (!value.is_empty() && is_image_reference(&property.name, value))
                .then(|| value.to_owned())
        })
        .collect()
}

fn is_image_reference(name: &str, trimmed_value: &str) -> bool {
    let normalized_name: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    normalized_name == "customimage"
        || normalized_name.contains("image")
        || ABSOLUTE_HTTP_URL.is_match(trimmed_value)
}
