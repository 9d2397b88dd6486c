//! Canonical order representation shared by every ingestion channel.
//!
//! The serde shape of [`NormalizedOrder`] is the request body of the
//! downstream `POST /api/order-metafield` call, so field names here are wire
//! names and must not change casually.

use serde::{Deserialize, Serialize};

/// A source-platform identifier that keeps its JSON kind.
///
/// Webhook payloads carry numeric ids while ids derived from global
/// identifiers are strings. The downstream API receives whichever form the
/// source produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalId {
    Number(i64),
    Text(String),
}

impl ExternalId {
    /// Reads an id from an arbitrary JSON value.
    ///
    /// Integers that fit `i64` stay numeric; other numbers and strings become
    /// text. Returns `None` for null, booleans, arrays, and objects.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => Some(
                n.as_i64()
                    .map_or_else(|| Self::Text(n.to_string()), Self::Number),
            ),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Returns `true` for `0` and for blank strings.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Number(n) => *n == 0,
            Self::Text(s) => s.trim().is_empty(),
        }
    }
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ExternalId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ExternalId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// A free-form key/value attribute attached to a line item at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemProperty {
    pub name: String,
    pub value: String,
}

impl LineItemProperty {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One line of an order after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLineItem {
    /// Opaque per-source id; not comparable across channels.
    pub id: Option<ExternalId>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub quantity: Option<i64>,
    /// Decimal string exactly as the source sent it, e.g. `"749.95"`.
    pub price: Option<String>,
    pub sku: Option<String>,
    pub variant_id: Option<ExternalId>,
    pub product_id: Option<ExternalId>,
    pub properties: Vec<LineItemProperty>,
    /// First image reference among `properties`.
    #[serde(rename = "custom_image_url")]
    pub primary_image_url: Option<String>,
}

/// An order ready to hand to the metafield API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedOrder {
    pub shop: String,
    pub order_id: ExternalId,
    pub line_items: Vec<NormalizedLineItem>,
    /// Every line's image references, exact duplicates removed, first
    /// occurrence order kept.
    pub images: Vec<String>,
}

impl NormalizedOrder {
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_order() -> NormalizedOrder {
        NormalizedOrder {
            shop: "demo.myshopify.com".to_owned(),
            order_id: ExternalId::Number(5678),
            line_items: vec![NormalizedLineItem {
                id: Some(ExternalId::Number(1001)),
                name: Some("The Collection Snowboard: Liquid".to_owned()),
                title: Some("The Collection Snowboard: Liquid".to_owned()),
                quantity: Some(1),
                price: Some("749.95".to_owned()),
                sku: None,
                variant_id: Some(ExternalId::Text("42".to_owned())),
                product_id: None,
                properties: vec![LineItemProperty::new("CustomImage", "https://a/b.png")],
                primary_image_url: Some("https://a/b.png".to_owned()),
            }],
            images: vec!["https://a/b.png".to_owned()],
        }
    }

    #[test]
    fn external_id_from_json_keeps_kind() {
        assert_eq!(
            ExternalId::from_json(&json!(5678)),
            Some(ExternalId::Number(5678))
        );
        assert_eq!(
            ExternalId::from_json(&json!("999")),
            Some(ExternalId::Text("999".to_owned()))
        );
        assert_eq!(ExternalId::from_json(&json!(null)), None);
        assert_eq!(ExternalId::from_json(&json!({"id": 1})), None);
    }

    #[test]
    fn external_id_from_json_keeps_large_unsigned_as_text() {
        let id = ExternalId::from_json(&json!(u64::MAX)).expect("id");
        assert_eq!(id, ExternalId::Text(u64::MAX.to_string()));
    }

    #[test]
    fn external_id_blank_detection() {
        assert!(ExternalId::Number(0).is_blank());
        assert!(ExternalId::from("  ").is_blank());
        assert!(!ExternalId::Number(7).is_blank());
        assert!(!ExternalId::from("7").is_blank());
    }

    #[test]
    fn normalized_order_serializes_as_metafield_request_body() {
        let value = serde_json::to_value(sample_order()).expect("serialize");
        assert_eq!(value["shop"], "demo.myshopify.com");
        assert_eq!(value["order_id"], 5678);
        assert_eq!(value["images"], json!(["https://a/b.png"]));

        let line = &value["line_items"][0];
        assert_eq!(line["id"], 1001);
        assert_eq!(line["variant_id"], "42");
        assert!(line["product_id"].is_null());
        assert_eq!(line["custom_image_url"], "https://a/b.png");
        assert_eq!(
            line["properties"],
            json!([{"name": "CustomImage", "value": "https://a/b.png"}])
        );
        assert!(line.get("primary_image_url").is_none());
    }

    #[test]
    fn image_count_counts_deduplicated_images() {
        let mut order = sample_order();
        assert_eq!(order.image_count(), 1);
        order.images.clear();
        assert_eq!(order.image_count(), 0);
    }
}
