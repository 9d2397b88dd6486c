//! Raw order shapes as they arrive from Shopify.
//!
//! ## `orders/create` webhook and Flow "Send HTTP request"
//! Both deliver the REST order resource: a numeric `id`, an
//! `admin_graphql_api_id` (`"gid://shopify/Order/<id>"`), and `line_items`
//! with `properties` as `[{ "name": ..., "value": ... }]`. Flow bodies are
//! hand-mapped by the merchant, so every field is optional here and anything
//! that is not the expected JSON kind degrades to absent rather than failing
//! the whole payload. A `line_items` or `properties` value that is not an
//! array is read as empty.
//!
//! ## Admin GraphQL `order(id:)`
//! Used by the storefront proxy, which only knows the order id. Ids are
//! global identifiers, line items are under `lineItems.edges[].node`, and
//! checkout attributes are `customAttributes` as `{ key, value }` where
//! `value` may be `null`. Price and product id are not requested.

use ordersync_core::ExternalId;
use serde::Deserialize;

/// Webhook-shaped order. Also the intermediate form every adapter converges on.
#[derive(Debug, Default, Deserialize)]
pub struct SourceOrder {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<ExternalId>,

    /// Global identifier, e.g. `"gid://shopify/Order/5678"`.
    #[serde(default, deserialize_with = "lenient::string")]
    pub admin_graphql_api_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub line_items: Vec<SourceLineItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SourceLineItem {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<ExternalId>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient::integer")]
    pub quantity: Option<i64>,

    /// Decimal string, e.g. `"749.95"`. Numbers are kept as their JSON text.
    #[serde(default, deserialize_with = "lenient::string")]
    pub price: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub sku: Option<String>,

    #[serde(default, deserialize_with = "lenient::id")]
    pub variant_id: Option<ExternalId>,

    #[serde(default, deserialize_with = "lenient::id")]
    pub product_id: Option<ExternalId>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub properties: Vec<SourceProperty>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SourceProperty {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub value: Option<String>,
}

/// Top-level GraphQL envelope for the order-detail query.
#[derive(Debug, Default, Deserialize)]
pub struct OrderQueryResponse {
    #[serde(default)]
    pub data: Option<OrderQueryData>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderQueryData {
    #[serde(default)]
    pub order: Option<QueryOrder>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOrder {
    /// Global identifier, e.g. `"gid://shopify/Order/999"`.
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub line_items: Option<Connection<QueryLineItem>>,
}

#[derive(Debug, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryLineItem {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub quantity: Option<i64>,

    #[serde(default)]
    pub sku: Option<String>,

    #[serde(default)]
    pub variant: Option<QueryVariant>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub custom_attributes: Vec<CustomAttribute>,
}

#[derive(Debug, Deserialize)]
pub struct QueryVariant {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CustomAttribute {
    pub key: String,

    #[serde(default)]
    pub value: Option<String>,
}

/// Field deserializers that accept whatever JSON kind a hand-mapped payload
/// carries and fall back to "absent" instead of erroring.
mod lenient {
    use ordersync_core::ExternalId;
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub(super) fn id<'de, D>(deserializer: D) -> Result<Option<ExternalId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(ExternalId::from_json(&value))
    }

    pub(super) fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub(super) fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Reads an array, dropping elements that do not fit `T`. Non-arrays read
    /// as empty.
    pub(super) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let Value::Array(items) = Value::deserialize(deserializer)? else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(parsed) => Some(parsed),
                Err(error) => {
                    tracing::debug!(%error, "dropping malformed list element");
                    None
                }
            })
            .collect())
    }
}
