//! Normalization from raw Shopify order shapes to [`NormalizedOrder`].
//!
//! Each [`OrderPayload`] variant is translated into the webhook-shaped
//! [`SourceOrder`] first; image extraction and deduplication then run once,
//! in [`normalize_order`], for every channel.

use std::collections::HashSet;

use ordersync_core::{ExternalId, LineItemProperty, NormalizedLineItem, NormalizedOrder};

use crate::error::NormalizeError;
use crate::images::extract_image_references;
use crate::types::{QueryLineItem, QueryOrder, SourceLineItem, SourceOrder, SourceProperty};

/// A raw order tagged with the channel that delivered it.
#[derive(Debug)]
pub enum OrderPayload {
    /// `orders/create` webhook body.
    Webhook(SourceOrder),
    /// Flow "Send HTTP request" body; webhook-shaped by contract.
    Automation(SourceOrder),
    /// Admin GraphQL `order(id:)` result fetched for a storefront proxy call.
    Query(QueryOrder),
}

impl OrderPayload {
    fn into_source_order(self) -> SourceOrder {
        match self {
            Self::Webhook(order) | Self::Automation(order) => order,
            Self::Query(order) => source_order_from_query(order),
        }
    }
}

/// Normalizes a raw order for `shop`.
///
/// # Errors
///
/// Returns [`NormalizeError::MissingOrderId`] if neither `id` nor the global
/// identifier yields an order id.
pub fn normalize_order(
    shop: &str,
    payload: OrderPayload,
) -> Result<NormalizedOrder, NormalizeError> {
    let order = payload.into_source_order();
    let order_id = resolve_ids(order.id, order.admin_graphql_api_id.as_deref())?;

    let mut references = Vec::new();
    let mut line_items = Vec::with_capacity(order.line_items.len());
    for line in order.line_items {
        let (item, images) = normalize_line_item(line);
        references.extend(images);
        line_items.push(item);
    }

    Ok(NormalizedOrder {
        shop: shop.to_owned(),
        order_id,
        line_items,
        images: dedupe_preserving_order(references),
    })
}

/// Resolves the order id of an arbitrary JSON order object.
///
/// Prefers a non-blank `id`; otherwise takes the segment after the last `/`
/// of `admin_graphql_api_id`. `null` and non-objects fail.
///
/// # Errors
///
/// Returns [`NormalizeError::MissingOrderId`] when no usable id exists.
pub fn resolve_order_id(order: &serde_json::Value) -> Result<ExternalId, NormalizeError> {
    let Some(fields) = order.as_object() else {
        return Err(NormalizeError::MissingOrderId);
    };
    resolve_ids(
        fields.get("id").and_then(ExternalId::from_json),
        fields
            .get("admin_graphql_api_id")
            .and_then(serde_json::Value::as_str),
    )
}

/// A blank `id` (`0` or `""`) falls through to the global id. Only a
/// missing or blank global id is an error.
fn resolve_ids(
    id: Option<ExternalId>,
    global_id: Option<&str>,
) -> Result<ExternalId, NormalizeError> {
    id.filter(|id| !id.is_blank())
        .or_else(|| global_id.and_then(local_id).map(ExternalId::from))
        .ok_or(NormalizeError::MissingOrderId)
}

/// Returns the local part of a global identifier: everything after the last
/// `/`. A bare id is returned unchanged. `None` when that part is blank.
fn local_id(global_id: &str) -> Option<&str> {
    let tail = global_id.rsplit('/').next().unwrap_or(global_id).trim();
    (!tail.is_empty()).then_some(tail)
}

fn local_or_raw(global_id: String) -> ExternalId {
    match local_id(&global_id) {
        Some(tail) => ExternalId::from(tail),
        None => ExternalId::Text(global_id),
    }
}

fn normalize_line_item(line: SourceLineItem) -> (NormalizedLineItem, Vec<String>) {
    let properties: Vec<LineItemProperty> = line
        .properties
        .into_iter()
        .map(|SourceProperty { name, value }| {
            LineItemProperty::new(name.unwrap_or_default(), value.unwrap_or_default())
        })
        .collect();

    let images = extract_image_references(&properties);
    let primary_image_url = images.first().cloned();

    let item = NormalizedLineItem {
        id: line.id,
        name: line.name,
        title: line.title,
        quantity: line.quantity,
        price: line.price,
        sku: line.sku,
        variant_id: line.variant_id,
        product_id: line.product_id,
        properties,
        primary_image_url,
    };
    (item, images)
}

fn source_order_from_query(order: QueryOrder) -> SourceOrder {
    let line_items = order
        .line_items
        .map(|connection| connection.edges)
        .unwrap_or_default()
        .into_iter()
        .map(|edge| source_line_from_query(edge.node))
        .collect();

    SourceOrder {
        id: order
            .id
            .as_deref()
            .and_then(local_id)
            .map(ExternalId::from),
        admin_graphql_api_id: order.id,
        line_items,
    }
}

fn source_line_from_query(node: QueryLineItem) -> SourceLineItem {
    SourceLineItem {
        id: node.id.map(local_or_raw),
        name: node.name,
        title: node.title,
        quantity: Some(node.quantity.unwrap_or(1)),
        // Not requested from the order-detail query.
        price: None,
        sku: node.sku,
        variant_id: node.variant.and_then(|v| v.id).map(local_or_raw),
        product_id: None,
        properties: node
            .custom_attributes
            .into_iter()
            .map(|attr| SourceProperty {
                name: Some(attr.key),
                value: Some(attr.value.unwrap_or_default()),
            })
            .collect(),
    }
}

fn dedupe_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(urls.len());
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
