//! Wire types for the search and enrichment endpoints.
//!
//! Both APIs drift: field names vary between items and scalar fields come
//! back as strings or numbers. Everything here deserializes leniently and
//! leaves interpretation to the normalizer.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Top-level search response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub response: SearchResults,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    /// Declared total. Read from the first page only.
    #[serde(rename = "numFound", default, deserialize_with = "lenient_u64")]
    pub num_found: Option<u64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub docs: Vec<CatalogDocument>,
}

/// One primary search document, kept as the raw JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogDocument(pub Map<String, Value>);

impl CatalogDocument {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Resolves a JSON pointer (`/images/0/url`) against the document.
    /// A bare key without a leading slash is looked up directly.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let Some(rest) = path.strip_prefix('/') else {
            return self.0.get(path);
        };
        let (head, tail) = match rest.split_once('/') {
            Some((head, tail)) => (head, Some(tail)),
            None => (rest, None),
        };
        let value = self.0.get(head)?;
        match tail {
            Some(tail) => value.pointer(&format!("/{tail}")),
            None => Some(value),
        }
    }

    /// Delta key. Empty when the document carries no id.
    #[must_use]
    pub fn id(&self) -> String {
        self.get("id").map(value_text).unwrap_or_default()
    }

    /// Enrichment join key: `item_number`, else `item_location_itemNumber`.
    #[must_use]
    pub fn item_number(&self) -> String {
        self.get("item_number")
            .or_else(|| self.get("item_location_itemNumber"))
            .map(value_text)
            .unwrap_or_default()
    }
}

/// Renders a JSON value as snapshot text: strings verbatim, numbers and
/// booleans via `to_string`, `null` as empty, arrays joined with `|`.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("|"),
        Value::Object(_) => value.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Enrichment (graph) endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrichmentResponse {
    #[serde(default)]
    pub data: Option<EnrichmentData>,
    /// Application-level errors. A batch carrying any is discarded.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrichmentData {
    #[serde(default)]
    pub products: Option<ProductsData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsData {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub catalog_data: Vec<CatalogData>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fulfillment_data: Vec<FulfillmentRecord>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub child_data: Vec<ChildData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub item_number: Option<String>,
    /// A list of tags, or one comma-separated string.
    #[serde(default)]
    pub program_types: Value,
    #[serde(default)]
    pub price_data: Option<PriceData>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceData {
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub list_price: Value,
}

/// Free-form key/value attribute. `value` may be a string, number, or list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Attribute {
    #[serde(default, deserialize_with = "lenient_string")]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub item_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub warehouse_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub channel: Option<String>,
    #[serde(default)]
    pub price: Value,
}

/// A variant of a parent item (size, color, ...).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub item_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub parent_item_number: Option<String>,
    #[serde(default)]
    pub program_types: Value,
    #[serde(default)]
    pub price_data: Option<PriceData>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attributes: Vec<Attribute>,
}

/// Everything the enrichment endpoint returned for one item number.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentPayload {
    pub catalog: Option<CatalogData>,
    pub fulfillment: Vec<FulfillmentRecord>,
    pub children: Vec<ChildData>,
}

impl EnrichmentPayload {
    /// Attributes of the item followed by those of its variants.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.catalog
            .iter()
            .flat_map(|c| c.attributes.iter())
            .chain(self.children.iter().flat_map(|c| c.attributes.iter()))
    }

    /// Program tags of the item and its variants, comma-separated strings split.
    #[must_use]
    pub fn program_tags(&self) -> Vec<String> {
        let mut tags = Vec::new();
        if let Some(catalog) = &self.catalog {
            collect_tags(&catalog.program_types, &mut tags);
        }
        for child in &self.children {
            collect_tags(&child.program_types, &mut tags);
        }
        tags
    }

    /// Candidate prices in lookup order: catalog, fulfillment, variants.
    /// Raw text, not yet normalized.
    #[must_use]
    pub fn prices(&self) -> Vec<String> {
        let catalog = self
            .catalog
            .iter()
            .filter_map(|c| c.price_data.as_ref())
            .map(|p| &p.price);
        let fulfillment = self.fulfillment.iter().map(|f| &f.price);
        let children = self
            .children
            .iter()
            .filter_map(|c| c.price_data.as_ref())
            .map(|p| &p.price);
        catalog
            .chain(fulfillment)
            .chain(children)
            .map(value_text)
            .filter(|s| !s.trim().is_empty())
            .collect()
    }
}

fn collect_tags(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned),
        ),
        Value::Array(items) => {
            for item in items {
                collect_tags(item, out);
            }
        }
        Value::Number(n) => out.push(n.to_string()),
        _ => {}
    }
}

impl ProductsData {
    /// Groups the three flat lists by item number. Variants attach to their
    /// parent; records without an item number are dropped.
    #[must_use]
    pub fn into_payloads(self) -> HashMap<String, EnrichmentPayload> {
        let mut payloads: HashMap<String, EnrichmentPayload> = HashMap::new();

        for catalog in self.catalog_data {
            if let Some(number) = catalog.item_number.clone() {
                payloads.entry(number).or_default().catalog = Some(catalog);
            }
        }
        for record in self.fulfillment_data {
            if let Some(number) = record.item_number.clone() {
                payloads.entry(number).or_default().fulfillment.push(record);
            }
        }
        for child in self.child_data {
            if let Some(parent) = child.parent_item_number.clone() {
                payloads.entry(parent).or_default().children.push(child);
            }
        }

        payloads
    }
}

// ---------------------------------------------------------------------------
// Lenient field helpers
// ---------------------------------------------------------------------------

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
