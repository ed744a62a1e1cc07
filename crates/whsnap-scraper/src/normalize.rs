//! Merges a search document and its enrichment payload into one
//! [`NormalizedRecord`].
//!
//! Field resolution is data-driven: [`FIELD_RULES`] lists, per output
//! column, the document paths to try in order and how to pick among them.
//! Price gets a second pass that may consult enrichment and is then gated
//! on delivery status.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use whsnap_core::{ChannelPolicy, NormalizedRecord, WarehouseContext};

use crate::classify::classify;
use crate::types::{value_text, CatalogDocument, EnrichmentPayload};

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*([\d,]+(?:\.\d{1,2})?)").expect("valid regex"));

/// How a rule chooses among its sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    /// The first source whose key exists, even if its value is empty.
    FirstPresent,
    /// The first source whose rendered value is non-empty.
    FirstNonEmpty,
}

/// Output fields resolved from the document alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    ItemNumber,
    Name,
    Price,
    ListPrice,
    ProductPic,
    ProductDescription,
    DeliveryStatus,
    Availability,
    ReviewCount,
    ReviewRatings,
    CategoryPath,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: Field,
    /// Bare keys or JSON pointers, tried in order.
    pub sources: &'static [&'static str],
    pub pick: Pick,
}

pub const FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        field: Field::Id,
        sources: &["id"],
        pick: Pick::FirstPresent,
    },
    FieldRule {
        field: Field::ItemNumber,
        sources: &["item_number", "item_location_itemNumber"],
        pick: Pick::FirstPresent,
    },
    FieldRule {
        field: Field::Name,
        sources: &["item_product_name", "name"],
        pick: Pick::FirstNonEmpty,
    },
    FieldRule {
        field: Field::Price,
        sources: &["item_location_pricing_salePrice", "minSalePrice"],
        pick: Pick::FirstPresent,
    },
    FieldRule {
        field: Field::ListPrice,
        sources: &["item_location_pricing_listPrice"],
        pick: Pick::FirstPresent,
    },
    FieldRule {
        field: Field::ProductPic,
        sources: &[
            "item_collateral_primaryimage",
            "image",
            "/images/0/item_collateral_primaryimage",
        ],
        pick: Pick::FirstNonEmpty,
    },
    FieldRule {
        field: Field::ProductDescription,
        sources: &[
            "description",
            "item_short_description",
            "item_product_short_description",
        ],
        pick: Pick::FirstNonEmpty,
    },
    FieldRule {
        field: Field::DeliveryStatus,
        sources: &["deliveryStatus"],
        pick: Pick::FirstPresent,
    },
    FieldRule {
        field: Field::Availability,
        sources: &["item_location_availability"],
        pick: Pick::FirstPresent,
    },
    FieldRule {
        field: Field::ReviewCount,
        sources: &["item_product_review_count", "item_review_count"],
        pick: Pick::FirstPresent,
    },
    FieldRule {
        field: Field::ReviewRatings,
        sources: &[
            "item_product_review_ratings",
            "item_review_ratings",
            "item_ratings",
        ],
        pick: Pick::FirstPresent,
    },
    FieldRule {
        field: Field::CategoryPath,
        sources: &["categoryPath_ss"],
        pick: Pick::FirstPresent,
    },
];

impl FieldRule {
    /// Resolves the rule against `doc`. Empty when no source qualifies.
    #[must_use]
    pub fn resolve(&self, doc: &CatalogDocument) -> String {
        match self.pick {
            Pick::FirstPresent => self
                .sources
                .iter()
                .find_map(|source| doc.lookup(source))
                .map(value_text)
                .unwrap_or_default(),
            Pick::FirstNonEmpty => self
                .sources
                .iter()
                .filter_map(|source| doc.lookup(source))
                .map(value_text)
                .find(|text| !text.is_empty())
                .unwrap_or_default(),
        }
    }
}

/// Extracts a plain decimal from display text: `"$1,234.50"` → `"1234.50"`.
/// Bare numbers pass through. Anything else yields `None`.
#[must_use]
pub fn parse_price(text: &str) -> Option<String> {
    if let Some(caps) = PRICE_RE.captures(text) {
        return Some(caps[1].replace(',', ""));
    }
    let trimmed = text.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .map(|_| trimmed.to_owned())
}

/// Builds the output record for one document.
///
/// Every column is populated; missing data is the empty string. Price falls
/// back to the first parseable enrichment price, and is blanked whenever
/// delivery status is empty.
#[must_use]
pub fn normalize(
    doc: &CatalogDocument,
    enrichment: &HashMap<String, EnrichmentPayload>,
    ctx: &WarehouseContext,
    policy: &ChannelPolicy,
) -> NormalizedRecord {
    let mut record = NormalizedRecord::default();
    for rule in FIELD_RULES {
        let value = rule.resolve(doc);
        let slot = match rule.field {
            Field::Id => &mut record.id,
            Field::ItemNumber => &mut record.item_number,
            Field::Name => &mut record.name,
            Field::Price => &mut record.price,
            Field::ListPrice => &mut record.list_price,
            Field::ProductPic => &mut record.product_pic,
            Field::ProductDescription => &mut record.product_description,
            Field::DeliveryStatus => &mut record.delivery_status,
            Field::Availability => &mut record.availability,
            Field::ReviewCount => &mut record.review_count,
            Field::ReviewRatings => &mut record.review_ratings,
            Field::CategoryPath => &mut record.category_path,
        };
        *slot = value;
    }

    let payload = enrichment.get(record.item_number.trim());

    if record.price.trim().is_empty() {
        if let Some(price) = payload.and_then(|p| p.prices().iter().find_map(|t| parse_price(t))) {
            record.price = price;
        }
    }
    if record.delivery_status.trim().is_empty() {
        record.price = String::new();
    }

    record.order_channel = classify(doc, payload, ctx, policy);
    record
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
