use serde::{Deserialize, Serialize};

/// Column order of every snapshot table.
pub const SNAPSHOT_COLUMNS: [&str; 13] = [
    "id",
    "item_number",
    "name",
    "price",
    "listPrice",
    "product_pic",
    "product_description",
    "deliveryStatus",
    "availability",
    "review_count",
    "review_ratings",
    "categoryPath",
    "order_channel",
];

/// Where an item can be bought, derived from enrichment tags and document badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderChannel {
    OnlineOnly,
    WarehouseOnly,
    /// Explicit online and explicit warehouse signals were both present.
    Both,
    /// No decisive signal anywhere in the input.
    #[default]
    Any,
}

impl OrderChannel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrderChannel::OnlineOnly => "online_only",
            OrderChannel::WarehouseOnly => "warehouse_only",
            OrderChannel::Both => "both",
            OrderChannel::Any => "any",
        }
    }

    /// `true` for every value except [`OrderChannel::Any`].
    #[must_use]
    pub fn is_decisive(self) -> bool {
        self != OrderChannel::Any
    }
}

impl std::fmt::Display for OrderChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output row per catalog document.
///
/// Every field is always present. An empty string is the absent marker, so
/// a record never drops a column from the snapshot schema.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub id: String,
    pub item_number: String,
    pub name: String,
    /// Empty when the delivery status is unknown, whatever the source price.
    pub price: String,
    #[serde(rename = "listPrice")]
    pub list_price: String,
    pub product_pic: String,
    pub product_description: String,
    #[serde(rename = "deliveryStatus")]
    pub delivery_status: String,
    pub availability: String,
    pub review_count: String,
    pub review_ratings: String,
    /// Category breadcrumbs joined with `|`.
    #[serde(rename = "categoryPath")]
    pub category_path: String,
    pub order_channel: OrderChannel,
}

impl NormalizedRecord {
    /// Field values as strings, in [`SNAPSHOT_COLUMNS`] order.
    #[must_use]
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.item_number.clone(),
            self.name.clone(),
            self.price.clone(),
            self.list_price.clone(),
            self.product_pic.clone(),
            self.product_description.clone(),
            self.delivery_status.clone(),
            self.availability.clone(),
            self.review_count.clone(),
            self.review_ratings.clone(),
            self.category_path.clone(),
            self.order_channel.as_str().to_string(),
        ]
    }
}
