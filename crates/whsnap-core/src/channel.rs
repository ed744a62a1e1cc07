//! Purchase-channel classification policy.
//!
//! Tag vocabularies and precedence are data: a [`ChannelPolicy`] can be
//! supplied in the `channel_policy` section of `config/warehouses.yaml`, and
//! omitted fields fall back to the defaults below.

use serde::{Deserialize, Serialize};

/// Which source decides the channel when both carry a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Precedence {
    /// Enrichment signals win; document badges only break an undecided result.
    #[default]
    EnrichmentFirst,
    /// Document badges win; enrichment only breaks an undecided result.
    DocumentFirst,
}

/// Label emitted when explicit online and warehouse signals are both present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictLabel {
    #[default]
    Both,
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelPolicy {
    /// Program-type tags that mark an item as purchasable in the warehouse.
    pub warehouse_programs: Vec<String>,
    /// Program-type tags that mark an item as purchasable online.
    pub online_programs: Vec<String>,
    /// Catalog-document fields holding badge/pill text.
    pub badge_fields: Vec<String>,
    pub precedence: Precedence,
    pub conflict: ConflictLabel,
    /// Whether an in-warehouse fulfillment record for the selected warehouse
    /// counts as a warehouse signal. Off by default.
    pub fulfillment_is_warehouse_signal: bool,
}

impl Default for ChannelPolicy {
    fn default() -> Self {
        Self {
            warehouse_programs: to_owned(&["InWarehouse", "Warehouse", "BuyInWarehouse", "WarehouseOnly"]),
            online_programs: to_owned(&["ShipIt", "2DayDelivery", "OnlineOnly", "BuyOnline"]),
            badge_fields: to_owned(&[
                "item_pill",
                "pills",
                "badges",
                "item_badges",
                "item_location_pill",
            ]),
            precedence: Precedence::default(),
            conflict: ConflictLabel::default(),
            fulfillment_is_warehouse_signal: false,
        }
    }
}

impl ChannelPolicy {
    /// Returns `true` if `tag` is in the warehouse vocabulary (case-insensitive).
    #[must_use]
    pub fn is_warehouse_program(&self, tag: &str) -> bool {
        contains_ignore_case(&self.warehouse_programs, tag)
    }

    /// Returns `true` if `tag` is in the online vocabulary (case-insensitive).
    #[must_use]
    pub fn is_online_program(&self, tag: &str) -> bool {
        contains_ignore_case(&self.online_programs, tag)
    }
}

fn contains_ignore_case(vocabulary: &[String], tag: &str) -> bool {
    let tag = tag.trim();
    vocabulary.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_prefers_enrichment_and_labels_conflicts_both() {
        let policy = ChannelPolicy::default();
        assert_eq!(policy.precedence, Precedence::EnrichmentFirst);
        assert_eq!(policy.conflict, ConflictLabel::Both);
        assert!(!policy.fulfillment_is_warehouse_signal);
    }

    #[test]
    fn program_lookup_ignores_case_and_padding() {
        let policy = ChannelPolicy::default();
        assert!(policy.is_online_program(" shipit "));
        assert!(policy.is_warehouse_program("INWAREHOUSE"));
        assert!(!policy.is_online_program("InWarehouse"));
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_fields() {
        let policy: ChannelPolicy =
            serde_yaml::from_str("precedence: document_first\nconflict: any\n").unwrap();
        assert_eq!(policy.precedence, Precedence::DocumentFirst);
        assert_eq!(policy.conflict, ConflictLabel::Any);
        assert_eq!(
            policy.online_programs,
            ChannelPolicy::default().online_programs
        );
    }
}
