//! Order-channel classification.
//!
//! Signals come from two sources. The enrichment payload contributes
//! attribute phrases, program tags and fulfillment records; the search
//! document contributes badge fields. [`ChannelPolicy::precedence`] decides
//! which source is consulted first. The other is only used when the first
//! yields no signal at all.

use serde_json::Value;
use unicode_normalization::UnicodeNormalization;
use whsnap_core::{ChannelPolicy, ConflictLabel, OrderChannel, Precedence, WarehouseContext};

use crate::types::{value_text, CatalogDocument, EnrichmentPayload, FulfillmentRecord};

const ONLINE_PHRASE: &str = "online only";
const WAREHOUSE_PHRASE: &str = "warehouse only";
const REMOTE_CHANNEL_WORDS: [&str; 6] = ["online", "ship", "shipit", "shipping", "delivery", "ecom"];

/// Explicit signals found in one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelSignals {
    pub online: bool,
    pub warehouse: bool,
}

impl ChannelSignals {
    #[must_use]
    pub fn is_decisive(self) -> bool {
        self.online || self.warehouse
    }

    /// Both explicit signals resolve to the policy's conflict label.
    #[must_use]
    pub fn resolve(self, conflict: ConflictLabel) -> OrderChannel {
        match (self.online, self.warehouse) {
            (true, true) => match conflict {
                ConflictLabel::Both => OrderChannel::Both,
                ConflictLabel::Any => OrderChannel::Any,
            },
            (true, false) => OrderChannel::OnlineOnly,
            (false, true) => OrderChannel::WarehouseOnly,
            (false, false) => OrderChannel::Any,
        }
    }

    fn absorb_text(&mut self, text: &str) {
        let normalized = format!(" {} ", normalize_text(text));
        self.online |= normalized.contains(&format!(" {ONLINE_PHRASE} "));
        self.warehouse |= normalized.contains(&format!(" {WAREHOUSE_PHRASE} "));
    }

    fn absorb_tag(&mut self, tag: &str, policy: &ChannelPolicy) {
        self.online |= policy.is_online_program(tag);
        self.warehouse |= policy.is_warehouse_program(tag);
    }
}

/// NFKC, lowercase, punctuation to spaces, whitespace collapsed.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    let folded: String = text
        .nfkc()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classifies one item. A pure function of its inputs.
#[must_use]
pub fn classify(
    doc: &CatalogDocument,
    payload: Option<&EnrichmentPayload>,
    ctx: &WarehouseContext,
    policy: &ChannelPolicy,
) -> OrderChannel {
    let enrichment = payload
        .map(|p| enrichment_signals(p, ctx, policy))
        .unwrap_or_default();
    let document = document_signals(doc, policy);

    let (first, second) = match policy.precedence {
        Precedence::EnrichmentFirst => (enrichment, document),
        Precedence::DocumentFirst => (document, enrichment),
    };
    if first.is_decisive() {
        first.resolve(policy.conflict)
    } else {
        second.resolve(policy.conflict)
    }
}

#[must_use]
pub fn enrichment_signals(
    payload: &EnrichmentPayload,
    ctx: &WarehouseContext,
    policy: &ChannelPolicy,
) -> ChannelSignals {
    let mut signals = ChannelSignals::default();

    for attribute in payload.attributes() {
        if let Some(key) = &attribute.key {
            signals.absorb_text(key);
        }
        for_each_text(&attribute.value, &mut |t| signals.absorb_text(t));
    }

    for tag in payload.program_tags() {
        signals.absorb_tag(&tag, policy);
    }

    if policy.fulfillment_is_warehouse_signal {
        signals.warehouse |= payload
            .fulfillment
            .iter()
            .any(|record| is_in_warehouse_record(record, ctx));
    }

    signals
}

/// A fulfillment record stocked at the selected warehouse and not tagged
/// with a ship/online channel.
fn is_in_warehouse_record(record: &FulfillmentRecord, ctx: &WarehouseContext) -> bool {
    let local = record
        .warehouse_number
        .as_deref()
        .is_some_and(|n| n.trim() == ctx.warehouse_number);
    let remote = record.channel.as_deref().is_some_and(|channel| {
        normalize_text(channel)
            .split(' ')
            .any(|word| REMOTE_CHANNEL_WORDS.contains(&word))
    });
    local && !remote
}

#[must_use]
pub fn document_signals(doc: &CatalogDocument, policy: &ChannelPolicy) -> ChannelSignals {
    let mut signals = ChannelSignals::default();
    for field in &policy.badge_fields {
        if let Some(value) = doc.get(field) {
            for_each_text(value, &mut |badge| {
                signals.absorb_text(badge);
                signals.absorb_tag(badge, policy);
            });
        }
    }
    signals
}

/// Visits every scalar string inside `value`, descending into lists and
/// object values.
fn for_each_text(value: &Value, visit: &mut impl FnMut(&str)) {
    match value {
        Value::Array(items) => {
            for item in items {
                for_each_text(item, visit);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                for_each_text(item, visit);
            }
        }
        Value::Null => {}
        other => visit(&value_text(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attribute, CatalogData, ChildData};
    use serde_json::json;

    fn ctx() -> WarehouseContext {
        WarehouseContext {
            warehouse_number: "388".to_owned(),
            warehouse_filter: "388-wh".to_owned(),
            location_ids: vec!["388-wh".to_owned()],
            user_location: "IL".to_owned(),
        }
    }

    fn doc(value: Value) -> CatalogDocument {
        serde_json::from_value(value).unwrap()
    }

    fn attribute(key: &str, value: Value) -> Attribute {
        Attribute {
            key: Some(key.to_owned()),
            value,
        }
    }

    fn with_attributes(attributes: Vec<Attribute>) -> EnrichmentPayload {
        EnrichmentPayload {
            catalog: Some(CatalogData {
                attributes,
                ..CatalogData::default()
            }),
            ..EnrichmentPayload::default()
        }
    }

    fn with_programs(programs: Value) -> EnrichmentPayload {
        EnrichmentPayload {
            catalog: Some(CatalogData {
                program_types: programs,
                ..CatalogData::default()
            }),
            ..EnrichmentPayload::default()
        }
    }

    #[test]
    fn normalize_text_folds_case_punctuation_and_width() {
        assert_eq!(normalize_text("  ONLINE-Only!! "), "online only");
        assert_eq!(normalize_text("Ｗａｒｅｈｏｕｓｅ　Ｏｎｌｙ"), "warehouse only");
        assert_eq!(normalize_text("Online\u{00A0}\tonly"), "online only");
    }

    #[test]
    fn no_signal_anywhere_is_any() {
        let policy = ChannelPolicy::default();
        let payload = with_attributes(vec![attribute("Brand", json!("Kirkland"))]);
        let channel = classify(&doc(json!({"id": "1"})), Some(&payload), &ctx(), &policy);
        assert_eq!(channel, OrderChannel::Any);
        assert_eq!(
            classify(&doc(json!({"id": "1"})), None, &ctx(), &policy),
            OrderChannel::Any
        );
    }

    #[test]
    fn attribute_phrase_is_detected_in_value_and_key() {
        let policy = ChannelPolicy::default();
        let by_value = with_attributes(vec![attribute("Availability", json!(["Online-Only"]))]);
        assert_eq!(
            classify(&doc(json!({})), Some(&by_value), &ctx(), &policy),
            OrderChannel::OnlineOnly
        );

        let by_key = with_attributes(vec![attribute("Warehouse Only", json!(true))]);
        assert_eq!(
            classify(&doc(json!({})), Some(&by_key), &ctx(), &policy),
            OrderChannel::WarehouseOnly
        );
    }

    #[test]
    fn phrase_must_match_whole_words() {
        let policy = ChannelPolicy::default();
        let payload = with_attributes(vec![attribute("Note", json!("nonline onlyish"))]);
        assert_eq!(
            classify(&doc(json!({})), Some(&payload), &ctx(), &policy),
            OrderChannel::Any
        );
    }

    #[test]
    fn child_variant_attributes_count() {
        let policy = ChannelPolicy::default();
        let payload = EnrichmentPayload {
            children: vec![ChildData {
                attributes: vec![attribute("Channel", json!("Warehouse only"))],
                ..ChildData::default()
            }],
            ..EnrichmentPayload::default()
        };
        assert_eq!(
            classify(&doc(json!({})), Some(&payload), &ctx(), &policy),
            OrderChannel::WarehouseOnly
        );
    }

    #[test]
    fn program_tags_match_vocabulary() {
        let policy = ChannelPolicy::default();
        assert_eq!(
            classify(&doc(json!({})), Some(&with_programs(json!("ShipIt"))), &ctx(), &policy),
            OrderChannel::OnlineOnly
        );
        assert_eq!(
            classify(
                &doc(json!({})),
                Some(&with_programs(json!(["inwarehouse"]))),
                &ctx(),
                &policy
            ),
            OrderChannel::WarehouseOnly
        );
    }

    #[test]
    fn both_signals_use_conflict_label() {
        let payload = with_programs(json!("ShipIt,InWarehouse"));
        let mut policy = ChannelPolicy::default();
        assert_eq!(
            classify(&doc(json!({})), Some(&payload), &ctx(), &policy),
            OrderChannel::Both
        );
        policy.conflict = ConflictLabel::Any;
        assert_eq!(
            classify(&doc(json!({})), Some(&payload), &ctx(), &policy),
            OrderChannel::Any
        );
    }

    fn with_fulfillment(warehouse: Option<&str>, channel: Option<&str>) -> EnrichmentPayload {
        EnrichmentPayload {
            fulfillment: vec![FulfillmentRecord {
                item_number: Some("100".to_owned()),
                warehouse_number: warehouse.map(str::to_owned),
                channel: channel.map(str::to_owned),
                ..FulfillmentRecord::default()
            }],
            ..EnrichmentPayload::default()
        }
    }

    #[test]
    fn fulfillment_records_are_not_a_signal_by_default() {
        let policy = ChannelPolicy::default();
        for payload in [
            with_fulfillment(Some("388"), None),
            with_fulfillment(None, Some("online")),
            with_fulfillment(Some("388"), Some("warehouse")),
        ] {
            assert_eq!(
                classify(&doc(json!({})), Some(&payload), &ctx(), &policy),
                OrderChannel::Any
            );
        }
    }

    #[test]
    fn online_program_with_local_stock_stays_online_by_default() {
        let mut payload = with_programs(json!("ShipIt"));
        payload.fulfillment = with_fulfillment(Some("388"), Some("online")).fulfillment;
        assert_eq!(
            classify(&doc(json!({})), Some(&payload), &ctx(), &ChannelPolicy::default()),
            OrderChannel::OnlineOnly
        );
    }

    #[test]
    fn opted_in_fulfillment_counts_only_in_warehouse_records_for_this_warehouse() {
        let policy = ChannelPolicy {
            fulfillment_is_warehouse_signal: true,
            ..ChannelPolicy::default()
        };
        let classify_with = |payload: EnrichmentPayload| {
            classify(&doc(json!({})), Some(&payload), &ctx(), &policy)
        };

        assert_eq!(
            classify_with(with_fulfillment(Some(" 388 "), None)),
            OrderChannel::WarehouseOnly
        );
        assert_eq!(
            classify_with(with_fulfillment(Some("388"), Some("In Warehouse"))),
            OrderChannel::WarehouseOnly
        );
        assert_eq!(
            classify_with(with_fulfillment(Some("1091"), None)),
            OrderChannel::Any
        );
        assert_eq!(
            classify_with(with_fulfillment(None, None)),
            OrderChannel::Any
        );
        assert_eq!(
            classify_with(with_fulfillment(Some("388"), Some("online"))),
            OrderChannel::Any
        );
        assert_eq!(
            classify_with(with_fulfillment(Some("388"), Some("Ship-It"))),
            OrderChannel::Any
        );
    }

    #[test]
    fn document_badges_fill_in_when_enrichment_is_silent() {
        let policy = ChannelPolicy::default();
        let badged = doc(json!({"item_location_pill": ["Online Only"]}));
        assert_eq!(
            classify(&badged, None, &ctx(), &policy),
            OrderChannel::OnlineOnly
        );

        let silent = with_attributes(vec![attribute("Brand", json!("Kirkland"))]);
        assert_eq!(
            classify(&badged, Some(&silent), &ctx(), &policy),
            OrderChannel::OnlineOnly
        );
    }

    #[test]
    fn precedence_picks_the_first_decisive_source() {
        let badged = doc(json!({"badges": "Warehouse Only"}));
        let payload = with_programs(json!("ShipIt"));

        let mut policy = ChannelPolicy::default();
        assert_eq!(
            classify(&badged, Some(&payload), &ctx(), &policy),
            OrderChannel::OnlineOnly
        );

        policy.precedence = Precedence::DocumentFirst;
        assert_eq!(
            classify(&badged, Some(&payload), &ctx(), &policy),
            OrderChannel::WarehouseOnly
        );
    }

    #[test]
    fn badge_fields_outside_policy_are_ignored() {
        let policy = ChannelPolicy::default();
        let d = doc(json!({"marketing_blurb": "online only deal"}));
        assert_eq!(classify(&d, None, &ctx(), &policy), OrderChannel::Any);
    }
}
