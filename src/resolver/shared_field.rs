use std::collections::BTreeSet;

use super::{MappingSource, ResolveContext, ResolverPhase, WorkOrderMap};
use crate::constants::{fields, schema};
use crate::data::{RawRecord, RecordType, render_scalar};

/// Correlates an unresolved internal form with an external record that names
/// a real lot, when the two raw records share any non-key field value.
///
/// Heuristic: this is a weak signal (a shared product code or operator name)
/// that has proven effective on real feeds, but it can produce false
/// positives. Values shorter than `min_shared_value_len` are ignored and the
/// earliest matching external record wins.
pub struct SharedFieldPhase;

impl ResolverPhase for SharedFieldPhase {
    fn name(&self) -> &'static str {
        "shared_field"
    }

    fn apply(&self, ctx: &ResolveContext<'_>, mut map: WorkOrderMap) -> WorkOrderMap {
        let min_len = ctx.config().min_shared_value_len;
        let candidates: Vec<(&str, BTreeSet<String>)> = ctx
            .records_of(RecordType::ExternalRft)
            .filter_map(|record| {
                let lot_id = record.lot_id.as_deref()?;
                if !ctx.is_real_lot(lot_id) {
                    return None;
                }
                let values = non_key_values(&record.raw, min_len);
                if values.is_empty() {
                    None
                } else {
                    Some((lot_id, values))
                }
            })
            .collect();
        if candidates.is_empty() {
            return map;
        }

        for record in ctx.records_of(RecordType::InternalRft) {
            if record.lot_id.is_some() {
                continue;
            }
            let Some(work_order) = record.work_order.as_deref() else {
                continue;
            };
            if map.contains(work_order) {
                continue;
            }
            let values = non_key_values(&record.raw, min_len);
            let hit = candidates
                .iter()
                .find(|(_, external_values)| !values.is_disjoint(external_values));
            if let Some((lot_id, _)) = hit {
                map.insert(work_order, lot_id, MappingSource::SharedField);
            }
        }
        map
    }
}

/// True for fields that carry identity, verdict, or date information.
pub fn is_key_field(name: &str) -> bool {
    let groups: [&[&str]; 13] = [
        schema::DISCRIMINATOR_FIELDS,
        schema::SOURCE_TAG_FIELDS,
        fields::LOT,
        fields::PROCESS_WORK_ORDERS,
        fields::INTERNAL_WORK_ORDER,
        fields::ERROR_COUNT,
        fields::FORM_TITLE,
        fields::ISSUE_CATEGORY,
        fields::COMMENT,
        fields::START_DATE,
        fields::END_DATE,
        fields::STAGE,
        &["id", "_id"],
    ];
    groups.iter().any(|group| group.contains(&name))
}

/// Lowercased scalar values of every non-key field with at least `min_len` characters.
pub fn non_key_values(raw: &RawRecord, min_len: usize) -> BTreeSet<String> {
    raw.fields()
        .iter()
        .filter(|(name, _)| !is_key_field(name))
        .filter_map(|(_, value)| render_scalar(value))
        .map(|value| value.to_lowercase())
        .filter(|value| value.chars().count() >= min_len)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconcileConfig;
    use crate::resolver::test_support::*;
    use serde_json::json;

    #[test]
    fn adopts_lot_from_external_record_with_shared_value() {
        let records = records(vec![
            json!({"batchId": "Internal RFT", "wo/lot#": "777", "#_of_errors": 1, "product": "Widget-10mg"}),
            json!({"batchId": "External RFT", "lot": "ABC1234", "category": "Labeling", "sku": "widget-10MG"}),
        ]);
        let config = ReconcileConfig::default();
        let ctx = ResolveContext::new(&records, &config);
        let map = SharedFieldPhase.apply(&ctx, WorkOrderMap::new());
        assert_eq!(map.lot_for("777").map(String::as_str), Some("ABC1234"));
        assert_eq!(map.phase_counts().shared_field, 1);
    }

    #[test]
    fn key_fields_and_short_values_do_not_correlate() {
        let records = records(vec![
            json!({"batchId": "Internal RFT", "wo/lot#": "777", "#_of_errors": 1, "date": "2025-01-01", "line": "A"}),
            json!({"batchId": "External RFT", "lot": "ABC1234", "category": "Labeling", "date": "2025-01-01", "line": "A"}),
        ]);
        let config = ReconcileConfig::default();
        let ctx = ResolveContext::new(&records, &config);
        let map = SharedFieldPhase.apply(&ctx, WorkOrderMap::new());
        assert!(map.is_empty());
    }

    #[test]
    fn pseudo_lot_external_records_are_not_candidates() {
        let records = records(vec![
            json!({"batchId": "Internal RFT", "wo/lot#": "777", "#_of_errors": 1, "product": "Widget"}),
            json!({"batchId": "External RFT", "lot": "888", "category": "Labeling", "product": "Widget"}),
        ]);
        let config = ReconcileConfig::default();
        let ctx = ResolveContext::new(&records, &config);
        let map = SharedFieldPhase.apply(&ctx, WorkOrderMap::new());
        assert!(map.is_empty());
    }

    #[test]
    fn key_field_detection() {
        assert!(is_key_field("batchId"));
        assert!(is_key_field("wo/lot#"));
        assert!(is_key_field("category"));
        assert!(!is_key_field("product"));
    }
}
