//! Lot grouping: attach every normalized record to at most one lot.
//!
//! Grouping runs in three ordered passes:
//! 1) attach records by explicit lot id, or by work order through the resolver map;
//! 2) move records out of pseudo lots the resolver remapped, deleting those groups;
//! 3) drop noise groups (no process records and too few other records).
//!
//! Records that end up in no lot are counted by reason, never silently lost.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::config::ReconcileConfig;
use crate::data::{NormalizedRecord, RecordType};
use crate::lot::Lot;
use crate::resolver::WorkOrderMap;
use crate::types::{LotId, WorkOrder};

/// Where records went during grouping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GroupingCounts {
    /// Records that ended up in an emitted lot.
    pub assigned_records: usize,
    /// Unclassifiable records (never grouped).
    pub unknown_records: usize,
    /// Records whose work orders resolved to no lot.
    pub unmapped_work_order_records: usize,
    /// Records carrying neither a lot id nor a work order.
    pub records_without_lot: usize,
    /// Records dropped together with their noise group.
    pub noise_filtered_records: usize,
    /// Lot ids of dropped noise groups, sorted.
    pub noise_filtered_lots: Vec<LotId>,
    /// Records moved from a pseudo lot into a real lot.
    pub remapped_records: usize,
    /// Work orders that resolved to no lot, sorted.
    pub unmapped_work_orders: BTreeSet<WorkOrder>,
}

impl GroupingCounts {
    /// Records not attached to any lot, whatever the reason.
    pub fn unassigned_records(&self) -> usize {
        self.unmapped_work_order_records + self.records_without_lot + self.noise_filtered_records
    }
}

/// Result of grouping: emitted lots keyed by normalized lot id, plus counts.
#[derive(Clone, Debug, Default)]
pub struct GroupingOutcome {
    /// Emitted lots keyed by lot id.
    pub lots: BTreeMap<LotId, Lot>,
    /// Where every record went.
    pub counts: GroupingCounts,
}

/// Group normalized records into lots using the resolved work-order map.
pub fn group_records(
    records: Vec<NormalizedRecord>,
    map: &WorkOrderMap,
    config: &ReconcileConfig,
) -> GroupingOutcome {
    let mut counts = GroupingCounts::default();
    let mut lots: BTreeMap<LotId, Lot> = BTreeMap::new();

    for record in records {
        if record.record_type == RecordType::Unknown {
            counts.unknown_records += 1;
            continue;
        }
        let target = match &record.lot_id {
            Some(lot_id) => Some(lot_id.clone()),
            None => map.resolve_any(&record.work_orders).cloned(),
        };
        match target {
            Some(lot_id) => {
                lots.entry(lot_id.clone())
                    .or_insert_with(|| Lot::new(lot_id))
                    .records
                    .push(record);
            }
            None if !record.work_orders.is_empty() => {
                counts.unmapped_work_order_records += 1;
                counts
                    .unmapped_work_orders
                    .extend(record.work_orders.iter().cloned());
            }
            None => counts.records_without_lot += 1,
        }
    }

    let remaps: Vec<(LotId, LotId)> = map
        .pseudo_lot_remaps()
        .map(|(pseudo, target)| (pseudo.clone(), target.clone()))
        .collect();
    for (pseudo_lot, target) in remaps {
        let Some(pseudo_group) = lots.remove(&pseudo_lot) else {
            continue;
        };
        counts.remapped_records += pseudo_group.records.len();
        debug!(
            "[lotwise:grouping] moved {} records from pseudo lot '{}' to '{}'",
            pseudo_group.records.len(),
            pseudo_lot,
            target
        );
        lots.entry(target.clone())
            .or_insert_with(|| Lot::new(target))
            .records
            .extend(pseudo_group.records);
    }

    let min_records = config.noise_min_records;
    lots.retain(|lot_id, lot| {
        let keep = lot.count_of(RecordType::Process) > 0 || lot.records.len() >= min_records;
        if !keep {
            counts.noise_filtered_records += lot.records.len();
            counts.noise_filtered_lots.push(lot_id.clone());
        }
        keep
    });

    for lot in lots.values_mut() {
        lot.records.sort_by_key(|record| record.index);
    }
    counts.assigned_records = lots.values().map(|lot| lot.records.len()).sum();

    GroupingOutcome { lots, counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::test_support::*;
    use crate::resolver::{MappingSource, Resolver};
    use serde_json::json;

    fn group(values: Vec<serde_json::Value>) -> GroupingOutcome {
        let records = records(values);
        let config = ReconcileConfig::default();
        let map = Resolver::default().resolve(&records, &config);
        group_records(records, &map, &config)
    }

    #[test]
    fn attaches_internal_records_through_work_orders() {
        let outcome = group(vec![
            process("ABC1234", "900", "901", "2025-01-01", "2025-01-05"),
            internal("900", 0, "2025-01-02"),
            internal("901", 1, "2025-01-03"),
        ]);
        assert_eq!(outcome.lots.len(), 1);
        let lot = &outcome.lots["ABC1234"];
        assert_eq!(lot.records.len(), 3);
        assert_eq!(lot.internal_records().count(), 2);
        assert_eq!(outcome.counts.assigned_records, 3);
        assert_eq!(outcome.counts.unassigned_records(), 0);
    }

    #[test]
    fn unmapped_work_orders_are_counted_not_grouped() {
        let outcome = group(vec![
            process("ABC1234", "900", "901", "2025-01-01", "2025-01-05"),
            internal("555", 0, "2024-01-02"),
        ]);
        assert!(!outcome.lots.contains_key("555"));
        assert_eq!(outcome.counts.unmapped_work_order_records, 1);
        assert!(outcome.counts.unmapped_work_orders.contains("555"));
    }

    #[test]
    fn noise_groups_are_dropped_and_counted() {
        let outcome = group(vec![
            json!({"batchId": "External RFT", "lot": "XYZ5678", "category": "Labeling"}),
            json!({"batchId": "External RFT", "lot": "QRS1111", "category": "Labeling"}),
            json!({"batchId": "External RFT", "lot": "QRS1111", "category": "Documentation"}),
        ]);
        assert!(!outcome.lots.contains_key("XYZ5678"));
        assert!(outcome.lots.contains_key("QRS1111"));
        assert_eq!(outcome.counts.noise_filtered_records, 1);
        assert_eq!(outcome.counts.noise_filtered_lots, vec!["XYZ5678".to_string()]);
    }

    #[test]
    fn pseudo_lot_records_move_exactly_once() {
        let outcome = group(vec![
            process("ABC1234", "900", "901", "2025-01-01", "2025-01-05"),
            json!({"batchId": "External RFT", "lot": "901", "category": "Labeling"}),
            json!({"batchId": "External RFT", "lot": "901", "category": "Info Only"}),
        ]);
        assert!(!outcome.lots.contains_key("901"));
        let lot = &outcome.lots["ABC1234"];
        assert_eq!(lot.external_records().count(), 2);
        assert_eq!(outcome.counts.remapped_records, 2);
        let indices: Vec<usize> = lot.records.iter().map(|record| record.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn unknown_and_lotless_records_are_tracked() {
        let outcome = group(vec![
            json!({"foo": "bar"}),
            json!({"batchId": "External RFT", "category": "Labeling"}),
        ]);
        assert!(outcome.lots.is_empty());
        assert_eq!(outcome.counts.unknown_records, 1);
        assert_eq!(outcome.counts.records_without_lot, 1);
    }

    #[test]
    fn process_records_without_lot_follow_their_work_orders() {
        let records = records(vec![
            json!({"batchId": "Commercial Process", "assemblyWo": "900"}),
        ]);
        let config = ReconcileConfig::default();
        let mut map = WorkOrderMap::new();
        map.insert("900", "ABC1234", MappingSource::Direct);
        let outcome = group_records(records, &map, &config);
        // A lone process record is never noise.
        assert_eq!(outcome.lots["ABC1234"].process_records().count(), 1);
    }
}
