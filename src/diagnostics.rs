//! Audit trail of where every input record ended up.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::{NormalizedRecord, RecordType};
use crate::grouping::GroupingCounts;
use crate::resolver::{PhaseCounts, WorkOrderMap};
use crate::types::{LotId, WorkOrder};

/// Record accounting for one analysis run.
///
/// Every record lands in exactly one bucket:
/// `assigned + unmapped_work_order + without_lot + noise_filtered + unknown == total`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationDiagnostics {
    /// Records in the input.
    pub total_records: usize,
    /// Record counts keyed by family label, including `unknown`.
    pub records_by_type: BTreeMap<&'static str, usize>,
    /// Records no schema rule matched.
    pub unknown_records: usize,
    /// Records inside emitted lots.
    pub assigned_records: usize,
    /// Records whose work orders resolved to no lot.
    pub unmapped_work_order_records: usize,
    /// Records with neither a lot id nor a work order.
    pub records_without_lot: usize,
    /// Records dropped with their noise group.
    pub noise_filtered_records: usize,
    /// Lot ids of dropped noise groups.
    pub noise_filtered_lots: Vec<LotId>,
    /// Records moved from a pseudo lot into a real lot.
    pub remapped_records: usize,
    /// Unresolved work orders, sorted.
    pub unmapped_work_orders: Vec<WorkOrder>,
    /// Mappings produced by each resolver phase.
    pub phase_counts: PhaseCounts,
}

impl ReconciliationDiagnostics {
    /// Tally record families; taken before grouping consumes the records.
    pub fn from_records(records: &[NormalizedRecord]) -> Self {
        let mut records_by_type = BTreeMap::new();
        for record in records {
            *records_by_type.entry(record.record_type.label()).or_insert(0) += 1;
        }
        Self {
            total_records: records.len(),
            records_by_type,
            ..Self::default()
        }
    }

    /// Fill in where grouping put the records and what each resolver phase mapped.
    pub fn record_outcome(&mut self, map: &WorkOrderMap, counts: &GroupingCounts) {
        self.unknown_records = counts.unknown_records;
        self.assigned_records = counts.assigned_records;
        self.unmapped_work_order_records = counts.unmapped_work_order_records;
        self.records_without_lot = counts.records_without_lot;
        self.noise_filtered_records = counts.noise_filtered_records;
        self.noise_filtered_lots = counts.noise_filtered_lots.clone();
        self.remapped_records = counts.remapped_records;
        self.unmapped_work_orders = counts.unmapped_work_orders.iter().cloned().collect();
        self.phase_counts = map.phase_counts();
    }

    /// Records left out of lot-level aggregation, unknown records included.
    pub fn unaccounted_for_lots(&self) -> usize {
        self.total_records - self.assigned_records
    }

    /// True when the per-bucket counts add up to the total.
    pub fn is_consistent(&self) -> bool {
        self.assigned_records
            + self.unmapped_work_order_records
            + self.records_without_lot
            + self.noise_filtered_records
            + self.unknown_records
            == self.total_records
    }

    /// Count of records classified as `record_type`.
    pub fn count_of(&self, record_type: RecordType) -> usize {
        self.records_by_type
            .get(record_type.label())
            .copied()
            .unwrap_or(0)
    }
}
