//! Work-order to lot resolution.
//!
//! Internal RFT forms reference work orders, not lots. The resolver builds the
//! `WorkOrder -> LotId` lookup through an ordered cascade of phases. Each phase
//! is a pure `(context, map) -> map` step that only fills entries the previous
//! phases left empty, so the phase order is the only thing that decides
//! conflicting evidence.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::config::ReconcileConfig;
use crate::data::{NormalizedRecord, RecordType};
use crate::identity::is_real_lot;
use crate::types::{LotId, WorkOrder};

/// Phase 1: process-record lot/work-order pairs.
pub mod direct;
/// Phase 4: pseudo-lot remapping.
pub mod pseudo_lot;
/// Phase 3: shared-field correlation with external records.
pub mod shared_field;
/// Phase 2: substring containment against confirmed lots.
pub mod substring;
/// Phase 5: temporal proximity.
pub mod temporal;

pub use direct::DirectPhase;
pub use pseudo_lot::PseudoLotPhase;
pub use shared_field::SharedFieldPhase;
pub use substring::SubstringPhase;
pub use temporal::TemporalPhase;

/// Which phase produced a mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingSource {
    /// Process record listing the work order.
    Direct,
    /// Textual containment with a lot id.
    Substring,
    /// Shared value with an external record.
    SharedField,
    /// Date proximity to a lot's process records.
    Temporal,
}

/// One resolved work order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Mapping {
    /// Lot the work order belongs to.
    pub lot_id: LotId,
    /// Phase that produced the mapping.
    pub source: MappingSource,
}

/// Per-phase mapping totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PhaseCounts {
    /// Direct mappings.
    pub direct: usize,
    /// Substring mappings.
    pub substring: usize,
    /// Shared-field mappings.
    pub shared_field: usize,
    /// Temporal mappings.
    pub temporal: usize,
    /// Pseudo lots folded into real lots.
    pub pseudo_lots_remapped: usize,
}

/// Work-order lookup plus the pseudo-lot remap decisions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WorkOrderMap {
    entries: BTreeMap<WorkOrder, Mapping>,
    pseudo_lot_remap: BTreeMap<LotId, LotId>,
}

impl WorkOrderMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mapping unless the work order is already resolved.
    ///
    /// Returns `true` when the entry was added.
    pub fn insert(&mut self, work_order: &str, lot_id: &str, source: MappingSource) -> bool {
        if self.entries.contains_key(work_order) {
            return false;
        }
        self.entries.insert(
            work_order.to_string(),
            Mapping {
                lot_id: lot_id.to_string(),
                source,
            },
        );
        true
    }

    /// Lot the work order resolved to.
    pub fn lot_for(&self, work_order: &str) -> Option<&LotId> {
        self.entries.get(work_order).map(|mapping| &mapping.lot_id)
    }

    /// Full mapping record for a work order.
    pub fn mapping_for(&self, work_order: &str) -> Option<&Mapping> {
        self.entries.get(work_order)
    }

    /// True when the work order already has a lot.
    pub fn contains(&self, work_order: &str) -> bool {
        self.entries.contains_key(work_order)
    }

    /// Number of resolved work orders.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolved work orders in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&WorkOrder, &Mapping)> {
        self.entries.iter()
    }

    /// First resolved lot among `work_orders`, in the given order.
    pub fn resolve_any<'a>(&'a self, work_orders: &[WorkOrder]) -> Option<&'a LotId> {
        work_orders.iter().find_map(|work_order| self.lot_for(work_order))
    }

    /// Record that records grouped under `pseudo_lot` belong to `lot_id`.
    ///
    /// A pseudo lot is remapped at most once; later calls are ignored.
    pub fn remap_pseudo_lot(&mut self, pseudo_lot: &str, lot_id: &str) -> bool {
        if self.pseudo_lot_remap.contains_key(pseudo_lot) {
            return false;
        }
        self.pseudo_lot_remap
            .insert(pseudo_lot.to_string(), lot_id.to_string());
        true
    }

    /// Real lot a pseudo lot was remapped to.
    pub fn pseudo_lot_target(&self, pseudo_lot: &str) -> Option<&LotId> {
        self.pseudo_lot_remap.get(pseudo_lot)
    }

    /// Every pseudo-lot remap, sorted by pseudo lot.
    pub fn pseudo_lot_remaps(&self) -> impl Iterator<Item = (&LotId, &LotId)> {
        self.pseudo_lot_remap.iter()
    }

    /// Mapping totals per phase.
    pub fn phase_counts(&self) -> PhaseCounts {
        let mut counts = PhaseCounts {
            pseudo_lots_remapped: self.pseudo_lot_remap.len(),
            ..PhaseCounts::default()
        };
        for mapping in self.entries.values() {
            match mapping.source {
                MappingSource::Direct => counts.direct += 1,
                MappingSource::Substring => counts.substring += 1,
                MappingSource::SharedField => counts.shared_field += 1,
                MappingSource::Temporal => counts.temporal += 1,
            }
        }
        counts
    }
}

/// Read-only view over the normalized records shared by every phase.
pub struct ResolveContext<'a> {
    records: &'a [NormalizedRecord],
    config: &'a ReconcileConfig,
    confirmed_lots: BTreeSet<LotId>,
    process_lots: BTreeSet<LotId>,
    pending_work_orders: BTreeSet<WorkOrder>,
    pseudo_lots: BTreeSet<LotId>,
}

impl<'a> ResolveContext<'a> {
    /// Index the records once; phases only read from this.
    pub fn new(records: &'a [NormalizedRecord], config: &'a ReconcileConfig) -> Self {
        let mut confirmed_lots = BTreeSet::new();
        let mut process_lots = BTreeSet::new();
        let mut pending_work_orders = BTreeSet::new();
        let mut pseudo_lots = BTreeSet::new();

        for record in records {
            if record.record_type == RecordType::Unknown {
                continue;
            }
            match &record.lot_id {
                Some(lot_id) if is_real_lot(config, lot_id) => {
                    confirmed_lots.insert(lot_id.clone());
                    if record.record_type == RecordType::Process {
                        process_lots.insert(lot_id.clone());
                    }
                }
                Some(lot_id) => {
                    pseudo_lots.insert(lot_id.clone());
                }
                None => {
                    if record.record_type == RecordType::InternalRft {
                        pending_work_orders.extend(record.work_orders.iter().cloned());
                    }
                }
            }
        }

        Self {
            records,
            config,
            confirmed_lots,
            process_lots,
            pending_work_orders,
            pseudo_lots,
        }
    }

    /// All normalized records in input order.
    pub fn records(&self) -> &'a [NormalizedRecord] {
        self.records
    }

    /// Records of one family, in input order.
    pub fn records_of(&self, record_type: RecordType) -> impl Iterator<Item = &'a NormalizedRecord> {
        self.records
            .iter()
            .filter(move |record| record.record_type == record_type)
    }

    /// Active configuration.
    pub fn config(&self) -> &'a ReconcileConfig {
        self.config
    }

    /// Real lot ids named explicitly by any record, sorted.
    pub fn confirmed_lots(&self) -> &BTreeSet<LotId> {
        &self.confirmed_lots
    }

    /// Real lot ids that own at least one process record, sorted.
    pub fn process_lots(&self) -> &BTreeSet<LotId> {
        &self.process_lots
    }

    /// Work orders referenced by internal forms that name no lot, sorted.
    pub fn pending_work_orders(&self) -> &BTreeSet<WorkOrder> {
        &self.pending_work_orders
    }

    /// Lot ids used by records that fail the real-lot gate, sorted.
    pub fn pseudo_lots(&self) -> &BTreeSet<LotId> {
        &self.pseudo_lots
    }

    /// Pending work orders the map has not resolved yet, sorted.
    pub fn unmapped_work_orders(&self, map: &WorkOrderMap) -> Vec<WorkOrder> {
        self.pending_work_orders
            .iter()
            .filter(|work_order| !map.contains(work_order))
            .cloned()
            .collect()
    }

    /// True when `lot_id` passes the real-lot gate.
    pub fn is_real_lot(&self, lot_id: &str) -> bool {
        is_real_lot(self.config, lot_id)
    }
}

/// One step of the resolution cascade.
pub trait ResolverPhase: Send + Sync {
    /// Short phase name used in logs.
    fn name(&self) -> &'static str;
    /// Return `map` extended with whatever this phase can resolve.
    fn apply(&self, ctx: &ResolveContext<'_>, map: WorkOrderMap) -> WorkOrderMap;
}

/// Ordered phase cascade.
pub struct Resolver {
    phases: Vec<Box<dyn ResolverPhase>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(DirectPhase),
            Box::new(SubstringPhase),
            Box::new(SharedFieldPhase),
            Box::new(PseudoLotPhase),
            Box::new(TemporalPhase),
        ])
    }
}

impl Resolver {
    /// Build a cascade from an explicit phase list (applied left to right).
    pub fn new(phases: Vec<Box<dyn ResolverPhase>>) -> Self {
        Self { phases }
    }

    /// Phase names in application order.
    pub fn phase_names(&self) -> Vec<&'static str> {
        self.phases.iter().map(|phase| phase.name()).collect()
    }

    /// Run every phase in order over `records`.
    pub fn resolve(&self, records: &[NormalizedRecord], config: &ReconcileConfig) -> WorkOrderMap {
        let ctx = ResolveContext::new(records, config);
        let mut map = WorkOrderMap::new();
        for phase in &self.phases {
            let before_entries = map.len();
            let before_remaps = map.pseudo_lot_remap.len();
            map = phase.apply(&ctx, map);
            debug!(
                "[lotwise:resolver] phase '{}' resolved {} work orders and {} pseudo lots",
                phase.name(),
                map.len() - before_entries,
                map.pseudo_lot_remap.len() - before_remaps
            );
        }
        debug!(
            "[lotwise:resolver] {} of {} pending work orders unresolved",
            ctx.unmapped_work_orders(&map).len(),
            ctx.pending_work_orders().len()
        );
        map
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::{Value, json};

    use crate::config::ReconcileConfig;
    use crate::data::{NormalizedRecord, RawRecord};
    use crate::normalize::normalize_records;

    /// Normalize a list of JSON objects with the default config.
    pub fn records(values: Vec<Value>) -> Vec<NormalizedRecord> {
        let raws: Vec<RawRecord> = values
            .into_iter()
            .map(|value| match value {
                Value::Object(map) => RawRecord::new(map),
                other => panic!("expected object, got {other}"),
            })
            .collect();
        normalize_records(&raws, &ReconcileConfig::default())
    }

    pub fn process(lot: &str, assembly: &str, cartoning: &str, start: &str, end: &str) -> Value {
        json!({
            "batchId": "Commercial Process",
            "lot": lot,
            "assemblyWo": assembly,
            "cartoningWo": cartoning,
            "startDate": start,
            "endDate": end,
        })
    }

    pub fn internal(work_order: &str, errors: u32, date: &str) -> Value {
        json!({
            "batchId": "Internal RFT",
            "wo/lot#": work_order,
            "#_of_errors": errors,
            "date": date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn insert_keeps_first_mapping() {
        let mut map = WorkOrderMap::new();
        assert!(map.insert("900", "ABC1234", MappingSource::Direct));
        assert!(!map.insert("900", "XYZ9999", MappingSource::Temporal));
        assert_eq!(map.lot_for("900").map(String::as_str), Some("ABC1234"));
        assert_eq!(map.phase_counts().direct, 1);
        assert_eq!(map.phase_counts().temporal, 0);
    }

    #[test]
    fn context_partitions_lots_and_work_orders() {
        let records = records(vec![
            process("ABC1234", "900", "901", "2025-01-01", "2025-01-05"),
            internal("900", 0, "2025-01-02"),
            internal("555", 0, "2025-01-02"),
            serde_json::json!({"batchId": "External RFT", "lot": "777", "category": "Labeling"}),
        ]);
        let config = ReconcileConfig::default();
        let ctx = ResolveContext::new(&records, &config);
        assert!(ctx.confirmed_lots().contains("ABC1234"));
        assert!(ctx.process_lots().contains("ABC1234"));
        assert!(ctx.pseudo_lots().contains("777"));
        assert_eq!(
            ctx.pending_work_orders().iter().cloned().collect::<Vec<_>>(),
            vec!["555".to_string(), "900".to_string()]
        );
    }

    #[test]
    fn default_cascade_runs_phases_in_order() {
        let resolver = Resolver::default();
        assert_eq!(
            resolver.phase_names(),
            vec!["direct", "substring", "shared_field", "pseudo_lot", "temporal"]
        );
    }

    #[test]
    fn resolve_maps_direct_work_orders_and_leaves_strays() {
        let records = records(vec![
            process("ABC1234", "900", "901", "2025-01-01", "2025-01-05"),
            internal("900", 0, "2025-01-02"),
            internal("555", 0, "2024-01-02"),
        ]);
        let config = ReconcileConfig::default();
        let map = Resolver::default().resolve(&records, &config);
        assert_eq!(map.lot_for("900").map(String::as_str), Some("ABC1234"));
        assert_eq!(map.lot_for("901").map(String::as_str), Some("ABC1234"));
        assert_eq!(map.lot_for("555"), None);
        let ctx = ResolveContext::new(&records, &config);
        assert_eq!(ctx.unmapped_work_orders(&map), vec!["555".to_string()]);
    }
}
