use super::{MappingSource, ResolveContext, ResolverPhase, WorkOrderMap};
use crate::data::RecordType;

/// Maps every work order on a process record to that record's lot.
///
/// Only lots that pass the real-lot gate are used; when two process records
/// claim the same work order, the earlier record wins.
pub struct DirectPhase;

impl ResolverPhase for DirectPhase {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn apply(&self, ctx: &ResolveContext<'_>, mut map: WorkOrderMap) -> WorkOrderMap {
        for record in ctx.records_of(RecordType::Process) {
            let Some(lot_id) = record.lot_id.as_deref() else {
                continue;
            };
            if !ctx.is_real_lot(lot_id) {
                continue;
            }
            for work_order in &record.work_orders {
                map.insert(work_order, lot_id, MappingSource::Direct);
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconcileConfig;
    use crate::resolver::test_support::*;

    #[test]
    fn maps_each_work_order_to_the_process_lot() {
        let records = records(vec![
            process("ABC1234", "900", "901", "2025-01-01", "2025-01-05"),
            process("XYZ5678", "910", "911", "2025-01-01", "2025-01-05"),
        ]);
        let config = ReconcileConfig::default();
        let ctx = ResolveContext::new(&records, &config);
        let map = DirectPhase.apply(&ctx, WorkOrderMap::new());
        assert_eq!(map.len(), 4);
        assert_eq!(map.lot_for("901").map(String::as_str), Some("ABC1234"));
        assert_eq!(map.lot_for("910").map(String::as_str), Some("XYZ5678"));
    }

    #[test]
    fn first_process_record_wins_and_pseudo_lots_are_skipped() {
        let records = records(vec![
            process("ABC1234", "900", "901", "2025-01-01", "2025-01-05"),
            process("XYZ5678", "900", "902", "2025-01-01", "2025-01-05"),
            process("12345", "903", "904", "2025-01-01", "2025-01-05"),
        ]);
        let config = ReconcileConfig::default();
        let ctx = ResolveContext::new(&records, &config);
        let map = DirectPhase.apply(&ctx, WorkOrderMap::new());
        assert_eq!(map.lot_for("900").map(String::as_str), Some("ABC1234"));
        assert_eq!(map.lot_for("902").map(String::as_str), Some("XYZ5678"));
        assert_eq!(map.lot_for("903"), None);
    }
}
