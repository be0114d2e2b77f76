use super::{ResolveContext, ResolverPhase, WorkOrderMap};
use crate::identity::contains_either;

/// Detects lot ids that are really work orders and decides where their
/// records belong.
///
/// A pseudo lot is an id that fails the real-lot gate (for example an external
/// record whose `lot` column holds `900`). When the id is already a resolved
/// work order, or textually corresponds to a lot that owns process records,
/// the pseudo lot is remapped to that lot. The grouper moves the records and
/// drops the pseudo group; this phase only records the decision.
pub struct PseudoLotPhase;

impl ResolverPhase for PseudoLotPhase {
    fn name(&self) -> &'static str {
        "pseudo_lot"
    }

    fn apply(&self, ctx: &ResolveContext<'_>, mut map: WorkOrderMap) -> WorkOrderMap {
        let min_len = ctx.config().min_substring_len;
        for pseudo_lot in ctx.pseudo_lots() {
            let via_work_order = map
                .lot_for(pseudo_lot)
                .filter(|lot_id| ctx.process_lots().contains(lot_id.as_str()))
                .cloned();
            let target = via_work_order.or_else(|| {
                ctx.process_lots()
                    .iter()
                    .find(|lot_id| contains_either(pseudo_lot, lot_id, min_len))
                    .cloned()
            });
            if let Some(lot_id) = target {
                map.remap_pseudo_lot(pseudo_lot, &lot_id);
            }
        }
        map
    }
}
