use super::{MappingSource, ResolveContext, ResolverPhase, WorkOrderMap};
use crate::identity::contains_either;

/// Maps a pending work order that textually contains (or sits inside) a
/// confirmed lot id, e.g. `ABC1234A` -> `ABC1234`.
///
/// Heuristic: containment is checked against lots in sorted order and the
/// first hit wins. The shorter side must reach `min_substring_len`.
pub struct SubstringPhase;

impl ResolverPhase for SubstringPhase {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn apply(&self, ctx: &ResolveContext<'_>, mut map: WorkOrderMap) -> WorkOrderMap {
        let min_len = ctx.config().min_substring_len;
        for work_order in ctx.unmapped_work_orders(&map) {
            let hit = ctx
                .confirmed_lots()
                .iter()
                .find(|lot_id| contains_either(&work_order, lot_id, min_len));
            if let Some(lot_id) = hit {
                map.insert(&work_order, lot_id, MappingSource::Substring);
            }
        }
        map
    }
}
