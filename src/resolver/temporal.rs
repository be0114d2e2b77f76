use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use super::{MappingSource, ResolveContext, ResolverPhase, WorkOrderMap};
use crate::data::RecordType;
use crate::identity::is_numeric;
use crate::normalize::dates::{days_between, mean_timestamp};
use crate::types::LotId;

/// Assigns a leftover numeric work order to the lot whose process records sit
/// closest in time.
///
/// Heuristic: the mean event date of the work order's internal forms is
/// compared against the mean event date of each lot's process records. The
/// closest lot wins when the gap is within `temporal_window_days`; ties go to
/// the lot that sorts first.
pub struct TemporalPhase;

impl ResolverPhase for TemporalPhase {
    fn name(&self) -> &'static str {
        "temporal"
    }

    fn apply(&self, ctx: &ResolveContext<'_>, mut map: WorkOrderMap) -> WorkOrderMap {
        let lot_means = process_lot_means(ctx);
        if lot_means.is_empty() {
            return map;
        }
        let window = ctx.config().temporal_window_days;

        for work_order in ctx.unmapped_work_orders(&map) {
            if !is_numeric(&work_order) {
                continue;
            }
            let dates: Vec<NaiveDateTime> = ctx
                .records_of(RecordType::InternalRft)
                .filter(|record| record.lot_id.is_none() && record.work_orders.contains(&work_order))
                .filter_map(|record| record.event_date())
                .collect();
            let Some(work_order_mean) = mean_timestamp(&dates) else {
                continue;
            };

            let mut best: Option<(&LotId, f64)> = None;
            for (lot_id, lot_mean) in &lot_means {
                let gap = days_between(work_order_mean, *lot_mean).abs();
                if best.is_none_or(|(_, best_gap)| gap < best_gap) {
                    best = Some((lot_id, gap));
                }
            }
            match best {
                Some((lot_id, gap)) if gap <= window => {
                    map.insert(&work_order, lot_id, MappingSource::Temporal);
                }
                _ => {}
            }
        }
        map
    }
}

/// Mean process-record event date per lot that owns dated process records.
fn process_lot_means(ctx: &ResolveContext<'_>) -> BTreeMap<LotId, NaiveDateTime> {
    let mut dates: BTreeMap<LotId, Vec<NaiveDateTime>> = BTreeMap::new();
    for record in ctx.records_of(RecordType::Process) {
        let (Some(lot_id), Some(date)) = (record.lot_id.as_ref(), record.event_date()) else {
            continue;
        };
        if ctx.process_lots().contains(lot_id) {
            dates.entry(lot_id.clone()).or_default().push(date);
        }
    }
    dates
        .into_iter()
        .filter_map(|(lot_id, dates)| mean_timestamp(&dates).map(|mean| (lot_id, mean)))
        .collect()
}
