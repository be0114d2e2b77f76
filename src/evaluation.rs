//! Per-lot RFT verdict and primary stage.

use std::collections::BTreeMap;

use crate::data::Stage;
use crate::lot::Lot;
use crate::types::LotId;

/// Tri-state RFT verdict for one lot.
///
/// Lots with no internal or external evidence are indeterminate (`None`);
/// process records alone never make a lot pass. Otherwise the lot passes
/// unless any internal or external record failed.
pub fn evaluate_rft(lot: &Lot) -> Option<bool> {
    let mut evidence = lot.internal_records().chain(lot.external_records()).peekable();
    evidence.peek()?;
    Some(evidence.all(|record| record.is_rft != Some(false)))
}

/// Stage holding the majority of the lot's staged records; ties go to FG.
///
/// Records with an unknown stage do not vote. A lot with no staged records
/// is `Unknown`.
pub fn primary_stage(lot: &Lot) -> Stage {
    let (wip, fg) = lot
        .records
        .iter()
        .fold((0usize, 0usize), |(wip, fg), record| match record.stage {
            Stage::Wip => (wip + 1, fg),
            Stage::Fg => (wip, fg + 1),
            Stage::Unknown => (wip, fg),
        });
    if wip == 0 && fg == 0 {
        Stage::Unknown
    } else if wip > fg {
        Stage::Wip
    } else {
        Stage::Fg
    }
}

/// Fill in verdict and stage for every lot.
pub fn evaluate_lots(lots: &mut BTreeMap<LotId, Lot>) {
    for lot in lots.values_mut() {
        lot.is_rft = evaluate_rft(lot);
        lot.primary_stage = primary_stage(lot);
    }
}
