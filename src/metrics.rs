use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::ReconcileConfig;
use crate::constants::defaults::UNCATEGORIZED;
use crate::data::{NormalizedRecord, RecordType, Stage};
use crate::lot::Lot;
use crate::normalize::dates::{days_between, round_one_decimal};
use crate::types::{IssueCategory, LotId};

/// Count and share of one issue category.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IssueCount {
    /// Issue category label.
    pub category: IssueCategory,
    /// Issues in this category.
    pub count: usize,
    /// Fraction of all issues in the same histogram.
    pub share: f64,
}

/// Global lot-level quality and cycle-time metrics.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotMetrics {
    /// Emitted lots.
    pub total_lots: usize,
    /// Lots that passed.
    pub rft_lots: usize,
    /// Lots with at least one failing record.
    pub non_rft_lots: usize,
    /// Lots with no internal or external records.
    pub indeterminate_lots: usize,
    /// `rft / (rft + non_rft) * 100`; indeterminate lots are not in the denominator.
    pub lot_rft_percentage: f64,
    /// Lots whose primary stage is WIP.
    pub wip_lots: usize,
    /// Lots whose primary stage is FG.
    pub fg_lots: usize,
    /// Lots with no staged records.
    pub unknown_stage_lots: usize,
    /// Mean of per-lot cycle times over lots that have any dated record.
    pub avg_cycle_time_days: f64,
    /// Lots contributing to the cycle-time average.
    pub cycle_time_lots: usize,
    /// Issue counts across internal and external records, in first-seen order.
    pub issue_category_histogram: IndexMap<IssueCategory, usize>,
    /// Most frequent internal issue categories.
    pub top_internal_issues: Vec<IssueCount>,
    /// Most frequent external issue categories.
    pub top_external_issues: Vec<IssueCount>,
    /// Issues across all lots.
    pub total_issues: usize,
    /// Issues logged at the WIP stage.
    pub wip_issue_count: usize,
    /// Issues logged at the FG stage.
    pub fg_issue_count: usize,
    /// Records in the input.
    pub total_records: usize,
    /// Records outside every lot.
    pub unassigned_records: usize,
}

/// Earliest/latest dated record and the rounded day span between them.
pub fn lot_cycle_span(lot: &Lot) -> (Option<chrono::NaiveDateTime>, Option<chrono::NaiveDateTime>, Option<f64>) {
    let mut dates = lot.records.iter().flat_map(|record| record.dates());
    let Some(first) = dates.next() else {
        return (None, None, None);
    };
    let (earliest, latest) = dates.fold((first, first), |(lo, hi), date| (lo.min(date), hi.max(date)));
    let days = round_one_decimal(days_between(earliest, latest));
    (Some(earliest), Some(latest), Some(days))
}

/// Fill in first/last event and cycle time for every lot.
pub fn annotate_cycle_times(lots: &mut BTreeMap<LotId, Lot>) {
    for lot in lots.values_mut() {
        let (first, last, days) = lot_cycle_span(lot);
        lot.first_event = first;
        lot.last_event = last;
        lot.cycle_days = days;
    }
}

/// Aggregate evaluated lots into global metrics.
///
/// Issue records from every lot are counted in input order, so histogram
/// ties resolve to the category encountered first in the feed, whatever the
/// lot ids are.
pub fn aggregate_metrics(
    lots: &BTreeMap<LotId, Lot>,
    total_records: usize,
    unassigned_records: usize,
    config: &ReconcileConfig,
) -> LotMetrics {
    let mut metrics = LotMetrics {
        total_lots: lots.len(),
        total_records,
        unassigned_records,
        ..LotMetrics::default()
    };
    let mut internal: IndexMap<IssueCategory, usize> = IndexMap::new();
    let mut external: IndexMap<IssueCategory, usize> = IndexMap::new();
    let mut cycle_total = 0.0;
    let mut issues: Vec<&NormalizedRecord> = Vec::new();

    for lot in lots.values() {
        match lot.is_rft {
            Some(true) => metrics.rft_lots += 1,
            Some(false) => metrics.non_rft_lots += 1,
            None => metrics.indeterminate_lots += 1,
        }
        match lot.primary_stage {
            Stage::Wip => metrics.wip_lots += 1,
            Stage::Fg => metrics.fg_lots += 1,
            Stage::Unknown => metrics.unknown_stage_lots += 1,
        }
        if let Some(days) = lot.cycle_days {
            cycle_total += days;
            metrics.cycle_time_lots += 1;
        }

        issues.extend(lot.records.iter().filter(|record| record.is_issue()));
    }

    issues.sort_by_key(|record| record.index);
    for record in issues {
        let category = record
            .issue_category
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        let bucket = match record.record_type {
            RecordType::InternalRft => &mut internal,
            _ => &mut external,
        };
        *bucket.entry(category.clone()).or_insert(0) += 1;
        *metrics.issue_category_histogram.entry(category).or_insert(0) += 1;
        metrics.total_issues += 1;
        match record.stage {
            Stage::Wip => metrics.wip_issue_count += 1,
            Stage::Fg => metrics.fg_issue_count += 1,
            Stage::Unknown => {}
        }
    }

    let judged = metrics.rft_lots + metrics.non_rft_lots;
    if judged > 0 {
        metrics.lot_rft_percentage = metrics.rft_lots as f64 / judged as f64 * 100.0;
    }
    if metrics.cycle_time_lots > 0 {
        metrics.avg_cycle_time_days =
            round_one_decimal(cycle_total / metrics.cycle_time_lots as f64);
    }
    metrics.top_internal_issues = top_issues(&internal, config.top_issue_limit);
    metrics.top_external_issues = top_issues(&external, config.top_issue_limit);
    metrics
}

/// Highest-count categories, descending; ties keep histogram order.
pub fn top_issues(histogram: &IndexMap<IssueCategory, usize>, limit: usize) -> Vec<IssueCount> {
    let total: usize = histogram.values().sum();
    let mut ranked: Vec<IssueCount> = histogram
        .iter()
        .map(|(category, count)| IssueCount {
            category: category.clone(),
            count: *count,
            share: if total == 0 {
                0.0
            } else {
                *count as f64 / total as f64
            },
        })
        .collect();
    // Stable sort keeps first-encountered order among equal counts.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}
