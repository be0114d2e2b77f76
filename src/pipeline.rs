//! End-to-end lot analysis: raw records in, `LotAnalysisResult` out.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::ReconcileConfig;
use crate::data::RawRecord;
use crate::diagnostics::ReconciliationDiagnostics;
use crate::errors::ReconcileError;
use crate::evaluation::evaluate_lots;
use crate::grouping::group_records;
use crate::ingestion::parse_records;
use crate::insights::{Insight, Recommendation, generate_insights, generate_recommendations};
use crate::lot::Lot;
use crate::metrics::{LotMetrics, aggregate_metrics, annotate_cycle_times};
use crate::normalize::normalize_records;
use crate::resolver::Resolver;
use crate::types::LotId;

/// Everything one analysis run produces. Built fresh per call; never shared.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotAnalysisResult {
    /// Reconstructed lots keyed by normalized lot id.
    pub lot_data: BTreeMap<LotId, Lot>,
    /// Global lot metrics.
    pub lot_metrics: LotMetrics,
    /// Insights, most severe first.
    pub insights: Vec<Insight>,
    /// Recommendations in priority order.
    pub recommendations: Vec<Recommendation>,
    /// Record accounting for the run.
    pub diagnostics: ReconciliationDiagnostics,
}

/// Runs the reconciliation pipeline with a fixed config and resolver cascade.
pub struct LotAnalyzer {
    config: ReconcileConfig,
    resolver: Resolver,
}

impl Default for LotAnalyzer {
    fn default() -> Self {
        Self::new(ReconcileConfig::default())
    }
}

impl LotAnalyzer {
    /// Analyzer with the default resolver cascade.
    pub fn new(config: ReconcileConfig) -> Self {
        Self {
            config,
            resolver: Resolver::default(),
        }
    }

    /// Replace the resolver cascade.
    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Classify, normalize, resolve, group, evaluate, and aggregate `raws`.
    ///
    /// Never fails: record-level problems are absorbed and counted in the
    /// diagnostics. Identical input always yields an identical result.
    pub fn analyze(&self, raws: &[RawRecord]) -> LotAnalysisResult {
        let config = &self.config;
        let records = normalize_records(raws, config);
        let map = self.resolver.resolve(&records, config);
        let mut diagnostics = ReconciliationDiagnostics::from_records(&records);
        let outcome = group_records(records, &map, config);
        diagnostics.record_outcome(&map, &outcome.counts);

        let mut lots = outcome.lots;
        evaluate_lots(&mut lots);
        annotate_cycle_times(&mut lots);

        let total_records = diagnostics.total_records;
        let unassigned = diagnostics.unaccounted_for_lots();
        let lot_metrics = aggregate_metrics(&lots, total_records, unassigned, config);
        let insights = generate_insights(&lot_metrics, &config.insights);
        let recommendations = generate_recommendations(&lot_metrics, &config.insights);

        info!(
            "[lotwise:pipeline] {} records -> {} lots ({} rft, {} non-rft, {} indeterminate)",
            lot_metrics.total_records,
            lot_metrics.total_lots,
            lot_metrics.rft_lots,
            lot_metrics.non_rft_lots,
            lot_metrics.indeterminate_lots
        );
        if total_records > 0 {
            let share = unassigned as f64 / total_records as f64;
            if share > config.insights.unassigned_share {
                warn!(
                    "[lotwise:pipeline] {} of {} records ({:.0}%) were not assigned to any lot",
                    unassigned,
                    total_records,
                    share * 100.0
                );
            }
        }

        LotAnalysisResult {
            lot_data: lots,
            lot_metrics,
            insights,
            recommendations,
            diagnostics,
        }
    }
}

/// Analyze parsed records with `config` and the default resolver cascade.
pub fn analyze_records(raws: &[RawRecord], config: &ReconcileConfig) -> LotAnalysisResult {
    LotAnalyzer::new(config.clone()).analyze(raws)
}

/// Analyze a JSON document (array or `{ "records": [...] }`).
pub fn analyze_value(value: Value, config: &ReconcileConfig) -> Result<LotAnalysisResult, ReconcileError> {
    let raws = parse_records(value)?;
    Ok(analyze_records(&raws, config))
}
