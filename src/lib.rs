#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Schema classification of raw records.
pub mod classify;
/// Reconciliation configuration types.
pub mod config;
/// Centralized field aliases, schema prefixes, and default constants.
pub mod constants;
/// Raw and normalized record types.
pub mod data;
/// Per-run record accounting.
pub mod diagnostics;
/// Lot RFT verdict and primary-stage evaluation.
pub mod evaluation;
/// Lot grouping and noise filtering.
pub mod grouping;
/// Lot and work-order identifier normalization.
pub mod identity;
/// JSON input boundary.
pub mod ingestion;
/// Threshold-based insights and recommendations.
pub mod insights;
/// Reconstructed lot type.
pub mod lot;
/// Aggregate lot metrics.
pub mod metrics;
/// Field normalization.
pub mod normalize;
/// End-to-end analysis entry points.
pub mod pipeline;
/// `lot_report` app runner.
pub mod report;
/// Work-order to lot resolution cascade.
pub mod resolver;
/// Shared type aliases.
pub mod types;

mod errors;

pub use config::{InsightThresholds, LotPattern, ReconcileConfig};
pub use data::{NormalizedRecord, RawRecord, RecordType, Stage};
pub use diagnostics::ReconciliationDiagnostics;
pub use errors::ReconcileError;
pub use ingestion::{load_records_from_path, load_records_from_str, parse_records};
pub use insights::{Insight, InsightCategory, Level, Recommendation, Severity};
pub use lot::Lot;
pub use metrics::{IssueCount, LotMetrics};
pub use pipeline::{LotAnalysisResult, LotAnalyzer, analyze_records, analyze_value};
pub use resolver::{Resolver, ResolverPhase, WorkOrderMap};
pub use types::{IssueCategory, LotId, RecordId, WorkOrder};
