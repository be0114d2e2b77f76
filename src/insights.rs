//! Threshold rules that turn `LotMetrics` into ranked insights and recommendations.
//!
//! Both generators are pure: the same metrics and thresholds always produce
//! the same ordered list. Rules are evaluated in a fixed order and ranked with
//! a stable sort, so rule order breaks ties.

use serde::Serialize;

use crate::config::InsightThresholds;
use crate::data::Stage;
use crate::metrics::{IssueCount, LotMetrics};

/// Insight urgency. Declared low-to-high so `Ord` ranks `High` last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// Informational.
    Low,
    /// Worth attention.
    Medium,
    /// Needs action.
    High,
}

/// Coarse three-level scale for impact, difficulty, and payoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Level {
    /// Low.
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
}

impl Level {
    fn rank(self) -> i8 {
        match self {
            Level::Low => 1,
            Level::Medium => 2,
            Level::High => 3,
        }
    }

    /// Payoff from impact and difficulty: positive margin is High, even is Medium.
    pub fn payoff(impact: Level, difficulty: Level) -> Level {
        match impact.rank() - difficulty.rank() {
            margin if margin > 0 => Level::High,
            0 => Level::Medium,
            _ => Level::Low,
        }
    }
}

/// Area an insight or recommendation concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum InsightCategory {
    /// RFT outcomes and issue mix.
    Quality,
    /// Stage carrying the most issues.
    CriticalPath,
    /// Lot duration.
    CycleTime,
    /// Coverage and linkage of the input feed.
    DataQuality,
}

/// Observation derived from the lot metrics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Insight {
    /// One-line headline.
    pub title: String,
    /// Supporting numbers.
    pub description: String,
    /// Area concerned.
    pub category: InsightCategory,
    /// Urgency used for ranking.
    pub severity: Severity,
}

/// Suggested action with its expected payoff.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    /// One-line action.
    pub title: String,
    /// Why, with supporting numbers.
    pub description: String,
    /// Area concerned.
    pub category: InsightCategory,
    /// Expected effect on quality.
    pub impact: Level,
    /// Effort to carry out.
    pub difficulty: Level,
    /// Impact relative to difficulty.
    pub payoff: Level,
    /// 1-based rank after sorting by payoff then impact.
    pub priority: usize,
}

/// Stage with more issues, or `None` when both are equal.
pub fn critical_path_stage(metrics: &LotMetrics) -> Option<Stage> {
    use std::cmp::Ordering;
    match metrics.wip_issue_count.cmp(&metrics.fg_issue_count) {
        Ordering::Greater => Some(Stage::Wip),
        Ordering::Less => Some(Stage::Fg),
        Ordering::Equal => None,
    }
}

fn stage_name(stage: Stage) -> &'static str {
    match stage {
        Stage::Wip => "WIP (assembly)",
        Stage::Fg => "FG (packaging)",
        Stage::Unknown => "unknown stage",
    }
}

/// Category with the highest count across internal and external issues.
fn dominant_issue(metrics: &LotMetrics) -> Option<(&str, usize)> {
    let mut best: Option<(&str, usize)> = None;
    for (category, count) in &metrics.issue_category_histogram {
        if best.is_none_or(|(_, best_count)| *count > best_count) {
            best = Some((category.as_str(), *count));
        }
    }
    best
}

fn share(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Evaluate every insight rule and rank the hits by severity.
pub fn generate_insights(metrics: &LotMetrics, thresholds: &InsightThresholds) -> Vec<Insight> {
    let mut insights = Vec::new();
    let judged = metrics.rft_lots + metrics.non_rft_lots;

    if judged > 0 {
        let pct = metrics.lot_rft_percentage;
        let band = if pct < thresholds.rft_high_severity_below {
            Some(("Lot RFT rate is critically low", Severity::High))
        } else if pct < thresholds.rft_medium_severity_below {
            Some(("Lot RFT rate is below target", Severity::Medium))
        } else if pct >= thresholds.rft_strong_at_or_above {
            Some(("Lot RFT rate is strong", Severity::Low))
        } else {
            None
        };
        if let Some((title, severity)) = band {
            insights.push(Insight {
                title: title.to_string(),
                description: format!(
                    "{:.1}% of evaluated lots were right first time ({} of {}).",
                    pct, metrics.rft_lots, judged
                ),
                category: InsightCategory::Quality,
                severity,
            });
        }
    }

    if let Some(stage) = critical_path_stage(metrics) {
        let (stage_issues, other_issues) = match stage {
            Stage::Wip => (metrics.wip_issue_count, metrics.fg_issue_count),
            _ => (metrics.fg_issue_count, metrics.wip_issue_count),
        };
        insights.push(Insight {
            title: format!("{} is the critical path", stage_name(stage)),
            description: format!(
                "{} issues were logged at {} versus {} at the other stage.",
                stage_issues,
                stage_name(stage),
                other_issues
            ),
            category: InsightCategory::CriticalPath,
            severity: Severity::Medium,
        });
    }

    if let Some((category, count)) = dominant_issue(metrics) {
        let fraction = share(count, metrics.total_issues);
        if fraction >= thresholds.dominant_issue_share {
            insights.push(Insight {
                title: format!("'{category}' dominates logged issues"),
                description: format!(
                    "{count} of {} issues ({:.0}%) fall in this category.",
                    metrics.total_issues,
                    fraction * 100.0
                ),
                category: InsightCategory::Quality,
                severity: Severity::Medium,
            });
        }
    }

    if metrics.cycle_time_lots > 0 {
        let days = metrics.avg_cycle_time_days;
        let severity = if days > thresholds.cycle_time_high_days {
            Some(Severity::High)
        } else if days > thresholds.cycle_time_medium_days {
            Some(Severity::Medium)
        } else {
            None
        };
        if let Some(severity) = severity {
            insights.push(Insight {
                title: "Lot cycle time is long".to_string(),
                description: format!(
                    "Average cycle time is {:.1} days across {} dated lots.",
                    days, metrics.cycle_time_lots
                ),
                category: InsightCategory::CycleTime,
                severity,
            });
        }
    }

    let indeterminate = share(metrics.indeterminate_lots, metrics.total_lots);
    if metrics.total_lots > 0 && indeterminate >= thresholds.indeterminate_share {
        insights.push(Insight {
            title: "Many lots lack RFT evidence".to_string(),
            description: format!(
                "{} of {} lots have no internal or external records and are excluded from the RFT rate.",
                metrics.indeterminate_lots, metrics.total_lots
            ),
            category: InsightCategory::DataQuality,
            severity: Severity::Medium,
        });
    }

    let unassigned = share(metrics.unassigned_records, metrics.total_records);
    if metrics.total_records > 0 && unassigned >= thresholds.unassigned_share {
        insights.push(Insight {
            title: "Records could not be matched to lots".to_string(),
            description: format!(
                "{} of {} records ({:.0}%) were left out of lot-level metrics.",
                metrics.unassigned_records,
                metrics.total_records,
                unassigned * 100.0
            ),
            category: InsightCategory::DataQuality,
            severity: Severity::Medium,
        });
    }

    insights.sort_by(|a, b| b.severity.cmp(&a.severity));
    insights
}

fn recommendation(
    title: String,
    description: String,
    category: InsightCategory,
    impact: Level,
    difficulty: Level,
) -> Recommendation {
    Recommendation {
        title,
        description,
        category,
        impact,
        difficulty,
        payoff: Level::payoff(impact, difficulty),
        priority: 0,
    }
}

fn leading(issues: &[IssueCount]) -> Option<&IssueCount> {
    issues.first()
}

/// Evaluate every recommendation rule and rank by payoff, then impact.
pub fn generate_recommendations(
    metrics: &LotMetrics,
    thresholds: &InsightThresholds,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    let judged = metrics.rft_lots + metrics.non_rft_lots;
    let below_target = judged > 0 && metrics.lot_rft_percentage < thresholds.rft_medium_severity_below;

    if let Some(issue) = leading(&metrics.top_internal_issues) {
        recommendations.push(recommendation(
            format!("Error-proof '{}' on internal forms", issue.category),
            format!(
                "'{}' accounts for {} internal issues; add checklist or system validation at entry.",
                issue.category, issue.count
            ),
            InsightCategory::Quality,
            if below_target { Level::High } else { Level::Medium },
            Level::Medium,
        ));
    }

    if let Some(issue) = leading(&metrics.top_external_issues) {
        recommendations.push(recommendation(
            format!("Close the loop on external '{}' findings", issue.category),
            format!(
                "'{}' accounts for {} external issues; review them with the originating area.",
                issue.category, issue.count
            ),
            InsightCategory::Quality,
            Level::High,
            Level::Medium,
        ));
    }

    if let Some(stage) = critical_path_stage(metrics) {
        recommendations.push(recommendation(
            format!("Focus improvement effort on {}", stage_name(stage)),
            format!(
                "{} carries more logged issues than the other stage; target it first.",
                stage_name(stage)
            ),
            InsightCategory::CriticalPath,
            Level::High,
            Level::High,
        ));
    }

    if metrics.cycle_time_lots > 0 && metrics.avg_cycle_time_days > thresholds.cycle_time_medium_days {
        recommendations.push(recommendation(
            "Reduce queue time between production stages".to_string(),
            format!(
                "Average lot cycle time is {:.1} days; review hand-offs between assembly and packaging.",
                metrics.avg_cycle_time_days
            ),
            InsightCategory::CycleTime,
            Level::Medium,
            Level::Medium,
        ));
    }

    if metrics.total_records > 0
        && share(metrics.unassigned_records, metrics.total_records) >= thresholds.unassigned_share
    {
        recommendations.push(recommendation(
            "Standardize work-order entry on RFT forms".to_string(),
            format!(
                "{} records could not be tied to a lot; require a lot or a valid work order on every form.",
                metrics.unassigned_records
            ),
            InsightCategory::DataQuality,
            Level::Medium,
            Level::Low,
        ));
    }

    if metrics.total_lots > 0
        && share(metrics.indeterminate_lots, metrics.total_lots) >= thresholds.indeterminate_share
    {
        recommendations.push(recommendation(
            "Capture RFT evidence for every lot".to_string(),
            format!(
                "{} lots have no RFT records; make the internal RFT form mandatory at lot close.",
                metrics.indeterminate_lots
            ),
            InsightCategory::DataQuality,
            Level::Medium,
            Level::Low,
        ));
    }

    recommendations.sort_by(|a, b| b.payoff.cmp(&a.payoff).then_with(|| b.impact.cmp(&a.impact)));
    for (idx, recommendation) in recommendations.iter_mut().enumerate() {
        recommendation.priority = idx + 1;
    }
    recommendations
}
