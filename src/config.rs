use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::errors::ReconcileError;

/// Shape of a canonical lot identifier: `prefix_len` letters then `suffix_len` digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotPattern {
    /// Number of leading ASCII letters.
    pub prefix_len: usize,
    /// Number of trailing ASCII digits.
    pub suffix_len: usize,
}

impl Default for LotPattern {
    fn default() -> Self {
        Self {
            prefix_len: defaults::LOT_PREFIX_LEN,
            suffix_len: defaults::LOT_SUFFIX_LEN,
        }
    }
}

impl LotPattern {
    /// True when `normalized` (already uppercased/alphanumeric) has the canonical shape.
    pub fn matches(&self, normalized: &str) -> bool {
        let bytes = normalized.as_bytes();
        if bytes.len() != self.prefix_len + self.suffix_len {
            return false;
        }
        let (prefix, suffix) = bytes.split_at(self.prefix_len);
        prefix.iter().all(u8::is_ascii_alphabetic) && suffix.iter().all(u8::is_ascii_digit)
    }
}

/// Thresholds consumed by the insight and recommendation rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightThresholds {
    /// Lot RFT percentage below which a high-severity insight fires.
    pub rft_high_severity_below: f64,
    /// Lot RFT percentage below which a medium-severity insight fires.
    pub rft_medium_severity_below: f64,
    /// Lot RFT percentage at or above which a positive insight fires.
    pub rft_strong_at_or_above: f64,
    /// Average cycle time (days) above which a high-severity insight fires.
    pub cycle_time_high_days: f64,
    /// Average cycle time (days) above which a medium-severity insight fires.
    pub cycle_time_medium_days: f64,
    /// Share of all issues held by the top category that counts as dominant.
    pub dominant_issue_share: f64,
    /// Share of lots with no RFT evidence that triggers a data insight.
    pub indeterminate_share: f64,
    /// Share of records left out of any lot that triggers a data insight.
    pub unassigned_share: f64,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            rft_high_severity_below: 70.0,
            rft_medium_severity_below: 85.0,
            rft_strong_at_or_above: 95.0,
            cycle_time_high_days: 30.0,
            cycle_time_medium_days: 14.0,
            dominant_issue_share: 0.30,
            indeterminate_share: 0.20,
            unassigned_share: 0.10,
        }
    }
}

/// Top-level reconciliation configuration.
///
/// Every heuristic constant lives here so tuned values can be changed without
/// touching the resolver phases.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Canonical lot-id shape used by the real-lot gate.
    pub lot_pattern: LotPattern,
    /// Literal lot id accepted as real regardless of the pattern.
    pub pending_sentinel: String,
    /// Issue categories that never fail a lot (case-insensitive substring match).
    pub exclusion_categories: Vec<String>,
    /// Maximum gap in days between a work order and a lot for temporal matching.
    pub temporal_window_days: f64,
    /// Minimum length of the shorter side in a substring containment match.
    pub min_substring_len: usize,
    /// Minimum rendered length of a value used for shared-field correlation.
    pub min_shared_value_len: usize,
    /// Lots without process records need at least this many records to be kept.
    pub noise_min_records: usize,
    /// Entries kept in each top-issue list.
    pub top_issue_limit: usize,
    /// Insight and recommendation thresholds.
    pub insights: InsightThresholds,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            lot_pattern: LotPattern::default(),
            pending_sentinel: defaults::PENDING_SENTINEL.to_string(),
            exclusion_categories: defaults::EXCLUSION_CATEGORIES
                .iter()
                .map(|category| category.to_string())
                .collect(),
            temporal_window_days: defaults::TEMPORAL_WINDOW_DAYS,
            min_substring_len: defaults::MIN_SUBSTRING_LEN,
            min_shared_value_len: defaults::MIN_SHARED_VALUE_LEN,
            noise_min_records: defaults::NOISE_MIN_RECORDS,
            top_issue_limit: defaults::TOP_ISSUE_LIMIT,
            insights: InsightThresholds::default(),
        }
    }
}

impl ReconcileConfig {
    /// Load a JSON config file; missing keys fall back to defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReconcileError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the heuristics meaningless.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.lot_pattern.prefix_len == 0 || self.lot_pattern.suffix_len == 0 {
            return Err(ReconcileError::Configuration(format!(
                "lot pattern lengths must be non-zero (prefix={}, suffix={})",
                self.lot_pattern.prefix_len, self.lot_pattern.suffix_len
            )));
        }
        if !self.temporal_window_days.is_finite() || self.temporal_window_days < 0.0 {
            return Err(ReconcileError::Configuration(format!(
                "temporal_window_days must be a non-negative number, got {}",
                self.temporal_window_days
            )));
        }
        if self
            .exclusion_categories
            .iter()
            .any(|category| category.trim().is_empty())
        {
            return Err(ReconcileError::Configuration(
                "exclusion_categories must not contain blank entries".to_string(),
            ));
        }
        if self.top_issue_limit == 0 {
            return Err(ReconcileError::Configuration(
                "top_issue_limit must be greater than zero".to_string(),
            ));
        }
        let t = &self.insights;
        if t.rft_high_severity_below > t.rft_medium_severity_below {
            return Err(ReconcileError::Configuration(format!(
                "rft_high_severity_below ({}) must not exceed rft_medium_severity_below ({})",
                t.rft_high_severity_below, t.rft_medium_severity_below
            )));
        }
        Ok(())
    }

    /// True when `category` hits the exclusion set (case-insensitive substring).
    pub fn is_excluded_category(&self, category: &str) -> bool {
        let lowered = category.to_lowercase();
        self.exclusion_categories
            .iter()
            .any(|excluded| lowered.contains(&excluded.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lot_pattern_matches_three_letters_four_digits() {
        let pattern = LotPattern::default();
        assert!(pattern.matches("ABC1234"));
        assert!(!pattern.matches("AB1234"));
        assert!(!pattern.matches("ABC12345"));
        assert!(!pattern.matches("1234ABC"));
        assert!(!pattern.matches("900"));
    }

    #[test]
    fn exclusion_is_case_insensitive_substring() {
        let config = ReconcileConfig::default();
        assert!(config.is_excluded_category("process clarification"));
        assert!(config.is_excluded_category("Customer - INFO ONLY"));
        assert!(!config.is_excluded_category("Missing Signature"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = ReconcileConfig::default();
        assert!(config.validate().is_ok());
        config.temporal_window_days = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ReconcileError::Configuration(_))
        ));

        let config = ReconcileConfig {
            lot_pattern: LotPattern {
                prefix_len: 0,
                suffix_len: 4,
            },
            ..ReconcileConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_exclusion_category() {
        let config = ReconcileConfig {
            exclusion_categories: vec!["Info Only".to_string(), String::new()],
            ..ReconcileConfig::default()
        };
        // A blank entry would substring-match every category.
        assert!(config.is_excluded_category("Labeling"));
        assert!(matches!(
            config.validate(),
            Err(ReconcileError::Configuration(_))
        ));
    }

    #[test]
    fn partial_json_config_keeps_defaults() {
        let config: ReconcileConfig =
            serde_json::from_str(r#"{"temporal_window_days": 10.0, "insights": {"unassigned_share": 0.5}}"#)
                .unwrap();
        assert_eq!(config.temporal_window_days, 10.0);
        assert_eq!(config.insights.unassigned_share, 0.5);
        assert_eq!(config.insights.rft_high_severity_below, 70.0);
        assert_eq!(config.pending_sentinel, "PENDING");
    }
}
