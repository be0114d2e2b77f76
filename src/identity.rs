//! Lot-id and work-order canonicalization shared by every pipeline stage.

use crate::config::ReconcileConfig;
use crate::types::{LotId, WorkOrder};

/// Canonical token form: uppercase ASCII alphanumerics only.
///
/// Integral floats rendered by JSON (`"900.0"`) collapse to their integer form
/// first so they do not pick up a trailing zero.
pub fn canonical_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let integral;
    let source = match trimmed.parse::<f64>() {
        Ok(number) if trimmed.contains('.') && number.is_finite() && number.fract() == 0.0 => {
            integral = format!("{}", number as i64);
            integral.as_str()
        }
        _ => trimmed,
    };
    let token: String = source
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_uppercase())
        .collect();
    if token.is_empty() { None } else { Some(token) }
}

/// Normalize a raw lot identifier (`abc-1234` -> `ABC1234`).
pub fn normalize_lot_id(raw: &str) -> Option<LotId> {
    canonical_token(raw)
}

/// Normalize a raw work-order reference (`WO 900` -> `WO900`).
pub fn normalize_work_order(raw: &str) -> Option<WorkOrder> {
    canonical_token(raw)
}

/// True when a normalized id passes the real-lot gate.
///
/// Only ids that match the configured pattern, or the pending sentinel, are
/// treated as lots by the resolver; everything else is a potential work order.
pub fn is_real_lot(config: &ReconcileConfig, lot_id: &str) -> bool {
    config.lot_pattern.matches(lot_id)
        || canonical_token(&config.pending_sentinel).as_deref() == Some(lot_id)
}

/// True for non-empty, digits-only identifiers.
pub fn is_numeric(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// Substring containment in either direction, guarded by a minimum length on the shorter side.
pub fn contains_either(a: &str, b: &str, min_len: usize) -> bool {
    let shorter = a.len().min(b.len());
    if shorter == 0 || shorter < min_len {
        return false;
    }
    a.contains(b) || b.contains(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_token_strips_noise_and_uppercases() {
        assert_eq!(canonical_token("abc-1234").as_deref(), Some("ABC1234"));
        assert_eq!(canonical_token(" Lot #abc 1234 ").as_deref(), Some("LOTABC1234"));
        assert_eq!(canonical_token("900.0").as_deref(), Some("900"));
        assert_eq!(canonical_token("900.5").as_deref(), Some("9005"));
        assert_eq!(canonical_token(" -- "), None);
    }

    #[test]
    fn real_lot_gate_accepts_pattern_and_sentinel() {
        let config = ReconcileConfig::default();
        assert!(is_real_lot(&config, "ABC1234"));
        assert!(is_real_lot(&config, "PENDING"));
        assert!(!is_real_lot(&config, "900"));
        assert!(!is_real_lot(&config, "ABC12345"));
    }

    #[test]
    fn contains_either_checks_both_directions_with_guard() {
        assert!(contains_either("ABC1234A", "ABC1234", 3));
        assert!(contains_either("ABC1234", "ABC1234A", 3));
        assert!(!contains_either("AB", "ABC1234", 3));
        assert!(!contains_either("", "ABC1234", 0));
        assert!(!contains_either("XYZ9999", "ABC1234", 3));
    }

    #[test]
    fn numeric_detection() {
        assert!(is_numeric("555"));
        assert!(!is_numeric("55A"));
        assert!(!is_numeric(""));
    }
}
