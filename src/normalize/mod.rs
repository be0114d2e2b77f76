//! Field normalization: raw, schema-specific records into `NormalizedRecord`.
//!
//! Every downstream stage reads only the normalized shape; raw field names are
//! inspected here and in the classifier, nowhere else. Malformed values never
//! fail a record: bad dates become `None` and bad error counts become `0`.

use rayon::prelude::*;
use serde_json::Value;

use crate::classify::classify;
use crate::config::ReconcileConfig;
use crate::constants::fields;
use crate::data::{NormalizedRecord, RawRecord, RecordType};
use crate::identity::{is_real_lot, normalize_lot_id, normalize_work_order};

/// Date parsing and day arithmetic.
pub mod dates;
/// Production-stage inference.
pub mod stage;

pub use dates::parse_event_date;
pub use stage::infer_stage;

/// Classify and normalize every record, preserving input order.
///
/// Records are independent at this stage, so the work is spread across the
/// rayon pool; the indexed collect keeps output order equal to input order.
pub fn normalize_records(raws: &[RawRecord], config: &ReconcileConfig) -> Vec<NormalizedRecord> {
    raws.par_iter()
        .enumerate()
        .map(|(index, raw)| normalize_record(index, raw.clone(), config))
        .collect()
}

/// Classify and normalize a single record at input position `index`.
pub fn normalize_record(index: usize, raw: RawRecord, config: &ReconcileConfig) -> NormalizedRecord {
    let record_type = classify(&raw);
    let mut record = NormalizedRecord {
        id: format!("rec-{index:06}"),
        index,
        record_type,
        lot_id: None,
        work_order: None,
        work_orders: Vec::new(),
        start_date: first_date(&raw, fields::START_DATE),
        end_date: first_date(&raw, fields::END_DATE),
        error_count: parse_error_count(&raw),
        issue_category: None,
        is_rft: None,
        excluded_issue: false,
        stage: infer_stage(&raw, record_type),
        raw: RawRecord::default(),
    };

    match record_type {
        RecordType::Process => {
            record.lot_id = raw.first_text(fields::LOT).and_then(|lot| normalize_lot_id(&lot));
            record.work_orders = collect_work_orders(&raw, fields::PROCESS_WORK_ORDERS);
            // Process rows carry no verdict of their own; they pass provisionally.
            record.is_rft = Some(true);
        }
        RecordType::InternalRft => {
            record.lot_id = raw.first_text(fields::LOT).and_then(|lot| normalize_lot_id(&lot));
            if let Some(reference) = raw
                .first_text(fields::INTERNAL_WORK_ORDER)
                .and_then(|value| normalize_work_order(&value))
            {
                if record.lot_id.is_none() && is_real_lot(config, &reference) {
                    record.lot_id = Some(reference);
                } else if record.lot_id.as_deref() != Some(reference.as_str()) {
                    record.work_orders.push(reference);
                }
            }
            record.issue_category = raw.first_text(fields::ISSUE_CATEGORY);
            record.excluded_issue = record
                .issue_category
                .as_deref()
                .is_some_and(|category| config.is_excluded_category(category));
            // Errors logged under an excluded category never fail the form.
            record.is_rft = Some(record.error_count == 0 || record.excluded_issue);
        }
        RecordType::ExternalRft => {
            record.lot_id = raw.first_text(fields::LOT).and_then(|lot| normalize_lot_id(&lot));
            record.issue_category = raw.first_text(fields::ISSUE_CATEGORY);
            record.excluded_issue = record
                .issue_category
                .as_deref()
                .is_some_and(|category| config.is_excluded_category(category));
            // External rows are logged issues; only excluded categories keep the lot passing.
            record.is_rft = Some(record.excluded_issue);
        }
        RecordType::Unknown => {}
    }

    record.work_order = record.work_orders.first().cloned();
    record.raw = raw;
    record
}

fn first_date(raw: &RawRecord, keys: &[&str]) -> Option<chrono::NaiveDateTime> {
    keys.iter()
        .filter_map(|key| raw.get(key))
        .find_map(parse_event_date)
}

fn collect_work_orders(raw: &RawRecord, keys: &[&str]) -> Vec<String> {
    let mut work_orders: Vec<String> = Vec::new();
    for work_order in raw
        .all_text(keys)
        .iter()
        .filter_map(|value| normalize_work_order(value))
    {
        if !work_orders.contains(&work_order) {
            work_orders.push(work_order);
        }
    }
    work_orders
}

/// Explicit error count, defaulting to 0 on absence or parse failure.
pub fn parse_error_count(raw: &RawRecord) -> u32 {
    let Some(value) = raw.first_value(fields::ERROR_COUNT) else {
        return 0;
    };
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(count) if count.is_finite() && count >= 0.0 => {
            count.round().min(f64::from(u32::MAX)) as u32
        }
        _ => 0,
    }
}
