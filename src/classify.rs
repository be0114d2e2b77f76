//! Schema classification for raw feed records.
//!
//! Resolution order is fixed: explicit source tag, then discriminator prefix,
//! then structural field presence. Structural matching runs last so that a
//! record carrying several type-like fields is decided by its stronger signals.

use crate::constants::{fields, schema};
use crate::data::{RawRecord, RecordType};

/// Classify one raw record.
pub fn classify(raw: &RawRecord) -> RecordType {
    classify_by_tag(raw)
        .or_else(|| classify_by_prefix(raw))
        .or_else(|| classify_by_structure(raw))
        .unwrap_or(RecordType::Unknown)
}

/// Explicit tag lookup; a tag naming more than one family is ignored.
pub fn classify_by_tag(raw: &RawRecord) -> Option<RecordType> {
    let tag = raw.first_text(schema::SOURCE_TAG_FIELDS)?.to_lowercase();
    let families = [
        (RecordType::Process, schema::PROCESS_TAGS),
        (RecordType::InternalRft, schema::INTERNAL_TAGS),
        (RecordType::ExternalRft, schema::EXTERNAL_TAGS),
    ];
    let mut matched = families
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|keyword| tag.contains(keyword)))
        .map(|(record_type, _)| *record_type);
    let first = matched.next()?;
    // "internal process" style tags name two families.
    if matched.next().is_some() {
        return None;
    }
    Some(first)
}

/// Discriminator prefix match against the three known record families.
pub fn classify_by_prefix(raw: &RawRecord) -> Option<RecordType> {
    let discriminator = raw.first_text(schema::DISCRIMINATOR_FIELDS)?.to_lowercase();
    if discriminator.starts_with(schema::PROCESS_PREFIX) {
        Some(RecordType::Process)
    } else if discriminator.starts_with(schema::INTERNAL_RFT_PREFIX) {
        Some(RecordType::InternalRft)
    } else if discriminator.starts_with(schema::EXTERNAL_RFT_PREFIX) {
        Some(RecordType::ExternalRft)
    } else {
        None
    }
}

/// Structural fallback based on which marker fields are present.
pub fn classify_by_structure(raw: &RawRecord) -> Option<RecordType> {
    if raw.has_any(fields::LOT) && raw.has_any(fields::PROCESS_WORK_ORDERS) {
        return Some(RecordType::Process);
    }
    if raw.has_any(fields::ERROR_COUNT) || raw.has_any(fields::FORM_TITLE) {
        return Some(RecordType::InternalRft);
    }
    if raw.has_any(fields::LOT) && raw.has_any(&["category"]) && raw.has_any(fields::COMMENT) {
        return Some(RecordType::ExternalRft);
    }
    None
}
