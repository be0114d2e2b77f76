use chrono::NaiveDateTime;
use serde::Serialize;

use crate::data::{NormalizedRecord, RecordType, Stage};
use crate::types::LotId;

/// A reconstructed manufacturing lot and every record attached to it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    /// Normalized lot id.
    pub lot_id: LotId,
    /// Attached records in input order.
    pub records: Vec<NormalizedRecord>,
    /// Tri-state verdict: `None` when no internal or external record exists.
    pub is_rft: Option<bool>,
    /// Days between the earliest and latest dated record, one decimal.
    pub cycle_days: Option<f64>,
    /// Majority stage of the lot's records; ties go to FG.
    pub primary_stage: Stage,
    /// Earliest dated record.
    pub first_event: Option<NaiveDateTime>,
    /// Latest dated record.
    pub last_event: Option<NaiveDateTime>,
}

impl Lot {
    /// Empty lot; verdict and timing are filled in by evaluation.
    pub fn new(lot_id: impl Into<LotId>) -> Self {
        Self {
            lot_id: lot_id.into(),
            records: Vec::new(),
            is_rft: None,
            cycle_days: None,
            primary_stage: Stage::Unknown,
            first_event: None,
            last_event: None,
        }
    }

    fn records_of(&self, record_type: RecordType) -> impl Iterator<Item = &NormalizedRecord> {
        self.records
            .iter()
            .filter(move |record| record.record_type == record_type)
    }

    /// Process records only.
    pub fn process_records(&self) -> impl Iterator<Item = &NormalizedRecord> {
        self.records_of(RecordType::Process)
    }

    /// Internal RFT forms only.
    pub fn internal_records(&self) -> impl Iterator<Item = &NormalizedRecord> {
        self.records_of(RecordType::InternalRft)
    }

    /// External RFT findings only.
    pub fn external_records(&self) -> impl Iterator<Item = &NormalizedRecord> {
        self.records_of(RecordType::ExternalRft)
    }

    /// Number of records of one family.
    pub fn count_of(&self, record_type: RecordType) -> usize {
        self.records_of(record_type).count()
    }

    /// Internal forms that reported errors.
    pub fn internal_issue_count(&self) -> usize {
        self.internal_records().filter(|record| record.is_issue()).count()
    }

    /// External records whose category is not excluded.
    pub fn external_issue_count(&self) -> usize {
        self.external_records().filter(|record| record.is_issue()).count()
    }
}
