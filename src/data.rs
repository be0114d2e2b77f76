use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use crate::types::{IssueCategory, LotId, RecordId, WorkOrder};

/// Untyped key/value record exactly as supplied by the source feed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Wrap an existing JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Borrow the underlying JSON object.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Raw value for `key` when present and not `null`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    /// Scalar value for `key` rendered as trimmed text; empty strings count as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(render_scalar)
    }

    /// First present value among `keys`, in order.
    pub fn first_value(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .find(|value| render_scalar(value).is_some())
    }

    /// First present text value among `keys`, in order.
    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.text(key))
    }

    /// Every present text value among `keys`, in key order.
    pub fn all_text(&self, keys: &[&str]) -> Vec<String> {
        keys.iter().filter_map(|key| self.text(key)).collect()
    }

    /// True when at least one of `keys` carries a value.
    pub fn has_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| self.text(key).is_some())
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Render strings, numbers, and booleans as trimmed text.
///
/// Arrays, objects, `null`, and blank strings yield `None`.
pub fn render_scalar(value: &Value) -> Option<String> {
    let rendered = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    if rendered.is_empty() {
        None
    } else {
        Some(rendered)
    }
}

/// Record family assigned by the schema classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    /// Process record: a lot and the work orders used to build it.
    Process,
    /// Internal RFT form keyed by work order.
    InternalRft,
    /// External RFT finding keyed by lot.
    ExternalRft,
    /// Matched no schema rule.
    Unknown,
}

impl RecordType {
    /// Families that participate in lot grouping.
    pub const GROUPABLE: [RecordType; 3] = [
        RecordType::Process,
        RecordType::InternalRft,
        RecordType::ExternalRft,
    ];

    /// Short human label.
    pub fn label(self) -> &'static str {
        match self {
            RecordType::Process => "process",
            RecordType::InternalRft => "internal_rft",
            RecordType::ExternalRft => "external_rft",
            RecordType::Unknown => "unknown",
        }
    }
}

/// Production stage a record (or lot) belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Stage {
    /// Work in progress (assembly).
    #[serde(rename = "WIP")]
    Wip,
    /// Finished goods (packaging).
    #[serde(rename = "FG")]
    Fg,
    /// No stage evidence.
    #[default]
    Unknown,
}

/// Canonical record shape produced once at the input boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    /// Stable per-run identifier derived from the input position.
    pub id: RecordId,
    /// Position of the record in the input array.
    pub index: usize,
    /// Family assigned by the classifier.
    pub record_type: RecordType,
    /// Normalized lot id when the record names one explicitly.
    pub lot_id: Option<LotId>,
    /// Primary work order (first of `work_orders`).
    pub work_order: Option<WorkOrder>,
    /// Every work order the record references, normalized, in field order.
    pub work_orders: Vec<WorkOrder>,
    /// Start (or single event) timestamp.
    pub start_date: Option<NaiveDateTime>,
    /// End timestamp.
    pub end_date: Option<NaiveDateTime>,
    /// Reported errors; `0` when absent or unparsable.
    pub error_count: u32,
    /// Issue category as written on the record.
    pub issue_category: Option<IssueCategory>,
    /// `Some(false)` fails the owning lot; `None` means "no verdict".
    pub is_rft: Option<bool>,
    /// Issue category hit the exclusion set.
    pub excluded_issue: bool,
    /// Inferred production stage.
    pub stage: Stage,
    /// Original fields, untouched.
    pub raw: RawRecord,
}

impl NormalizedRecord {
    /// Primary event timestamp (start, falling back to end).
    pub fn event_date(&self) -> Option<NaiveDateTime> {
        self.start_date.or(self.end_date)
    }

    /// All dated timestamps carried by the record.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.start_date.into_iter().chain(self.end_date)
    }

    /// True when this record counts toward issue histograms.
    ///
    /// Internal forms are issues when they report errors; external records
    /// always are. Either way an excluded category is never an issue.
    pub fn is_issue(&self) -> bool {
        match self.record_type {
            RecordType::InternalRft => self.error_count > 0 && !self.excluded_issue,
            RecordType::ExternalRft => !self.excluded_issue,
            RecordType::Process | RecordType::Unknown => false,
        }
    }
}
