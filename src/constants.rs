/// Type-discriminator prefixes and explicit source tags used by the classifier.
pub mod schema {
    /// Fields that may carry the `batchId`-like type discriminator.
    pub const DISCRIMINATOR_FIELDS: &[&str] = &["batchId", "batch_id", "batchID", "type"];
    /// Fields that may carry an explicit source/category tag.
    pub const SOURCE_TAG_FIELDS: &[&str] =
        &["source", "recordType", "record_type", "sourceType", "category_tag"];

    /// Discriminator prefix for process (batch record) rows.
    pub const PROCESS_PREFIX: &str = "commercial process";
    /// Discriminator prefix for internal RFT form rows.
    pub const INTERNAL_RFT_PREFIX: &str = "internal rft";
    /// Discriminator prefix for external (customer/QA) RFT rows.
    pub const EXTERNAL_RFT_PREFIX: &str = "external rft";

    /// Tag keywords that identify a process record.
    pub const PROCESS_TAGS: &[&str] = &["process", "commercial process", "batch"];
    /// Tag keywords that identify an internal RFT record.
    pub const INTERNAL_TAGS: &[&str] = &["internal", "internal rft", "internal_rft"];
    /// Tag keywords that identify an external RFT record.
    pub const EXTERNAL_TAGS: &[&str] = &["external", "external rft", "external_rft"];
}

/// Raw field-name aliases, grouped by the canonical field they feed.
pub mod fields {
    /// Lot identifier fields on process and external records.
    pub const LOT: &[&str] = &["lot", "Lot", "lot_number", "lotNumber", "lot#", "batch"];
    /// Work-order fields on process records, in priority order.
    pub const PROCESS_WORK_ORDERS: &[&str] = &[
        "assemblyWo",
        "assembly_wo",
        "cartoningWo",
        "cartoning_wo",
        "workOrder",
        "work_order",
        "wo",
    ];
    /// Combined work-order/lot field on internal RFT forms.
    pub const INTERNAL_WORK_ORDER: &[&str] = &["wo/lot#", "wo_lot", "woLot", "workOrder", "wo"];
    /// Error-count fields on internal RFT forms.
    pub const ERROR_COUNT: &[&str] = &["#_of_errors", "num_errors", "errors", "errorCount"];
    /// Form-title fields on internal RFT forms.
    pub const FORM_TITLE: &[&str] = &["form_title", "formTitle", "title"];
    /// Issue-category fields.
    pub const ISSUE_CATEGORY: &[&str] = &[
        "issueCategory",
        "issue_category",
        "error_type",
        "errorType",
        "issue",
        "category",
    ];
    /// Free-text comment fields on external RFT records.
    pub const COMMENT: &[&str] = &["comment", "comments", "Comment"];
    /// Start/primary event date fields.
    pub const START_DATE: &[&str] = &[
        "startDate",
        "start_date",
        "start",
        "date",
        "date_entered",
        "date_received",
        "created",
    ];
    /// End/completion date fields.
    pub const END_DATE: &[&str] = &["endDate", "end_date", "end", "completed", "completedDate"];
    /// Explicit production-stage field.
    pub const STAGE: &[&str] = &["stage", "Stage", "productionStage"];
}

/// Stage keyword tables (matched case-insensitively as substrings).
pub mod stage {
    /// Keywords that identify the work-in-progress (assembly) stage.
    pub const WIP_KEYWORDS: &[&str] = &["wip", "assembly", "work in progress", "work-in-progress"];
    /// Keywords that identify the finished-goods (packaging) stage.
    pub const FG_KEYWORDS: &[&str] = &["fg", "finished good", "packaging", "cartoning", "pack"];
}

/// Defaults for the reconciliation heuristics.
pub mod defaults {
    /// Alphabetic prefix length of a canonical lot id (`ABC1234`).
    pub const LOT_PREFIX_LEN: usize = 3;
    /// Numeric suffix length of a canonical lot id (`ABC1234`).
    pub const LOT_SUFFIX_LEN: usize = 4;
    /// Sentinel lot id accepted as real despite not matching the pattern.
    pub const PENDING_SENTINEL: &str = "PENDING";
    /// Issue categories that never fail a lot (case-insensitive substring).
    pub const EXCLUSION_CATEGORIES: &[&str] = &["Process Clarification", "Info Only"];
    /// Maximum gap (days) for temporal work-order assignment.
    pub const TEMPORAL_WINDOW_DAYS: f64 = 30.0;
    /// Minimum normalized length for substring containment matches.
    pub const MIN_SUBSTRING_LEN: usize = 3;
    /// Minimum rendered length for shared-field correlation values.
    pub const MIN_SHARED_VALUE_LEN: usize = 3;
    /// Groups without process records need at least this many records to survive.
    pub const NOISE_MIN_RECORDS: usize = 2;
    /// Number of entries kept in each top-issue list.
    pub const TOP_ISSUE_LIMIT: usize = 5;
    /// Category label used when an issue carries no category.
    pub const UNCATEGORIZED: &str = "Uncategorized";
}

/// Spreadsheet serial-date bounds and epoch.
pub mod dates {
    /// Smallest serial day accepted as a date (1954-10-04).
    pub const SERIAL_MIN: f64 = 20_000.0;
    /// Largest serial day accepted as a date (2119-01-10).
    pub const SERIAL_MAX: f64 = 80_000.0;
    /// Serial day zero as (year, month, day).
    pub const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
    /// Seconds per day used for cycle-time arithmetic.
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
}
