/// Normalized lot identifier (uppercase, alphanumeric only).
/// Examples: `ABC1234`, `PENDING`
pub type LotId = String;
/// Normalized work-order identifier.
/// Examples: `900`, `WO12345`
pub type WorkOrder = String;
/// Issue category label carried by RFT records.
/// Examples: `Documentation`, `Process Clarification`
pub type IssueCategory = String;
/// Stable per-run record identifier (input position based).
/// Example: `rec-000042`
pub type RecordId = String;
