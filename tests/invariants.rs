use lotwise::{
    LotAnalysisResult, RawRecord, ReconcileConfig, Stage, analyze_records, analyze_value,
    parse_records,
};
use serde_json::{Value, json};

/// A feed mixing every record family plus the awkward cases: pseudo lots,
/// unmapped work orders, excluded categories, undated and unknown rows.
fn mixed_feed() -> Value {
    json!([
        {"batchId": "Commercial Process", "lot": "ABC1234", "assemblyWo": "900",
         "cartoningWo": "901", "startDate": "2025-01-01", "endDate": "2025-01-09"},
        {"batchId": "Commercial Process", "lot": "XYZ5678", "assemblyWo": "910",
         "cartoningWo": "911", "startDate": "01/15/2025", "endDate": "2025-01-30T08:00:00"},
        {"batchId": "Commercial Process", "lot": "QRS1111", "cartoningWo": "920"},
        {"batchId": "Internal RFT", "wo/lot#": "900", "#_of_errors": 0, "stage": "WIP"},
        {"batchId": "Internal RFT", "wo/lot#": "901", "#_of_errors": "2",
         "error_type": "Documentation", "stage": "FG"},
        {"batchId": "Internal RFT", "wo/lot#": "910", "#_of_errors": "n/a", "date": "not a date"},
        {"batchId": "Internal RFT", "wo/lot#": "777", "#_of_errors": 1, "date": "2019-05-05"},
        {"batchId": "External RFT", "lot": "xyz5678", "category": "Info Only"},
        {"batchId": "External RFT", "lot": "911", "category": "Labeling"},
        {"batchId": "External RFT", "lot": "LMN4444", "category": "Sealing"},
        {"batchId": "External RFT", "category": "Sealing"},
        {"sku": "unrelated", "qty": 4}
    ])
}

fn analyze(value: Value) -> LotAnalysisResult {
    analyze_value(value, &ReconcileConfig::default()).expect("valid input")
}

#[test]
fn verdict_counts_cover_every_lot() {
    let metrics = analyze(mixed_feed()).lot_metrics;
    assert_eq!(
        metrics.rft_lots + metrics.non_rft_lots + metrics.indeterminate_lots,
        metrics.total_lots
    );
    assert_eq!(
        metrics.wip_lots + metrics.fg_lots + metrics.unknown_stage_lots,
        metrics.total_lots
    );
}

#[test]
fn every_record_is_accounted_for() {
    let result = analyze(mixed_feed());
    let diagnostics = &result.diagnostics;
    assert!(diagnostics.is_consistent());
    assert_eq!(diagnostics.total_records, 12);

    let in_lots: usize = result.lot_data.values().map(|lot| lot.records.len()).sum();
    assert_eq!(in_lots, diagnostics.assigned_records);
    assert_eq!(
        result.lot_metrics.unassigned_records,
        diagnostics.total_records - diagnostics.assigned_records
    );
    assert!(diagnostics.unmapped_work_orders.contains(&"777".to_string()));
    assert_eq!(diagnostics.noise_filtered_lots, vec!["LMN4444".to_string()]);
    assert_eq!(diagnostics.records_without_lot, 1);
    assert_eq!(diagnostics.unknown_records, 1);
}

#[test]
fn no_record_belongs_to_two_lots() {
    let result = analyze(mixed_feed());
    let mut seen = std::collections::BTreeSet::new();
    for lot in result.lot_data.values() {
        for record in &lot.records {
            assert!(seen.insert(record.id.clone()), "record {} grouped twice", record.id);
        }
    }
}

#[test]
fn repeated_runs_are_byte_identical() {
    let first = serde_json::to_string(&analyze(mixed_feed())).unwrap();
    let second = serde_json::to_string(&analyze(mixed_feed())).unwrap();
    assert_eq!(first, second);
}

#[test]
fn reusing_parsed_records_matches_fresh_parse() {
    let raws: Vec<RawRecord> = parse_records(mixed_feed()).unwrap();
    let config = ReconcileConfig::default();
    let a = serde_json::to_string(&analyze_records(&raws, &config).lot_metrics).unwrap();
    let b = serde_json::to_string(&analyze_records(&raws, &config).lot_metrics).unwrap();
    assert_eq!(a, b);
}

#[test]
fn excluded_categories_never_fail_a_lot() {
    for category in ["Process Clarification", "process clarification", "Info Only"] {
        let result = analyze(json!([
            {"batchId": "Commercial Process", "lot": "ABC1234", "assemblyWo": "900"},
            {"batchId": "Internal RFT", "wo/lot#": "900", "#_of_errors": 0},
            {"batchId": "External RFT", "lot": "ABC1234", "category": category},
        ]));
        assert_eq!(result.lot_data["ABC1234"].is_rft, Some(true), "category {category}");
    }
}

#[test]
fn excluded_internal_errors_neither_fail_nor_count_as_issues() {
    let result = analyze(json!([
        {"batchId": "Commercial Process", "lot": "ABC1234", "assemblyWo": "900"},
        {"batchId": "Internal RFT", "wo/lot#": "900", "#_of_errors": 1,
         "error_type": "Process Clarification"},
    ]));
    let metrics = &result.lot_metrics;
    assert_eq!(result.lot_data["ABC1234"].is_rft, Some(true));
    assert!(metrics.issue_category_histogram.is_empty());
    assert!(metrics.top_internal_issues.is_empty());
    assert_eq!(metrics.total_issues, 0);
}

#[test]
fn issue_ties_keep_feed_order_across_lots() {
    let result = analyze(json!([
        {"batchId": "Commercial Process", "lot": "XYZ5678", "assemblyWo": "910"},
        {"batchId": "External RFT", "lot": "XYZ5678", "category": "Sealing"},
        {"batchId": "Commercial Process", "lot": "ABC1234", "assemblyWo": "900"},
        {"batchId": "External RFT", "lot": "ABC1234", "category": "Labeling"},
    ]));
    let top: Vec<&str> = result
        .lot_metrics
        .top_external_issues
        .iter()
        .map(|issue| issue.category.as_str())
        .collect();
    assert_eq!(top, vec!["Sealing", "Labeling"]);
    let first = result.lot_metrics.issue_category_histogram.keys().next();
    assert_eq!(first.map(String::as_str), Some("Sealing"));
}

#[test]
fn stage_ties_resolve_to_fg() {
    let result = analyze(json!([
        {"batchId": "Internal RFT", "wo/lot#": "ABC1234", "#_of_errors": 0, "stage": "WIP"},
        {"batchId": "Internal RFT", "wo/lot#": "ABC1234", "#_of_errors": 0, "stage": "FG"},
    ]));
    let lot = &result.lot_data["ABC1234"];
    assert_eq!(lot.primary_stage, Stage::Fg);

    let reversed = analyze(json!([
        {"batchId": "Internal RFT", "wo/lot#": "ABC1234", "#_of_errors": 0, "stage": "FG"},
        {"batchId": "Internal RFT", "wo/lot#": "ABC1234", "#_of_errors": 0, "stage": "WIP"},
    ]));
    assert_eq!(reversed.lot_data["ABC1234"].primary_stage, Stage::Fg);
}

#[test]
fn malformed_fields_degrade_without_failing() {
    let result = analyze(mixed_feed());
    let lot = &result.lot_data["XYZ5678"];
    let form = lot
        .internal_records()
        .next()
        .expect("work order 910 resolves to XYZ5678");
    assert_eq!(form.error_count, 0);
    assert_eq!(form.start_date, None);
    assert_eq!(lot.is_rft, Some(false));
}

#[test]
fn empty_input_yields_empty_metrics() {
    let result = analyze(json!([]));
    assert!(result.lot_data.is_empty());
    assert_eq!(result.lot_metrics.total_lots, 0);
    assert_eq!(result.lot_metrics.lot_rft_percentage, 0.0);
    assert_eq!(result.lot_metrics.avg_cycle_time_days, 0.0);
    assert!(result.insights.is_empty());
    assert!(result.recommendations.is_empty());
    assert!(result.diagnostics.is_consistent());
}
