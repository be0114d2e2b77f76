use std::error::Error;
use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Parser, ValueEnum, error::ErrorKind};

use crate::config::ReconcileConfig;
use crate::ingestion::load_records_from_path;
use crate::metrics::IssueCount;
use crate::pipeline::{LotAnalysisResult, LotAnalyzer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "lot_report",
    disable_help_subcommand = true,
    about = "Reconcile production records into lots and report RFT quality",
    long_about = "Group process, internal RFT, and external RFT records into manufacturing lots, then report lot-level RFT rate, cycle time, top issues, and insights.",
    after_help = "Input is a JSON array of records or an object with a `records` array. Set RUST_LOG=debug to trace resolver phases."
)]
struct LotReportCli {
    #[arg(value_name = "INPUT", help = "Path to the JSON record export")]
    input: PathBuf,
    #[arg(
        long,
        value_name = "PATH",
        help = "Optional JSON config file; missing keys use defaults"
    )]
    config: Option<PathBuf>,
    #[arg(
        long,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Report format"
    )]
    format: OutputFormat,
    #[arg(
        long,
        value_parser = parse_positive_usize,
        help = "Override the number of entries in each top-issue list"
    )]
    top: Option<usize>,
}

/// Run the `lot_report` app with process-style args (program name excluded).
pub fn run_lot_report<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) =
        parse_cli::<LotReportCli, _>(std::iter::once("lot_report".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let mut config = match &cli.config {
        Some(path) => ReconcileConfig::from_path(path)?,
        None => ReconcileConfig::default(),
    };
    if let Some(top) = cli.top {
        config.top_issue_limit = top;
    }
    config.validate()?;

    let records = load_records_from_path(&cli.input)?;
    let result = LotAnalyzer::new(config).analyze(&records);

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print!("{}", render_text_report(&result)),
    }
    Ok(())
}

/// Human-readable summary of one analysis run.
pub fn render_text_report(result: &LotAnalysisResult) -> String {
    let metrics = &result.lot_metrics;
    let diagnostics = &result.diagnostics;
    let mut out = String::new();

    let _ = writeln!(out, "=== lot RFT report ===");
    let _ = writeln!(out, "records: {}", metrics.total_records);
    let _ = writeln!(out, "lots: {}", metrics.total_lots);
    let _ = writeln!(out);

    let _ = writeln!(out, "[QUALITY]");
    let _ = writeln!(out, "  lot RFT rate: {:.1}%", metrics.lot_rft_percentage);
    let _ = writeln!(
        out,
        "  rft: {} | non-rft: {} | indeterminate: {}",
        metrics.rft_lots, metrics.non_rft_lots, metrics.indeterminate_lots
    );
    let _ = writeln!(
        out,
        "  stage: WIP {} | FG {} | unknown {}",
        metrics.wip_lots, metrics.fg_lots, metrics.unknown_stage_lots
    );
    let _ = writeln!(
        out,
        "  issues: {} (WIP {} | FG {})",
        metrics.total_issues, metrics.wip_issue_count, metrics.fg_issue_count
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "[CYCLE TIME]");
    if metrics.cycle_time_lots == 0 {
        let _ = writeln!(out, "  no dated lots");
    } else {
        let _ = writeln!(
            out,
            "  average: {:.1} days over {} lots",
            metrics.avg_cycle_time_days, metrics.cycle_time_lots
        );
    }
    let _ = writeln!(out);

    write_issue_list(&mut out, "[TOP INTERNAL ISSUES]", &metrics.top_internal_issues);
    write_issue_list(&mut out, "[TOP EXTERNAL ISSUES]", &metrics.top_external_issues);

    let _ = writeln!(out, "[DIAGNOSTICS]");
    for (record_type, count) in &diagnostics.records_by_type {
        let _ = writeln!(out, "  {record_type}: {count}");
    }
    let _ = writeln!(out, "  assigned to lots: {}", diagnostics.assigned_records);
    let _ = writeln!(
        out,
        "  unmapped work orders: {} records ({})",
        diagnostics.unmapped_work_order_records,
        if diagnostics.unmapped_work_orders.is_empty() {
            "none".to_string()
        } else {
            diagnostics.unmapped_work_orders.join(", ")
        }
    );
    let _ = writeln!(out, "  without lot or work order: {}", diagnostics.records_without_lot);
    let _ = writeln!(
        out,
        "  noise filtered: {} records in {} lots",
        diagnostics.noise_filtered_records,
        diagnostics.noise_filtered_lots.len()
    );
    let _ = writeln!(out, "  pseudo-lot records moved: {}", diagnostics.remapped_records);
    let phases = &diagnostics.phase_counts;
    let _ = writeln!(
        out,
        "  mappings: direct {} | substring {} | shared field {} | temporal {} | pseudo lots {}",
        phases.direct, phases.substring, phases.shared_field, phases.temporal, phases.pseudo_lots_remapped
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "[INSIGHTS]");
    if result.insights.is_empty() {
        let _ = writeln!(out, "  none");
    }
    for insight in &result.insights {
        let _ = writeln!(out, "  [{:?}] {}", insight.severity, insight.title);
        let _ = writeln!(out, "    {}", insight.description);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "[RECOMMENDATIONS]");
    if result.recommendations.is_empty() {
        let _ = writeln!(out, "  none");
    }
    for recommendation in &result.recommendations {
        let _ = writeln!(
            out,
            "  {}. {} (impact {:?}, difficulty {:?}, payoff {:?})",
            recommendation.priority,
            recommendation.title,
            recommendation.impact,
            recommendation.difficulty,
            recommendation.payoff
        );
        let _ = writeln!(out, "     {}", recommendation.description);
    }
    out
}

fn write_issue_list(out: &mut String, heading: &str, issues: &[IssueCount]) {
    let _ = writeln!(out, "{heading}");
    if issues.is_empty() {
        let _ = writeln!(out, "  none");
    }
    for issue in issues {
        let _ = writeln!(
            out,
            "  {}: {} ({:.0}%)",
            issue.category,
            issue.count,
            issue.share * 100.0
        );
    }
    let _ = writeln!(out);
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse --top value '{}' as a positive integer", raw))?;
    if parsed == 0 {
        return Err("--top must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
