use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::Output;
use crate::client::{ReqwestTransport, ScanClient};
use crate::collect::{CollectedDocuments, collect_documents};
use crate::config::ScanlinkConfig;
use crate::parallel::{CountingProgress, ProgressReporter, ProgressSection, ScanProgressBar};
use crate::scan::{BatchDispatcher, CliError, DispatchOutcome, LocalScanResult, RemoteBatchScanner, ScanType};

/// Exit code when the scan finished and found nothing
pub const EXIT_CLEAN: i32 = 0;
/// Exit code when at least one detection was reported
pub const EXIT_DETECTIONS: i32 = 1;
/// Exit code when at least one batch failed with a hard error
pub const EXIT_BATCH_ERRORS: i32 = 2;

#[derive(Args)]
pub struct ScanArgs {
    /// Files or directories to scan
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Scan type: secret, iac, sca, sast
    #[arg(short = 't', long, default_value = "secret")]
    pub scan_type: String,

    /// Upload with the synchronous flow instead of polling
    #[arg(long)]
    pub sync: bool,

    /// Request a report url for every batch
    #[arg(long)]
    pub report: bool,

    /// Mark the upload as a git diff
    #[arg(long)]
    pub git_diff: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Output format: text, json
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
}

#[derive(Serialize)]
struct BatchErrorReport<'a> {
    batch_id: &'a str,
    #[serde(flatten)]
    error: &'a CliError,
}

#[derive(Serialize)]
struct ScanReport<'a> {
    scan_type: ScanType,
    documents: usize,
    skipped: usize,
    detections: usize,
    results: &'a [LocalScanResult],
    errors: Vec<BatchErrorReport<'a>>,
}

pub fn execute(args: ScanArgs, verbose: u8, quiet: bool, custom_config: Option<&str>) -> Result<i32> {
    let output = Output::new(verbose > 0, quiet);
    let json = args.format == "json";
    let scan_type: ScanType = args.scan_type.parse()?;

    let mut config = ScanlinkConfig::load(custom_config)?;
    apply_flags(&mut config, &args);

    let progress: Box<dyn ProgressReporter> = if args.no_progress || quiet || json {
        Box::new(CountingProgress::new())
    } else {
        Box::new(ScanProgressBar::new())
    };

    let started = Instant::now();
    progress.set_section_length(ProgressSection::Prepare, 1);
    let collected = collect_documents(&args.paths, config.collect.max_file_size_bytes);
    progress.update(ProgressSection::Prepare);
    output.verbose(&format!(
        "Collected {} files from {} path(s)",
        collected.documents.len(),
        args.paths.len()
    ));

    if collected.documents.is_empty() {
        progress.finish();
        output.info("No files to scan");
        return Ok(EXIT_CLEAN);
    }

    let transport = ReqwestTransport::new(&config.api).context("Failed to create HTTP client")?;
    let client = ScanClient::new(Box::new(transport))
        .with_sync_scan_timeout(Duration::from_secs(config.api.sync_scan_timeout_secs));
    let scanner = RemoteBatchScanner::new(
        &client,
        scan_type,
        config.scan.clone(),
        config.polling.clone(),
    );

    let outcome = BatchDispatcher::new(&config.scan_batch).run(
        &scanner,
        scan_type,
        &collected.documents,
        progress.as_ref(),
    )?;

    let report = generate_report(
        progress.as_ref(),
        json,
        scan_type,
        &collected,
        &outcome,
        started.elapsed(),
    )?;
    progress.finish();

    match report {
        Report::Json(rendered) => println!("{rendered}"),
        Report::Text(summary) => print_summary(&output, scan_type, &summary),
    }

    Ok(exit_code(&outcome))
}

enum Report<'a> {
    Json(String),
    Text(ScanSummary<'a>),
}

/// Build the report inside the `GenerateReport` section. Nothing is printed here so the
/// bar can be cleared before output starts.
fn generate_report<'a>(
    progress: &dyn ProgressReporter,
    json: bool,
    scan_type: ScanType,
    collected: &CollectedDocuments,
    outcome: &'a DispatchOutcome<LocalScanResult>,
    elapsed: Duration,
) -> Result<Report<'a>> {
    progress.set_section_length(ProgressSection::GenerateReport, 1);
    let report = if json {
        Report::Json(render_json(scan_type, collected, outcome)?)
    } else {
        Report::Text(ScanSummary::new(collected, outcome, elapsed))
    };
    progress.update(ProgressSection::GenerateReport);
    Ok(report)
}

/// Figures for the text report
struct ScanSummary<'a> {
    files_scanned: usize,
    files_skipped: usize,
    batches: usize,
    detections: usize,
    elapsed: Duration,
    results: &'a [LocalScanResult],
    errors: Vec<(&'a str, &'a CliError)>,
}

impl<'a> ScanSummary<'a> {
    fn new(
        collected: &CollectedDocuments,
        outcome: &'a DispatchOutcome<LocalScanResult>,
        elapsed: Duration,
    ) -> Self {
        Self {
            files_scanned: collected.documents.len(),
            files_skipped: collected.warnings.len(),
            batches: outcome.results.len() + outcome.errors.len(),
            detections: detection_count(outcome),
            elapsed,
            results: &outcome.results,
            errors: sorted_errors(outcome),
        }
    }
}

fn apply_flags(config: &mut ScanlinkConfig, args: &ScanArgs) {
    config.scan.use_sync_flow |= args.sync;
    config.scan.report |= args.report;
    config.scan.is_git_diff |= args.git_diff;
}

fn exit_code(outcome: &DispatchOutcome<LocalScanResult>) -> i32 {
    if outcome.errors.values().any(|error| !error.soft_fail) {
        EXIT_BATCH_ERRORS
    } else if outcome.results.iter().any(|result| result.issue_detected) {
        EXIT_DETECTIONS
    } else {
        EXIT_CLEAN
    }
}

fn sorted_errors(outcome: &DispatchOutcome<LocalScanResult>) -> Vec<(&str, &CliError)> {
    let mut errors: Vec<(&str, &CliError)> = outcome
        .errors
        .iter()
        .map(|(batch_id, error)| (batch_id.as_str(), error))
        .collect();
    errors.sort_by_key(|(batch_id, _)| *batch_id);
    errors
}

fn detection_count(outcome: &DispatchOutcome<LocalScanResult>) -> usize {
    outcome.results.iter().map(|result| result.detections.len()).sum()
}

fn render_json(
    scan_type: ScanType,
    collected: &CollectedDocuments,
    outcome: &DispatchOutcome<LocalScanResult>,
) -> Result<String> {
    let report = ScanReport {
        scan_type,
        documents: collected.documents.len(),
        skipped: collected.warnings.len(),
        detections: detection_count(outcome),
        results: &outcome.results,
        errors: sorted_errors(outcome)
            .into_iter()
            .map(|(batch_id, error)| BatchErrorReport { batch_id, error })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn print_summary(output: &Output, scan_type: ScanType, summary: &ScanSummary<'_>) {
    output.header(&format!("Scan results ({scan_type})"));
    output.key_value("Files scanned:", &summary.files_scanned.to_string(), false);
    output.key_value("Batches:", &summary.batches.to_string(), false);
    output.key_value("Duration:", &format!("{:.2}s", summary.elapsed.as_secs_f64()), false);

    if summary.detections > 0 {
        output.category("Detections");
        for result in summary.results.iter().filter(|result| result.issue_detected) {
            for detection in &result.detections {
                let rule = detection
                    .detection_type
                    .as_deref()
                    .or(detection.detection_rule_id.as_deref())
                    .unwrap_or("detection");
                output.detection(rule, &detection.message, detection.file_path());
            }
            if let Some(report_url) = &result.report_url {
                output.key_value("Report:", report_url, false);
            }
        }
    }

    if !summary.errors.is_empty() {
        output.category("Failed batches");
        for (batch_id, error) in &summary.errors {
            output.batch_error(batch_id, &error.code, &error.message);
        }
    }

    output.blank_line();
    if summary.files_skipped > 0 {
        output.warning(&format!(
            "Skipped {} files (unreadable, not UTF-8 or larger than the size limit)",
            summary.files_skipped
        ));
    }
    if !summary.errors.is_empty() {
        output.error(&format!(
            "{} of {} batches failed",
            summary.errors.len(),
            summary.batches
        ));
    }
    if summary.detections > 0 {
        output.count("⚠", "Detections found", summary.detections);
    } else if summary.errors.is_empty() {
        output.success("No detections found");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::Detection;
    use crate::error::ScanError;

    fn result(detections: usize) -> LocalScanResult {
        LocalScanResult {
            scan_id: "s-1".to_string(),
            scan_type: ScanType::Secret,
            documents_count: 1,
            detections: vec![Detection::default(); detections],
            report_url: None,
            issue_detected: detections > 0,
        }
    }

    fn outcome(results: Vec<LocalScanResult>, errors: Vec<(&str, CliError)>) -> DispatchOutcome<LocalScanResult> {
        DispatchOutcome {
            errors: errors
                .into_iter()
                .map(|(batch_id, error)| (batch_id.to_string(), error))
                .collect(),
            results,
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&outcome(vec![result(0)], vec![])), EXIT_CLEAN);
        assert_eq!(exit_code(&outcome(vec![result(2)], vec![])), EXIT_DETECTIONS);
        assert_eq!(
            exit_code(&outcome(vec![result(2)], vec![("b", CliError::new("transport", "down"))])),
            EXIT_BATCH_ERRORS
        );
        assert_eq!(
            exit_code(&outcome(vec![result(0)], vec![("b", CliError::new("x", "y").soft())])),
            EXIT_CLEAN
        );
        let rejected = ScanError::Status {
            path: "api/v1/zip".to_string(),
            status: 413,
            body: "batch too large".to_string(),
        };
        assert_eq!(
            exit_code(&outcome(vec![result(0)], vec![("b", CliError::from(&rejected))])),
            EXIT_CLEAN
        );
    }

    #[test]
    fn test_report_generation_fills_report_section() {
        let progress = CountingProgress::new();
        let collected = CollectedDocuments::default();
        let outcome = outcome(
            vec![result(1), result(0)],
            vec![("b-1", CliError::new("transport", "down"))],
        );

        let report = generate_report(
            &progress,
            false,
            ScanType::Secret,
            &collected,
            &outcome,
            Duration::from_millis(5),
        )
        .unwrap();

        assert_eq!(progress.section_length(ProgressSection::GenerateReport), 1);
        assert_eq!(progress.updates(ProgressSection::GenerateReport), 1);
        let Report::Text(summary) = report else {
            panic!("expected a text report");
        };
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.detections, 1);
        assert_eq!(summary.errors, vec![("b-1", &outcome.errors["b-1"])]);

        let progress = CountingProgress::new();
        let report = generate_report(
            &progress,
            true,
            ScanType::Secret,
            &collected,
            &outcome,
            Duration::ZERO,
        )
        .unwrap();
        assert_eq!(progress.updates(ProgressSection::GenerateReport), 1);
        assert!(matches!(report, Report::Json(rendered) if rendered.contains("\"b-1\"")));
    }

    #[test]
    fn test_json_report_lists_errors_sorted() {
        let collected = CollectedDocuments::default();
        let outcome = outcome(
            vec![result(1)],
            vec![
                ("b-2", CliError::new("http_status", "server returned 500")),
                ("b-1", CliError::new("scan_panicked", "boom")),
            ],
        );

        let json = render_json(ScanType::Secret, &collected, &outcome).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["scan_type"], "secret");
        assert_eq!(value["detections"], 1);
        assert_eq!(value["errors"][0]["batch_id"], "b-1");
        assert_eq!(value["errors"][0]["code"], "scan_panicked");
        assert_eq!(value["errors"][1]["soft_fail"], false);
    }
}
