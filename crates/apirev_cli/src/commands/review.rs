//! Review command - Review every API description of a repository.
//!
//! Descriptions are reviewed in parallel, then compared as a batch and
//! cross-checked against their behaviour tests. Findings are written as a
//! detailed Markdown report plus a pull request summary.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use apirev_doc::{DocResult, Document, DocumentReader};
use apirev_policy::{
    CommonalitiesPolicy, ConsistencyChecker, Findings, ReviewBatch, ReviewType, SeverityCounts,
    TestAlignmentChecker, ValidationResult, Validator,
};
use chrono::Local;
use clap::Args;
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument, Span};

use super::OutputFormat;
use crate::discover;
use crate::error::CliError;
use crate::report::{self, ReportMeta};

#[derive(Args)]
pub struct ReviewArgs {
    /// Path to the repository containing code/API_definitions
    #[arg(default_value = ".")]
    repo_path: PathBuf,

    /// Output directory for the reports
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Repository name, used in the report header and file name
    #[arg(long)]
    repo_name: Option<String>,

    /// Pull request number, used in the report header and file name
    #[arg(long)]
    pr_number: Option<String>,

    /// Commonalities version to review against (X.Y)
    #[arg(long, env = "APIREV_COMMONALITIES_VERSION", default_value = "0.6")]
    commonalities_version: String,

    /// Review type (release-candidate, public-release, wip)
    #[arg(long, env = "APIREV_REVIEW_TYPE", default_value = "release-candidate")]
    review_type: ReviewType,

    /// Policy file replacing the built-in commonalities profile
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Output format; json also writes api_review.json
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Exit with code 3 when any critical issue is found
    #[arg(long)]
    fail_on_critical: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated: String,
    repo_name: Option<&'a str>,
    pr_number: Option<&'a str>,
    commonalities_version: &'a str,
    review_type: ReviewType,
    report: &'a str,
    totals: SeverityCounts,
    results: &'a ReviewBatch,
}

pub async fn execute(args: ReviewArgs, quiet: bool) -> Result<()> {
    if !args.repo_path.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "Repository directory does not exist: {}",
            args.repo_path.display()
        ))
        .into());
    }
    let policy = resolve_policy(&args)?;

    let meta = ReportMeta {
        repo_name: args.repo_name.as_deref().and_then(report::clean_repo_name),
        pr_number: args.pr_number.as_deref().and_then(report::clean_pr_number),
        commonalities_version: policy.commonalities_version.clone(),
        review_type: args.review_type,
        generated: Local::now(),
    };

    let span = info_span!("review", repo = meta.repo_name.as_deref().unwrap_or("-"));
    info!(parent: &span, "Reviewing {:?} against commonalities {} ({})",
        args.repo_path, meta.commonalities_version, meta.review_type);

    let batch = run_review(&args.repo_path, policy).instrument(span).await?;
    let report_name = write_reports(&batch, &meta, &args.output, args.format)?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&json_report(&batch, &meta, &report_name))
                .context("Failed to serialize results")?;
            println!("{}", json);
        }
        OutputFormat::Text if !quiet => print_summary(&batch, &report_name),
        OutputFormat::Text => {}
    }

    let critical = batch.totals().critical;
    if args.fail_on_critical && critical > 0 {
        return Err(CliError::CriticalFindings(critical).into());
    }
    Ok(())
}

/// Policy file first, then the built-in profile for the requested version.
fn resolve_policy(args: &ReviewArgs) -> Result<CommonalitiesPolicy> {
    let policy = match &args.policy {
        Some(path) => CommonalitiesPolicy::from_file(path)
            .with_context(|| format!("Failed to load policy file {}", path.display()))?,
        None => {
            let version = args.commonalities_version.trim();
            if !is_commonalities_version(version) {
                return Err(CliError::InvalidArgument(format!(
                    "Invalid commonalities version `{}` (expected X.Y, e.g. 0.6)",
                    version
                ))
                .into());
            }
            CommonalitiesPolicy::for_version(version).map_err(|e| CliError::InvalidArgument(e.to_string()))?
        }
    };
    Ok(policy.with_review_type(args.review_type))
}

fn is_commonalities_version(version: &str) -> bool {
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    version
        .split_once('.')
        .map_or(false, |(major, minor)| digits(major) && digits(minor))
}

async fn run_review(repo: &Path, policy: CommonalitiesPolicy) -> Result<ReviewBatch> {
    let files = discover::find_api_files(repo)?;
    if files.is_empty() {
        warn!("No API definition files found in {}", discover::api_dir(repo).display());
        return Ok(ReviewBatch::default());
    }
    info!("Found {} API definition file(s)", files.len());

    let validator = Arc::new(Validator::new(policy.clone()).context("Invalid commonalities policy")?);
    let mut tasks = Vec::with_capacity(files.len());
    for path in files {
        let validator = Arc::clone(&validator);
        let span = Span::current();
        tasks.push(tokio::task::spawn_blocking(move || {
            let _guard = span.enter();
            review_file(&validator, path)
        }));
    }

    // Awaited in spawn order so the batch keeps discovery order.
    let mut loaded = Vec::with_capacity(tasks.len());
    let mut validations = Vec::with_capacity(tasks.len());
    for task in tasks {
        let (document, validation) = task.await.context("Review task failed")?;
        loaded.push(document);
        validations.push(validation);
    }

    let consistency = (loaded.len() > 1).then(|| ConsistencyChecker::new(&policy).check(&loaded));

    let test_dir = discover::test_dir(repo);
    let alignments = if test_dir.is_dir() {
        let checker = TestAlignmentChecker::new(&policy).context("Invalid commonalities policy")?;
        loaded
            .iter()
            .filter_map(|d| d.as_ref().ok())
            .map(|document| checker.check(document, &test_dir))
            .collect()
    } else {
        debug!("No test directory at {:?}, skipping test alignment", test_dir);
        Vec::new()
    };

    Ok(ReviewBatch {
        validations,
        consistency,
        alignments,
    })
}

fn review_file(validator: &Validator, path: PathBuf) -> (DocResult<Document>, ValidationResult) {
    let loaded = DocumentReader::read_file(&path);
    let validation = match &loaded {
        Ok(document) => validator.validate(document),
        Err(e) => {
            warn!("Failed to load {:?}: {}", path, e);
            ValidationResult::load_failed(path.display().to_string(), e)
        }
    };
    (loaded, validation)
}

fn json_report<'a>(batch: &'a ReviewBatch, meta: &'a ReportMeta, report_name: &'a str) -> JsonReport<'a> {
    JsonReport {
        generated: meta.generated.to_rfc3339(),
        repo_name: meta.repo_name.as_deref(),
        pr_number: meta.pr_number.as_deref(),
        commonalities_version: &meta.commonalities_version,
        review_type: meta.review_type,
        report: report_name,
        totals: batch.totals(),
        results: batch,
    }
}

/// Write the report, the summary and, for JSON output, the raw results.
/// Returns the report file name.
fn write_reports(batch: &ReviewBatch, meta: &ReportMeta, output: &Path, format: OutputFormat) -> Result<String> {
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let report_name = meta.file_name();
    let report_path = output.join(&report_name);
    fs::write(&report_path, report::render_report(batch, meta)?)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;

    let summary_path = output.join(report::SUMMARY_FILE);
    fs::write(&summary_path, report::render_summary(batch, &report_name)?)
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;

    if format == OutputFormat::Json {
        let json_path = output.join(report::JSON_FILE);
        let json = serde_json::to_string_pretty(&json_report(batch, meta, &report_name))
            .context("Failed to serialize results")?;
        fs::write(&json_path, json).with_context(|| format!("Failed to write {}", json_path.display()))?;
    }

    info!("Report written to {}", report_path.display());
    Ok(report_name)
}

fn print_summary(batch: &ReviewBatch, report_name: &str) {
    if batch.validations.is_empty() {
        println!("❌ No API definition files found");
        println!("📄 Empty report generated: {}", report_name);
        return;
    }

    println!("🔍 Reviewed {} API description(s)", batch.validations.len());
    for result in &batch.validations {
        let counts = result.counts();
        let api_type = result
            .api_type()
            .map_or_else(|| "not loaded".to_string(), |t| t.to_string());
        println!(
            "  📋 {} v{} ({}): {} critical, {} medium, {} low",
            result.api_name(),
            result.version(),
            api_type,
            counts.critical,
            counts.medium,
            counts.low
        );
    }

    match &batch.consistency {
        Some(consistency) => println!("🔗 Consistency: {} issue(s)", consistency.issues().len()),
        None => println!("🔗 Consistency: skipped (single file)"),
    }
    if batch.alignments.is_empty() {
        println!("🧪 Test alignment: skipped (no tests found)");
    } else {
        let issues: usize = batch.alignments.iter().map(|a| a.issues().len()).sum();
        println!("🧪 Test alignment: {} issue(s)", issues);
    }

    let totals = batch.totals();
    println!();
    println!("Summary:");
    println!("  🔴 Critical: {}", totals.critical);
    println!("  🟡 Medium:   {}", totals.medium);
    println!("  🔵 Low:      {}", totals.low);
    println!("  ℹ️  Info:     {}", totals.info);
    println!();
    println!("📄 Report generated: {}", report_name);

    if totals.critical == 0 {
        println!("✅ No critical issues found");
    } else {
        println!("❌ {} critical issue(s) found", totals.critical);
    }
}
