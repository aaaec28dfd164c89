//! Markdown rendering of a review batch.
//!
//! Two documents are produced per run: a detailed report and a short
//! summary meant to be posted as a pull request comment.

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use apirev_policy::{ApiType, Findings, Issue, ReviewBatch, ReviewType, Severity};
use chrono::{DateTime, Local};

pub const SUMMARY_FILE: &str = "summary.md";
pub const JSON_FILE: &str = "api_review.json";

const MAX_FILE_NAME: usize = 200;
const MAX_REPO_NAME: usize = 100;
const MAX_PR_NUMBER: usize = 20;
const FALLBACK_FILE_NAME: &str = "sanitized_filename.md";

/// Critical issues repeated at the end of the detailed report.
const REPORT_CRITICAL_LIMIT: usize = 10;
/// Critical issues listed in the summary, overall and per API.
const SUMMARY_CRITICAL_LIMIT: usize = 25;
const SUMMARY_PER_API_LIMIT: usize = 5;

pub fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "🔴 Critical",
        Severity::Medium => "🟡 Medium",
        Severity::Low => "🔵 Low",
        Severity::Info => "ℹ️ Info",
    }
}

fn type_label(api_type: Option<ApiType>) -> String {
    api_type.map_or_else(|| "Unknown (not loaded)".to_string(), |t| t.to_string())
}

fn type_indicator(api_type: Option<ApiType>) -> &'static str {
    match api_type {
        Some(ApiType::ExplicitSubscription) => "🔔",
        Some(ApiType::ImplicitSubscription) => "📧",
        Some(ApiType::Regular) => "📄",
        None => "❌",
    }
}

/// Identity of a review run, shown in the report header.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub repo_name: Option<String>,
    pub pr_number: Option<String>,
    pub commonalities_version: String,
    pub review_type: ReviewType,
    pub generated: DateTime<Local>,
}

impl ReportMeta {
    /// `api_review_<repo>_pr<N>_v<ver>_<timestamp>.md`, or without the
    /// repository part when either the name or the PR number is unknown.
    pub fn file_name(&self) -> String {
        let version = self.commonalities_version.replace('.', "_");
        let timestamp = self.generated.format("%Y%m%d_%H%M%S");
        let base = match (&self.repo_name, &self.pr_number) {
            (Some(repo), Some(pr)) => format!("api_review_{}_pr{}_v{}_{}", repo, pr, version, timestamp),
            _ => format!("api_review_v{}_{}", version, timestamp),
        };
        sanitize_file_name(&format!("{}.md", base))
    }
}

/// Repository name reduced to `[A-Za-z0-9_-]`.
pub fn clean_repo_name(raw: &str) -> Option<String> {
    let name: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(MAX_REPO_NAME)
        .collect();
    (!name.is_empty()).then_some(name)
}

/// Pull request number reduced to its digits.
pub fn clean_pr_number(raw: &str) -> Option<String> {
    let number: String = raw.chars().filter(char::is_ascii_digit).take(MAX_PR_NUMBER).collect();
    (!number.is_empty()).then_some(number)
}

/// Make `name` safe to use as a single file name inside the output directory.
pub fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut cleaned: String = base
        .chars()
        .map(|c| if c.is_control() || r#"<>:"/\|?*"#.contains(c) { '_' } else { c })
        .collect();

    if cleaned.chars().count() > MAX_FILE_NAME {
        let (stem, ext) = match cleaned.rfind('.') {
            Some(i) if i > 0 => cleaned.split_at(i),
            _ => (cleaned.as_str(), ""),
        };
        let keep = MAX_FILE_NAME.saturating_sub(ext.chars().count() + 3);
        cleaned = format!("{}...{}", stem.chars().take(keep).collect::<String>(), ext);
    }

    if cleaned.chars().all(|c| c == '.' || c == '_') {
        return FALLBACK_FILE_NAME.to_string();
    }
    cleaned
}

/// Escape HTML special characters in free text.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '>' => out.push_str("&gt;"),
            '<' => out.push_str("&lt;"),
            other => out.push(other),
        }
    }
    out
}

fn file_name_of(source: &str) -> String {
    Path::new(source)
        .file_name()
        .map_or_else(|| source.to_string(), |n| n.to_string_lossy().into_owned())
}

fn write_issue(out: &mut String, issue: &Issue) -> std::fmt::Result {
    writeln!(out, "**{}**: {}", severity_label(issue.severity()), issue.category())?;
    writeln!(out, "- **Description**: {}", escape(issue.description()))?;
    if let Some(location) = issue.location() {
        writeln!(out, "- **Location**: `{}`", location)?;
    }
    if let Some(fix) = issue.fix_suggestion() {
        writeln!(out, "- **Fix**: {}", escape(fix))?;
    }
    writeln!(out)
}

/// Render the detailed report.
pub fn render_report(batch: &ReviewBatch, meta: &ReportMeta) -> Result<String> {
    let mut out = String::new();
    let totals = batch.totals();

    writeln!(out, "# API Review Report\n")?;
    writeln!(out, "**Generated**: {}", meta.generated.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "**Commonalities Version**: {}", meta.commonalities_version)?;
    writeln!(out, "**Review Type**: {}", meta.review_type)?;
    if let Some(repo) = &meta.repo_name {
        writeln!(out, "**Repository**: {}", repo)?;
    }
    if let Some(pr) = &meta.pr_number {
        writeln!(out, "**PR Number**: {}", pr)?;
    }

    writeln!(out, "\n## Executive Summary\n")?;
    writeln!(out, "- **APIs Reviewed**: {}", batch.validations.len())?;
    writeln!(out, "- **Critical Issues**: {}", totals.critical)?;
    writeln!(out, "- **Medium Issues**: {}", totals.medium)?;
    writeln!(out, "- **Low Issues**: {}", totals.low)?;
    writeln!(out, "- **Info**: {}", totals.info)?;
    writeln!(
        out,
        "- **Multi-file Consistency**: {}",
        if batch.consistency.is_some() { "✅ Checked" } else { "⏭️ Skipped (single file)" }
    )?;
    writeln!(
        out,
        "- **Test Alignment**: {}\n",
        if batch.alignments.is_empty() { "⏭️ Skipped (no tests found)" } else { "✅ Checked" }
    )?;

    let type_counts = batch.type_counts();
    if !type_counts.is_empty() {
        writeln!(out, "### API Types Detected\n")?;
        for (api_type, count) in &type_counts {
            writeln!(out, "- **{}**: {}", api_type, count)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "## Individual API Analysis\n")?;
    for result in &batch.validations {
        let counts = result.counts();
        writeln!(out, "### `{}` v{}\n", result.api_name(), result.version())?;
        writeln!(out, "**File**: `{}`", file_name_of(result.source()))?;
        writeln!(out, "**Type**: {}", type_label(result.api_type()))?;
        writeln!(
            out,
            "**Issues**: {} critical, {} medium, {} low\n",
            counts.critical, counts.medium, counts.low
        )?;
        if result.issues().is_empty() {
            writeln!(out, "✅ **No issues found**\n")?;
        } else {
            writeln!(out, "#### Issues Found\n")?;
            for issue in result.issues() {
                write_issue(&mut out, issue)?;
            }
        }
    }

    if let Some(consistency) = batch.consistency.as_ref().filter(|c| !c.issues().is_empty()) {
        writeln!(out, "## Project-Wide Consistency Issues\n")?;
        for issue in consistency.issues() {
            write_issue(&mut out, issue)?;
        }
    }

    if !batch.alignments.is_empty() {
        writeln!(out, "## Test Alignment Analysis\n")?;
        for alignment in &batch.alignments {
            let api = Path::new(alignment.source())
                .file_stem()
                .map_or_else(|| alignment.source().to_string(), |s| s.to_string_lossy().into_owned());
            writeln!(out, "### Tests for `{}`\n", api)?;
            if alignment.test_files().is_empty() {
                writeln!(out, "❌ **No test files found**\n")?;
            } else {
                writeln!(out, "**Test Files Found**:")?;
                for file in alignment.test_files() {
                    writeln!(out, "- `{}`", file_name_of(file))?;
                }
                writeln!(out)?;
            }
            if !alignment.issues().is_empty() {
                writeln!(out, "#### Test Issues\n")?;
                for issue in alignment.issues() {
                    write_issue(&mut out, issue)?;
                }
            }
        }
    }

    let critical = batch.issues_with(Severity::Critical);
    if !critical.is_empty() {
        writeln!(out, "## Critical Issues Requiring Immediate Attention\n")?;
        for issue in critical.iter().take(REPORT_CRITICAL_LIMIT) {
            write!(out, "- **{}**: {}", issue.category(), escape(issue.description()))?;
            if let Some(location) = issue.location() {
                write!(out, " (`{}`)", location)?;
            }
            writeln!(out)?;
        }
        if critical.len() > REPORT_CRITICAL_LIMIT {
            writeln!(
                out,
                "\n*... and {} more critical issues. See the sections above for complete analysis.*",
                critical.len() - REPORT_CRITICAL_LIMIT
            )?;
        }
        writeln!(out)?;
    }

    let checks = batch.checks_performed();
    if !checks.is_empty() {
        writeln!(out, "## Automated Checks Performed\n")?;
        for check in checks {
            writeln!(out, "- {}", check)?;
        }
        writeln!(out)?;
    }

    let manual = batch.manual_checks();
    if !manual.is_empty() {
        writeln!(out, "## Manual Review Required\n")?;
        for check in manual {
            writeln!(out, "- {}", check)?;
        }
        writeln!(out)?;
    }

    Ok(out)
}

/// Render the pull request summary.
pub fn render_summary(batch: &ReviewBatch, report_name: &str) -> Result<String> {
    let mut out = String::new();

    if batch.validations.is_empty() {
        writeln!(out, "❌ **No API definition files found**\n")?;
        writeln!(out, "Please ensure YAML files are located in `code/API_definitions/`")?;
        return Ok(out);
    }

    let totals = batch.totals();
    let status = if totals.critical > 0 {
        "❌ **Critical Issues Found**"
    } else if totals.medium > 0 {
        "⚠️ **Conditional Approval**"
    } else {
        "✅ **Ready for Release**"
    };
    writeln!(out, "### {}\n", status)?;

    writeln!(out, "**APIs Reviewed**:")?;
    for result in &batch.validations {
        writeln!(
            out,
            "- {} `{}` v{} ({})",
            type_indicator(result.api_type()),
            result.api_name(),
            result.version(),
            type_label(result.api_type())
        )?;
    }
    writeln!(out)?;

    writeln!(out, "**Issues Summary**:")?;
    for severity in Severity::ALL {
        writeln!(out, "- {}: {}", severity_label(severity), totals.get(severity))?;
    }
    writeln!(out)?;

    if totals.critical > 0 {
        writeln!(out, "**Critical Issues Requiring Immediate Attention**:\n")?;
        let mut shown = 0;
        for result in &batch.validations {
            let critical = result.issues_with(Severity::Critical);
            if critical.is_empty() || shown >= SUMMARY_CRITICAL_LIMIT {
                continue;
            }
            writeln!(out, "*{}*:", result.api_name())?;
            let room = SUMMARY_PER_API_LIMIT.min(SUMMARY_CRITICAL_LIMIT - shown);
            for issue in critical.into_iter().take(room) {
                writeln!(out, "- {}: {}", issue.category(), escape(issue.description()))?;
                shown += 1;
            }
            writeln!(out)?;
        }

        let batch_wide = batch
            .consistency
            .iter()
            .flat_map(|c| c.issues_with(Severity::Critical))
            .chain(batch.alignments.iter().flat_map(|a| a.issues_with(Severity::Critical)));
        for issue in batch_wide.take(SUMMARY_CRITICAL_LIMIT - shown) {
            writeln!(out, "- {}: {}", issue.category(), escape(issue.description()))?;
            shown += 1;
        }

        if shown < totals.critical {
            writeln!(
                out,
                "*... and {} more critical issues. See detailed report for complete analysis.*",
                totals.critical - shown
            )?;
        }
        writeln!(out)?;
    }

    if totals.critical > 0 {
        writeln!(
            out,
            "**Recommendation**: ❌ Address {} critical issue(s) before release",
            totals.critical
        )?;
    } else if totals.medium > 0 {
        writeln!(out, "**Recommendation**: ⚠️ Approved with medium-priority improvements recommended")?;
    } else {
        writeln!(out, "**Recommendation**: ✅ Approved for release")?;
    }

    writeln!(out, "\n📄 **Detailed Report**: {}", report_name)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apirev_doc::{DocError, DocumentReader};
    use apirev_policy::{CommonalitiesPolicy, ValidationResult, Validator};
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn meta(repo: Option<&str>, pr: Option<&str>) -> ReportMeta {
        ReportMeta {
            repo_name: repo.map(str::to_string),
            pr_number: pr.map(str::to_string),
            commonalities_version: "0.6".to_string(),
            review_type: ReviewType::ReleaseCandidate,
            generated: Local.with_ymd_and_hms(2026, 3, 1, 12, 30, 5).unwrap(),
        }
    }

    fn broken(name: &str, message: &str) -> ValidationResult {
        let path = format!("code/API_definitions/{}", name);
        let error = DocError::Parse {
            path: PathBuf::from(&path),
            message: message.to_string(),
        };
        ValidationResult::load_failed(path, &error)
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(
            meta(Some("QualityOnDemand"), Some("42")).file_name(),
            "api_review_QualityOnDemand_pr42_v0_6_20260301_123005.md"
        );
        assert_eq!(meta(Some("QualityOnDemand"), None).file_name(), "api_review_v0_6_20260301_123005.md");
    }

    #[test]
    fn test_input_cleaning() {
        assert_eq!(clean_repo_name("camara/Quality On-Demand!").as_deref(), Some("camaraQualityOn-Demand"));
        assert_eq!(clean_repo_name("$$$"), None);
        assert_eq!(clean_pr_number("#123").as_deref(), Some("123"));
        assert_eq!(clean_pr_number(&"9".repeat(40)).map(|n| n.len()), Some(20));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("a<b>|c.md"), "a_b__c.md");
        assert_eq!(sanitize_file_name(".."), FALLBACK_FILE_NAME);
        assert_eq!(sanitize_file_name("._."), FALLBACK_FILE_NAME);

        let long = sanitize_file_name(&format!("{}.md", "x".repeat(300)));
        assert_eq!(long.chars().count(), MAX_FILE_NAME);
        assert!(long.ends_with("....md"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;");
    }

    #[test]
    fn test_empty_summary() {
        let summary = render_summary(&ReviewBatch::default(), "report.md").unwrap();
        assert!(summary.starts_with("❌ **No API definition files found**"));
    }

    #[test]
    fn test_summary_limits_critical_issues() {
        let batch = ReviewBatch {
            validations: (0..30).map(|i| broken(&format!("api-{}.yaml", i), "bad")).collect(),
            ..ReviewBatch::default()
        };
        let summary = render_summary(&batch, "report.md").unwrap();
        assert!(summary.contains("### ❌ **Critical Issues Found**"));
        assert_eq!(summary.matches("- YAML Syntax: ").count(), SUMMARY_CRITICAL_LIMIT);
        assert!(summary.contains("*... and 5 more critical issues."));
        assert!(summary.contains("Address 30 critical issue(s)"));
        assert!(summary.contains("- ❌ `api-0` vunknown (Unknown (not loaded))"));
    }

    #[test]
    fn test_report_sections() {
        let validator = Validator::new(CommonalitiesPolicy::v0_6()).unwrap();
        let doc = DocumentReader::parse_str(
            "code/API_definitions/toy-api.yaml",
            "info: {title: Toy, version: 1.0.0}\n",
        )
        .unwrap();
        let batch = ReviewBatch {
            validations: vec![validator.validate(&doc), broken("other.yaml", "<unexpected>")],
            ..ReviewBatch::default()
        };

        let report = render_report(&batch, &meta(Some("Toy"), Some("7"))).unwrap();
        assert!(report.contains("**Repository**: Toy"));
        assert!(report.contains("- **Multi-file Consistency**: ⏭️ Skipped (single file)"));
        assert!(report.contains("- **Regular API**: 1"));
        assert!(report.contains("### `Toy` v1.0.0"));
        assert!(report.contains("**Type**: Unknown (not loaded)"));
        assert!(report.contains("&lt;unexpected&gt;"));
        assert!(!report.contains("<unexpected>"));
        assert!(report.contains("## Critical Issues Requiring Immediate Attention"));
        assert!(report.contains("## Automated Checks Performed"));
        assert!(report.contains("- Required sections validation"));
        assert!(report.contains("## Manual Review Required"));

        let summary = render_summary(&batch, "report.md").unwrap();
        assert!(summary.contains("- 📄 `Toy` v1.0.0 (Regular API)"));
        assert!(summary.ends_with("📄 **Detailed Report**: report.md\n"));
    }
}
