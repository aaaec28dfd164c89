//! Result containers and batch aggregation.
//!
//! Per-severity counts are always derived from the issue lists on demand.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Add, AddAssign};

use apirev_doc::DocError;
use serde::Serialize;

use crate::api_type::ApiType;
use crate::issue::{Issue, Severity};

/// Number of issues per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            match issue.severity() {
                Severity::Critical => counts.critical += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Info => self.info,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.medium + self.low + self.info
    }
}

impl Add for SeverityCounts {
    type Output = SeverityCounts;

    fn add(self, rhs: SeverityCounts) -> SeverityCounts {
        SeverityCounts {
            critical: self.critical + rhs.critical,
            medium: self.medium + rhs.medium,
            low: self.low + rhs.low,
            info: self.info + rhs.info,
        }
    }
}

impl AddAssign for SeverityCounts {
    fn add_assign(&mut self, rhs: SeverityCounts) {
        *self = *self + rhs;
    }
}

/// Common read access to anything carrying findings.
pub trait Findings {
    fn issues(&self) -> &[Issue];

    fn checks_performed(&self) -> &BTreeSet<String>;

    fn counts(&self) -> SeverityCounts {
        SeverityCounts::from_issues(self.issues())
    }

    fn issues_with(&self, severity: Severity) -> Vec<&Issue> {
        self.issues()
            .iter()
            .filter(|i| i.severity() == severity)
            .collect()
    }
}

/// Outcome of reviewing one description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    source: String,
    api_name: String,
    version: String,
    /// `None` when the description could not be loaded.
    api_type: Option<ApiType>,
    issues: Vec<Issue>,
    checks_performed: BTreeSet<String>,
    manual_checks: BTreeSet<String>,
}

impl ValidationResult {
    pub(crate) fn new(
        source: String,
        api_name: String,
        version: String,
        api_type: ApiType,
        issues: Vec<Issue>,
        checks_performed: BTreeSet<String>,
        manual_checks: BTreeSet<String>,
    ) -> Self {
        Self {
            source,
            api_name,
            version,
            api_type: Some(api_type),
            issues,
            checks_performed,
            manual_checks,
        }
    }

    /// Result for a description that failed to load.
    pub fn load_failed(source: impl Into<String>, error: &DocError) -> Self {
        let source = source.into();
        let category = if error.is_syntax() {
            "YAML Syntax"
        } else {
            "File Loading"
        };
        let issue = Issue::critical(category, format!("Failed to load description: {}", error))
            .at(source.clone());
        let api_name = std::path::Path::new(&source)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.clone());
        Self {
            source,
            api_name,
            version: "unknown".to_string(),
            api_type: None,
            issues: vec![issue],
            checks_performed: BTreeSet::new(),
            manual_checks: BTreeSet::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn api_type(&self) -> Option<ApiType> {
        self.api_type
    }

    pub fn manual_checks(&self) -> &BTreeSet<String> {
        &self.manual_checks
    }
}

impl Findings for ValidationResult {
    fn issues(&self) -> &[Issue] {
        &self.issues
    }

    fn checks_performed(&self) -> &BTreeSet<String> {
        &self.checks_performed
    }
}

/// Outcome of comparing a batch of descriptions with each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsistencyResult {
    issues: Vec<Issue>,
    checks_performed: BTreeSet<String>,
}

impl ConsistencyResult {
    pub(crate) fn new(issues: Vec<Issue>, checks_performed: BTreeSet<String>) -> Self {
        Self {
            issues,
            checks_performed,
        }
    }
}

impl Findings for ConsistencyResult {
    fn issues(&self) -> &[Issue] {
        &self.issues
    }

    fn checks_performed(&self) -> &BTreeSet<String> {
        &self.checks_performed
    }
}

/// Outcome of cross-checking one description against its behaviour tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestAlignmentResult {
    source: String,
    test_files: Vec<String>,
    issues: Vec<Issue>,
    checks_performed: BTreeSet<String>,
}

impl TestAlignmentResult {
    pub(crate) fn new(
        source: String,
        test_files: Vec<String>,
        issues: Vec<Issue>,
        checks_performed: BTreeSet<String>,
    ) -> Self {
        Self {
            source,
            test_files,
            issues,
            checks_performed,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Discovered test files, main file first.
    pub fn test_files(&self) -> &[String] {
        &self.test_files
    }
}

impl Findings for TestAlignmentResult {
    fn issues(&self) -> &[Issue] {
        &self.issues
    }

    fn checks_performed(&self) -> &BTreeSet<String> {
        &self.checks_performed
    }
}

/// Everything a review run produced, handed to report renderers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewBatch {
    pub validations: Vec<ValidationResult>,
    pub consistency: Option<ConsistencyResult>,
    pub alignments: Vec<TestAlignmentResult>,
}

impl ReviewBatch {
    /// All result sets in report order: documents, batch, tests.
    fn all_findings(&self) -> impl Iterator<Item = &dyn Findings> + '_ {
        self.validations
            .iter()
            .map(|r| r as &dyn Findings)
            .chain(self.consistency.iter().map(|r| r as &dyn Findings))
            .chain(self.alignments.iter().map(|r| r as &dyn Findings))
    }

    pub fn totals(&self) -> SeverityCounts {
        self.all_findings()
            .fold(SeverityCounts::default(), |acc, r| acc + r.counts())
    }

    pub fn checks_performed(&self) -> BTreeSet<&str> {
        self.all_findings()
            .flat_map(|r| r.checks_performed().iter().map(String::as_str))
            .collect()
    }

    pub fn manual_checks(&self) -> BTreeSet<&str> {
        self.validations
            .iter()
            .flat_map(|r| r.manual_checks().iter().map(String::as_str))
            .collect()
    }

    /// Issues of one severity across the whole batch, in report order.
    pub fn issues_with(&self, severity: Severity) -> Vec<&Issue> {
        self.all_findings()
            .flat_map(|r| r.issues().iter())
            .filter(|i| i.severity() == severity)
            .collect()
    }

    /// Number of reviewed descriptions per API type.
    pub fn type_counts(&self) -> BTreeMap<ApiType, usize> {
        let mut counts = BTreeMap::new();
        for api_type in self.validations.iter().filter_map(ValidationResult::api_type) {
            *counts.entry(api_type).or_insert(0) += 1;
        }
        counts
    }
}
