//! Commonalities policy definitions.
//!
//! A policy holds every convention value the checks compare against. The
//! built-in profile covers commonalities 0.6; other versions are supplied as
//! YAML files whose missing fields fall back to the 0.6 values.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PolicyError, PolicyResult};
use crate::issue::Severity;

/// Kind of review requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewType {
    #[default]
    ReleaseCandidate,
    PublicRelease,
    /// Work-in-progress review; WIP markers are expected.
    Wip,
}

impl FromStr for ReviewType {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "release-candidate" | "rc" => Ok(ReviewType::ReleaseCandidate),
            "public-release" | "release" => Ok(ReviewType::PublicRelease),
            "wip" => Ok(ReviewType::Wip),
            other => Err(PolicyError::InvalidConfiguration(format!(
                "unknown review type `{}` (expected release-candidate, public-release or wip)",
                other
            ))),
        }
    }
}

impl fmt::Display for ReviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReviewType::ReleaseCandidate => "release-candidate",
            ReviewType::PublicRelease => "public-release",
            ReviewType::Wip => "wip",
        })
    }
}

/// Convention values checked by the review engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonalitiesPolicy {
    /// Expected `info.x-camara-commonalities` value
    pub commonalities_version: String,
    /// Grammar for `info.version`
    pub version_pattern: String,
    /// Version value marking work in progress
    pub wip_version: String,
    /// Server URL fragment marking work in progress
    pub wip_server_fragment: String,
    /// Severity of work-in-progress markers
    pub wip_severity: Severity,
    pub license_name: String,
    pub license_url: String,
    /// Members that must not appear in `info`
    pub forbidden_info_fields: Vec<String>,
    /// Grammar for OAuth2 scope names
    pub scope_pattern: String,
    /// Grammar for description file stems
    pub filename_pattern: String,
    /// Canonical error payload schema
    pub error_schema: String,
    pub error_schema_properties: Vec<String>,
    /// Error codes no longer allowed in enums
    pub deprecated_error_codes: Vec<String>,
    pub legacy_auth_code: String,
    pub auth_code_replacement: String,
    /// Correlator header parameter and its required pattern
    pub correlator_parameter: String,
    pub correlator_pattern: String,
    /// Schemas expected to be identical across a batch
    pub shared_schemas: Vec<String>,
    /// Extension of behaviour test files
    pub test_extension: String,
    /// Keyword opening a behaviour test header line
    pub feature_keyword: String,
    /// Pattern capturing operation identifiers in test bodies
    pub operation_reference_pattern: String,
}

impl Default for CommonalitiesPolicy {
    fn default() -> Self {
        Self::v0_6()
    }
}

impl CommonalitiesPolicy {
    /// Built-in profile for commonalities 0.6.
    pub fn v0_6() -> Self {
        Self {
            commonalities_version: "0.6".to_string(),
            version_pattern: r"^\d+\.\d+\.\d+(-rc\.\d+|-alpha\.\d+)?$".to_string(),
            wip_version: "wip".to_string(),
            wip_server_fragment: "vwip".to_string(),
            wip_severity: Severity::Critical,
            license_name: "Apache 2.0".to_string(),
            license_url: "https://www.apache.org/licenses/LICENSE-2.0.html".to_string(),
            forbidden_info_fields: vec!["termsOfService".to_string()],
            scope_pattern: r"^[a-z0-9-]+:[a-z0-9-]+$".to_string(),
            filename_pattern: r"^[a-z0-9-]+$".to_string(),
            error_schema: "ErrorInfo".to_string(),
            error_schema_properties: vec!["code".to_string(), "message".to_string()],
            deprecated_error_codes: vec!["IDENTIFIER_MISMATCH".to_string()],
            legacy_auth_code: "AUTHENTICATION_REQUIRED".to_string(),
            auth_code_replacement: "UNAUTHENTICATED".to_string(),
            correlator_parameter: "X-Correlator".to_string(),
            correlator_pattern: r"^\w{8}-\w{4}-4\w{3}-[89aAbB]\w{3}-\w{12}$".to_string(),
            shared_schemas: [
                "XCorrelator",
                "ErrorInfo",
                "Device",
                "DeviceResponse",
                "PhoneNumber",
                "NetworkAccessIdentifier",
                "DeviceIpv4Addr",
                "DeviceIpv6Address",
                "SingleIpv4Addr",
                "Port",
                "Point",
                "Latitude",
                "Longitude",
                "Area",
                "AreaType",
                "Circle",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            test_extension: "feature".to_string(),
            feature_keyword: "Feature:".to_string(),
            operation_reference_pattern: r#"request\s+"([^"]+)""#.to_string(),
        }
    }

    /// Built-in profile for a commonalities version (`0.6`).
    pub fn for_version(version: &str) -> PolicyResult<Self> {
        match version.trim() {
            "0.6" => Ok(Self::v0_6()),
            other => Err(PolicyError::UnknownCommonalities(other.to_string())),
        }
    }

    /// Adjust the policy to the kind of review being run.
    pub fn with_review_type(mut self, review_type: ReviewType) -> Self {
        self.wip_severity = match review_type {
            ReviewType::Wip => Severity::Info,
            ReviewType::ReleaseCandidate | ReviewType::PublicRelease => Severity::Critical,
        };
        self
    }

    /// Load a policy from a YAML file.
    pub fn from_file(path: &Path) -> PolicyResult<Self> {
        debug!("Loading policy from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a policy from YAML string.
    pub fn from_yaml(yaml: &str) -> PolicyResult<Self> {
        serde_yaml::from_str(yaml).map_err(PolicyError::from)
    }

    /// Serialize the policy to YAML.
    pub fn to_yaml(&self) -> PolicyResult<String> {
        serde_yaml::to_string(self).map_err(PolicyError::from)
    }
}

/// A policy with its patterns compiled, shared read-only by all checks.
#[derive(Debug, Clone)]
pub struct Conventions {
    policy: CommonalitiesPolicy,
    version: Regex,
    scope: Regex,
    filename: Regex,
    operation_reference: Regex,
}

impl Conventions {
    pub fn compile(policy: CommonalitiesPolicy) -> PolicyResult<Self> {
        if policy.commonalities_version.trim().is_empty() {
            return Err(PolicyError::InvalidConfiguration(
                "commonalities_version must not be empty".to_string(),
            ));
        }
        Ok(Self {
            version: compile("version_pattern", &policy.version_pattern)?,
            scope: compile("scope_pattern", &policy.scope_pattern)?,
            filename: compile("filename_pattern", &policy.filename_pattern)?,
            operation_reference: compile(
                "operation_reference_pattern",
                &policy.operation_reference_pattern,
            )?,
            policy,
        })
    }

    pub fn policy(&self) -> &CommonalitiesPolicy {
        &self.policy
    }

    pub fn version(&self) -> &Regex {
        &self.version
    }

    pub fn scope(&self) -> &Regex {
        &self.scope
    }

    pub fn filename(&self) -> &Regex {
        &self.filename
    }

    /// Pattern whose first capture group is a referenced operation id.
    pub fn operation_reference(&self) -> &Regex {
        &self.operation_reference
    }
}

fn compile(name: &str, pattern: &str) -> PolicyResult<Regex> {
    Regex::new(pattern).map_err(|e| PolicyError::InvalidPattern {
        name: name.to_string(),
        message: e.to_string(),
    })
}
