//! Findings produced by the review engine.

use serde::{Deserialize, Serialize};

/// Upper bound, in bytes, for any free-text field of an [`Issue`].
pub const MAX_FIELD_LEN: usize = 1_000_000;

const TRUNCATION_MARKER: &str = " [truncated]";

/// Severity of a finding.
///
/// Variants are declared from most to least severe, so the derived `Ord`
/// sorts Critical first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    /// Stable machine name, as used in serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

/// A single finding: what is wrong, where, and how to fix it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    severity: Severity,
    category: String,
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fix_suggestion: Option<String>,
}

impl Issue {
    pub fn new(severity: Severity, category: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity,
            category: bounded(category.into()),
            description: bounded(description.into()),
            location: None,
            fix_suggestion: None,
        }
    }

    pub fn critical(category: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Severity::Critical, category, description)
    }

    pub fn medium(category: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Severity::Medium, category, description)
    }

    pub fn low(category: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Severity::Low, category, description)
    }

    pub fn info(category: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Severity::Info, category, description)
    }

    /// Set the dot/bracket path the finding refers to.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(bounded(location.into()));
        self
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix_suggestion = Some(bounded(fix.into()));
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn fix_suggestion(&self) -> Option<&str> {
        self.fix_suggestion.as_deref()
    }
}

/// Cut text exceeding [`MAX_FIELD_LEN`] at a char boundary.
fn bounded(mut text: String) -> String {
    if text.len() <= MAX_FIELD_LEN {
        return text;
    }
    let mut cut = MAX_FIELD_LEN;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str(TRUNCATION_MARKER);
    text
}
