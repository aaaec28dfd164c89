//! Per-document review.

use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use apirev_doc::{DocNode, Document, DocumentReader};
use tracing::{debug, info, warn};

use crate::api_type::ApiClassifier;
use crate::error::{PolicyError, PolicyResult};
use crate::issue::Issue;
use crate::manual::manual_checks_for;
use crate::policy::{CommonalitiesPolicy, Conventions};
use crate::result::ValidationResult;
use crate::rules::{Rule, RuleContext, RuleSet};

const INTERNAL_CATEGORY: &str = "Validator Internal";

/// Runs the rule set over single documents.
///
/// A validator holds only read-only state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct Validator {
    conventions: Conventions,
    rules: RuleSet,
}

impl Validator {
    /// Create a validator with the standard rule set.
    pub fn new(policy: CommonalitiesPolicy) -> PolicyResult<Self> {
        Ok(Self {
            conventions: Conventions::compile(policy)?,
            rules: RuleSet::standard(),
        })
    }

    /// Replace the rule set.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Load and review a description file.
    ///
    /// Load failures are reported as a Critical issue on the result.
    pub fn validate_file(&self, path: &Path) -> ValidationResult {
        match DocumentReader::read_file(path) {
            Ok(document) => self.validate(&document),
            Err(e) => {
                warn!("Failed to load {:?}: {}", path, e);
                ValidationResult::load_failed(path.display().to_string(), &e)
            }
        }
    }

    /// Review a loaded description.
    pub fn validate(&self, document: &Document) -> ValidationResult {
        let root = document.root();
        let policy = self.conventions.policy();

        let api_name = root
            .str_at(&["info", "title"])
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| document.file_stem())
            .to_string();
        let version = root
            .get("info")
            .and_then(|i| i.get("version"))
            .and_then(DocNode::as_text)
            .map_or_else(|| "unknown".to_string(), |v| v.into_owned());

        let api_type = ApiClassifier::classify(root);
        info!("Reviewing {} ({}) as {}", api_name, document.source(), api_type);

        let mut checks = BTreeSet::new();
        checks.insert(format!("Commonalities {} validation", policy.commonalities_version));
        checks.insert(format!("API type detection: {}", api_type));

        let ctx = RuleContext {
            document,
            api_type,
            conventions: &self.conventions,
        };

        let mut issues = Vec::new();
        for rule in self.rules.rules().iter().filter(|r| r.applies(api_type)) {
            checks.insert(rule.name().to_string());
            match run_guarded(rule, &ctx) {
                Ok(found) => {
                    debug!("Rule {} produced {} issue(s)", rule.id(), found.len());
                    issues.extend(found);
                }
                Err(e) => {
                    warn!("Rule {} failed on {}: {}", rule.id(), document.source(), e);
                    issues.push(
                        Issue::critical(INTERNAL_CATEGORY, e.to_string())
                            .at(document.source())
                            .with_fix("Report this failure to the validator maintainers"),
                    );
                }
            }
        }

        let manual = manual_checks_for(api_type).into_iter().map(str::to_string).collect();

        ValidationResult::new(
            document.source().to_string(),
            api_name,
            version,
            api_type,
            issues,
            checks,
            manual,
        )
    }
}

/// Run one rule, turning a panic into an internal check error.
fn run_guarded(rule: &Rule, ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    match panic::catch_unwind(AssertUnwindSafe(|| rule.run(ctx))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panicked".to_string());
            Err(PolicyError::internal(rule.id(), message))
        }
    }
}
