//! # apirev_policy
//!
//! Review engine checking API descriptions against a versioned set of
//! organisational conventions ("commonalities").
//!
//! This crate provides:
//! - **Classification**: decide once whether a description is a regular,
//!   implicit-subscription or explicit-subscription API
//! - **Rule Engine**: an ordered registry of structural, policy,
//!   version-specific and type-specific checks
//! - **Consistency Checker**: compare shared schemas, license and
//!   commonalities tag across a batch of descriptions
//! - **Test Alignment Checker**: cross-reference behaviour test files
//!   against declared operations
//!
//! The engine only produces findings. Deciding whether a release may
//! proceed is left to the caller.
//!
//! ## Example
//!
//! ```rust,no_run
//! use apirev_doc::DocumentReader;
//! use apirev_policy::{CommonalitiesPolicy, Findings, Validator};
//!
//! let policy = CommonalitiesPolicy::for_version("0.6").unwrap();
//! let validator = Validator::new(policy).unwrap();
//!
//! let doc = DocumentReader::read_file("code/API_definitions/qos-booking.yaml").unwrap();
//! let result = validator.validate(&doc);
//! println!("{:?}: {} critical", result.api_type(), result.counts().critical);
//! ```

pub mod alignment;
pub mod api_type;
pub mod consistency;
pub mod engine;
pub mod error;
pub mod issue;
pub mod manual;
pub mod openapi;
pub mod policy;
pub mod result;
pub mod rules;

pub use alignment::TestAlignmentChecker;
pub use api_type::{ApiClassifier, ApiType};
pub use consistency::{normalize_schema, ConsistencyChecker};
pub use engine::Validator;
pub use error::{PolicyError, PolicyResult};
pub use issue::{Issue, Severity, MAX_FIELD_LEN};
pub use manual::manual_checks_for;
pub use policy::{CommonalitiesPolicy, Conventions, ReviewType};
pub use result::{
    ConsistencyResult, Findings, ReviewBatch, SeverityCounts, TestAlignmentResult,
    ValidationResult,
};
pub use rules::{Rule, RuleContext, RuleGroup, RuleSet};
