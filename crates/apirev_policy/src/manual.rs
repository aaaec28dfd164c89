//! Manual review prompts.
//!
//! Prompts are advisory reminders for human reviewers. They are never
//! counted as issues.

use crate::api_type::ApiType;

const COMMON: [&str; 6] = [
    "Business logic appropriateness review",
    "Documentation quality assessment",
    "API design patterns validation",
    "Use case coverage evaluation",
    "Security considerations beyond structure",
    "Performance implications assessment",
];

const EXPLICIT_SUBSCRIPTION: [&str; 4] = [
    "Subscription lifecycle management review",
    "Event delivery mechanism validation",
    "Webhook endpoint security review",
    "Subscription filtering logic validation",
];

const IMPLICIT_SUBSCRIPTION: [&str; 3] = [
    "Event callback mechanism review",
    "Implicit subscription trigger validation",
    "Event payload structure review",
];

/// Prompts for an API type: the common baseline plus type-specific ones.
pub fn manual_checks_for(api_type: ApiType) -> Vec<&'static str> {
    let extra: &[&str] = match api_type {
        ApiType::Regular => &[],
        ApiType::ExplicitSubscription => &EXPLICIT_SUBSCRIPTION,
        ApiType::ImplicitSubscription => &IMPLICIT_SUBSCRIPTION,
    };
    COMMON.iter().chain(extra.iter()).copied().collect()
}
