//! Checks selected by the API type.

use crate::api_type::ApiType;
use crate::error::PolicyResult;
use crate::issue::Issue;
use crate::openapi::{self, CRUD_METHODS, HTTP_METHODS};

use super::{Rule, RuleContext, RuleGroup};

const EVENT_KEYWORDS: [&str; 3] = ["event", "webhook", "notification"];

pub(super) fn rules() -> Vec<Rule> {
    let group = RuleGroup::TypeSpecific;
    vec![
        Rule::new(
            "explicit-subscription",
            "Explicit subscription API compliance validation",
            group,
            explicit_subscription,
        )
        .only_for(ApiType::ExplicitSubscription),
        Rule::new(
            "implicit-subscription",
            "Implicit subscription API compliance validation",
            group,
            implicit_subscription,
        )
        .only_for(ApiType::ImplicitSubscription),
    ]
}

fn has_schema_named(ctx: &RuleContext<'_>, keywords: &[&str]) -> bool {
    openapi::schemas(ctx.root()).any(|(name, _)| {
        let name = name.to_lowercase();
        keywords.iter().any(|k| name.contains(k))
    })
}

fn missing_event_schemas() -> Issue {
    Issue::low("Event Schemas", "Subscription API should define event-related schemas")
        .at("components.schemas")
        .with_fix("Consider adding event payload schemas")
}

fn explicit_subscription(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let subscription_paths: Vec<_> = openapi::paths(ctx.root())
        .filter(|(path, _)| path.to_lowercase().contains("subscription"))
        .collect();
    let mut issues = Vec::new();

    if subscription_paths.is_empty() {
        issues.push(
            Issue::critical("Subscription Endpoints", "Explicit subscription API must have subscription endpoints")
                .at("paths")
                .with_fix("Add /subscriptions endpoints for CRUD operations"),
        );
    }
    for (path, item) in &subscription_paths {
        if !item.entries().any(|(method, _)| CRUD_METHODS.contains(&method)) {
            issues.push(
                Issue::medium(
                    "Subscription Operations",
                    format!("Subscription path `{}` has no operations defined", path),
                )
                .at(format!("paths.{}", path)),
            );
        }
    }

    if !has_schema_named(ctx, &["subscription"]) {
        issues.push(
            Issue::medium(
                "Subscription Schemas",
                "Explicit subscription API should define subscription-related schemas",
            )
            .at("components.schemas")
            .with_fix("Add schemas for subscription management"),
        );
    }
    if !has_schema_named(ctx, &EVENT_KEYWORDS) {
        issues.push(missing_event_schemas());
    }

    Ok(issues)
}

fn implicit_subscription(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let mut issues = Vec::new();

    let has_callbacks = openapi::operations(ctx.root(), &HTTP_METHODS)
        .iter()
        .any(|op| op.node.contains_key("callbacks"));
    if !has_callbacks {
        issues.push(
            Issue::medium("Implicit Subscription", "Implicit subscription API should define callbacks")
                .at("paths")
                .with_fix("Add callback definitions for event notifications"),
        );
    }
    if !has_schema_named(ctx, &EVENT_KEYWORDS) {
        issues.push(missing_event_schemas());
    }

    Ok(issues)
}
