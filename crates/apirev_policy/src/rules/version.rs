//! Checks tied to a specific commonalities release.

use apirev_doc::DocNode;

use crate::error::PolicyResult;
use crate::issue::Issue;
use crate::openapi;

use super::{Rule, RuleContext, RuleGroup};

pub(super) fn rules() -> Vec<Rule> {
    let group = RuleGroup::VersionSpecific;
    vec![
        Rule::new("work-in-progress", "Work-in-progress version validation", group, work_in_progress),
        Rule::new(
            "deprecated-error-codes",
            "Deprecated error code validation",
            group,
            deprecated_error_codes,
        ),
        Rule::new("legacy-auth-code", "Generic 401 error validation", group, legacy_auth_code),
        Rule::new(
            "correlator-pattern",
            "Commonalities schema compliance validation",
            group,
            correlator_pattern,
        ),
    ]
}

fn work_in_progress(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let root = ctx.root();
    let policy = ctx.policy();
    let severity = policy.wip_severity;
    let mut issues = Vec::new();

    let version = root.get("info").and_then(|i| i.get("version")).and_then(DocNode::as_text);
    if version.as_deref() == Some(policy.wip_version.as_str()) {
        issues.push(
            Issue::new(
                severity,
                "Version",
                format!("Work-in-progress version `{}` cannot be released", policy.wip_version),
            )
            .at("info.version")
            .with_fix("Update to proper semantic version (e.g., `0.1.0-rc.1`)"),
        );
    }

    let server_url = root
        .get("servers")
        .and_then(|s| s.index(0))
        .and_then(|s| s.str_at(&["url"]))
        .unwrap_or_default();
    if server_url.contains(policy.wip_server_fragment.as_str()) {
        issues.push(
            Issue::new(
                severity,
                "Server URL",
                format!(
                    "Work-in-progress server URL (`{}`) cannot be used in release",
                    policy.wip_server_fragment
                ),
            )
            .at("servers[0].url")
            .with_fix("Update to production server URL"),
        );
    }

    Ok(issues)
}

/// `(schema name, code)` for every enum value equal to one of `codes`,
/// one entry per schema and code.
fn enum_hits<'a>(root: &'a DocNode, codes: &[&str]) -> Vec<(&'a str, String)> {
    let mut hits = Vec::new();
    for (name, schema) in openapi::schemas(root) {
        let values = openapi::enum_values(schema);
        for code in codes {
            if values.contains(code) {
                hits.push((name, code.to_string()));
            }
        }
    }
    hits
}

fn deprecated_error_codes(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let codes: Vec<&str> = ctx.policy().deprecated_error_codes.iter().map(String::as_str).collect();
    Ok(enum_hits(ctx.root(), &codes)
        .into_iter()
        .map(|(schema, code)| {
            Issue::critical("Error Responses", format!("Forbidden error code `{}` found", code))
                .at(format!("components.schemas.{}", schema))
                .with_fix(format!("Remove `{}` from enum values", code))
        })
        .collect())
}

fn legacy_auth_code(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let policy = ctx.policy();
    let legacy = policy.legacy_auth_code.as_str();
    let replacement = policy.auth_code_replacement.as_str();
    Ok(enum_hits(ctx.root(), &[legacy])
        .into_iter()
        .map(|(schema, _)| {
            Issue::medium(
                "Error Codes",
                format!(
                    "Use `{}` instead of `{}` (Commonalities {})",
                    replacement, legacy, policy.commonalities_version
                ),
            )
            .at(format!("components.schemas.{}", schema))
            .with_fix(format!("Replace `{}` with `{}`", legacy, replacement))
        })
        .collect())
}

fn correlator_pattern(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let root = ctx.root();
    let policy = ctx.policy();
    let wanted = policy.correlator_parameter.as_str();

    let parameter = root
        .at(&["components", "parameters"])
        .into_iter()
        .flat_map(|p| p.entries())
        .find(|(key, param)| {
            *key == wanted
                || param
                    .str_at(&["name"])
                    .map_or(false, |name| name.eq_ignore_ascii_case(wanted))
        });
    let Some((key, parameter)) = parameter else {
        return Ok(Vec::new());
    };

    let location = format!("components.parameters.{}.schema.pattern", key);
    let schema = parameter.get("schema").map(|s| openapi::resolve_local(root, s));
    let pattern = schema.and_then(|s| s.str_at(&["pattern"]));
    let fix = format!("Use pattern: `{}`", policy.correlator_pattern);

    let issue = match pattern {
        Some(p) if p == policy.correlator_pattern => return Ok(Vec::new()),
        Some(_) => Issue::medium(
            "XCorrelator Pattern",
            format!(
                "{} pattern should follow Commonalities {} specification",
                wanted, policy.commonalities_version
            ),
        ),
        None => Issue::medium("XCorrelator Pattern", format!("{} schema declares no pattern", wanted)),
    };
    Ok(vec![issue.at(location).with_fix(fix)])
}
