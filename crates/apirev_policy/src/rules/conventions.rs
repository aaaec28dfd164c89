//! Policy checks: values fixed by the commonalities conventions.

use apirev_doc::DocNode;

use crate::error::PolicyResult;
use crate::issue::Issue;
use crate::openapi;

use super::{Rule, RuleContext, RuleGroup};

pub(super) fn rules() -> Vec<Rule> {
    let group = RuleGroup::Policy;
    vec![
        Rule::new("version-format", "Version format validation", group, version_format),
        Rule::new("license", "License validation", group, license),
        Rule::new(
            "commonalities-version",
            "Commonalities version validation",
            group,
            commonalities_version,
        ),
        Rule::new("forbidden-fields", "Forbidden fields validation", group, forbidden_fields),
        Rule::new("scope-naming", "Scope naming pattern validation", group, scope_naming),
        Rule::new("filename", "Filename consistency validation", group, filename),
    ]
}

fn info_node<'a>(ctx: &RuleContext<'a>) -> Option<&'a DocNode> {
    ctx.root().get("info").filter(|i| !i.is_blank())
}

fn version_format(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let Some(info) = info_node(ctx) else {
        return Ok(Vec::new());
    };
    let version = info.get("version").and_then(DocNode::as_text).unwrap_or_default();
    if version == ctx.policy().wip_version.as_str() || ctx.conventions.version().is_match(&version) {
        return Ok(Vec::new());
    }
    Ok(vec![Issue::critical("Info Object", format!("Invalid version format: `{}`", version))
        .at("info.version")
        .with_fix("Use semantic versioning (`x.y.z` or `x.y.z-rc.n`)")])
}

fn license(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let Some(info) = info_node(ctx) else {
        return Ok(Vec::new());
    };
    let policy = ctx.policy();
    let mut issues = Vec::new();

    if info.str_at(&["license", "name"]) != Some(policy.license_name.as_str()) {
        issues.push(
            Issue::critical("Info Object", format!("License must be `{}`", policy.license_name))
                .at("info.license.name"),
        );
    }
    if info.str_at(&["license", "url"]) != Some(policy.license_url.as_str()) {
        issues.push(
            Issue::critical("Info Object", "Incorrect license URL")
                .at("info.license.url")
                .with_fix(format!("Use `{}`", policy.license_url)),
        );
    }

    Ok(issues)
}

fn commonalities_version(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let Some(info) = info_node(ctx) else {
        return Ok(Vec::new());
    };
    let expected = &ctx.policy().commonalities_version;
    let found = info.get("x-camara-commonalities").and_then(DocNode::as_text);
    if found.as_deref() == Some(expected.as_str()) {
        return Ok(Vec::new());
    }
    let found = found.map_or_else(|| "not declared".to_string(), |f| format!("`{}`", f));
    Ok(vec![Issue::medium(
        "Info Object",
        format!("Expected commonalities `{}`, found: {}", expected, found),
    )
    .at("info.x-camara-commonalities")])
}

fn forbidden_fields(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let Some(info) = info_node(ctx) else {
        return Ok(Vec::new());
    };
    Ok(ctx
        .policy()
        .forbidden_info_fields
        .iter()
        .filter(|field| info.contains_key(field))
        .map(|field| {
            Issue::medium("Info Object", format!("`{}` field is forbidden", field))
                .at(format!("info.{}", field))
                .with_fix(format!("Remove `{}` field", field))
        })
        .collect())
}

fn scope_naming(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let mut issues = Vec::new();

    for (scheme_name, scheme) in openapi::security_schemes(ctx.root()).into_iter().flat_map(|s| s.entries()) {
        if scheme.str_at(&["type"]) != Some("oauth2") {
            continue;
        }
        for (flow_name, flow) in scheme.get("flows").into_iter().flat_map(|f| f.entries()) {
            for (scope, _) in flow.get("scopes").into_iter().flat_map(|s| s.entries()) {
                if !ctx.conventions.scope().is_match(scope) {
                    issues.push(
                        Issue::medium(
                            "Scope Naming",
                            format!("Scope name should follow pattern `api-name:operation`: `{}`", scope),
                        )
                        .at(format!(
                            "components.securitySchemes.{}.flows.{}.scopes",
                            scheme_name, flow_name
                        )),
                    );
                }
            }
        }
    }

    Ok(issues)
}

fn filename(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let document = ctx.document;
    let stem = document.file_stem();
    let mut issues = Vec::new();

    if !ctx.conventions.filename().is_match(stem) {
        issues.push(
            Issue::medium("File Naming", format!("Filename should use kebab-case: `{}`", stem))
                .at(document.source())
                .with_fix("Use lowercase letters, numbers, and hyphens only"),
        );
    }

    // Advisory only: titles are free text.
    let title = ctx.root().str_at(&["info", "title"]).unwrap_or_default();
    let expected = kebab_case(title);
    if !expected.is_empty() && expected != stem {
        issues.push(
            Issue::info(
                "File Naming",
                format!("Filename `{}` doesn't match title pattern `{}`", stem, expected),
            )
            .at(document.source())
            .with_fix("Consider aligning filename with API title"),
        );
    }

    Ok(issues)
}

/// `Quality On Demand` -> `quality-on-demand`
fn kebab_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
