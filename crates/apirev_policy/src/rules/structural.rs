//! Structural checks: required sections and the shape of operations,
//! responses, components and security declarations.

use apirev_doc::DocNode;

use crate::error::PolicyResult;
use crate::issue::Issue;
use crate::openapi::{self, Operation, CORE_METHODS, HTTP_METHODS};

use super::{Rule, RuleContext, RuleGroup};

const SUCCESS_CODES: [&str; 4] = ["200", "201", "202", "204"];
const ERROR_CODES: [&str; 5] = ["400", "401", "403", "404", "500"];
const MODIFYING_METHODS: [&str; 3] = ["post", "put", "delete"];
const JSON: &str = "application/json";

pub(super) fn rules() -> Vec<Rule> {
    let group = RuleGroup::Structural;
    vec![
        Rule::new("required-sections", "Required sections validation", group, required_sections),
        Rule::new("info-object", "Info object validation", group, info_object),
        Rule::new("external-docs", "External documentation validation", group, external_docs),
        Rule::new("servers", "Servers validation", group, servers),
        Rule::new("operations", "Paths validation", group, operations),
        Rule::new(
            "mandatory-error-responses",
            "Mandatory error responses validation",
            group,
            mandatory_error_responses,
        ),
        Rule::new("components", "Components validation", group, components),
        Rule::new(
            "security-references",
            "Security configuration validation",
            group,
            security_references,
        ),
    ]
}

fn required_sections(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let root = ctx.root();
    let mut issues = Vec::new();

    if root.get("info").map_or(true, DocNode::is_blank) {
        issues.push(Issue::critical("Info Object", "Missing required `info` object").at("info"));
    }
    if root.get("externalDocs").map_or(true, DocNode::is_blank) {
        issues.push(
            Issue::critical("ExternalDocs", "Missing externalDocs object")
                .at("externalDocs")
                .with_fix("Add externalDocs with description and url"),
        );
    }
    if root.get("servers").map_or(true, DocNode::is_blank) {
        issues.push(Issue::medium("Servers", "No servers defined").at("servers"));
    }
    if root.get("paths").map_or(true, DocNode::is_blank) {
        issues.push(Issue::critical("Paths", "No paths defined").at("paths"));
    }
    if root.get("components").map_or(true, DocNode::is_blank) {
        issues.push(Issue::medium("Components", "No components defined").at("components"));
    }

    // Operations carrying their own requirement do not need a top-level one.
    let unsecured = openapi::operations(root, &HTTP_METHODS)
        .iter()
        .any(|op| !op.node.contains_key("security"));
    if !root.contains_key("security") && unsecured {
        issues.push(
            Issue::medium("Security", "No top-level `security` requirement declared")
                .at("security")
                .with_fix("Declare the default security requirement at top level"),
        );
    }

    Ok(issues)
}

fn info_object(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let Some(info) = ctx.root().get("info").filter(|i| !i.is_blank()) else {
        return Ok(Vec::new());
    };
    let mut issues = Vec::new();

    match info.get("title").and_then(DocNode::as_text) {
        Some(title) if !title.is_empty() => {
            if title.contains("API") {
                issues.push(
                    Issue::medium("Info Object", format!("Title should not include 'API': `{}`", title))
                        .at("info.title")
                        .with_fix("Remove 'API' from title"),
                );
            }
        }
        _ => issues.push(Issue::critical("Info Object", "Missing required `title` field").at("info.title")),
    }

    Ok(issues)
}

fn external_docs(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let Some(docs) = ctx.root().get("externalDocs").filter(|d| !d.is_blank()) else {
        return Ok(Vec::new());
    };
    let mut issues = Vec::new();

    if docs.get("description").map_or(true, DocNode::is_blank) {
        issues.push(
            Issue::medium("ExternalDocs", "Missing externalDocs description").at("externalDocs.description"),
        );
    }
    match docs.get("url").and_then(DocNode::as_str).filter(|u| !u.is_empty()) {
        None => issues.push(Issue::critical("ExternalDocs", "Missing externalDocs URL").at("externalDocs.url")),
        Some(url) if !url.starts_with("https://") => issues.push(
            Issue::medium("ExternalDocs", "External docs URL should use HTTPS").at("externalDocs.url"),
        ),
        Some(_) => {}
    }

    Ok(issues)
}

fn servers(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let mut issues = Vec::new();
    let servers = ctx.root().get("servers").map(DocNode::items).unwrap_or(&[]);

    for (i, server) in servers.iter().enumerate() {
        let location = format!("servers[{}].url", i);
        match server.get("url").and_then(DocNode::as_str).filter(|u| !u.is_empty()) {
            None => issues.push(Issue::critical("Servers", format!("Server {} missing URL", i + 1)).at(location)),
            Some(url) if !(url.starts_with("https://") || url.starts_with("{apiRoot}")) => issues.push(
                Issue::medium("Server URL", format!("Server URL should use HTTPS or template variable: `{}`", url))
                    .at(location)
                    .with_fix("Use `{apiRoot}` template or HTTPS URL"),
            ),
            Some(_) => {}
        }
    }

    Ok(issues)
}

fn operations(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let root = ctx.root();
    let error_schema = &ctx.policy().error_schema;
    let top_level_security = root.contains_key("security");
    let mut issues = Vec::new();

    for op in openapi::operations(root, &HTTP_METHODS) {
        if op.node.as_mapping().is_none() {
            continue;
        }
        let label = op.label();

        if !op.node.contains_key("operationId") {
            issues.push(Issue::critical("Operation", "Missing operationId").at(label.clone()));
        }
        if !op.node.contains_key("summary") {
            issues.push(Issue::medium("Operation", "Missing summary").at(label.clone()));
        }
        if !op.node.contains_key("description") {
            issues.push(Issue::low("Operation", "Missing description").at(label.clone()));
        }

        match op.responses().filter(|r| !r.is_blank()) {
            None => issues.push(Issue::critical("Operation", "No responses defined").at(label.clone())),
            Some(responses) => check_responses(root, &op, responses, error_schema, &mut issues),
        }

        if MODIFYING_METHODS.contains(&op.method) && !op.node.contains_key("security") && !top_level_security {
            issues.push(
                Issue::medium("Operation", "Consider adding security requirements for modifying operations")
                    .at(label),
            );
        }
    }

    Ok(issues)
}

fn check_responses(
    root: &DocNode,
    op: &Operation<'_>,
    responses: &DocNode,
    error_schema: &str,
    issues: &mut Vec<Issue>,
) {
    let label = op.label();

    if !SUCCESS_CODES.iter().any(|code| responses.contains_key(code)) {
        issues.push(
            Issue::medium("Responses", "No success response (2xx) defined").at(format!("{}.responses", label)),
        );
    }

    for code in ERROR_CODES {
        let Some(response) = responses.get(code) else {
            continue;
        };
        let response = openapi::resolve_local(root, response);
        let location = format!("{}.responses.{}", label, code);

        let Some(media) = response.at(&["content", JSON]) else {
            issues.push(
                Issue::medium("Error Responses", format!("Error response {} should have {} content", code, JSON))
                    .at(location),
            );
            continue;
        };
        let references = media
            .get("schema")
            .map_or(false, |schema| openapi::references_schema(schema, error_schema));
        if !references {
            issues.push(
                Issue::medium(
                    "Error Responses",
                    format!("Error response {} should reference {} schema", code, error_schema),
                )
                .at(location),
            );
        }
    }
}

fn mandatory_error_responses(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let mut issues = Vec::new();

    for op in openapi::operations(ctx.root(), &CORE_METHODS) {
        if op.node.as_mapping().is_none() {
            continue;
        }
        let location = format!("{}.responses", op.label());
        let declares = |code: &str| op.responses().map_or(false, |r| r.contains_key(code));

        if !declares("400") {
            issues.push(
                Issue::medium("Error Responses", "Missing 400 (Bad Request) response")
                    .at(location.clone())
                    .with_fix("Add 400 response for validation errors"),
            );
        }
        if !declares("500") {
            issues.push(
                Issue::medium("Error Responses", "Missing 500 (Internal Server Error) response")
                    .at(location)
                    .with_fix("Add 500 response for server errors"),
            );
        }
    }

    Ok(issues)
}

fn components(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let root = ctx.root();
    if root.get("components").map_or(true, DocNode::is_blank) {
        return Ok(Vec::new());
    }
    let policy = ctx.policy();
    let mut issues = Vec::new();

    match root.at(&["components", "schemas", policy.error_schema.as_str()]) {
        None => issues.push(
            Issue::critical("Components", format!("Missing required `{}` schema", policy.error_schema))
                .at("components.schemas"),
        ),
        Some(schema) => {
            for property in &policy.error_schema_properties {
                if schema.at(&["properties", property.as_str()]).is_none() {
                    issues.push(
                        Issue::critical(
                            format!("{} Schema", policy.error_schema),
                            format!("Missing required property `{}`", property),
                        )
                        .at(format!("components.schemas.{}.properties", policy.error_schema)),
                    );
                }
            }
        }
    }

    for (name, scheme) in openapi::security_schemes(root).into_iter().flat_map(|s| s.entries()) {
        if scheme.str_at(&["type"]) != Some("oauth2") {
            continue;
        }
        let location = format!("components.securitySchemes.{}.flows", name);
        let Some(flows) = scheme.get("flows").filter(|f| !f.is_blank()) else {
            issues.push(
                Issue::critical("Security Schemes", format!("OAuth2 scheme `{}` missing flows", name)).at(location),
            );
            continue;
        };
        let Some(client) = flows.get("clientCredentials").filter(|c| !c.is_blank()) else {
            continue;
        };
        let location = format!("{}.clientCredentials", location);
        if !client.contains_key("tokenUrl") {
            issues.push(
                Issue::critical("Security Schemes", "OAuth2 clientCredentials flow missing tokenUrl")
                    .at(location.clone()),
            );
        }
        if !client.contains_key("scopes") {
            issues.push(
                Issue::medium("Security Schemes", "OAuth2 clientCredentials flow missing scopes").at(location),
            );
        }
    }

    Ok(issues)
}

fn security_references(ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
    let root = ctx.root();
    let schemes = openapi::security_schemes(root);
    let mut issues = Vec::new();

    let mut check = |requirements: &DocNode, location: String| {
        for requirement in requirements.items() {
            for (name, _) in requirement.entries() {
                if !schemes.map_or(false, |s| s.contains_key(name)) {
                    issues.push(
                        Issue::critical("Security Schemes", format!("Undefined security scheme `{}` referenced", name))
                            .at(location.clone())
                            .with_fix(format!("Define `{}` in components.securitySchemes", name)),
                    );
                }
            }
        }
    };

    if let Some(security) = root.get("security") {
        check(security, "security".to_string());
    }
    for op in openapi::operations(root, &HTTP_METHODS) {
        if let Some(security) = op.node.get("security") {
            check(security, format!("{}.security", op.label()));
        }
    }

    Ok(issues)
}
