//! Alignment between a description and its behaviour test files.
//!
//! Test files live in one directory and are named after the description's
//! file stem: `<api>.feature` is the main file and `<api>-<operationId>.feature`
//! files cover a single operation.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use apirev_doc::{DocNode, Document};
use glob::Pattern;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{PolicyError, PolicyResult};
use crate::issue::Issue;
use crate::openapi;
use crate::policy::{CommonalitiesPolicy, Conventions};
use crate::result::TestAlignmentResult;

const ALIGNMENT_CHECK: &str = "Test alignment validation";

/// Number of leading lines searched for the feature header.
const HEADER_LINES: usize = 2;

/// Cross-checks behaviour tests against declared operations.
#[derive(Debug, Clone)]
pub struct TestAlignmentChecker {
    conventions: Conventions,
}

impl TestAlignmentChecker {
    pub fn new(policy: &CommonalitiesPolicy) -> PolicyResult<Self> {
        Ok(Self {
            conventions: Conventions::compile(policy.clone())?,
        })
    }

    /// Test files for `api_id` in `dir`: the main file first, then the
    /// per-operation files sorted by name. A missing directory has none.
    pub fn discover(&self, dir: &Path, api_id: &str) -> PolicyResult<Vec<PathBuf>> {
        if !dir.is_dir() {
            debug!("Test directory {:?} does not exist", dir);
            return Ok(Vec::new());
        }
        let ext = &self.conventions.policy().test_extension;
        let main_name = format!("{}.{}", api_id, ext);
        let per_operation = Pattern::new(&format!(
            "{}-*.{}",
            Pattern::escape(api_id),
            Pattern::escape(ext)
        ))
        .map_err(|e| PolicyError::InvalidPattern {
            name: "test file pattern".to_string(),
            message: e.to_string(),
        })?;

        let mut main = None;
        let mut others = Vec::new();
        for entry in WalkDir::new(dir)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name == main_name.as_str() {
                main = Some(entry.path().to_path_buf());
            } else if per_operation.matches(&name) {
                others.push(entry.path().to_path_buf());
            }
        }

        Ok(main.into_iter().chain(others).collect())
    }

    /// Check one description against the tests found in `test_dir`.
    pub fn check(&self, document: &Document, test_dir: &Path) -> TestAlignmentResult {
        let api_id = document.file_stem();
        let mut checks = BTreeSet::new();
        checks.insert(ALIGNMENT_CHECK.to_string());
        let mut issues = Vec::new();

        let files = match self.discover(test_dir, api_id) {
            Ok(files) => files,
            Err(e) => {
                warn!("Failed to list tests in {:?}: {}", test_dir, e);
                issues.push(
                    Issue::critical("Test File Loading", format!("Failed to list test files: {}", e))
                        .at(test_dir.display().to_string()),
                );
                return TestAlignmentResult::new(document.source().to_string(), Vec::new(), issues, checks);
            }
        };
        info!("Found {} test file(s) for {}", files.len(), api_id);

        let test_files: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
        if files.is_empty() {
            let ext = &self.conventions.policy().test_extension;
            issues.push(
                Issue::critical("Test Files", format!("No test files found for API `{}`", api_id))
                    .at(test_dir.display().to_string())
                    .with_fix(format!(
                        "Create either `{}.{}` or `{}-<operationId>.{}` files",
                        api_id, ext, api_id, ext
                    )),
            );
            return TestAlignmentResult::new(document.source().to_string(), test_files, issues, checks);
        }

        let root = document.root();
        let version = root
            .at(&["info", "version"])
            .and_then(DocNode::as_text)
            .map(|v| v.into_owned())
            .unwrap_or_default();
        let operations = openapi::operation_ids(root);

        for (path, label) in files.iter().zip(&test_files) {
            match read_test_file(path) {
                Ok(content) => {
                    self.check_file(path, label, &content, api_id, &version, &operations, &mut issues)
                }
                Err(e) => {
                    warn!("{}", e);
                    issues.push(Issue::critical("Test File Loading", e.to_string()).at(label.clone()));
                }
            }
        }

        TestAlignmentResult::new(document.source().to_string(), test_files, issues, checks)
    }

    #[allow(clippy::too_many_arguments)]
    fn check_file(
        &self,
        path: &Path,
        label: &str,
        content: &str,
        api_id: &str,
        version: &str,
        operations: &[String],
        issues: &mut Vec<Issue>,
    ) {
        let keyword = &self.conventions.policy().feature_keyword;
        let header = content
            .lines()
            .take(HEADER_LINES)
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .find(|(_, line)| line.starts_with(keyword.as_str()));

        match header {
            Some((line_no, header)) if !mentions_version(header, version) => issues.push(
                Issue::medium(
                    "Test Version",
                    format!("Feature line doesn't mention API version `{}`", version),
                )
                .at(format!("{}:line {}", label, line_no))
                .with_fix(format!("Include version `{}` in Feature line: {}", version, header)),
            ),
            Some(_) => {}
            None => issues.push(
                Issue::medium(
                    "Test Structure",
                    format!("No {} line found in first {} lines", keyword.trim_end_matches(':'), HEADER_LINES),
                )
                .at(format!("{}:lines 1-{}", label, HEADER_LINES))
                .with_fix("Add Feature line with API name and version"),
            ),
        }

        let valid = operations.join(", ");
        for reference in self.referenced_operations(content) {
            if !operations.iter().any(|op| op == reference) {
                issues.push(
                    Issue::critical(
                        "Test Operation IDs",
                        format!("Test references unknown operation `{}`", reference),
                    )
                    .at(label)
                    .with_fix(format!("Use valid operation ID from: `{}`", valid)),
                );
            }
        }

        let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        if let Some(suffix) = stem.strip_prefix(&format!("{}-", api_id)) {
            if !operations.iter().any(|op| op == suffix) {
                issues.push(
                    Issue::medium(
                        "Test File Naming",
                        format!("Test file suggests operation `{}` but it doesn't exist in API", suffix),
                    )
                    .at(label)
                    .with_fix(format!("Use valid operation from: `{}`", valid)),
                );
            }
        }
    }

    /// Operation ids referenced in a test body, first appearance first.
    pub fn referenced_operations<'c>(&self, content: &'c str) -> Vec<&'c str> {
        let mut seen = Vec::new();
        for caps in self.conventions.operation_reference().captures_iter(content) {
            if let Some(id) = caps.get(1).map(|m| m.as_str()) {
                if !seen.contains(&id) {
                    seen.push(id);
                }
            }
        }
        seen
    }
}

fn read_test_file(path: &Path) -> PolicyResult<String> {
    fs::read_to_string(path).map_err(|source| PolicyError::TestFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Whether the header carries `version` as a whole token, optionally with a
/// leading `v`. Tokens are runs of alphanumerics, `.` and `-`.
fn mentions_version(header: &str, version: &str) -> bool {
    if version.is_empty() {
        return false;
    }
    let is_version_char = |c: char| c.is_ascii_alphanumeric() || c == '.' || c == '-';
    header
        .split(|c: char| !is_version_char(c))
        .flat_map(|token| {
            // `API-v1.0.0`: the version may follow a dash-joined word.
            let tail = token.rsplit_once("-v").map(|(_, t)| t);
            std::iter::once(token).chain(tail)
        })
        .map(|token| token.trim_matches(|c: char| c == '.' || c == '-'))
        .filter(|token| !token.is_empty())
        .any(|token| token == version || token.strip_prefix('v') == Some(version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Severity;
    use crate::result::Findings;
    use apirev_doc::DocumentReader;
    use tempfile::TempDir;

    const API: &str = r#"
info:
  title: Quality On Demand
  version: 0.11.0-rc.1
paths:
  /sessions:
    post:
      operationId: createSession
  /sessions/{sessionId}:
    get:
      operationId: getSession
    delete:
      operationId: deleteSession
"#;

    fn document() -> Document {
        DocumentReader::parse_str("code/API_definitions/quality-on-demand.yaml", API).unwrap()
    }

    fn checker() -> TestAlignmentChecker {
        TestAlignmentChecker::new(&CommonalitiesPolicy::v0_6()).unwrap()
    }

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_discovery_order_and_filtering() {
        let dir = TempDir::new().unwrap();
        write(&dir, "quality-on-demand-getSession.feature", "");
        write(&dir, "quality-on-demand.feature", "");
        write(&dir, "quality-on-demand-createSession.feature", "");
        write(&dir, "quality-on-demand.txt", "");
        write(&dir, "qos-profiles.feature", "");

        let found = checker().discover(dir.path(), "quality-on-demand").unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "quality-on-demand.feature",
                "quality-on-demand-createSession.feature",
                "quality-on-demand-getSession.feature",
            ]
        );
    }

    #[test]
    fn test_missing_tests() {
        let dir = TempDir::new().unwrap();
        let result = checker().check(&document(), dir.path());
        assert!(result.test_files().is_empty());
        assert_eq!(result.issues().len(), 1);
        assert_eq!(result.issues()[0].severity(), Severity::Critical);

        let result = checker().check(&document(), &dir.path().join("absent"));
        assert_eq!(result.counts().critical, 1);
    }

    #[test]
    fn test_aligned_file_is_clean() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "quality-on-demand-createSession.feature",
            "Feature: CAMARA Quality On Demand API, v0.11.0-rc.1 - Operation createSession\n\
             Scenario: create\n  When the request \"createSession\" is sent\n",
        );
        let result = checker().check(&document(), dir.path());
        assert!(result.issues().is_empty(), "{:?}", result.issues());
    }

    #[test]
    fn test_unknown_reference_and_naming() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "quality-on-demand-extendSession.feature",
            "@tag\nFeature: Quality On Demand, 0.11.0-rc.1\n\
             When the request \"extendSession\" is sent\nAnd the request \"extendSession\" is sent again\n",
        );
        let result = checker().check(&document(), dir.path());
        let categories: Vec<_> = result.issues().iter().map(Issue::category).collect();
        assert_eq!(categories, vec!["Test Operation IDs", "Test File Naming"]);
        assert!(result.issues()[0].description().contains("`extendSession`"));
    }

    #[test]
    fn test_header_problems() {
        let dir = TempDir::new().unwrap();
        write(&dir, "quality-on-demand.feature", "Feature: Quality On Demand v0.10.0\n");
        write(&dir, "quality-on-demand-getSession.feature", "# comment\n\nFeature: late\n");
        let result = checker().check(&document(), dir.path());
        let categories: Vec<_> = result.issues().iter().map(Issue::category).collect();
        assert_eq!(categories, vec!["Test Version", "Test Structure"]);
        assert!(result.issues()[0].location().unwrap().ends_with(":line 1"));
    }

    #[test]
    fn test_version_tokens() {
        assert!(mentions_version("Feature: QoD, v1.2.0 - Operation x", "1.2.0"));
        assert!(mentions_version("Feature: QoD 1.2.0", "1.2.0"));
        assert!(!mentions_version("Feature: QoD v11.2.0", "1.2.0"));
        assert!(!mentions_version("Feature: QoD vv1.2.0", "1.2.0"));
        assert!(!mentions_version("Feature: QoD", ""));
        assert!(mentions_version("Feature: Toy,v1.0.0", "1.0.0"));
        assert!(mentions_version("Feature: Toy API-v1.0.0", "1.0.0"));
        assert!(mentions_version("Feature: Toy:v1.0.0", "1.0.0"));
        assert!(mentions_version("Feature: Toy (v0.11.0-rc.1).", "0.11.0-rc.1"));
        assert!(!mentions_version("Feature: Toy API-v1.0.0", "0.0"));
    }

    #[test]
    fn test_unreadable_file_does_not_stop_others() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("quality-on-demand.feature"), b"Feature: \xff\xfe\n").unwrap();
        write(
            &dir,
            "quality-on-demand-getSession.feature",
            "Feature: Quality On Demand, v0.11.0-rc.1\nWhen the request \"zz\" is sent\n",
        );

        let result = checker().check(&document(), dir.path());
        assert_eq!(result.test_files().len(), 2);
        let found: Vec<_> = result.issues().iter().map(|i| (i.severity(), i.category())).collect();
        assert_eq!(
            found,
            vec![
                (Severity::Critical, "Test File Loading"),
                (Severity::Critical, "Test Operation IDs"),
            ]
        );
        assert!(result.issues()[0]
            .location()
            .unwrap()
            .ends_with("quality-on-demand.feature"));
        assert!(result.issues()[1].description().contains("`zz`"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_test_file_is_discovered() {
        let dir = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let target = elsewhere.path().join("shared.feature");
        fs::write(&target, "").unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("quality-on-demand.feature")).unwrap();

        let found = checker().discover(dir.path(), "quality-on-demand").unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_references_in_first_appearance_order() {
        let refs = checker()
            .referenced_operations("request \"b\"\nrequest  \"a\"\nrequest \"b\"\nrequest c\n");
        assert_eq!(refs, vec!["b", "a"]);
    }
}
