//! Cross-document consistency checks.

use std::collections::BTreeSet;
use std::path::PathBuf;

use apirev_doc::{DocNode, DocResult, Document, DocumentReader, Mapping};
use tracing::{debug, info, warn};

use crate::issue::Issue;
use crate::policy::CommonalitiesPolicy;
use crate::result::ConsistencyResult;

/// Members that never take part in a schema comparison.
const COSMETIC_KEYS: [&str; 3] = ["example", "examples", "description"];

const SCHEMA_CHECK: &str = "Project-wide shared schema validation";
const LICENSE_CHECK: &str = "License consistency validation";
const COMMONALITIES_CHECK: &str = "Commonalities version consistency validation";

/// Copy of `node` without cosmetic members at any depth.
///
/// The order of the remaining members is preserved.
pub fn normalize_schema(node: &DocNode) -> DocNode {
    match node {
        DocNode::Mapping(m) => DocNode::Mapping(
            m.iter()
                .filter(|(key, _)| !COSMETIC_KEYS.contains(key))
                .map(|(key, value)| (key.to_string(), normalize_schema(value)))
                .collect::<Mapping>(),
        ),
        DocNode::Sequence(items) => DocNode::Sequence(items.iter().map(normalize_schema).collect()),
        other => other.clone(),
    }
}

/// Compares shared fragments across a batch of descriptions.
#[derive(Debug, Clone)]
pub struct ConsistencyChecker {
    shared_schemas: Vec<String>,
}

impl ConsistencyChecker {
    pub fn new(policy: &CommonalitiesPolicy) -> Self {
        Self {
            shared_schemas: policy.shared_schemas.clone(),
        }
    }

    /// Load every path, then check the batch.
    pub fn check_paths(&self, paths: &[PathBuf]) -> ConsistencyResult {
        let batch: Vec<_> = paths.iter().map(DocumentReader::read_file).collect();
        self.check(&batch)
    }

    /// Check a batch in order. Entries that failed to load are reported and
    /// left out of every comparison.
    pub fn check(&self, batch: &[DocResult<Document>]) -> ConsistencyResult {
        let mut checks = BTreeSet::new();
        checks.insert(SCHEMA_CHECK.to_string());
        let mut issues = Vec::new();

        if batch.len() < 2 {
            return ConsistencyResult::new(issues, checks);
        }

        let mut documents = Vec::with_capacity(batch.len());
        for entry in batch {
            match entry {
                Ok(document) => documents.push(document),
                Err(e) => {
                    warn!("Excluding {:?} from consistency checks: {}", e.path(), e);
                    let path = e.path().display().to_string();
                    issues.push(
                        Issue::critical("File Loading", format!("Failed to load `{}`: {}", path, e)).at(path),
                    );
                }
            }
        }

        if documents.len() < 2 {
            return ConsistencyResult::new(issues, checks);
        }
        info!("Comparing {} descriptions", documents.len());

        for name in &self.shared_schemas {
            self.compare_schema(name, &documents, &mut issues);
        }

        checks.insert(LICENSE_CHECK.to_string());
        compare_licenses(&documents, &mut issues);

        checks.insert(COMMONALITIES_CHECK.to_string());
        compare_commonalities(&documents, &mut issues);

        ConsistencyResult::new(issues, checks)
    }

    fn compare_schema(&self, name: &str, documents: &[&Document], issues: &mut Vec<Issue>) {
        let declared: Vec<(&Document, DocNode)> = documents
            .iter()
            .filter_map(|doc| {
                doc.root()
                    .at(&["components", "schemas", name])
                    .map(|schema| (*doc, normalize_schema(schema)))
            })
            .collect();

        if declared.len() < 2 {
            debug!("Shared schema {} declared by fewer than two descriptions", name);
            return;
        }
        let (reference, expected) = &declared[0];

        for (doc, schema) in &declared[1..] {
            if schema != expected {
                issues.push(
                    Issue::medium(
                        "Schema Consistency",
                        format!(
                            "Schema `{}` differs between `{}` and `{}`",
                            name,
                            reference.file_name(),
                            doc.file_name()
                        ),
                    )
                    .at(pair(reference, doc))
                    .with_fix(format!("Ensure `{}` schema is identical across all files", name)),
                );
            }
        }
    }
}

fn pair(a: &Document, b: &Document) -> String {
    format!("{} vs {}", a.file_name(), b.file_name())
}

fn compare_licenses(documents: &[&Document], issues: &mut Vec<Issue>) {
    let mut declared = documents.iter().filter_map(|doc| {
        doc.root()
            .at(&["info", "license"])
            .filter(|l| !l.is_blank())
            .map(|license| (*doc, license))
    });
    let Some((reference, expected)) = declared.next() else {
        return;
    };

    for (doc, license) in declared {
        if license != expected {
            issues.push(
                Issue::medium("License Consistency", "License information differs between files")
                    .at(pair(reference, doc))
                    .with_fix("Ensure all files have identical license information"),
            );
        }
    }
}

fn compare_commonalities(documents: &[&Document], issues: &mut Vec<Issue>) {
    let mut declared = documents.iter().filter_map(|doc| {
        doc.root()
            .at(&["info", "x-camara-commonalities"])
            .and_then(DocNode::as_text)
            .filter(|v| !v.is_empty())
            .map(|version| (*doc, version))
    });
    let Some((reference, expected)) = declared.next() else {
        return;
    };

    for (doc, version) in declared {
        if version != expected {
            issues.push(
                Issue::medium(
                    "Commonalities Consistency",
                    format!("Commonalities version differs: `{}` vs `{}`", expected, version),
                )
                .at(pair(reference, doc))
                .with_fix("Ensure all files use the same commonalities version"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Findings;
    use apirev_doc::DocError;

    fn doc(name: &str, yaml: &str) -> DocResult<Document> {
        DocumentReader::parse_str(format!("code/API_definitions/{}", name), yaml)
    }

    fn checker() -> ConsistencyChecker {
        ConsistencyChecker::new(&CommonalitiesPolicy::v0_6())
    }

    #[test]
    fn test_normalization_strips_cosmetic_members() {
        let a = doc(
            "a.yaml",
            "type: object\ndescription: A\nproperties:\n  code:\n    type: string\n    example: X\n    examples: [Y]\n",
        )
        .unwrap();
        let b = doc("b.yaml", "type: object\nproperties:\n  code:\n    description: Code\n    type: string\n").unwrap();
        assert_eq!(normalize_schema(a.root()), normalize_schema(b.root()));

        let c = doc("c.yaml", "type: object\nproperties:\n  code:\n    type: integer\n").unwrap();
        assert_ne!(normalize_schema(a.root()), normalize_schema(c.root()));
    }

    #[test]
    fn test_single_declaration_is_skipped() {
        let batch = vec![
            doc("a.yaml", "components:\n  schemas:\n    Device: {type: object}\n"),
            doc("b.yaml", "components:\n  schemas:\n    Other: {}\n"),
            doc("c.yaml", "info: {title: C}\n"),
        ];
        let result = checker().check(&batch);
        assert!(result.issues().is_empty());
    }

    #[test]
    fn test_each_deviation_compared_to_first() {
        let batch = vec![
            doc("a.yaml", "components:\n  schemas:\n    Port: {type: integer, minimum: 0}\n"),
            doc("b.yaml", "components:\n  schemas:\n    Port: {type: integer, minimum: 1}\n"),
            doc("c.yaml", "components:\n  schemas:\n    Port: {type: integer, minimum: 0, description: Port}\n"),
            doc("d.yaml", "components:\n  schemas:\n    Port: {type: string}\n"),
        ];
        let result = checker().check(&batch);
        let locations: Vec<_> = result.issues().iter().filter_map(Issue::location).collect();
        assert_eq!(locations, vec!["a.yaml vs b.yaml", "a.yaml vs d.yaml"]);
    }

    #[test]
    fn test_load_failure_is_excluded() {
        let batch = vec![
            Err(DocError::Parse {
                path: PathBuf::from("code/API_definitions/broken.yaml"),
                message: "mapping values are not allowed here".to_string(),
            }),
            doc("a.yaml", "components:\n  schemas:\n    Port: {type: integer}\n"),
            doc("b.yaml", "components:\n  schemas:\n    Port: {type: integer}\n"),
        ];
        let result = checker().check(&batch);
        assert_eq!(result.issues().len(), 1);
        assert_eq!(result.issues()[0].category(), "File Loading");
        assert!(result.checks_performed().contains(LICENSE_CHECK));
    }

    #[test]
    fn test_license_and_commonalities_drift() {
        let batch = vec![
            doc("a.yaml", "info:\n  x-camara-commonalities: 0.6\n  license: {name: Apache 2.0, url: u}\n"),
            doc("b.yaml", "info:\n  x-camara-commonalities: '0.6'\n  license: {name: Apache 2.0, url: v}\n"),
            doc("c.yaml", "info:\n  x-camara-commonalities: 0.5\n"),
        ];
        let result = checker().check(&batch);
        let categories: Vec<_> = result.issues().iter().map(Issue::category).collect();
        assert_eq!(categories, vec!["License Consistency", "Commonalities Consistency"]);
        assert_eq!(result.issues()[1].location(), Some("a.yaml vs c.yaml"));
    }

    #[test]
    fn test_small_batch_is_not_compared() {
        let batch = vec![doc("a.yaml", "info: {title: A}\n")];
        let result = checker().check(&batch);
        assert!(result.issues().is_empty());
        assert_eq!(result.checks_performed().len(), 1);
    }
}
