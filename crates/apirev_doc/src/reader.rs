//! Description file loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::debug;

use crate::error::{DocError, DocResult};
use crate::node::{DocNode, Mapping, Scalar};

/// A loaded description: its source identifier plus the parsed tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    source: String,
    root: DocNode,
}

impl Document {
    pub fn new(source: impl Into<String>, root: DocNode) -> Self {
        Self {
            source: source.into(),
            root,
        }
    }

    /// Identifier of the file this document was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &DocNode {
        &self.root
    }

    /// File name without directories, e.g. `device-status.yaml`.
    pub fn file_name(&self) -> &str {
        Path::new(&self.source)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.source)
    }

    /// File name without directories and extension, e.g. `device-status`.
    pub fn file_stem(&self) -> &str {
        Path::new(&self.source)
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.source)
    }
}

/// Loader for YAML and JSON descriptions.
pub struct DocumentReader;

impl DocumentReader {
    /// Read and parse a description file.
    pub fn read_file(path: impl AsRef<Path>) -> DocResult<Document> {
        let path = path.as_ref();
        debug!("Reading description from {:?}", path);

        let content = fs::read_to_string(path).map_err(|source| DocError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(path.to_string_lossy(), &content)
    }

    /// Parse description text. `source` identifies the document in errors
    /// and findings.
    pub fn parse_str(source: impl Into<String>, content: &str) -> DocResult<Document> {
        let source = source.into();
        let path = PathBuf::from(&source);

        let value: Value = serde_yaml::from_str(content).map_err(|e| DocError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let root = convert(value, &path, "$")?;
        if root.as_mapping().is_none() {
            return Err(DocError::Parse {
                path,
                message: "expected a mapping at the document root".to_string(),
            });
        }

        Ok(Document::new(source, root))
    }
}

fn convert(value: Value, path: &Path, location: &str) -> DocResult<DocNode> {
    let node = match value {
        Value::Null => DocNode::Null,
        Value::Bool(b) => DocNode::Scalar(Scalar::Bool(b)),
        Value::Number(n) => DocNode::Scalar(number(&n)),
        Value::String(s) => DocNode::Scalar(Scalar::Str(s)),
        Value::Sequence(items) => DocNode::Sequence(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| convert(item, path, &format!("{}[{}]", location, i)))
                .collect::<DocResult<Vec<_>>>()?,
        ),
        Value::Mapping(entries) => {
            let mut mapping = Mapping::new();
            for (key, item) in entries {
                let key = mapping_key(key).ok_or_else(|| DocError::InvalidKey {
                    path: path.to_path_buf(),
                    location: location.to_string(),
                })?;
                let child = convert(item, path, &format!("{}.{}", location, key))?;
                // Keys such as `200` and `"200"` collapse to the same text.
                if !mapping.insert(key.clone(), child) {
                    return Err(DocError::DuplicateKey {
                        path: path.to_path_buf(),
                        key,
                        location: location.to_string(),
                    });
                }
            }
            DocNode::Mapping(mapping)
        }
        Value::Tagged(tagged) => convert(tagged.value, path, location)?,
    };
    Ok(node)
}

fn number(n: &serde_yaml::Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        Scalar::Int(i)
    } else {
        // u64 beyond i64 range and all floats
        Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// OpenAPI writes status codes as bare numbers; keep every scalar key as text.
fn mapping_key(key: Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(number(&n).to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => mapping_key(tagged.value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_key_order() {
        let doc = DocumentReader::parse_str(
            "api.yaml",
            "openapi: 3.0.3\ninfo:\n  title: T\npaths: {}\ncomponents: {}\n",
        )
        .unwrap();
        let keys: Vec<_> = doc.root().as_mapping().unwrap().keys().collect();
        assert_eq!(keys, vec!["openapi", "info", "paths", "components"]);
    }

    #[test]
    fn test_numeric_keys_become_text() {
        let doc = DocumentReader::parse_str(
            "api.yaml",
            "responses:\n  200:\n    description: OK\n  '400':\n    description: Bad\n",
        )
        .unwrap();
        let responses = doc.root().get("responses").unwrap();
        assert!(responses.contains_key("200"));
        assert!(responses.contains_key("400"));
    }

    #[test]
    fn test_colliding_keys_are_rejected() {
        let err = DocumentReader::parse_str("api.yaml", "r:\n  200: a\n  '200': b\n").unwrap_err();
        assert!(matches!(err, DocError::DuplicateKey { ref key, .. } if key == "200"));
    }

    #[test]
    fn test_malformed_yaml_is_load_error() {
        let err = DocumentReader::parse_str("broken.yaml", "info: [unclosed\n").unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.path(), Path::new("broken.yaml"));
    }

    #[test]
    fn test_non_mapping_root_is_load_error() {
        assert!(DocumentReader::parse_str("list.yaml", "- a\n- b\n").is_err());
        assert!(DocumentReader::parse_str("empty.yaml", "").is_err());
    }

    #[test]
    fn test_json_input() {
        let doc = DocumentReader::parse_str(
            "api.json",
            r#"{"info": {"version": "1.0.0", "x-camara-commonalities": 0.6}}"#,
        )
        .unwrap();
        assert_eq!(doc.root().str_at(&["info", "version"]), Some("1.0.0"));
        assert_eq!(doc.file_stem(), "api");
    }
}
