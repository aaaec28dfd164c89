//! Document tree model.
//!
//! The tree mirrors the data model of YAML/JSON: mappings with ordered,
//! unique string keys, sequences, scalars and null. Nodes are immutable once
//! built; lookups return `None` for anything absent or of the wrong shape.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// A node of a parsed description.
#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    Mapping(Mapping),
    Sequence(Vec<DocNode>),
    Scalar(Scalar),
    Null,
}

/// Leaf values.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Textual form of the scalar, as it would be written in the source.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Scalar::Str(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(other.to_string()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            // Keep a trailing `.0` so `1.0` does not read back as an integer.
            Scalar::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => {
                write!(f, "{:.1}", x)
            }
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

/// Insertion-ordered mapping with unique keys.
///
/// Iteration follows document order; equality does not.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: Vec<(String, DocNode)>,
    index: HashMap<String, usize>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Returns `false` and leaves the mapping untouched
    /// when the key is already present.
    pub fn insert(&mut self, key: impl Into<String>, value: DocNode) -> bool {
        let key = key.into();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        true
    }

    pub fn get(&self, key: &str) -> Option<&DocNode> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocNode)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |o| o == v))
    }
}

impl FromIterator<(String, DocNode)> for Mapping {
    /// Later duplicates of a key are dropped.
    fn from_iter<I: IntoIterator<Item = (String, DocNode)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

impl DocNode {
    /// Convenience constructor for string scalars.
    pub fn string(value: impl Into<String>) -> Self {
        DocNode::Scalar(Scalar::Str(value.into()))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            DocNode::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[DocNode]> {
        match self {
            DocNode::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            DocNode::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow a string scalar. Numbers and booleans are not coerced.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocNode::Scalar(Scalar::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Textual form of any scalar (`0.6`, `true`, `wip`).
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        self.as_scalar().map(Scalar::as_text)
    }

    /// Member of a mapping node.
    pub fn get(&self, key: &str) -> Option<&DocNode> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Element of a sequence node.
    pub fn index(&self, idx: usize) -> Option<&DocNode> {
        self.as_sequence().and_then(|items| items.get(idx))
    }

    /// Follow a chain of mapping keys.
    pub fn at(&self, path: &[&str]) -> Option<&DocNode> {
        path.iter().try_fold(self, |node, key| node.get(key))
    }

    /// String scalar at a chain of mapping keys.
    pub fn str_at(&self, path: &[&str]) -> Option<&str> {
        self.at(path).and_then(DocNode::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.as_mapping().map_or(false, |m| m.contains_key(key))
    }

    /// Mapping entries, or nothing when the node is not a mapping.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &DocNode)> + '_ {
        self.as_mapping().into_iter().flat_map(|m| m.iter())
    }

    /// Sequence elements, or an empty slice when the node is not a sequence.
    pub fn items(&self) -> &[DocNode] {
        self.as_sequence().unwrap_or(&[])
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DocNode::Null)
    }

    /// Null, empty string, empty mapping or empty sequence.
    pub fn is_blank(&self) -> bool {
        match self {
            DocNode::Null => true,
            DocNode::Scalar(Scalar::Str(s)) => s.is_empty(),
            DocNode::Scalar(_) => false,
            DocNode::Mapping(m) => m.is_empty(),
            DocNode::Sequence(items) => items.is_empty(),
        }
    }
}

/// Flow-style rendering, e.g. `{type: object, required: [code]}`.
impl fmt::Display for DocNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocNode::Null => f.write_str("null"),
            DocNode::Scalar(s) => write!(f, "{}", s),
            DocNode::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            DocNode::Mapping(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DocNode {
        let mut license = Mapping::new();
        license.insert("name", DocNode::string("Apache 2.0"));
        let mut info = Mapping::new();
        info.insert("title", DocNode::string("Device Status"));
        info.insert("license", DocNode::Mapping(license));
        info.insert("x-camara-commonalities", DocNode::Scalar(Scalar::Float(0.6)));
        let mut root = Mapping::new();
        root.insert("info", DocNode::Mapping(info));
        root.insert(
            "servers",
            DocNode::Sequence(vec![DocNode::string("https://example.com")]),
        );
        DocNode::Mapping(root)
    }

    #[test]
    fn test_path_access() {
        let doc = sample();
        assert_eq!(doc.str_at(&["info", "license", "name"]), Some("Apache 2.0"));
        assert_eq!(doc.str_at(&["info", "license", "url"]), None);
        assert!(doc.at(&["paths", "/x", "get"]).is_none());
        assert_eq!(
            doc.at(&["info", "x-camara-commonalities"])
                .and_then(DocNode::as_text)
                .as_deref(),
            Some("0.6")
        );
    }

    #[test]
    fn test_accessors_on_wrong_shape() {
        let doc = sample();
        let servers = doc.get("servers").unwrap();
        assert!(servers.get("url").is_none());
        assert_eq!(servers.entries().count(), 0);
        assert_eq!(servers.items().len(), 1);
        assert!(doc.items().is_empty());
        assert!(servers.index(3).is_none());
    }

    #[test]
    fn test_mapping_rejects_duplicate_keys() {
        let mut m = Mapping::new();
        assert!(m.insert("a", DocNode::Null));
        assert!(!m.insert("a", DocNode::string("b")));
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("a"), Some(&DocNode::Null));
    }

    #[test]
    fn test_large_mapping_lookup() {
        let m: Mapping = (0..50_000).map(|i| (format!("k{}", i), DocNode::Null)).collect();
        assert_eq!(m.len(), 50_000);
        assert!(m.contains_key("k49999"));
        assert_eq!(m.keys().next(), Some("k0"));
        assert!(m.get("k50000").is_none());
    }

    #[test]
    fn test_mapping_equality_ignores_order() {
        let a: Mapping = vec![
            ("type".to_string(), DocNode::string("object")),
            ("required".to_string(), DocNode::Sequence(vec![DocNode::string("code")])),
        ]
        .into_iter()
        .collect();
        let b: Mapping = vec![
            ("required".to_string(), DocNode::Sequence(vec![DocNode::string("code")])),
            ("type".to_string(), DocNode::string("object")),
        ]
        .into_iter()
        .collect();
        assert_eq!(a, b);
        assert_eq!(a.keys().collect::<Vec<_>>(), vec!["type", "required"]);

        let mut c = b.clone();
        c.insert("format", DocNode::Null);
        assert_ne!(a, c);
    }

    #[test]
    fn test_float_text_keeps_fraction() {
        assert_eq!(Scalar::Float(1.0).to_string(), "1.0");
        assert_eq!(Scalar::Float(0.6).to_string(), "0.6");
        assert_eq!(Scalar::Int(3).to_string(), "3");
    }

    #[test]
    fn test_flow_rendering() {
        let doc = sample();
        let rendered = doc.get("info").unwrap().to_string();
        assert_eq!(
            rendered,
            "{title: Device Status, license: {name: Apache 2.0}, x-camara-commonalities: 0.6}"
        );
    }

    #[test]
    fn test_blank() {
        assert!(DocNode::Null.is_blank());
        assert!(DocNode::string("").is_blank());
        assert!(DocNode::Mapping(Mapping::new()).is_blank());
        assert!(!DocNode::Scalar(Scalar::Bool(false)).is_blank());
    }
}
