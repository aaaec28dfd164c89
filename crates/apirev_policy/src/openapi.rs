//! Navigation helpers over OpenAPI-shaped document trees.

use apirev_doc::DocNode;

/// Every operation method OpenAPI allows on a path item.
pub const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Methods inspected by classification, error-response and alignment checks.
pub const CORE_METHODS: [&str; 5] = ["get", "post", "put", "delete", "patch"];

/// Methods that count as subscription management.
pub const CRUD_METHODS: [&str; 4] = ["get", "post", "put", "delete"];

/// One operation of a path item.
#[derive(Debug, Clone, Copy)]
pub struct Operation<'a> {
    pub path: &'a str,
    pub method: &'a str,
    pub node: &'a DocNode,
}

impl<'a> Operation<'a> {
    /// `GET /sessions/{id}`
    pub fn label(&self) -> String {
        format!("{} {}", self.method.to_uppercase(), self.path)
    }

    pub fn operation_id(&self) -> Option<&'a str> {
        self.node.get("operationId").and_then(DocNode::as_str)
    }

    pub fn responses(&self) -> Option<&'a DocNode> {
        self.node.get("responses")
    }
}

/// Path items in document order.
pub fn paths(root: &DocNode) -> impl Iterator<Item = (&str, &DocNode)> + '_ {
    root.get("paths").into_iter().flat_map(|p| p.entries())
}

/// Operations declared with one of `methods`, in document order.
pub fn operations<'a>(root: &'a DocNode, methods: &[&str]) -> Vec<Operation<'a>> {
    let mut ops = Vec::new();
    for (path, item) in paths(root) {
        for (method, node) in item.entries() {
            if methods.contains(&method) {
                ops.push(Operation { path, method, node });
            }
        }
    }
    ops
}

/// Declared operation identifiers, in document order.
pub fn operation_ids(root: &DocNode) -> Vec<String> {
    operations(root, &CORE_METHODS)
        .iter()
        .filter_map(|op| op.operation_id())
        .map(str::to_string)
        .collect()
}

/// `components.schemas` entries in document order.
pub fn schemas(root: &DocNode) -> impl Iterator<Item = (&str, &DocNode)> + '_ {
    root.at(&["components", "schemas"])
        .into_iter()
        .flat_map(|s| s.entries())
}

/// `components.securitySchemes`, if declared.
pub fn security_schemes(root: &DocNode) -> Option<&DocNode> {
    root.at(&["components", "securitySchemes"])
}

/// Follow a local `$ref` (`#/components/...`) one level.
///
/// Returns the node itself when it is not a reference or the target
/// cannot be found.
pub fn resolve_local<'a>(root: &'a DocNode, node: &'a DocNode) -> &'a DocNode {
    let Some(reference) = node.get("$ref").and_then(DocNode::as_str) else {
        return node;
    };
    let Some(pointer) = reference.strip_prefix("#/") else {
        return node;
    };
    let segments: Vec<String> = pointer.split('/').map(unescape_pointer).collect();
    let keys: Vec<&str> = segments.iter().map(String::as_str).collect();
    root.at(&keys).unwrap_or(node)
}

fn unescape_pointer(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Whether the schema references `#/components/schemas/<name>` directly or
/// through `allOf`/`oneOf`/`anyOf`.
pub fn references_schema(schema: &DocNode, name: &str) -> bool {
    let target = format!("#/components/schemas/{}", name);
    let direct = schema
        .get("$ref")
        .and_then(DocNode::as_str)
        .map_or(false, |r| r.contains(&target));
    direct
        || ["allOf", "oneOf", "anyOf"].iter().any(|combinator| {
            schema
                .get(combinator)
                .map_or(false, |items| items.items().iter().any(|s| references_schema(s, name)))
        })
}

/// String values of every `enum` inside a schema, depth first.
pub fn enum_values(schema: &DocNode) -> Vec<&str> {
    let mut values = Vec::new();
    collect_enum_values(schema, &mut values);
    values
}

fn collect_enum_values<'a>(node: &'a DocNode, out: &mut Vec<&'a str>) {
    match node {
        DocNode::Mapping(m) => {
            for (key, value) in m.iter() {
                if key == "enum" {
                    out.extend(value.items().iter().filter_map(DocNode::as_str));
                } else {
                    collect_enum_values(value, out);
                }
            }
        }
        DocNode::Sequence(items) => {
            for item in items {
                collect_enum_values(item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apirev_doc::DocumentReader;

    const SPEC: &str = r##"
paths:
  /sessions:
    parameters: []
    post:
      operationId: createSession
      responses:
        "400":
          $ref: "#/components/responses/Generic400"
    get:
      operationId: listSessions
  /sessions/{id}:
    head:
      operationId: headSession
    delete:
      operationId: deleteSession
components:
  responses:
    Generic400:
      description: Bad request
      content:
        application/json:
          schema:
            allOf:
              - $ref: "#/components/schemas/ErrorInfo"
              - type: object
                properties:
                  code:
                    enum: [INVALID_ARGUMENT, OUT_OF_RANGE]
  schemas:
    ErrorInfo:
      type: object
"##;

    #[test]
    fn test_operations_in_document_order() {
        let doc = DocumentReader::parse_str("s.yaml", SPEC).unwrap();
        let labels: Vec<_> = operations(doc.root(), &HTTP_METHODS)
            .iter()
            .map(Operation::label)
            .collect();
        assert_eq!(
            labels,
            vec!["POST /sessions", "GET /sessions", "HEAD /sessions/{id}", "DELETE /sessions/{id}"]
        );
        assert_eq!(
            operation_ids(doc.root()),
            vec!["createSession", "listSessions", "deleteSession"]
        );
    }

    #[test]
    fn test_resolve_local_and_references() {
        let doc = DocumentReader::parse_str("s.yaml", SPEC).unwrap();
        let root = doc.root();
        let response = root.at(&["paths", "/sessions", "post", "responses", "400"]).unwrap();
        let resolved = resolve_local(root, response);
        assert_eq!(resolved.str_at(&["description"]), Some("Bad request"));

        let schema = resolved.at(&["content", "application/json", "schema"]).unwrap();
        assert!(references_schema(schema, "ErrorInfo"));
        assert!(!references_schema(schema, "Other"));
        assert_eq!(enum_values(schema), vec!["INVALID_ARGUMENT", "OUT_OF_RANGE"]);
    }

    #[test]
    fn test_unresolvable_ref_returns_node() {
        let doc = DocumentReader::parse_str("s.yaml", "a:\n  $ref: '#/components/missing'\n").unwrap();
        let node = doc.root().get("a").unwrap();
        assert_eq!(resolve_local(doc.root(), node), node);
    }
}
