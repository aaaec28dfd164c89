//! Integration tests for the review engine.

use std::fs;
use std::path::{Path, PathBuf};

use apirev_doc::{Document, DocumentReader};
use apirev_policy::{
    ApiType, CommonalitiesPolicy, ConsistencyChecker, Findings, ReviewBatch, ReviewType, Severity,
    TestAlignmentChecker, Validator,
};
use tempfile::tempdir;

const QOD: &str = r##"
openapi: 3.0.3
info:
  title: Quality On Demand
  version: 1.2.0
  x-camara-commonalities: 0.6
  license:
    name: Apache 2.0
    url: https://www.apache.org/licenses/LICENSE-2.0.html
externalDocs:
  description: Product documentation at CAMARA
  url: https://github.com/camaraproject/QualityOnDemand
servers:
  - url: "{apiRoot}/quality-on-demand/v1"
security:
  - openId:
      - quality-on-demand:sessions-create
paths:
  /sessions:
    post:
      operationId: createSession
      summary: Creates a new session
      description: Create QoS session to manage latency/throughput priorities
      callbacks:
        notifications:
          "{$request.body#/sink}":
            post:
              operationId: postNotification
              responses:
                "204":
                  description: Received
      responses:
        "201":
          description: Session created
        "400":
          $ref: "#/components/responses/Generic400"
        "500":
          $ref: "#/components/responses/Generic500"
components:
  securitySchemes:
    openId:
      type: openIdConnect
      openIdConnectUrl: https://example.com/.well-known/openid-configuration
  responses:
    Generic400:
      description: Bad Request
      content:
        application/json:
          schema:
            allOf:
              - $ref: "#/components/schemas/ErrorInfo"
    Generic500:
      description: Server error
      content:
        application/json:
          schema:
            $ref: "#/components/schemas/ErrorInfo"
  schemas:
    ErrorInfo:
      type: object
      required: [status, code, message]
      properties:
        status:
          type: integer
          description: HTTP status code
        code:
          type: string
          example: INVALID_ARGUMENT
        message:
          type: string
    EventQosStatusChanged:
      type: object
"##;

fn parse(name: &str, yaml: &str) -> Document {
    DocumentReader::parse_str(format!("code/API_definitions/{}", name), yaml).unwrap()
}

fn validator() -> Validator {
    Validator::new(CommonalitiesPolicy::v0_6()).unwrap()
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_compliant_description_has_no_blocking_findings() {
    let result = validator().validate(&parse("quality-on-demand.yaml", QOD));
    assert_eq!(result.api_type(), Some(ApiType::ImplicitSubscription));
    assert_eq!(result.counts().critical, 0, "{:?}", result.issues());
    assert_eq!(result.counts().medium, 0, "{:?}", result.issues());
}

#[test]
fn test_validation_is_idempotent() {
    let doc = parse("quality-on-demand.yaml", &QOD.replace("1.2.0", "wip"));
    let validator = validator();
    let first = validator.validate(&doc);
    let second = validator.validate(&doc);
    assert!(!first.issues().is_empty());
    assert_eq!(first.issues(), second.issues());
    assert_eq!(first, second);

    let reloaded = parse("quality-on-demand.yaml", &QOD.replace("1.2.0", "wip"));
    assert_eq!(validator.validate(&reloaded).issues(), first.issues());
}

#[test]
fn test_subscription_path_takes_precedence_over_callbacks() {
    let yaml = QOD.replace(
        "paths:\n  /sessions:",
        "paths:\n  /subscriptions:\n    get:\n      operationId: listSubscriptions\n  /sessions:",
    );
    let result = validator().validate(&parse("quality-on-demand.yaml", &yaml));
    assert_eq!(result.api_type(), Some(ApiType::ExplicitSubscription));
}

#[test]
fn test_license_findings() {
    let license_issues = |yaml: &str| {
        validator()
            .validate(&parse("quality-on-demand.yaml", yaml))
            .issues()
            .iter()
            .filter(|i| i.location().map_or(false, |l| l.starts_with("info.license")))
            .map(|i| i.severity())
            .collect::<Vec<_>>()
    };

    assert!(license_issues(QOD).is_empty());
    assert_eq!(
        license_issues(&QOD.replace("name: Apache 2.0", "name: MIT")),
        vec![Severity::Critical]
    );
    assert_eq!(
        license_issues(&QOD.replace("LICENSE-2.0.html", "LICENSE-2.0")),
        vec![Severity::Critical]
    );
    assert_eq!(
        license_issues(&QOD.replace("name: Apache 2.0", "name: MIT").replace("LICENSE-2.0.html", "LICENSE-2.0")),
        vec![Severity::Critical, Severity::Critical]
    );
}

#[test]
fn test_work_in_progress_gate() {
    let wip = QOD.replace("version: 1.2.0", "version: wip");
    let version_issues = |yaml: &str, policy: CommonalitiesPolicy| {
        Validator::new(policy)
            .unwrap()
            .validate(&parse("quality-on-demand.yaml", yaml))
            .issues()
            .iter()
            .filter(|i| i.category() == "Version")
            .map(|i| i.severity())
            .collect::<Vec<_>>()
    };

    assert_eq!(version_issues(&wip, CommonalitiesPolicy::v0_6()), vec![Severity::Critical]);
    assert!(version_issues(QOD, CommonalitiesPolicy::v0_6()).is_empty());
    assert_eq!(
        version_issues(&wip, CommonalitiesPolicy::v0_6().with_review_type(ReviewType::Wip)),
        vec![Severity::Info]
    );
}

#[test]
fn test_unknown_operation_reference() {
    let api = parse(
        "toy-api.yaml",
        "info: {version: 1.0.0}\npaths:\n  /a:\n    get: {operationId: a}\n  /b:\n    post: {operationId: b}\n",
    );
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "toy-api.feature",
        "Feature: Toy, v1.0.0\n  Scenario: unknown\n    When the request \"a\" is sent\n    And the request \"c\" is sent\n",
    );

    let checker = TestAlignmentChecker::new(&CommonalitiesPolicy::v0_6()).unwrap();
    let result = checker.check(&api, dir.path());
    let critical = result.issues_with(Severity::Critical);
    assert_eq!(critical.len(), 1);
    assert!(critical[0].description().contains("`c`"));
    assert_eq!(result.issues().len(), 1);
}

#[test]
fn test_missing_tests() {
    let dir = tempdir().unwrap();
    let checker = TestAlignmentChecker::new(&CommonalitiesPolicy::v0_6()).unwrap();
    let result = checker.check(&parse("quality-on-demand.yaml", QOD), dir.path());
    assert!(result.test_files().is_empty());
    assert_eq!(result.issues().len(), 1);
    assert_eq!(result.counts().critical, 1);
}

#[test]
fn test_shared_schema_in_one_of_three_documents() {
    let checker = ConsistencyChecker::new(&CommonalitiesPolicy::v0_6());
    let batch = vec![
        Ok(parse("a.yaml", "components:\n  schemas:\n    Circle: {type: object}\n")),
        Ok(parse("b.yaml", "components:\n  schemas:\n    Point: {type: object}\n")),
        Ok(parse("c.yaml", "components:\n  schemas:\n    Area: {type: object}\n")),
    ];
    assert!(checker.check(&batch).issues().is_empty());
}

#[test]
fn test_reordered_and_cosmetic_changes_are_equivalent() {
    let checker = ConsistencyChecker::new(&CommonalitiesPolicy::v0_6());
    let batch = vec![
        Ok(parse(
            "a.yaml",
            "components:\n  schemas:\n    Port:\n      type: integer\n      minimum: 0\n      description: A port\n",
        )),
        Ok(parse(
            "b.yaml",
            "components:\n  schemas:\n    Port:\n      minimum: 0\n      example: 8080\n      type: integer\n",
        )),
    ];
    assert!(checker.check(&batch).issues().is_empty());
}

#[test]
fn test_error_info_drift_end_to_end() {
    let dir = tempdir().unwrap();
    let original = write(dir.path(), "quality-on-demand.yaml", QOD);
    let drifted = write(
        dir.path(),
        "qos-profiles.yaml",
        &QOD.replace("required: [status, code, message]", "required: [status, code, message, details]"),
    );

    let checker = ConsistencyChecker::new(&CommonalitiesPolicy::v0_6());
    let result = checker.check_paths(&[original, drifted]);

    assert_eq!(result.issues().len(), 1);
    let issue = &result.issues()[0];
    assert_eq!(issue.severity(), Severity::Medium);
    assert!(issue.description().contains("ErrorInfo"));
    assert!(issue.description().contains("quality-on-demand.yaml"));
    assert!(issue.description().contains("qos-profiles.yaml"));
}

#[test]
fn test_batch_aggregation() {
    let dir = tempdir().unwrap();
    let good = write(dir.path(), "quality-on-demand.yaml", QOD);
    let broken = write(dir.path(), "broken.yaml", "info: [unclosed\n");

    let validator = validator();
    let validations = vec![validator.validate_file(&good), validator.validate_file(&broken)];
    assert_eq!(validations[1].api_type(), None);
    assert_eq!(validations[1].issues()[0].category(), "YAML Syntax");

    let consistency = ConsistencyChecker::new(validator.conventions().policy()).check_paths(&[good, broken]);
    assert_eq!(consistency.counts().critical, 1);

    let batch = ReviewBatch {
        validations,
        consistency: Some(consistency),
        alignments: Vec::new(),
    };
    let totals = batch.totals();
    assert_eq!(totals.critical, 2);
    assert!(batch.checks_performed().contains("Project-wide shared schema validation"));
    assert!(batch.manual_checks().contains("Event callback mechanism review"));
    assert_eq!(batch.type_counts().get(&ApiType::ImplicitSubscription), Some(&1));
}
