//! End-to-end migration against a mocked GitLab.

use bb2gl_migrate::{MigrationConfig, MigrationError, Migrator};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXPORT: &str = r#"{
    "milestones": [{"name": "1.0"}],
    "components": [{"name": "billing"}],
    "issues": [
        {"id": 1, "title": "Invoice total wrong", "status": "resolved", "priority": "critical",
         "reporter": "alice", "assignee": "bob", "milestone": "1.0", "component": "billing",
         "created_on": "2020-01-01", "updated_on": "2020-01-02", "content": "Totals are off"}
    ],
    "comments": [
        {"issue": 1, "user": "bob", "content": "Fixed", "created_on": "2020-01-03"},
        {"issue": 1, "user": "bob", "content": null, "created_on": "2020-01-04"}
    ]
}"#;

fn write_export(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("db-1.0.json");
    std::fs::write(&path, EXPORT).unwrap();
    path
}

async fn mount_project(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 7, "path_with_namespace": "repo/name"}
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_migrates_bundle_into_project() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_project(&server).await;

    Mock::given(method("GET"))
        .and(path("/projects/7/milestones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/projects/7/milestones"))
        .and(body_json(json!({"title": "1.0"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 31, "title": "1.0"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects/7/labels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "P1", "color": "#ff0000"}
        ])))
        .mount(&server)
        .await;

    // billing, P4, P3, P2, P0, on hold
    Mock::given(method("POST"))
        .and(path("/projects/7/labels"))
        .and(body_partial_json(json!({"color": "#808080"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"name": "x"})))
        .expect(6)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("PRIVATE-TOKEN", "token-bob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 12, "username": "bob"})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/projects/7/issues"))
        .and(header("PRIVATE-TOKEN", "token-alice"))
        .and(body_json(json!({
            "title": "Invoice total wrong",
            "state": "resolved",
            "created_at": "2020-01-01",
            "updated_at": "2020-01-02",
            "description": "Totals are off",
            "assignee_id": 12,
            "milestone_id": 31,
            "labels": "P1,billing"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(
            json!({"id": 500, "iid": 1, "title": "Invoice total wrong", "state": "opened"}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/projects/7/issues/1/notes"))
        .and(header("PRIVATE-TOKEN", "token-bob"))
        .and(body_json(json!({"body": "Fixed"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 600, "body": "Fixed"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/projects/7/issues/1"))
        .and(header("PRIVATE-TOKEN", "token-alice"))
        .and(body_json(json!({"state_event": "close"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"id": 500, "iid": 1, "title": "Invoice total wrong", "state": "closed"}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = MigrationConfig::new(server.uri(), "repo/name", write_export(dir.path()))
        .with_credential("alice", "token-alice")
        .with_credential("bob", "token-bob");

    let report = Migrator::from_config(&config)
        .unwrap()
        .migrate()
        .await
        .unwrap();

    assert_eq!(report.milestones_created, 1);
    assert_eq!(report.labels_created, 6);
    assert_eq!(report.labels_skipped, 1);
    assert_eq!(report.issues_migrated, 1);
    assert_eq!(report.issues_closed, 1);
    assert_eq!(report.comments_migrated, 1);
    assert_eq!(report.comments_skipped, 1);
}

#[tokio::test]
async fn test_unknown_project_aborts() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "path_with_namespace": "someone/else"}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let config = MigrationConfig::new(server.uri(), "repo/name", write_export(dir.path()))
        .with_credential("alice", "token-alice");

    let err = Migrator::from_config(&config)
        .unwrap()
        .migrate()
        .await
        .unwrap_err();
    assert!(matches!(err, MigrationError::ProjectNotFound(_)));
}

#[tokio::test]
async fn test_remote_rejection_propagates() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_project(&server).await;

    Mock::given(method("GET"))
        .and(path("/projects/7/milestones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/projects/7/milestones"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let config = MigrationConfig::new(server.uri(), "repo/name", write_export(dir.path()))
        .with_credential("alice", "token-alice");

    let err = Migrator::from_config(&config)
        .unwrap()
        .migrate()
        .await
        .unwrap_err();
    assert!(matches!(err, MigrationError::ApiError(_)));
}
