#![allow(clippy::unwrap_used, clippy::expect_used, clippy::use_debug)]

//! Resource operations against a mock Posture Management API.

use std::io::Write;
use std::time::Duration;

use http::StatusCode;
use httpmock::prelude::*;
use posture_management_sdk::{
    CreateCollectorOptions, CreateCredentialOptions, CreateScopeOptions,
    CreateValidationScanOptions, DeleteOutcome, DiscoveryRequest, PostureManagementClient,
    ResourceKind, ScanSummariesOptions, SccError, ValidationError,
};
use scc_auth::{AccessToken, SecretString};
use serde_json::json;

const ACCOUNT: &str = "acc-42";

fn client(server: &MockServer) -> PostureManagementClient {
    PostureManagementClient::builder()
        .base_url(server.base_url())
        .account_id(ACCOUNT)
        .http_config(scc_http::HttpClientConfig::for_testing())
        .build()
        .unwrap()
}

fn token() -> AccessToken {
    AccessToken::bearer("tok-1", Duration::from_secs(600))
}

#[tokio::test]
async fn create_collector_sends_common_headers_and_body() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/alpha/v1.0/collectors")
            .header("authorization", "Bearer tok-1")
            .header("REALM", ACCOUNT)
            .header_exists("transaction-id")
            .header("content-type", "application/json")
            .json_body(json!({
                "collector_name": "test-1",
                "collector_description": "test collector",
                "managed_by": "customer",
                "is_public": true,
                "pass_phrase": "secret"
            }));
        then.status(201)
            .header("content-type", "application/json")
            .json_body(json!({"collector_id": 1417, "display_name": "test-1"}));
    });

    let options = CreateCollectorOptions::new("test-1")
        .description("test collector")
        .managed_by("customer")
        .is_public(true)
        .pass_phrase(SecretString::new("secret"));
    let resp = client(&server)
        .create_collector(&token(), &options)
        .await
        .unwrap();

    mock.assert();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let collector = resp.result().unwrap();
    assert_eq!(collector.collector_id, "1417");
    assert_eq!(collector.display_name.as_deref(), Some("test-1"));
}

#[tokio::test]
async fn every_call_gets_a_fresh_transaction_id() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/alpha/v1.0/profiles");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"profiles": []}));
    });

    let c = client(&server);
    let t = token();
    c.list_profiles(&t).await.unwrap();
    c.list_profiles(&t).await.unwrap();
    mock.assert_calls(2);
}

#[tokio::test]
async fn non_success_status_is_returned_not_raised() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/alpha/v1.0/schemas");
        then.status(400)
            .header("content-type", "application/json")
            .body(r#"{"message":"unknown credential"}"#);
    });

    let options = CreateScopeOptions::new("scope-1", "999", vec!["1".to_owned()]);
    let resp = client(&server)
        .create_scope(&token(), &options)
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.result().is_none());

    let err = resp.into_result().unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    match err {
        SccError::Api { body, .. } => assert!(body.contains("unknown credential")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn expect_status_rejects_unexpected_success_code() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/alpha/v1.0/collectors");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"collector_id": "1"}));
    });

    let resp = client(&server)
        .create_collector(&token(), &CreateCollectorOptions::new("c"))
        .await
        .unwrap();
    let err = resp.expect_status(&[StatusCode::CREATED]).unwrap_err();
    assert!(matches!(err, SccError::Api { status, .. } if status == StatusCode::OK));
}

#[tokio::test]
async fn mismatched_success_body_is_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/alpha/v1.0/schemas");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"scopes": "not-a-list"}"#);
    });

    let err = client(&server).list_scopes(&token()).await.unwrap_err();
    assert!(matches!(err, SccError::Decode { status, .. } if status == StatusCode::OK));
}

#[tokio::test]
async fn create_scope_serializes_references() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/alpha/v1.0/schemas").json_body(json!({
            "scope_name": "scope-1",
            "scope_description": "test scope",
            "collector_ids": ["1417"],
            "credential_id": "88",
            "environment_type": "ibm"
        }));
        then.status(201)
            .header("content-type", "application/json")
            .json_body(json!({"scope_id": 2001, "collector_ids": [1417]}));
    });

    let options = CreateScopeOptions::new("scope-1", "88", vec!["1417".to_owned()])
        .description("test scope")
        .environment_type("ibm");
    let resp = client(&server)
        .create_scope(&token(), &options)
        .await
        .unwrap();

    mock.assert();
    let scope = resp.into_result().unwrap().unwrap();
    assert_eq!(scope.scope_id, "2001");
    assert_eq!(scope.collector_ids, vec!["1417".to_owned()]);
}

#[tokio::test]
async fn create_scope_without_collectors_sends_nothing() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/alpha/v1.0/schemas");
        then.status(201);
    });

    let options = CreateScopeOptions::new("scope-1", "88", Vec::new());
    let err = client(&server)
        .create_scope(&token(), &options)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SccError::Validation(ValidationError::EmptyField("collector_ids"))
    ));
    mock.assert_calls(0);
}

#[tokio::test]
async fn create_credential_uploads_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let cred_path = dir.path().join("credentials.json");
    let pem_path = dir.path().join("key.pem");
    std::fs::File::create(&cred_path)
        .unwrap()
        .write_all(br#"{"type":"ibm_cloud"}"#)
        .unwrap();
    std::fs::write(&pem_path, "-----BEGIN KEY-----").unwrap();

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/alpha/v1.0/credentials")
            .header_exists("transaction-id")
            .body_includes(r#"name="credential_data_file""#)
            .body_includes(r#"filename="credentials.json""#)
            .body_includes(r#"{"type":"ibm_cloud"}"#)
            .body_includes(r#"name="pem_file""#)
            .body_includes(r#"filename="key.pem""#)
            .body_includes("-----BEGIN KEY-----");
        then.status(201)
            .header("content-type", "application/json")
            .json_body(json!({"credential_id": "c-9", "type": "ibm_cloud"}));
    });

    let options = CreateCredentialOptions::new(&cred_path).pem_path(&pem_path);
    let resp = client(&server)
        .create_credential(&token(), &options)
        .await
        .unwrap();

    mock.assert();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let credential = resp.result().unwrap();
    assert_eq!(credential.credential_id, "c-9");
    assert_eq!(credential.credential_type.as_deref(), Some("ibm_cloud"));
}

#[tokio::test]
async fn create_credential_with_missing_file_names_path() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/alpha/v1.0/credentials");
        then.status(201);
    });
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");

    let err = client(&server)
        .create_credential(&token(), &CreateCredentialOptions::new(&missing))
        .await
        .unwrap_err();

    match err {
        SccError::Validation(ValidationError::UnreadableFile { field, path, .. }) => {
            assert_eq!(field, "credential_data_file");
            assert_eq!(path, missing);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    mock.assert_calls(0);
}

#[tokio::test]
async fn list_scopes_finds_created_scope() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/alpha/v1.0/schemas");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "scopes": [
                {"scope_id": "2001", "scope_name": "scope-1", "credential_id": 5645},
                {"scope_id": 7, "scope_name": "other"}
                ]
            }));
    });

    let list = client(&server)
        .list_scopes(&token())
        .await
        .unwrap()
        .into_result()
        .unwrap()
        .unwrap();
    assert_eq!(list.count_of("2001"), 1);
    assert_eq!(list.count_of("7"), 1);
    assert_eq!(list.count_of("3"), 0);
    assert_eq!(list.scopes[0].credential_id.as_deref(), Some("5645"));
}

#[tokio::test]
async fn list_profiles_returns_list() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/alpha/v1.0/profiles");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "profiles": [{"profile_id": 48, "profile_name": "CIS IBM Foundations"}]
            }));
    });

    let resp = client(&server).list_profiles(&token()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let profiles = &resp.result().unwrap().profiles;
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].profile_id, "48");
}

#[tokio::test]
async fn create_discovery_posts_tldiscover_payload() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/alpha/v1.0/schemas/tldiscover")
            .header("REALM", ACCOUNT)
            .json_body(json!({
                "discoveryLevel": 1,
                "gatewayIds": [1417],
                "requestType": "TLDISCOVER",
                "schemaId": 2001
            }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"message": "discovery started"}));
    });

    let request = DiscoveryRequest::new("2001", &["1417"]).unwrap();
    let resp = client(&server)
        .create_discovery(&token(), &request)
        .await
        .unwrap();

    mock.assert();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.result().unwrap()["message"], "discovery started");
}

#[tokio::test]
async fn create_validation_scan_sends_options() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/alpha/v1.0/scans/validation")
            .json_body(json!({
                "scope_id": "2001",
                "profile_id": "48",
                "name": "nightly"
            }));
        then.status(202)
            .header("content-type", "application/json")
            .json_body(json!({"result": true, "message": "scan queued"}));
    });

    let options = CreateValidationScanOptions::new("2001", "48").name("nightly");
    let reply = client(&server)
        .create_validation_scan(&token(), &options)
        .await
        .unwrap()
        .into_result()
        .unwrap()
        .unwrap();

    mock.assert();
    assert_eq!(reply.result, Some(true));
    assert_eq!(reply.message.as_deref(), Some("scan queued"));
}

#[tokio::test]
async fn scan_summaries_passes_query() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/alpha/v1.0/scans/summaries")
            .query_param("scope_id", "1188")
            .query_param("profile_id", "48")
            .query_param("group_profile_id", "1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "summaries": [{"id": 31, "scope_id": "1188", "status": "completed"}]
            }));
    });

    let options = ScanSummariesOptions::new("1188")
        .profile_id("48")
        .group_profile_id("1");
    let list = client(&server)
        .scan_summaries(&token(), &options)
        .await
        .unwrap()
        .into_result()
        .unwrap()
        .unwrap();

    mock.assert();
    assert_eq!(list.summaries.len(), 1);
    assert_eq!(list.summaries[0].scan_id, "31");
}

#[tokio::test]
async fn hard_delete_then_delete_again() {
    let server = MockServer::start();
    let mut first = server.mock(|when, then| {
        when.method(DELETE).path("/alpha/v1.0/collectors/1417");
        then.status(200);
    });

    let c = client(&server);
    let t = token();
    let outcome = c
        .hard_delete(&t, ResourceKind::Collector, "1417")
        .await
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted(StatusCode::OK));
    first.assert();
    first.delete();

    server.mock(|when, then| {
        when.method(DELETE).path("/alpha/v1.0/collectors/1417");
        then.status(404).body(r#"{"message":"not found"}"#);
    });
    let outcome = c
        .hard_delete(&t, ResourceKind::Collector, "1417")
        .await
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::AlreadyAbsent(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn hard_delete_ignores_reply_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(DELETE).path("/alpha/v1.0/collectors/1");
        then.status(200).body("OK");
    });
    server.mock(|when, then| {
        when.method(DELETE).path("/alpha/v1.0/schemas/2");
        then.status(202)
            .header("content-type", "application/json")
            .body("{not json");
    });

    let c = client(&server);
    let t = token();
    assert_eq!(
        c.hard_delete(&t, ResourceKind::Collector, "1").await.unwrap(),
        DeleteOutcome::Deleted(StatusCode::OK)
    );
    assert_eq!(
        c.hard_delete(&t, ResourceKind::Scope, "2").await.unwrap(),
        DeleteOutcome::Deleted(StatusCode::ACCEPTED)
    );
}

#[tokio::test]
async fn hard_delete_server_error_is_api_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(DELETE).path("/alpha/v1.0/schemas/2001");
        then.status(500).body("boom");
    });

    let err = client(&server)
        .hard_delete(&token(), ResourceKind::Scope, "2001")
        .await
        .unwrap_err();
    match err {
        SccError::Api { status, body } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let c = PostureManagementClient::builder()
        .base_url("http://127.0.0.1:1")
        .account_id(ACCOUNT)
        .http_config(scc_http::HttpClientConfig::for_testing())
        .build()
        .unwrap();

    let err = c.list_scopes(&token()).await.unwrap_err();
    assert!(matches!(err, SccError::Transport(ref e) if e.is_transport()));
    assert_eq!(err.status(), None);
}
