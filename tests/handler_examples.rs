mod common;

use axum::body::Bytes;
use axum::http::StatusCode;
use chrono::{TimeDelta, Utc};
use serde_json::{Value, json};
use std::time::Duration;

use common::TestApp;

async fn create_example(app: &TestApp, auth: &str, title: &str) -> i64 {
    let response = app
        .server
        .post("/api/v1/examples")
        .add_header("Authorization", auth.to_string())
        .json(&json!({ "title": title }))
        .await;

    response.assert_status_ok();
    response.json::<Value>()["data"]["id"].as_i64().unwrap()
}

// ─── END TO END ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_owner_flow_end_to_end() {
    let app = common::spawn_app();
    let u1 = common::bearer(&app.state, 1, "u1");
    let u2 = common::bearer(&app.state, 2, "u2");

    let response = app
        .server
        .post("/api/v1/examples")
        .add_header("Authorization", u1.clone())
        .json(&json!({ "title": "report", "description": "draft", "sort": 3 }))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["created_by"], "u1");
    assert_eq!(body["data"]["sort_order"], 3);
    assert_eq!(body["data"]["status"], 1);
    let id = body["data"]["id"].as_i64().unwrap();

    let response = app
        .server
        .put(&format!("/api/v1/examples/{id}"))
        .add_header("Authorization", u2.clone())
        .json(&json!({ "title": "hijacked" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["code"], 20004);

    let response = app
        .server
        .put(&format!("/api/v1/examples/{id}"))
        .add_header("Authorization", u1.clone())
        .json(&json!({ "title": "final report" }))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["data"]["title"], "final report");
    assert_eq!(body["data"]["description"], "draft");

    let response = app
        .server
        .delete(&format!("/api/v1/examples/{id}"))
        .add_header("Authorization", u2)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .delete(&format!("/api/v1/examples/{id}"))
        .add_header("Authorization", u1.clone())
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["deleted"], true);

    let response = app.server.get(&format!("/api/v1/examples/{id}")).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], 40001);

    let stored = app
        .state
        .example_service
        .get_including_deleted(id)
        .await
        .unwrap();
    assert!(stored.is_deleted());
    assert_eq!(stored.title, "final report");

    let response = app
        .server
        .delete(&format!("/api/v1/examples/{id}"))
        .add_header("Authorization", u1)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_may_modify_any_record() {
    let app = common::spawn_app();
    let owner = common::bearer(&app.state, 1, "u1");
    let admin = common::bearer(&app.state, 99, "admin");

    let id = create_example(&app, &owner, "owned by u1").await;

    let response = app
        .server
        .put(&format!("/api/v1/examples/{id}"))
        .add_header("Authorization", admin.clone())
        .json(&json!({ "status": 0 }))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["data"]["status"], 0);
    assert_eq!(body["data"]["created_by"], "u1");

    app.server
        .delete(&format!("/api/v1/examples/{id}"))
        .add_header("Authorization", admin)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_update_missing_record_is_not_found() {
    let app = common::spawn_app();
    let auth = common::bearer(&app.state, 1, "u1");

    let response = app
        .server
        .put("/api/v1/examples/4242")
        .add_header("Authorization", auth)
        .json(&json!({ "title": "x" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

// ─── READ ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reads_do_not_require_token() {
    let app = common::spawn_app();
    let auth = common::bearer(&app.state, 1, "u1");
    let id = create_example(&app, &auth, "public").await;

    let response = app.server.get(&format!("/api/v1/examples/{id}")).await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["data"]["title"], "public");
    assert!(body["data"].get("deleted_at").is_none());

    app.server.get("/api/v1/examples").await.assert_status_ok();
}

#[tokio::test]
async fn test_pagination_pages_are_disjoint_and_total_is_exact() {
    let app = common::spawn_app();
    let auth = common::bearer(&app.state, 1, "u1");
    for i in 0..5 {
        create_example(&app, &auth, &format!("item {i}")).await;
    }

    let page1 = app.server.get("/api/v1/examples?page=1&size=2").await.json::<Value>();
    let page2 = app.server.get("/api/v1/examples?page=2&size=2").await.json::<Value>();
    let page3 = app.server.get("/api/v1/examples?page=3&size=2").await.json::<Value>();

    let ids = |page: &Value| -> Vec<i64> {
        page["data"]["list"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_i64().unwrap())
            .collect()
    };

    let (ids1, ids2, ids3) = (ids(&page1), ids(&page2), ids(&page3));
    assert_eq!(ids1.len(), 2);
    assert_eq!(ids2.len(), 2);
    assert_eq!(ids3.len(), 1);
    assert!(ids1.iter().all(|id| !ids2.contains(id)));

    for page in [&page1, &page2, &page3] {
        assert_eq!(page["data"]["total"], 5);
        assert_eq!(page["data"]["size"], 2);
    }
    assert_eq!(page2["data"]["page"], 2);
}

#[tokio::test]
async fn test_page_past_end_is_empty_with_true_total() {
    let app = common::spawn_app();
    let auth = common::bearer(&app.state, 1, "u1");
    create_example(&app, &auth, "only").await;

    let body = app
        .server
        .get("/api/v1/examples?page=50&size=10")
        .await
        .json::<Value>();

    assert_eq!(body["data"]["list"], json!([]));
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_bad_pagination_falls_back_to_defaults() {
    let app = common::spawn_app();

    let response = app.server.get("/api/v1/examples?page=abc&size=1000").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["size"], 10);
}

#[tokio::test]
async fn test_deleted_records_leave_the_list() {
    let app = common::spawn_app();
    let auth = common::bearer(&app.state, 1, "u1");
    let keep = create_example(&app, &auth, "keep").await;
    let drop = create_example(&app, &auth, "drop").await;

    app.server
        .delete(&format!("/api/v1/examples/{drop}"))
        .add_header("Authorization", auth)
        .await
        .assert_status_ok();

    let body = app.server.get("/api/v1/examples").await.json::<Value>();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["list"][0]["id"], keep);
}

// ─── INPUT ERRORS ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_empty_title_is_validation_error() {
    let app = common::spawn_app();
    let auth = common::bearer(&app.state, 1, "u1");

    let response = app
        .server
        .post("/api/v1/examples")
        .add_header("Authorization", auth)
        .json(&json!({ "title": "" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["code"], 10003);
    assert!(body["message"].as_str().unwrap().starts_with("Validation failed"));
}

#[tokio::test]
async fn test_out_of_range_status_is_validation_error() {
    let app = common::spawn_app();
    let auth = common::bearer(&app.state, 1, "u1");

    let response = app
        .server
        .post("/api/v1/examples")
        .add_header("Authorization", auth)
        .json(&json!({ "title": "x", "status": 5 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], 10003);
}

#[tokio::test]
async fn test_malformed_json_is_bind_error() {
    let app = common::spawn_app();
    let auth = common::bearer(&app.state, 1, "u1");

    let response = app
        .server
        .post("/api/v1/examples")
        .add_header("Authorization", auth)
        .bytes(Bytes::from_static(b"{\"title\": "))
        .content_type("application/json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], 10002);
}

#[tokio::test]
async fn test_non_numeric_id_is_bind_error() {
    let app = common::spawn_app();

    for path in ["/api/v1/examples/abc", "/api/v1/examples/0", "/api/v1/examples/-3"] {
        let response = app.server.get(path).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["code"], 10002, "path {path}");
    }
}

// ─── AUTHENTICATION ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let app = common::spawn_app();

    let response = app
        .server
        .post("/api/v1/examples")
        .json(&json!({ "title": "x" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["code"], 20003);
    assert_eq!(response.header("www-authenticate"), "Bearer");
}

#[tokio::test]
async fn test_wrong_scheme_and_bad_tokens_are_invalid_credentials() {
    let app = common::spawn_app();
    let expired = common::bearer_issued_at(
        &app.state,
        1,
        "u1",
        Duration::from_secs(60),
        Utc::now() - TimeDelta::hours(2),
    );

    let mut tampered = common::bearer(&app.state, 1, "u1");
    tampered.push('x');

    for header in [
        "Basic dTE6cGFzcw==".to_string(),
        "Bearer not-a-token".to_string(),
        expired,
        tampered,
    ] {
        let response = app
            .server
            .delete("/api/v1/examples/1")
            .add_header("Authorization", header.clone())
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["code"], 20001, "header {header}");
    }
}

#[tokio::test]
async fn test_token_from_other_secret_is_rejected() {
    let app = common::spawn_app();
    let mut config = common::test_config();
    config.jwt_secret = "some-other-secret".to_string();
    let (other, _) = common::create_test_state(config);

    let response = app
        .server
        .post("/api/v1/examples")
        .add_header("Authorization", common::bearer(&other, 1, "u1"))
        .json(&json!({ "title": "x" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["code"], 20001);
}

#[tokio::test]
async fn test_unknown_path_is_enveloped_not_found() {
    let app = common::spawn_app();

    let response = app.server.get("/api/v1/nothing-here").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], 40001);
}
