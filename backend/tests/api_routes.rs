use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use portal_backend::{app::build_router, models::identity::UserRole};
use serde_json::{json, Value};
use tower::ServiceExt;

mod support;
use support::{bearer_for, caller, environment, gke_configuration, resource_type, test_state};

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, bearer);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_is_public() {
    let (state, _store) = test_state();
    let app = build_router(state);

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (state, _store) = test_state();
    let app = build_router(state);

    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/requests/{id}/submit"].is_object());
}

#[tokio::test]
async fn api_requires_a_bearer_token() {
    let (state, _store) = test_state();
    let app = build_router(state);

    let (status, body) = send(&app, Method::GET, "/api/requests", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], json!("UNAUTHORIZED"));

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/requests",
        Some("Bearer not-a-jwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_echoes_the_token_identity() {
    let (state, _store) = test_state();
    let app = build_router(state);
    let approver = caller(UserRole::Approver);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/auth/me",
        Some(&bearer_for(&approver)),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], json!(approver.user_id));
    assert_eq!(body["role"], json!("approver"));
}

#[tokio::test]
async fn catalog_lookups_accept_names() {
    let (state, _store) = test_state();
    let app = build_router(state);
    let bearer = bearer_for(&caller(UserRole::User));

    let (status, body) = send(&app, Method::GET, "/api/environments", Some(&bearer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(3));

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/resource-types/cloudsql/schema",
        Some(&bearer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["required"], json!(["tier", "disk_size_gb"]));

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/environments/qa",
        Some(&bearer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn request_round_trip_over_http() {
    let (state, store) = test_state();
    let app = build_router(state);
    let owner = caller(UserRole::User);
    let approver = caller(UserRole::Approver);
    let owner_bearer = bearer_for(&owner);
    let approver_bearer = bearer_for(&approver);

    let payload = json!({
        "title": "Prod cluster",
        "environment_id": environment(&store, "prod").await.id,
        "resource_type_id": resource_type(&store, "gke").await.id,
        "configuration": gke_configuration(),
        "priority": "high"
    });
    let (status, created) = send(
        &app,
        Method::POST,
        "/api/requests",
        Some(&owner_bearer),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], json!("draft"));
    assert_eq!(created["priority"], json!("high"));
    assert!(created.get("deleted_at").is_none());
    let id = created["id"].as_str().expect("id").to_string();

    let (status, submitted) = send(
        &app,
        Method::POST,
        &format!("/api/requests/{id}/submit"),
        Some(&owner_bearer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], json!("pending"));

    let (status, pending) = send(
        &app,
        Method::GET,
        "/api/approvals",
        Some(&approver_bearer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let approvals = pending.as_array().expect("approval list");
    assert_eq!(approvals.len(), 1);
    let approval_id = approvals[0]["id"].as_str().expect("approval id").to_string();

    // No body at all is the same as an empty comment.
    let (status, decided) = send(
        &app,
        Method::POST,
        &format!("/api/approvals/{approval_id}/approve"),
        Some(&approver_bearer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["status"], json!("approved"));

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/approvals/{approval_id}/reject"),
        Some(&approver_bearer),
        Some(json!({ "comment": "too late" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_STATE"));

    let (status, fetched) = send(
        &app,
        Method::GET,
        &format!("/api/requests/{id}"),
        Some(&owner_bearer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], json!("approved"));

    let (status, deleted) = send(
        &app,
        Method::DELETE,
        &format!("/api/requests/{id}"),
        Some(&owner_bearer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["outcome"], json!("cancelled"));
}

#[tokio::test]
async fn create_with_blank_title_is_a_validation_error() {
    let (state, store) = test_state();
    let app = build_router(state);
    let bearer = bearer_for(&caller(UserRole::User));

    let payload = json!({
        "title": "",
        "environment_id": environment(&store, "dev").await.id,
        "resource_type_id": resource_type(&store, "gke").await.id,
        "configuration": gke_configuration()
    });
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/requests",
        Some(&bearer),
        Some(payload),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn role_gates_protect_approvals_and_audit_logs() {
    let (state, _store) = test_state();
    let app = build_router(state);
    let user_bearer = bearer_for(&caller(UserRole::User));
    let approver_bearer = bearer_for(&caller(UserRole::Approver));
    let admin_bearer = bearer_for(&caller(UserRole::Admin));

    let (status, body) = send(&app, Method::GET, "/api/approvals", Some(&user_bearer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!("FORBIDDEN"));

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/admin/audit-logs",
        Some(&approver_bearer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/admin/audit-logs",
        Some(&admin_bearer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_array());
}

#[tokio::test]
async fn malformed_decision_body_is_a_bad_request() {
    let (state, _store) = test_state();
    let app = build_router(state);
    let bearer = bearer_for(&caller(UserRole::Approver));
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/approvals/{}/approve", uuid::Uuid::new_v4()))
        .header(header::AUTHORIZATION, bearer)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
