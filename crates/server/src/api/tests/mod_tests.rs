use super::*;
use axum::{
    body::{self, Body},
    http::Request,
    response::Response,
};
use server_api::ApiContext;
use storage::Storage;
use tower::ServiceExt;

async fn test_app() -> (Router, Storage) {
    test_app_with_body_limit(16 * 1024).await
}

async fn test_app_with_body_limit(max_body_bytes: usize) -> (Router, Storage) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let app = build_router(Arc::new(AppState {
        api: ApiContext::new(storage.clone()),
        max_body_bytes,
    }));
    (app, storage)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn json_of(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    (status, json_of(response).await)
}

fn course_body(max_employees: i64) -> Value {
    serde_json::json!({
        "course_name": "Rust101",
        "instructor_name": "Amy",
        "start_date": "2025-01-01",
        "min_employees": 1,
        "max_employees": max_employees,
    })
}

fn register_body(employee: &str) -> Value {
    serde_json::json!({
        "employee_name": employee,
        "email": format!("{}@x.com", employee.to_lowercase()),
        "course_id": "OFFERING-Rust101-Amy",
    })
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _storage) = test_app().await;
    let response = app
        .oneshot(empty_request("GET", "/healthz"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn create_course_returns_envelope_and_rejects_duplicate() {
    let (app, _storage) = test_app().await;
    let (status, body) = send(
        &app,
        json_request("POST", "/add/courseOffering", course_body(1)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(body["message"], "course added successfully");
    assert_eq!(body["data"]["success"]["course_id"], "OFFERING-Rust101-Amy");

    let (status, body) = send(
        &app,
        json_request("POST", "/add/courseOffering", course_body(1)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["data"]["failure"]["message"],
        "Course already added to database."
    );

    let (status, courses) = send(&app, empty_request("GET", "/courses")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(courses.as_array().expect("array").len(), 1);
    assert_eq!(courses[0]["current_employees"], 0);
}

#[tokio::test]
async fn missing_or_malformed_body_is_a_validation_failure() {
    let (app, _storage) = test_app().await;
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/add/courseOffering",
            serde_json::json!({ "course_name": "Rust101" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], MISSING_BODY_PARAMETERS);

    let (status, body) = send(&app, empty_request("POST", "/add/courseOffering")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["failure"]["message"], MISSING_BODY_PARAMETERS);
}

#[tokio::test]
async fn register_route_maps_not_found_and_capacity_to_forbidden() {
    let (app, _storage) = test_app().await;
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/add/register/OFFERING-Rust101-Amy",
            register_body("Bob"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Course not in database.");

    send(
        &app,
        json_request("POST", "/add/courseOffering", course_body(1)),
    )
    .await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/add/register/OFFERING-Rust101-Amy",
            register_body("Bob"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["success"]["registration_id"],
        "Bob-OFFERING-Rust101-Amy"
    );
    assert_eq!(body["data"]["success"]["status"], "PENDING");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/add/register/OFFERING-Rust101-Amy",
            register_body("Cara"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], 403);
    assert_eq!(body["message"], "Maximum employees reached.");
}

#[tokio::test]
async fn register_route_falls_back_to_path_course_id() {
    let (app, storage) = test_app().await;
    send(
        &app,
        json_request("POST", "/add/courseOffering", course_body(2)),
    )
    .await;

    let (status, _body) = send(
        &app,
        json_request(
            "POST",
            "/add/register/OFFERING-Rust101-Amy",
            serde_json::json!({ "employee_name": "Bob", "email": "b@x.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let registrations = storage.list_registrations().await.expect("list");
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].registration_id, "Bob-OFFERING-Rust101-Amy");
}

#[tokio::test]
async fn cancel_allot_and_force_remove_routes() {
    let (app, storage) = test_app().await;
    send(
        &app,
        json_request("POST", "/add/courseOffering", course_body(3)),
    )
    .await;
    for employee in ["Bob", "Cara"] {
        send(
            &app,
            json_request(
                "POST",
                "/add/register/OFFERING-Rust101-Amy",
                register_body(employee),
            ),
        )
        .await;
    }

    let (status, body) = send(
        &app,
        empty_request("DELETE", "/cancel/Bob-OFFERING-Rust101-Amy"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Successfully cancelled registration for Rust101"
    );
    assert_eq!(body["data"]["success"]["status"], "CANCEL_ACCEPTED");

    let (status, body) = send(&app, empty_request("POST", "/allot/OFFERING-Rust101-Amy")).await;
    assert_eq!(status, StatusCode::OK);
    let allotted = body["data"]["success"].as_array().expect("array");
    assert_eq!(allotted.len(), 1);
    assert_eq!(allotted[0]["status"], "ACCEPTED");

    let (status, body) = send(
        &app,
        empty_request("DELETE", "/cancel/Cara-OFFERING-Rust101-Amy"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["failure"]["status"], "CANCEL_REJECTED");
    assert_eq!(
        body["data"]["failure"]["registration_id"],
        "Cara-OFFERING-Rust101-Amy"
    );

    let (status, body) = send(
        &app,
        empty_request("DELETE", "/delete/registration/Cara-OFFERING-Rust101-Amy"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["success"]["status"], "DELETED");

    let (status, body) = send(
        &app,
        empty_request("DELETE", "/delete/registration/Cara-OFFERING-Rust101-Amy"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Registration does not exist in database.");

    let course = storage
        .course_by_course_id("OFFERING-Rust101-Amy")
        .await
        .expect("load")
        .expect("course");
    assert_eq!(course.current_employees, 0);
}

#[tokio::test]
async fn delete_course_route_cascades_registrations() {
    let (app, _storage) = test_app().await;
    let (_, created) = send(
        &app,
        json_request("POST", "/add/courseOffering", course_body(3)),
    )
    .await;
    let id = created["data"]["success"]["id"]
        .as_str()
        .expect("store id")
        .to_string();
    send(
        &app,
        json_request(
            "POST",
            "/add/register/OFFERING-Rust101-Amy",
            register_body("Bob"),
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        empty_request("DELETE", &format!("/delete/courseOffering/{id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["success"]["deleted_registrations"], 1);

    let (_, registrations) = send(&app, empty_request("GET", "/registrations")).await;
    assert!(registrations.as_array().expect("array").is_empty());

    let (status, body) = send(
        &app,
        empty_request("DELETE", &format!("/delete/courseOffering/{id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["success"]["course"].is_null());
}

#[tokio::test]
async fn register_route_uses_path_when_body_course_id_is_blank() {
    let (app, storage) = test_app().await;
    send(
        &app,
        json_request("POST", "/add/courseOffering", course_body(2)),
    )
    .await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/add/register/OFFERING-Rust101-Amy",
            serde_json::json!({ "employee_name": "Bob", "email": "b@x.com", "course_id": "  " }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "successfully registered for OFFERING-Rust101-Amy");

    let registrations = storage.list_registrations().await.expect("list");
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].course_id, "OFFERING-Rust101-Amy");
}

#[tokio::test]
async fn oversized_body_with_content_length_gets_failure_envelope() {
    let (app, _storage) = test_app_with_body_limit(64).await;
    let payload = serde_json::json!({ "course_name": "x".repeat(256) }).to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/add/courseOffering")
        .header("content-type", "application/json")
        .header("content-length", payload.len().to_string())
        .body(Body::from(payload))
        .expect("request");

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["status"], 413);
    assert_eq!(
        body["data"]["failure"]["message"],
        "Request body exceeds 64 bytes."
    );
}

#[tokio::test]
async fn oversized_streamed_body_gets_failure_envelope() {
    let (app, _storage) = test_app_with_body_limit(64).await;
    let payload = serde_json::json!({ "course_name": "x".repeat(256) });

    let (status, body) = send(
        &app,
        json_request("POST", "/add/courseOffering", payload),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["message"], "Request body exceeds 64 bytes.");
}
