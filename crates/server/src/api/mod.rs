use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    middleware::map_response_with_state,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::Value;
use server_api::{
    allot, cancel_registration, create_course, delete_course, list_courses, list_registrations,
    register, remove_registration, MISSING_BODY_PARAMETERS,
};
use shared::{
    domain::{CourseOffering, Registration},
    error::{ApiError, ErrorCode},
    protocol::{
        CourseCreated, CourseDeleted, CreateCourseOfferingRequest, Envelope, RegisterRequest,
        Registered, RegistrationReleased,
    },
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, warn};

use crate::app_state::AppState;

type Rejection = (StatusCode, Json<Envelope<Value>>);
type EnvelopeResult<T> = Result<Json<Envelope<T>>, Rejection>;

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.max_body_bytes;
    Router::new()
        .route("/healthz", get(healthz))
        .route("/courses", get(http_list_courses))
        .route("/add/courseOffering", post(http_create_course))
        .route("/delete/courseOffering/:id", delete(http_delete_course))
        .route("/registrations", get(http_list_registrations))
        .route("/add/register/:course_id", post(http_register))
        .route("/cancel/:registration_id", delete(http_cancel_registration))
        .route("/allot/:course_id", post(http_allot))
        .route(
            "/delete/registration/:registration_id",
            delete(http_remove_registration),
        )
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(map_response_with_state(max_body_bytes, envelope_oversized_body))
        .with_state(state)
}

/// The body limit layer answers oversized `Content-Length` requests itself with a plain-text
/// 413; rewrap those in the failure envelope.
async fn envelope_oversized_body(
    State(max_body_bytes): State<usize>,
    response: Response,
) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE || is_json {
        return response;
    }
    payload_too_large(max_body_bytes).into_response()
}

fn payload_too_large(max_body_bytes: usize) -> Rejection {
    let status = StatusCode::PAYLOAD_TOO_LARGE;
    let err = ApiError::validation(format!("Request body exceeds {max_body_bytes} bytes."));
    (status, Json(Envelope::failure(status.as_u16(), &err)))
}

/// Status for a failed request. Unknown courses during registration are reported as 403;
/// every other lookup miss is a plain 400.
fn status_for(code: ErrorCode, not_found: StatusCode) -> StatusCode {
    match code {
        ErrorCode::Capacity => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => not_found,
        ErrorCode::Validation | ErrorCode::Conflict | ErrorCode::Internal => {
            StatusCode::BAD_REQUEST
        }
    }
}

fn reject(err: ApiError, not_found: StatusCode) -> Rejection {
    let status = status_for(err.code, not_found);
    (status, Json(Envelope::failure(status.as_u16(), &err)))
}

fn bad_request(err: ApiError) -> Rejection {
    reject(err, StatusCode::BAD_REQUEST)
}

fn ok<T>(message: impl Into<String>, data: T) -> Json<Envelope<T>> {
    Json(Envelope::success(StatusCode::OK.as_u16(), message, data))
}

fn json_body<T>(
    body: Result<Json<T>, JsonRejection>,
    max_body_bytes: usize,
) -> Result<T, Rejection> {
    body.map(|Json(value)| value).map_err(|rejection| {
        debug!(%rejection, "rejected request body");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            payload_too_large(max_body_bytes)
        } else {
            bad_request(ApiError::validation(MISSING_BODY_PARAMETERS))
        }
    })
}

async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            warn!(error = %format!("{error:#}"), "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn http_list_courses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CourseOffering>>, Rejection> {
    list_courses(&state.api).await.map(Json).map_err(bad_request)
}

async fn http_create_course(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateCourseOfferingRequest>, JsonRejection>,
) -> EnvelopeResult<CourseCreated> {
    let req = json_body(body, state.max_body_bytes)?;
    let created = create_course(&state.api, &req).await.map_err(bad_request)?;
    Ok(ok("course added successfully", created))
}

async fn http_delete_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> EnvelopeResult<CourseDeleted> {
    let deleted = delete_course(&state.api, &id).await.map_err(bad_request)?;
    let message = match &deleted.course {
        Some(course) => format!("Successfully deleted course offering {}", course.course_id),
        None => format!("No course offering with id: {id}"),
    };
    Ok(ok(message, deleted))
}

async fn http_list_registrations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Registration>>, Rejection> {
    list_registrations(&state.api)
        .await
        .map(Json)
        .map_err(bad_request)
}

async fn http_register(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> EnvelopeResult<Registered> {
    let mut req = json_body(body, state.max_body_bytes)?;
    if req
        .course_id
        .as_deref()
        .map_or(true, |id| id.trim().is_empty())
    {
        req.course_id = Some(course_id);
    }

    let registered = register(&state.api, &req)
        .await
        .map_err(|err| reject(err, StatusCode::FORBIDDEN))?;
    let course_id = req.course_id.unwrap_or_default();
    Ok(ok(
        format!("successfully registered for {course_id}"),
        registered,
    ))
}

async fn http_cancel_registration(
    State(state): State<Arc<AppState>>,
    Path(registration_id): Path<String>,
) -> EnvelopeResult<RegistrationReleased> {
    let released = cancel_registration(&state.api, &registration_id)
        .await
        .map_err(bad_request)?;
    let course = released
        .course_name
        .clone()
        .unwrap_or_else(|| released.course_id.clone());
    Ok(ok(
        format!("Successfully cancelled registration for {course}"),
        released,
    ))
}

async fn http_allot(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> EnvelopeResult<Vec<Registration>> {
    let registrations = allot(&state.api, &course_id).await.map_err(bad_request)?;
    Ok(ok(
        "successfully alloted course to registered employees.",
        registrations,
    ))
}

async fn http_remove_registration(
    State(state): State<Arc<AppState>>,
    Path(registration_id): Path<String>,
) -> EnvelopeResult<RegistrationReleased> {
    let removed = remove_registration(&state.api, &registration_id)
        .await
        .map_err(bad_request)?;
    Ok(ok(
        format!(
            "Successfully deleted registration with id: {}",
            removed.registration_id
        ),
        removed,
    ))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
