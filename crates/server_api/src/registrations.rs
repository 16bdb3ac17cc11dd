use shared::{
    domain::{NewRegistration, Registration, RegistrationKey},
    error::ApiError,
    protocol::{Registered, RegisterRequest, RegistrationReleased, ReleaseStatus},
};
use storage::{ReleaseMode, ReleaseOutcome, SeatClaim};
use tracing::{info, warn};

use crate::{internal, required, ApiContext, MISSING_BODY_PARAMETERS, MISSING_PARAMETERS};

pub async fn register(ctx: &ApiContext, req: &RegisterRequest) -> Result<Registered, ApiError> {
    let (Some(employee_name), Some(email), Some(course_id)) = (
        required(req.employee_name.as_deref()),
        required(req.email.as_deref()),
        required(req.course_id.as_deref()),
    ) else {
        return Err(ApiError::validation(MISSING_BODY_PARAMETERS));
    };

    let registration = NewRegistration {
        key: RegistrationKey::new(employee_name, course_id),
        email: email.to_string(),
    };

    match ctx
        .storage
        .claim_seat(&registration)
        .await
        .map_err(internal)?
    {
        SeatClaim::Claimed(stored) => {
            info!(
                registration_id = %stored.registration_id,
                course_id = %stored.course_id,
                "registration created"
            );
            Ok(Registered {
                registration_id: stored.registration_id,
                status: stored.status,
            })
        }
        SeatClaim::CourseMissing => Err(ApiError::not_found("Course not in database.")),
        SeatClaim::Duplicate => Err(ApiError::conflict(
            "Registration already added to database.",
        )),
        SeatClaim::CourseFull => {
            warn!(%course_id, employee_name, "registration rejected: course full");
            Err(ApiError::capacity("Maximum employees reached."))
        }
    }
}

pub async fn list_registrations(ctx: &ApiContext) -> Result<Vec<Registration>, ApiError> {
    ctx.storage.list_registrations().await.map_err(internal)
}

/// Employee cancellation; only `PENDING` registrations can be cancelled.
pub async fn cancel_registration(
    ctx: &ApiContext,
    registration_id: &str,
) -> Result<RegistrationReleased, ApiError> {
    release(ctx, registration_id, ReleaseMode::PendingOnly).await
}

/// Administrative removal regardless of status.
pub async fn remove_registration(
    ctx: &ApiContext,
    registration_id: &str,
) -> Result<RegistrationReleased, ApiError> {
    release(ctx, registration_id, ReleaseMode::Any).await
}

async fn release(
    ctx: &ApiContext,
    registration_id: &str,
    mode: ReleaseMode,
) -> Result<RegistrationReleased, ApiError> {
    let Some(registration_id) = required(Some(registration_id)) else {
        return Err(ApiError::validation(MISSING_PARAMETERS));
    };

    match ctx
        .storage
        .release_seat(registration_id, mode)
        .await
        .map_err(internal)?
    {
        ReleaseOutcome::Missing => Err(ApiError::not_found(
            "Registration does not exist in database.",
        )),
        ReleaseOutcome::Rejected(registration) => Err(ApiError::conflict(
            "Course already alloted to given registration. Cancellation not possible.",
        )
        .with_failure(serde_json::json!({
            "registration_id": registration.registration_id,
            "course_id": registration.course_id,
            "status": ReleaseStatus::CancelRejected,
        }))),
        ReleaseOutcome::Released {
            registration,
            course,
        } => {
            let status = match mode {
                ReleaseMode::PendingOnly => ReleaseStatus::CancelAccepted,
                ReleaseMode::Any => ReleaseStatus::Deleted,
            };
            info!(
                registration_id = %registration.registration_id,
                course_id = %registration.course_id,
                ?status,
                current_employees = course.as_ref().map(|c| c.current_employees),
                "registration released"
            );
            Ok(RegistrationReleased {
                registration_id: registration.registration_id,
                course_id: registration.course_id,
                status,
                course_name: course.map(|c| c.course_name),
            })
        }
    }
}

/// Accepts every registration of the course that is not yet `ACCEPTED` and returns the
/// course's registrations as stored after the update.
pub async fn allot(ctx: &ApiContext, course_id: &str) -> Result<Vec<Registration>, ApiError> {
    let Some(course_id) = required(Some(course_id)) else {
        return Err(ApiError::validation(MISSING_PARAMETERS));
    };

    let accepted = ctx
        .storage
        .accept_pending_registrations(course_id)
        .await
        .map_err(internal)?;
    info!(%course_id, accepted, "allotment completed");

    ctx.storage
        .list_registrations_for_course(course_id)
        .await
        .map_err(internal)
}
