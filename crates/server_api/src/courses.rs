use shared::{
    domain::{CourseKey, CourseOffering, CourseOfferingId, NewCourseOffering},
    error::ApiError,
    protocol::{CourseCreated, CourseDeleted, CreateCourseOfferingRequest},
};
use tracing::info;

use crate::{internal, required, ApiContext, MISSING_BODY_PARAMETERS};

pub async fn create_course(
    ctx: &ApiContext,
    req: &CreateCourseOfferingRequest,
) -> Result<CourseCreated, ApiError> {
    let (
        Some(course_name),
        Some(instructor_name),
        Some(start_date),
        Some(min_employees),
        Some(max_employees),
    ) = (
        required(req.course_name.as_deref()),
        required(req.instructor_name.as_deref()),
        required(req.start_date.as_deref()),
        req.min_employees,
        req.max_employees,
    )
    else {
        return Err(ApiError::validation(MISSING_BODY_PARAMETERS));
    };

    let offering = NewCourseOffering {
        key: CourseKey::new(course_name, instructor_name),
        start_date: start_date.to_string(),
        min_employees,
        max_employees,
    };
    let course_id = offering.key.course_id();

    if ctx
        .storage
        .course_by_course_id(&course_id)
        .await
        .map_err(internal)?
        .is_some()
    {
        return Err(ApiError::conflict("Course already added to database."));
    }

    // The insert re-checks uniqueness, so a concurrent create still lands here.
    let course = ctx
        .storage
        .create_course_offering(&offering)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::conflict("Course already added to database."))?;

    info!(course_id = %course.course_id, id = %course.id, max_employees, "course offering created");
    Ok(CourseCreated {
        course_id: course.course_id,
        id: course.id,
    })
}

pub async fn list_courses(ctx: &ApiContext) -> Result<Vec<CourseOffering>, ApiError> {
    ctx.storage.list_course_offerings().await.map_err(internal)
}

/// Deletes by store id and cascades the course's registrations. An unknown or malformed id
/// is not an error: the result carries `course: None`.
pub async fn delete_course(ctx: &ApiContext, id: &str) -> Result<CourseDeleted, ApiError> {
    let Ok(id) = id.parse::<CourseOfferingId>() else {
        return Ok(CourseDeleted {
            course: None,
            deleted_registrations: 0,
        });
    };

    let deleted = ctx
        .storage
        .delete_course_offering(id)
        .await
        .map_err(internal)?;

    Ok(match deleted {
        Some((course, deleted_registrations)) => {
            info!(
                course_id = %course.course_id,
                %id,
                deleted_registrations,
                "course offering deleted"
            );
            CourseDeleted {
                course: Some(course),
                deleted_registrations,
            }
        }
        None => CourseDeleted {
            course: None,
            deleted_registrations: 0,
        },
    })
}
