use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{CourseOffering, CourseOfferingId, RegistrationStatus},
    error::ApiError,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCourseOfferingRequest {
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub instructor_name: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub min_employees: Option<i64>,
    #[serde(default)]
    pub max_employees: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub course_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCreated {
    pub course_id: String,
    pub id: CourseOfferingId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDeleted {
    pub course: Option<CourseOffering>,
    pub deleted_registrations: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registered {
    pub registration_id: String,
    pub status: RegistrationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseStatus {
    CancelAccepted,
    CancelRejected,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationReleased {
    pub registration_id: String,
    pub course_id: String,
    pub status: ReleaseStatus,
    /// Name of the course whose seat was released; `None` when the course is gone.
    /// Only used to word the response message.
    #[serde(skip)]
    pub course_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeData<T> {
    Success(T),
    Failure(Value),
}

/// `{status, message, data: {success | failure}}` body shared by every mutating route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub message: String,
    pub data: EnvelopeData<T>,
}

impl<T> Envelope<T> {
    pub fn success(status: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            status,
            message: message.into(),
            data: EnvelopeData::Success(data),
        }
    }
}

impl Envelope<Value> {
    pub fn failure(status: u16, error: &ApiError) -> Self {
        Self {
            status,
            message: error.message.clone(),
            data: EnvelopeData::Failure(error.failure_body()),
        }
    }
}
