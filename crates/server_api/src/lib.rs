use shared::error::ApiError;
use storage::Storage;
use tracing::error;

mod courses;
mod registrations;

pub use courses::{create_course, delete_course, list_courses};
pub use registrations::{
    allot, cancel_registration, list_registrations, register, remove_registration,
};

pub const MISSING_BODY_PARAMETERS: &str = "Request body missing required parameters.";
pub const MISSING_PARAMETERS: &str = "Missing parameters.";

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

impl ApiContext {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

/// Present means non-null and not blank. The value is returned as given, keys are derived
/// from it verbatim.
fn required(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %format!("{err:#}"), "storage operation failed");
    ApiError::internal("internal storage error")
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
