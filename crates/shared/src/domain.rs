use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

id_newtype!(CourseOfferingId);
id_newtype!(RegistrationRecordId);

pub const COURSE_ID_PREFIX: &str = "OFFERING";

/// Natural key of a course offering: one offering per course name and instructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourseKey {
    pub course_name: String,
    pub instructor_name: String,
}

impl CourseKey {
    pub fn new(course_name: impl Into<String>, instructor_name: impl Into<String>) -> Self {
        Self {
            course_name: course_name.into(),
            instructor_name: instructor_name.into(),
        }
    }

    /// `OFFERING-<course_name>-<instructor_name>`
    pub fn course_id(&self) -> String {
        format!(
            "{COURSE_ID_PREFIX}-{}-{}",
            self.course_name, self.instructor_name
        )
    }
}

/// Natural key of a registration: one registration per employee and course.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistrationKey {
    pub employee_name: String,
    pub course_id: String,
}

impl RegistrationKey {
    pub fn new(employee_name: impl Into<String>, course_id: impl Into<String>) -> Self {
        Self {
            employee_name: employee_name.into(),
            course_id: course_id.into(),
        }
    }

    /// `<employee_name>-<course_id>`
    pub fn registration_id(&self) -> String {
        format!("{}-{}", self.employee_name, self.course_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Pending,
    Accepted,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown registration status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for RegistrationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ACCEPTED" => Ok(Self::Accepted),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOffering {
    pub id: CourseOfferingId,
    pub course_id: String,
    pub course_name: String,
    pub instructor_name: String,
    pub start_date: String,
    pub min_employees: i64,
    pub max_employees: i64,
    pub current_employees: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationRecordId,
    pub registration_id: String,
    pub employee_name: String,
    pub email: String,
    pub course_id: String,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
}

/// Validated input for a new course offering.
#[derive(Debug, Clone)]
pub struct NewCourseOffering {
    pub key: CourseKey,
    pub start_date: String,
    pub min_employees: i64,
    pub max_employees: i64,
}

/// Validated input for a new registration.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub key: RegistrationKey,
    pub email: String,
}
