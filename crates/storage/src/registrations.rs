//! Registration Store: the `registrations` collection and the seat bookkeeping that keeps
//! `course_offerings.current_employees` in step with it.

use anyhow::{Context, Result};
use chrono::Utc;
use shared::domain::{
    CourseOffering, NewRegistration, Registration, RegistrationRecordId, RegistrationStatus,
};
use sqlx::{sqlite::SqliteRow, Row, Sqlite, Transaction};

use crate::{
    courses::{course_columns, course_from_row},
    Storage,
};

macro_rules! registration_columns {
    () => {
        "id, registration_id, employee_name, email, course_id, status, registered_at"
    };
}

/// Result of trying to take a seat in a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatClaim {
    Claimed(Registration),
    CourseMissing,
    Duplicate,
    CourseFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    /// Employee cancellation: accepted registrations are kept.
    PendingOnly,
    /// Administrative removal regardless of status.
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Missing,
    Rejected(Registration),
    Released {
        registration: Registration,
        /// The course after its counter was decremented; `None` if it no longer exists.
        course: Option<CourseOffering>,
    },
}

impl Storage {
    pub async fn list_registrations(&self) -> Result<Vec<Registration>> {
        let rows = sqlx::query(concat!(
            "SELECT ",
            registration_columns!(),
            " FROM registrations ORDER BY registered_at ASC, registration_id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to list registrations")?;
        rows.iter().map(registration_from_row).collect()
    }

    /// Registrations for one course, ordered by `registration_id`.
    pub async fn list_registrations_for_course(&self, course_id: &str) -> Result<Vec<Registration>> {
        let rows = sqlx::query(concat!(
            "SELECT ",
            registration_columns!(),
            " FROM registrations WHERE course_id = ? ORDER BY registration_id ASC"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list registrations for course")?;
        rows.iter().map(registration_from_row).collect()
    }

    /// Takes a seat and inserts a `PENDING` registration in one transaction.
    ///
    /// Checks run in the order course exists, registration is not a duplicate, course has
    /// room. Nothing is written unless the outcome is [`SeatClaim::Claimed`].
    pub async fn claim_seat(&self, registration: &NewRegistration) -> Result<SeatClaim> {
        let course_id = registration.key.course_id.as_str();
        let registration_id = registration.key.registration_id();
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE course_offerings
             SET current_employees = current_employees + 1
             WHERE course_id = ? AND current_employees + 1 <= max_employees",
        )
        .bind(course_id)
        .execute(&mut *tx)
        .await
        .context("failed to reserve course seat")?
        .rows_affected();

        if claimed == 0 {
            let outcome = if !course_exists(&mut tx, course_id).await? {
                SeatClaim::CourseMissing
            } else if registration_exists(&mut tx, &registration_id, registration).await? {
                SeatClaim::Duplicate
            } else {
                SeatClaim::CourseFull
            };
            tx.rollback().await?;
            return Ok(outcome);
        }

        let row = sqlx::query(concat!(
            "INSERT INTO registrations (id, registration_id, employee_name, email, course_id, status, registered_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT DO NOTHING
             RETURNING ",
            registration_columns!()
        ))
        .bind(RegistrationRecordId::new().to_string())
        .bind(&registration_id)
        .bind(&registration.key.employee_name)
        .bind(&registration.email)
        .bind(course_id)
        .bind(RegistrationStatus::Pending.as_str())
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await
        .context("failed to insert registration")?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(SeatClaim::Duplicate);
        };
        let stored = registration_from_row(&row)?;
        tx.commit().await?;
        Ok(SeatClaim::Claimed(stored))
    }

    /// Deletes a registration and gives its seat back (counter floored at zero) in one
    /// transaction.
    pub async fn release_seat(
        &self,
        registration_id: &str,
        mode: ReleaseMode,
    ) -> Result<ReleaseOutcome> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(concat!(
            "DELETE FROM registrations
             WHERE registration_id = ? AND (? = 0 OR status = 'PENDING')
             RETURNING ",
            registration_columns!()
        ))
        .bind(registration_id)
        .bind(mode == ReleaseMode::PendingOnly)
        .fetch_optional(&mut *tx)
        .await
        .context("failed to delete registration")?;

        let Some(row) = row else {
            let existing = sqlx::query(concat!(
                "SELECT ",
                registration_columns!(),
                " FROM registrations WHERE registration_id = ?"
            ))
            .bind(registration_id)
            .fetch_optional(&mut *tx)
            .await
            .context("failed to load registration")?;
            tx.rollback().await?;
            return match existing {
                Some(row) => Ok(ReleaseOutcome::Rejected(registration_from_row(&row)?)),
                None => Ok(ReleaseOutcome::Missing),
            };
        };
        let registration = registration_from_row(&row)?;

        let course = sqlx::query(concat!(
            "UPDATE course_offerings
             SET current_employees = MAX(current_employees - 1, 0)
             WHERE course_id = ?
             RETURNING ",
            course_columns!()
        ))
        .bind(&registration.course_id)
        .fetch_optional(&mut *tx)
        .await
        .context("failed to release course seat")?;
        let course = course.as_ref().map(course_from_row).transpose()?;

        tx.commit().await?;
        Ok(ReleaseOutcome::Released {
            registration,
            course,
        })
    }

    /// Moves every registration of the course that is not yet `ACCEPTED` to `ACCEPTED`.
    /// Returns the number of registrations that changed.
    pub async fn accept_pending_registrations(&self, course_id: &str) -> Result<u64> {
        let updated = sqlx::query(
            "UPDATE registrations SET status = ? WHERE course_id = ? AND status <> ?",
        )
        .bind(RegistrationStatus::Accepted.as_str())
        .bind(course_id)
        .bind(RegistrationStatus::Accepted.as_str())
        .execute(&self.pool)
        .await
        .context("failed to accept registrations")?
        .rows_affected();
        Ok(updated)
    }
}

async fn course_exists(tx: &mut Transaction<'_, Sqlite>, course_id: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM course_offerings WHERE course_id = ?")
        .bind(course_id)
        .fetch_one(&mut **tx)
        .await?;
    Ok(count > 0)
}

async fn registration_exists(
    tx: &mut Transaction<'_, Sqlite>,
    registration_id: &str,
    registration: &NewRegistration,
) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM registrations
         WHERE registration_id = ? OR (employee_name = ? AND course_id = ?)",
    )
    .bind(registration_id)
    .bind(&registration.key.employee_name)
    .bind(&registration.key.course_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(count > 0)
}

fn registration_from_row(row: &SqliteRow) -> Result<Registration> {
    let id: String = row.try_get("id")?;
    let status: String = row.try_get("status")?;
    Ok(Registration {
        id: id
            .parse()
            .with_context(|| format!("malformed registration id '{id}'"))?,
        registration_id: row.try_get("registration_id")?,
        employee_name: row.try_get("employee_name")?,
        email: row.try_get("email")?,
        course_id: row.try_get("course_id")?,
        status: status.parse()?,
        registered_at: row.try_get("registered_at")?,
    })
}
