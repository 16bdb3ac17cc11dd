//! Course Store: the `course_offerings` collection.

use anyhow::{Context, Result};
use chrono::Utc;
use shared::domain::{CourseOffering, CourseOfferingId, NewCourseOffering};
use sqlx::{sqlite::SqliteRow, Row};

use crate::Storage;

macro_rules! course_columns {
    () => {
        "id, course_id, course_name, instructor_name, start_date, min_employees, max_employees, current_employees, created_at"
    };
}
pub(crate) use course_columns;

impl Storage {
    /// Inserts a new offering with `current_employees = 0`.
    ///
    /// Returns `None` when an offering with the same derived `course_id` (or the same
    /// course name and instructor) already exists.
    pub async fn create_course_offering(
        &self,
        offering: &NewCourseOffering,
    ) -> Result<Option<CourseOffering>> {
        let row = sqlx::query(concat!(
            "INSERT INTO course_offerings (id, course_id, course_name, instructor_name, start_date, min_employees, max_employees, current_employees, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)
             ON CONFLICT DO NOTHING
             RETURNING ",
            course_columns!()
        ))
        .bind(CourseOfferingId::new().to_string())
        .bind(offering.key.course_id())
        .bind(&offering.key.course_name)
        .bind(&offering.key.instructor_name)
        .bind(&offering.start_date)
        .bind(offering.min_employees)
        .bind(offering.max_employees)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .context("failed to insert course offering")?;

        row.as_ref().map(course_from_row).transpose()
    }

    pub async fn list_course_offerings(&self) -> Result<Vec<CourseOffering>> {
        let rows = sqlx::query(concat!(
            "SELECT ",
            course_columns!(),
            " FROM course_offerings ORDER BY created_at ASC, course_id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to list course offerings")?;
        rows.iter().map(course_from_row).collect()
    }

    pub async fn course_by_course_id(&self, course_id: &str) -> Result<Option<CourseOffering>> {
        let row = sqlx::query(concat!(
            "SELECT ",
            course_columns!(),
            " FROM course_offerings WHERE course_id = ?"
        ))
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to load course offering")?;
        row.as_ref().map(course_from_row).transpose()
    }

    /// Deletes the offering and every registration referencing its `course_id` in one
    /// transaction. Returns the removed offering and the number of cascaded registrations,
    /// or `None` when no offering has this id.
    pub async fn delete_course_offering(
        &self,
        id: CourseOfferingId,
    ) -> Result<Option<(CourseOffering, u64)>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(concat!(
            "DELETE FROM course_offerings WHERE id = ? RETURNING ",
            course_columns!()
        ))
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .context("failed to delete course offering")?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let course = course_from_row(&row)?;

        let cascaded = sqlx::query("DELETE FROM registrations WHERE course_id = ?")
            .bind(&course.course_id)
            .execute(&mut *tx)
            .await
            .context("failed to cascade registrations for deleted course")?
            .rows_affected();

        tx.commit().await?;
        Ok(Some((course, cascaded)))
    }
}

pub(crate) fn course_from_row(row: &SqliteRow) -> Result<CourseOffering> {
    let id: String = row.try_get("id")?;
    Ok(CourseOffering {
        id: id
            .parse()
            .with_context(|| format!("malformed course offering id '{id}'"))?,
        course_id: row.try_get("course_id")?,
        course_name: row.try_get("course_name")?,
        instructor_name: row.try_get("instructor_name")?,
        start_date: row.try_get("start_date")?,
        min_employees: row.try_get("min_employees")?,
        max_employees: row.try_get("max_employees")?,
        current_employees: row.try_get("current_employees")?,
        created_at: row.try_get("created_at")?,
    })
}
