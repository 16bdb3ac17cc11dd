use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use server_api::ApiContext;
use shared::protocol::{CreateCourseOfferingRequest, RegisterRequest};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/courses.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    ListCourses,
    CreateCourse {
        course_name: String,
        instructor_name: String,
        start_date: String,
        min_employees: i64,
        max_employees: i64,
    },
    /// Deletes a course by store id together with its registrations.
    DeleteCourse {
        id: String,
    },
    ListRegistrations,
    Register {
        employee_name: String,
        email: String,
        course_id: String,
    },
    Allot {
        course_id: String,
    },
    RemoveRegistration {
        registration_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = ApiContext::new(Storage::new(&cli.database_url).await?);

    match cli.command {
        Command::ListCourses => print_json(&server_api::list_courses(&ctx).await?)?,
        Command::CreateCourse {
            course_name,
            instructor_name,
            start_date,
            min_employees,
            max_employees,
        } => {
            let created = server_api::create_course(
                &ctx,
                &CreateCourseOfferingRequest {
                    course_name: Some(course_name),
                    instructor_name: Some(instructor_name),
                    start_date: Some(start_date),
                    min_employees: Some(min_employees),
                    max_employees: Some(max_employees),
                },
            )
            .await?;
            println!("created course_id={} id={}", created.course_id, created.id);
        }
        Command::DeleteCourse { id } => {
            let deleted = server_api::delete_course(&ctx, &id).await?;
            match deleted.course {
                Some(course) => println!(
                    "deleted course_id={} registrations={}",
                    course.course_id, deleted.deleted_registrations
                ),
                None => println!("no course offering with id={id}"),
            }
        }
        Command::ListRegistrations => print_json(&server_api::list_registrations(&ctx).await?)?,
        Command::Register {
            employee_name,
            email,
            course_id,
        } => {
            let registered = server_api::register(
                &ctx,
                &RegisterRequest {
                    employee_name: Some(employee_name),
                    email: Some(email),
                    course_id: Some(course_id),
                },
            )
            .await?;
            println!(
                "registered registration_id={} status={}",
                registered.registration_id, registered.status
            );
        }
        Command::Allot { course_id } => print_json(&server_api::allot(&ctx, &course_id).await?)?,
        Command::RemoveRegistration { registration_id } => {
            let removed = server_api::remove_registration(&ctx, &registration_id).await?;
            println!(
                "removed registration_id={} course_id={}",
                removed.registration_id, removed.course_id
            );
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
