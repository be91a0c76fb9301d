//! `roster` command-line front end.
//!
//! # Responsibility
//! - Parse arguments, build the configured service once, call one operation.
//! - Render results as plain text.
//!
//! # Usage
//!
//! ```text
//! roster --db roster.db register Ana Lee ana@x.com CS
//! roster --db roster.db list --major cs
//! ROSTER_STORAGE__BACKEND=sqlite ROSTER_STORAGE__DB_PATH=roster.db roster stats
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use roster_core::{
    core_version, DynStudentService, RosterConfig, StorageBackend, StudentDto, StudentId,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "roster", version, about = "Student roster maintenance")]
struct Args {
    /// Path to a TOML config file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use a throwaway in-memory store for this run.
    #[arg(long, conflicts_with = "db")]
    memory: bool,

    /// Use the SQLite database at PATH.
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new student.
    Register {
        first_name: String,
        last_name: String,
        email: String,
        major: String,
        /// Enrollment date, defaults to today.
        #[arg(long, value_name = "YYYY-MM-DD")]
        enrolled: Option<NaiveDate>,
    },
    /// Show one student by id, active or not.
    Get { id: StudentId },
    /// Show one student by email, active or not.
    FindEmail { email: String },
    /// List active students.
    List {
        /// Only students in this major (case-insensitive).
        #[arg(long)]
        major: Option<String>,
    },
    /// Change fields of an existing student.
    Update {
        id: StudentId,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        major: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        enrolled: Option<NaiveDate>,
    },
    /// Soft-delete a student.
    Delete { id: StudentId },
    /// Undo a soft delete.
    Reactivate { id: StudentId },
    /// Active-student totals per major.
    Stats,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = RosterConfig::load(args.config.as_deref())
        .context("loading roster configuration")?;
    if args.memory {
        config.storage.backend = StorageBackend::Memory;
    }
    if let Some(path) = args.db {
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.db_path = Some(path);
    }

    config.init_logging().context("starting logging")?;
    info!(
        "event=cli_start module=cli status=ok version={}",
        core_version()
    );

    let service = config.open_service().context("opening student store")?;
    run(&service, args.command)
}

fn run(service: &DynStudentService, command: Command) -> Result<()> {
    match command {
        Command::Register {
            first_name,
            last_name,
            email,
            major,
            enrolled,
        } => {
            let mut dto = StudentDto::new(first_name, last_name, email, major);
            if let Some(date) = enrolled {
                dto.enrollment_date = date;
            }
            let created = service.register(&dto)?;
            print_student(&created);
        }
        Command::Get { id } => match service.find_by_id(id)? {
            Some(student) => print_student(&student),
            None => println!("no student with id {id}"),
        },
        Command::FindEmail { email } => match service.find_by_email(&email)? {
            Some(student) => print_student(&student),
            None => println!("no student with email {email}"),
        },
        Command::List { major } => {
            let students = match major {
                Some(major) => service.list_by_major(&major)?,
                None => service.list_active()?,
            };
            for student in &students {
                print_student(student);
            }
            println!("{} student(s)", students.len());
        }
        Command::Update {
            id,
            first_name,
            last_name,
            email,
            major,
            enrolled,
        } => {
            let mut dto = service
                .find_by_id(id)?
                .with_context(|| format!("no student with id {id}"))?;
            if let Some(value) = first_name {
                dto.set_first_name(value);
            }
            if let Some(value) = last_name {
                dto.set_last_name(value);
            }
            if let Some(value) = email {
                dto.email = value;
            }
            if let Some(value) = major {
                dto.major = value;
            }
            if let Some(value) = enrolled {
                dto.enrollment_date = value;
            }
            let updated = service.update(&dto)?;
            print_student(&updated);
        }
        Command::Delete { id } => {
            service.delete(id)?;
            println!("student {id} deactivated");
        }
        Command::Reactivate { id } => {
            let student = service.reactivate(id)?;
            print_student(&student);
        }
        Command::Stats => {
            let stats = service.statistics()?;
            println!("active students: {}", stats.total_active);
            for (major, count) in &stats.by_major {
                println!("  {major}: {count}");
            }
        }
    }
    Ok(())
}

fn print_student(student: &StudentDto) {
    let id = student
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    let status = if student.active { "active" } else { "inactive" };
    println!(
        "{id}\t{}\t{}\t{}\t{}\t{status}",
        student.full_name(),
        student.email,
        student.major,
        student.enrollment_date
    );
}
