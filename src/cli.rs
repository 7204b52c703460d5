//! CLI interface for Surveyor.
//!
//! Each subcommand is non-interactive: arguments in, structured output out.
//! Machine-readable output (ids, JSON) goes to stdout; human-readable
//! confirmations go to stderr.
//!
//! - `surveyor project new|list|add-member|show` manages projects.
//! - `surveyor waypoint add|list` records and exports waypoints.
//! - `surveyor report` rebuilds an employee's survey history.
//!
//! `--project` takes a full UUID or unambiguous prefix.

mod format;
mod project;
mod report;
mod waypoint;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use uuid::Uuid;

use crate::config::Config;
use crate::model::Project;
use crate::storage::Storage;

pub use project::ProjectCommand;
pub use waypoint::WaypointCommand;

/// Surveyor: assemble field survey waypoints into paths.
#[derive(Debug, Parser)]
#[command(name = "surveyor", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Employee to act as. Falls back to `SURVEYOR_EMPLOYEE`, then the config file.
    #[arg(long = "as", global = true)]
    employee: Option<String>,

    /// Increase log verbosity (`-v` debug, `-vv` trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: walking a feeder
  1. surveyor project new --name "Feeder 7" --circle North --division Barasat
     → prints a project ID (e.g. 5f2c81d0)
  2. surveyor project add-member --project 5f2 emp-17 --name "Asha Roy"
  3. surveyor --as emp-17 waypoint add --project 5f2 --start --lat 22.72 --lng 88.48 --name "Tap"
  4. surveyor --as emp-17 waypoint add --project 5f2 --lat 22.73 --lng 88.49 --name "Pole 14"
  5. surveyor --as emp-17 waypoint add --project 5f2 --end --lat 22.74 --lng 88.50 --name "DTR"
  6. surveyor --as emp-17 report"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage projects: create, list, enrol employees, inspect paths.
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },

    /// Record waypoints and export an employee's waypoints for a project.
    Waypoint {
        #[command(subcommand)]
        command: WaypointCommand,
    },

    /// Rebuild the acting employee's paths across all projects, grouped by day.
    ///
    /// Prints JSON: one entry per project per day, most recent day first.
    Report {
        /// Write the report JSON to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run(cli: Cli, config: &Config, storage: &Storage) -> Result<(), String> {
    let employee = cli.employee.as_deref();
    match cli.command {
        Command::Project { command } => project::run(command, storage),
        Command::Waypoint { command } => waypoint::run(command, employee, config, storage),
        Command::Report { out } => report::run(employee, config, storage, out.as_deref()),
    }
}

/// Resolve a project reference (full UUID or unambiguous prefix) to a project.
fn resolve_project(storage: &Storage, reference: &str) -> Result<Project, String> {
    // Try full UUID first.
    if let Ok(id) = reference.parse::<Uuid>() {
        return storage
            .load_project(id)
            .map_err(|e| format!("project not found: {e}"));
    }

    // Try as a prefix match against all projects.
    let projects = storage
        .list_projects()
        .map_err(|e| format!("failed to list projects: {e}"))?;

    let mut matches: Vec<Project> = projects
        .into_iter()
        .filter(|p| p.id.to_string().starts_with(reference))
        .collect();

    match matches.len() {
        0 => Err(format!("no project matching '{reference}'")),
        1 => Ok(matches.remove(0)),
        n => {
            let ids: Vec<String> = matches.iter().map(|p| short_id(p.id)).collect();
            Err(format!(
                "'{reference}' is ambiguous: matches {n} projects: {}",
                ids.join(", ")
            ))
        }
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Write pretty JSON to `out` if given, otherwise to stdout.
fn emit_json<T: serde::Serialize>(value: &T, out: Option<&Path>) -> Result<(), String> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| format!("failed to serialize: {e}"))?;
    match out {
        Some(path) => {
            fs::write(path, &json)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
