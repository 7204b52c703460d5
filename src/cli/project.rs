//! Project commands: new, list, add-member, show.

use clap::Subcommand;
use jiff::Timestamp;
use tracing::info;

use crate::model::{EmployeeId, Member, Project};
use crate::storage::Storage;

use super::format::format_path_line;
use super::{resolve_project, short_id};

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// Create a new project. Prints the project ID.
    New {
        /// Project name.
        #[arg(long)]
        name: String,

        /// Administrative circle the project belongs to.
        #[arg(long, default_value = "")]
        circle: String,

        /// Division within the circle.
        #[arg(long, default_value = "")]
        division: String,

        /// What is being surveyed.
        #[arg(long, default_value = "")]
        description: String,
    },

    /// List projects.
    List,

    /// Enrol an employee on a project. Only members may submit waypoints.
    AddMember {
        /// Project ID: full UUID or unambiguous prefix.
        #[arg(long)]
        project: String,

        /// Employee ID to enrol.
        employee: String,

        /// Display name used in reports. Defaults to the employee ID.
        #[arg(long)]
        name: Option<String>,
    },

    /// Show a project's paths: owner, state, and waypoint count.
    Show {
        /// Project ID: full UUID or unambiguous prefix.
        #[arg(long)]
        project: String,
    },
}

pub(super) fn run(command: ProjectCommand, storage: &Storage) -> Result<(), String> {
    match command {
        ProjectCommand::New {
            name,
            circle,
            division,
            description,
        } => cmd_new(storage, name, circle, division, description),
        ProjectCommand::List => cmd_list(storage),
        ProjectCommand::AddMember {
            project,
            employee,
            name,
        } => {
            let project = resolve_project(storage, &project)?;
            cmd_add_member(storage, &project, &employee, name)
        }
        ProjectCommand::Show { project } => {
            let project = resolve_project(storage, &project)?;
            cmd_show(&project);
            Ok(())
        }
    }
}

fn cmd_new(
    storage: &Storage,
    name: String,
    circle: String,
    division: String,
    description: String,
) -> Result<(), String> {
    let mut project = Project::new(name, Timestamp::now());
    project.circle = circle;
    project.division = division;
    project.description = description;

    storage
        .create_project(&project)
        .map_err(|e| format!("failed to create project: {e}"))?;
    info!(project = %project.id, name = %project.name, "created project");

    println!("{}", project.id);
    Ok(())
}

fn cmd_list(storage: &Storage) -> Result<(), String> {
    let projects = storage
        .list_projects()
        .map_err(|e| format!("failed to list projects: {e}"))?;

    if projects.is_empty() {
        println!("No projects");
        return Ok(());
    }

    for p in &projects {
        let open = p.paths.iter().filter(|path| path.is_open()).count();
        println!(
            "{}  [{} paths, {open} open]  {}",
            short_id(p.id),
            p.paths.len(),
            p.name
        );
    }

    Ok(())
}

fn cmd_add_member(
    storage: &Storage,
    project: &Project,
    employee: &str,
    name: Option<String>,
) -> Result<(), String> {
    let member = Member {
        id: EmployeeId::from(employee),
        name: name.unwrap_or_else(|| employee.to_string()),
    };
    storage
        .add_member(project.id, &member)
        .map_err(|e| format!("failed to add member: {e}"))?;

    eprintln!("Enrolled {} on {}", member.id, short_id(project.id));
    Ok(())
}

fn cmd_show(project: &Project) {
    println!("{}  {}", short_id(project.id), project.name);
    if !project.circle.is_empty() || !project.division.is_empty() {
        println!("circle: {}  division: {}", project.circle, project.division);
    }
    if project.paths.is_empty() {
        println!("No paths");
    }
    for (index, path) in project.paths.iter().enumerate() {
        println!("{}", format_path_line(index, path));
    }
}
