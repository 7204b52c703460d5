//! Report command: an employee's reconstructed survey history.

use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::identity::resolve_employee;
use crate::report::reconstruct;
use crate::storage::Storage;

use super::emit_json;

pub(super) fn run(
    employee: Option<&str>,
    config: &Config,
    storage: &Storage,
    out: Option<&Path>,
) -> Result<(), String> {
    let employee = resolve_employee(employee, config)?;
    let projects = storage
        .list_projects()
        .map_err(|e| format!("failed to list projects: {e}"))?;

    let entries = reconstruct(&projects, &employee);
    info!(%employee, projects = projects.len(), entries = entries.len(), "built report");
    emit_json(&entries, out)
}
