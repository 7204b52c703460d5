//! Employee resolution for Surveyor commands.
//!
//! Submitting waypoints and building reports both need to know which
//! employee is acting. Rather than requiring `--as` on every invocation,
//! the employee is resolved through a chain:
//!
//! 1. `--as <employee>`: explicit per-command override
//! 2. `SURVEYOR_EMPLOYEE` env var: set once per device or session
//! 3. `default-employee` in `~/.surveyor/config.toml`

use std::env;

use crate::config::Config;
use crate::model::EmployeeId;

/// Error message shown when the employee cannot be resolved.
pub const EMPLOYEE_REQUIRED: &str = "employee required: pass --as <employee>, \
    set SURVEYOR_EMPLOYEE, or add `default-employee = \"...\"` to ~/.surveyor/config.toml";

/// Resolve the acting employee from the tiered resolution chain.
pub fn resolve_employee(explicit: Option<&str>, config: &Config) -> Result<EmployeeId, String> {
    let from_env = env::var("SURVEYOR_EMPLOYEE").ok();
    resolve_from(explicit, from_env.as_deref(), config.default_employee.as_deref())
}

fn resolve_from(
    explicit: Option<&str>,
    from_env: Option<&str>,
    from_config: Option<&str>,
) -> Result<EmployeeId, String> {
    [explicit, from_env, from_config]
        .into_iter()
        .flatten()
        .find(|id| !id.is_empty())
        .map(EmployeeId::from)
        .ok_or_else(|| EMPLOYEE_REQUIRED.to_string())
}
