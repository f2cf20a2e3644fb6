//! Project provisioning: derive a project version from a master template.
//!
//! Copies the master's table files, reduces the workflow table to the
//! selected workflows, and substitutes `{PlaceholderName}` variables in the
//! attribute table (project number, project name and the like). The project
//! version then runs through the normal pipeline in project mode.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::pipeline::PipelineError;
use crate::storage::{VersionStore, ATTRIBUTES_FILE, WORKFLOWS_FILE};
use crate::table::Value;

/// What to provision: source master, target project, which workflows stay,
/// and the placeholder substitutions.
#[derive(Debug, Clone)]
pub struct ProjectSpec {
    pub master_version: String,
    pub project_version: String,
    pub selected_workflows: Vec<String>,
    pub variables: HashMap<String, String>,
}

/// Derive a project version folder from a master template.
pub fn provision_project(
    store: &dyn VersionStore,
    spec: &ProjectSpec,
) -> Result<(), PipelineError> {
    tracing::info!(
        master = %spec.master_version,
        project = %spec.project_version,
        workflows = spec.selected_workflows.len(),
        "Provisioning project version"
    );
    store.copy_version_tables(&spec.master_version, &spec.project_version)?;

    select_workflows(store, spec)?;
    substitute_variables(store, spec)?;
    Ok(())
}

/// Keep only the selected workflows and mark them selected.
fn select_workflows(store: &dyn VersionStore, spec: &ProjectSpec) -> Result<(), PipelineError> {
    let mut workflows = store.load_table(&spec.project_version, WORKFLOWS_FILE)?;
    let id_idx = workflows.require_column("WorkflowID")?;

    let selected: HashSet<&str> = spec.selected_workflows.iter().map(String::as_str).collect();
    workflows.retain_rows(|row| {
        row[id_idx]
            .as_text()
            .is_some_and(|id| selected.contains(id.trim()))
    });

    let flags = vec![Value::Bool(true); workflows.row_count()];
    if workflows.has_column("Selected") {
        workflows.map_column("Selected", |_| Value::Bool(true))?;
    } else {
        workflows.add_column("Selected", flags)?;
    }

    tracing::info!(
        kept = workflows.row_count(),
        "Reduced workflow table to the selected workflows"
    );
    store.store_table(&spec.project_version, WORKFLOWS_FILE, &workflows)?;
    Ok(())
}

/// Replace `{Name}` placeholders in every text cell of the attribute table.
/// Placeholders without a supplied value stay intact and are logged.
fn substitute_variables(store: &dyn VersionStore, spec: &ProjectSpec) -> Result<(), PipelineError> {
    let mut attributes = store.load_table(&spec.project_version, ATTRIBUTES_FILE)?;

    let mut unresolved: BTreeSet<String> = BTreeSet::new();
    let columns: Vec<String> = attributes.columns().to_vec();
    for column in columns {
        attributes.map_column(&column, |value| match value {
            Value::Text(s) if s.contains('{') => {
                Value::Text(substitute(s, &spec.variables, &mut unresolved))
            }
            other => other.clone(),
        })?;
    }

    for name in &unresolved {
        tracing::warn!(placeholder = %name, "No value supplied; placeholder left intact");
    }

    store.store_table(&spec.project_version, ATTRIBUTES_FILE, &attributes)?;
    Ok(())
}

/// Replace `{Name}` occurrences from the variable map; unknown names are
/// collected and kept verbatim.
fn substitute(
    text: &str,
    variables: &HashMap<String, String>,
    unresolved: &mut BTreeSet<String>,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match variables.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        if !name.is_empty() {
                            unresolved.insert(name.to_string());
                        }
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                // unbalanced brace, keep the remainder as-is
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}
