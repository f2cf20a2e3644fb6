//! Merging the exploded attribute table with elements, models and workflows
//! into the denormalized requirement-row set.
//!
//! Three sequential left joins, then the run-mode workflow gate, then the
//! idempotent duplicate collapse. Unresolved links never drop a row; they
//! null-fill the joined side and are logged as link-resolution gaps so dirty
//! data stays visible for review.

use std::collections::{HashMap, HashSet};

use crate::table::{Table, Value};

use super::links::{split_list, LIST_DELIMITER};
use super::{PipelineError, RunMode};

/// Attribute-table columns that hold delimited foreign-key lists.
pub const LINK_COLUMNS: &[&str] = &["ElementLink", "ModelLink", "WorkflowLink"];

/// Workflow column naming the models a workflow requires (delimited list).
const MODEL_FOR_WORKFLOW_COLUMN: &str = "ModelForWorkflow";

/// Workflow inclusion flag written by project provisioning.
const SELECTED_COLUMN: &str = "Selected";

/// Join the four tables into the full requirement-row set for one version.
pub fn merge_tables(
    attributes: &Table,
    elements: &Table,
    models: &Table,
    workflows: &Table,
    mode: RunMode,
) -> Result<Table, PipelineError> {
    let merged = left_join(attributes, elements, "ElementLink", "ElementID", "Elements")?;
    let merged = left_join(&merged, models, "ModelLink", "ModelID", "Models")?;
    let mut merged = left_join(&merged, workflows, "WorkflowLink", "WorkflowID", "Workflows")?;

    if mode == RunMode::Project {
        apply_workflow_gate(&mut merged)?;
    }
    deduplicate(&mut merged)?;

    tracing::info!(
        rows = merged.row_count(),
        mode = %mode,
        "Merged requirement rows"
    );
    Ok(merged)
}

/// Left join: every left row survives. Lookups resolve to the first
/// occurrence of a right-side key; further occurrences are ignored and
/// logged. Right columns whose name already exists on the left are skipped.
fn left_join(
    left: &Table,
    right: &Table,
    left_key: &str,
    right_key: &str,
    right_name: &str,
) -> Result<Table, PipelineError> {
    let left_key_idx = left.require_column(left_key)?;
    let right_key_idx = right.require_column(right_key)?;

    let mut lookup: HashMap<&str, usize> = HashMap::with_capacity(right.row_count());
    let mut duplicate_keys = 0usize;
    for (i, row) in right.rows().iter().enumerate() {
        if let Some(key) = row[right_key_idx].as_text() {
            if lookup.contains_key(key.trim()) {
                duplicate_keys += 1;
            } else {
                lookup.insert(key.trim(), i);
            }
        }
    }
    if duplicate_keys > 0 {
        tracing::warn!(
            table = right_name,
            key = right_key,
            count = duplicate_keys,
            "Duplicate keys on join side; first occurrence wins"
        );
    }

    // Right columns carried into the result, key column included.
    let carried: Vec<usize> = right
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| !left.has_column(name))
        .map(|(i, _)| i)
        .collect();
    if carried.len() < right.column_count() {
        tracing::debug!(
            table = right_name,
            skipped = right.column_count() - carried.len(),
            "Skipped join columns already present on the left side"
        );
    }

    let mut columns = left.columns().to_vec();
    columns.extend(carried.iter().map(|&i| right.columns()[i].clone()));
    let mut out = Table::new(columns)?;

    let mut gaps = 0usize;
    for row in left.rows() {
        let mut new_row = row.clone();
        match row[left_key_idx].as_text().and_then(|k| lookup.get(k.trim())) {
            Some(&right_row) => {
                let resolved = &right.rows()[right_row];
                new_row.extend(carried.iter().map(|&i| resolved[i].clone()));
            }
            None => {
                if !row[left_key_idx].is_null() {
                    gaps += 1;
                }
                new_row.extend(carried.iter().map(|_| Value::Null));
            }
        }
        out.push_row(new_row)?;
    }

    if gaps > 0 {
        tracing::warn!(
            table = right_name,
            key = left_key,
            count = gaps,
            "Link values did not resolve; rows kept null-filled"
        );
    }
    Ok(out)
}

/// Project-mode gate: keep a row only when its resolved workflow is selected
/// and, where the workflow declares required models, the row's model link is
/// among them.
fn apply_workflow_gate(merged: &mut Table) -> Result<(), PipelineError> {
    let workflow_idx = merged.require_column("WorkflowID")?;
    let model_link_idx = merged.require_column("ModelLink")?;
    let selected_idx = merged.column_index(SELECTED_COLUMN);
    if selected_idx.is_none() {
        // A provisioned project's workflow table holds only selected
        // workflows, so presence alone counts as selection.
        tracing::warn!(
            column = SELECTED_COLUMN,
            "Selection column missing; resolved workflows count as selected"
        );
    }
    let required_idx = merged.column_index(MODEL_FOR_WORKFLOW_COLUMN);

    let before = merged.row_count();
    merged.retain_rows(|row| {
        if row[workflow_idx].is_null() {
            return false;
        }
        if let Some(i) = selected_idx {
            if !is_selected(&row[i]) {
                return false;
            }
        }
        if let Some(i) = required_idx {
            let required: HashSet<String> = split_list(&row[i], LIST_DELIMITER)
                .into_iter()
                .filter_map(|v| v.as_text().map(str::to_string))
                .collect();
            if !required.is_empty() {
                match row[model_link_idx].as_text() {
                    Some(model) => {
                        if !required.contains(model) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
        }
        true
    });

    tracing::info!(
        dropped = before - merged.row_count(),
        "Applied workflow selection gate"
    );
    Ok(())
}

fn is_selected(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Text(s) => {
            matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "x" | "yes")
        }
        _ => false,
    }
}

/// Collapse rows that share the (model, element, attribute) link triple.
/// First occurrence in explosion order wins.
fn deduplicate(merged: &mut Table) -> Result<(), PipelineError> {
    let keys = [
        merged.require_column("ModelLink")?,
        merged.require_column("ElementLink")?,
        merged.require_column("AttributeID")?,
    ];

    let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(merged.row_count());
    let before = merged.row_count();
    merged.retain_rows(|row| {
        let key: Vec<String> = keys.iter().map(|&i| row[i].to_field().into_owned()).collect();
        seen.insert(key)
    });

    let dropped = before - merged.row_count();
    if dropped > 0 {
        tracing::debug!(dropped, "Collapsed duplicate requirement rows");
    }
    Ok(())
}
