//! Minimum column contracts for the four source tables.
//!
//! A trailing `*` on a contract entry means "at least one language-suffixed
//! variant of this base name must exist", e.g. `WorkflowName*` is satisfied
//! by `WorkflowNameDE`. Violations abort the run for that version before any
//! stage touches the data.

use thiserror::Error;

use super::Table;

pub const REQUIRED_WORKFLOW_COLUMNS: &[&str] = &[
    "WorkflowID",
    "WorkflowName*",
    "WorkflowDescription*",
    "Status",
];

pub const REQUIRED_MODEL_COLUMNS: &[&str] = &[
    "ModelID",
    "ModelName*",
    "ModelDescription*",
    "FileName*",
    "SortModels",
];

pub const REQUIRED_ELEMENT_COLUMNS: &[&str] = &[
    "ElementID",
    "ElementName*",
    "SortElement",
    "IfcEntity",
    "ElementDescription*",
];

pub const REQUIRED_ATTRIBUTE_COLUMNS: &[&str] = &[
    "AttributeID",
    "AttributeName",
    "SortAttribute",
    "AttributeDescription*",
    "Pset",
    "AllowedValues*",
    "DataType",
    "Unit",
    "Applicability",
    "ElementLink",
    "ModelLink",
    "WorkflowLink",
];

#[derive(Error, Debug)]
#[error("Missing required columns in {table}: {}", missing.join(", "))]
pub struct SchemaError {
    pub table: String,
    pub missing: Vec<String>,
}

/// Check a table against its minimum column contract.
pub fn check_required_columns(
    table: &Table,
    required: &[&str],
    table_name: &str,
) -> Result<(), SchemaError> {
    let mut missing = Vec::new();
    for &column in required {
        let satisfied = match column.strip_suffix('*') {
            Some(base) => table.columns().iter().any(|c| c.starts_with(base)),
            None => table.has_column(column),
        };
        if !satisfied {
            missing.push(column.to_string());
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError {
            table: table_name.to_string(),
            missing,
        })
    }
}
