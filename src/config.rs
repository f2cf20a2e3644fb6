//! Report configuration: which columns each artifact shows, in which order
//! and width, plus the grouping rules and artifact kind names.
//!
//! Loaded from `config.yaml`; every field has a default so a missing or
//! partial file still yields a working configuration. A `*` in a column name
//! stands for the language suffix and is resolved per export.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::layout::GroupingRules;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
}

/// One output column: source column name (language placeholder allowed) and
/// rendered width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub column: String,
    #[serde(default = "default_column_width")]
    pub width: f64,
}

impl ColumnSpec {
    pub fn new(column: &str, width: f64) -> ColumnSpec {
        ColumnSpec {
            column: column.to_string(),
            width,
        }
    }

    /// Resolve the `*` language placeholder for one export.
    pub fn resolve(&self, language: &str) -> String {
        self.column.replace('*', language)
    }
}

fn default_column_width() -> f64 {
    8.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Columns of the contract-facing report, in order.
    #[serde(default = "default_contract_columns")]
    pub contract_columns: Vec<ColumnSpec>,
    /// Columns of the CDE import configuration, in order. Duplicates are
    /// allowed; the import target expects some columns twice.
    #[serde(default = "default_import_columns")]
    pub import_columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub grouping: GroupingRules,
    /// Artifact kind of the contract report, used in output file names.
    #[serde(default = "default_report_kind")]
    pub report_kind: String,
    /// Artifact kind of the import configuration.
    #[serde(default = "default_config_kind")]
    pub config_kind: String,
    /// Width of the generated phase and ordinal columns.
    #[serde(default = "default_phase_column_width")]
    pub phase_column_width: f64,
}

fn default_report_kind() -> String {
    "Elementplan".to_string()
}

fn default_config_kind() -> String {
    "CdeConfig".to_string()
}

fn default_phase_column_width() -> f64 {
    8.0
}

fn default_contract_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("FileName*", 20.0),
        ColumnSpec::new("ModelName*", 20.0),
        ColumnSpec::new("ElementName*", 25.0),
        ColumnSpec::new("ElementDescription*", 45.0),
        ColumnSpec::new("Pset", 20.0),
        ColumnSpec::new("AttributeName", 25.0),
        ColumnSpec::new("AttributeDescription*", 45.0),
        ColumnSpec::new("AllowedValues*", 30.0),
        ColumnSpec::new("DataType", 12.0),
        ColumnSpec::new("Unit", 8.0),
        ColumnSpec::new("IfcEntity", 20.0),
    ]
}

fn default_import_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("ElementName*", 20.0),
        ColumnSpec::new("IfcEntity", 20.0),
        ColumnSpec::new("Pset", 20.0),
        ColumnSpec::new("AttributeName", 20.0),
        ColumnSpec::new("AttributeName", 35.0),
        ColumnSpec::new("AttributeDescription*", 45.0),
        ColumnSpec::new("DataType", 20.0),
        ColumnSpec::new("ModelName*", 20.0),
        ColumnSpec::new("Unit", 20.0),
    ]
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            contract_columns: default_contract_columns(),
            import_columns: default_import_columns(),
            grouping: GroupingRules::default(),
            report_kind: default_report_kind(),
            config_kind: default_config_kind(),
            phase_column_width: default_phase_column_width(),
        }
    }
}

impl ReportConfig {
    /// Load from a YAML file.
    pub fn load(path: &Path) -> Result<ReportConfig, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
