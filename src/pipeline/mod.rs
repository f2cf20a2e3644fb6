//! The requirements ETL pipeline: explode → merge → project → expand →
//! sort → render, one version per run.

pub mod language;
pub mod links;
pub mod merge;
pub mod phases;
pub mod runner;
pub mod sort;

use thiserror::Error;

use crate::render::RenderError;
use crate::storage::StorageError;
use crate::table::schema::SchemaError;
use crate::table::TableError;

/// Which table set a run reads and whether the workflow gate applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Master template: every requirement row participates.
    Master,
    /// Project: rows are gated by workflow selection and required models.
    Project,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Master => write!(f, "master"),
            RunMode::Project => write!(f, "project"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("No columns found for language '{0}'")]
    LanguageDataGap(String),

    #[error("Phase column '{code}' collides with an existing column")]
    PhaseColumnCollision { code: String },
}
