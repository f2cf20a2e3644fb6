//! Per-version run orchestration.
//!
//! Drives the whole pipeline for one version: load and validate the four
//! tables, explode and merge, persist the merged data, then project, expand
//! and render per language. Schema and storage problems abort the run; a
//! data problem in one language degrades that language only, so the other
//! languages still get their artifacts.

use serde::Serialize;

use crate::config::ReportConfig;
use crate::render::report::{contract_report, import_config};
use crate::storage::{
    self, VersionStore, ATTRIBUTES_FILE, ELEMENTS_FILE, MODELS_FILE, WORKFLOWS_FILE,
};
use crate::table::schema::{
    check_required_columns, REQUIRED_ATTRIBUTE_COLUMNS, REQUIRED_ELEMENT_COLUMNS,
    REQUIRED_MODEL_COLUMNS, REQUIRED_WORKFLOW_COLUMNS,
};
use crate::table::Table;
use crate::translate::HeaderTranslations;

use super::language::{available_languages, project_language};
use super::links::{explode_links, LIST_DELIMITER};
use super::merge::{merge_tables, LINK_COLUMNS};
use super::phases::expand_phase_matrix;
use super::sort::{normalize_sort_column, sort_by_columns, SORT_COLUMNS};
use super::{PipelineError, RunMode};

/// Summary of one version run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub version: String,
    pub mode: RunMode,
    /// Requirement rows after merging, gating and deduplication.
    pub row_count: usize,
    pub languages: Vec<LanguageOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageOutcome {
    pub language: String,
    pub status: LanguageStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LanguageStatus {
    /// Both artifacts were rendered and stored.
    Exported { artifacts: Vec<String> },
    /// No data for this language; nothing was rendered.
    Skipped { reason: String },
    /// Rendering failed; other languages are unaffected.
    Failed { reason: String },
}

/// The pipeline entry point: storage plus configuration, reusable across
/// versions.
pub struct PipelineRun<S: VersionStore> {
    store: S,
    config: ReportConfig,
    translations: HeaderTranslations,
}

impl<S: VersionStore> PipelineRun<S> {
    pub fn new(store: S, config: ReportConfig, translations: HeaderTranslations) -> Self {
        PipelineRun {
            store,
            config,
            translations,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process one version start to finish.
    pub fn process_version(
        &self,
        version: &str,
        mode: RunMode,
    ) -> Result<RunOutcome, PipelineError> {
        tracing::info!(version, %mode, "Starting pipeline run");

        let workflows = self.store.load_table(version, WORKFLOWS_FILE)?;
        check_required_columns(&workflows, REQUIRED_WORKFLOW_COLUMNS, "Workflows")?;
        let models = self.store.load_table(version, MODELS_FILE)?;
        check_required_columns(&models, REQUIRED_MODEL_COLUMNS, "Models")?;
        let elements = self.store.load_table(version, ELEMENTS_FILE)?;
        check_required_columns(&elements, REQUIRED_ELEMENT_COLUMNS, "Elements")?;
        let attributes = self.store.load_table(version, ATTRIBUTES_FILE)?;
        check_required_columns(&attributes, REQUIRED_ATTRIBUTE_COLUMNS, "Attributes")?;

        let languages = available_languages(&attributes);
        if languages.is_empty() {
            tracing::warn!(version, "Attribute table carries no language columns");
        }

        let exploded = explode_links(&attributes, LINK_COLUMNS, LIST_DELIMITER)?;
        let mut merged = merge_tables(&exploded, &elements, &models, &workflows, mode)?;

        for column in SORT_COLUMNS {
            if merged.has_column(column) {
                normalize_sort_column(&mut merged, column)?;
            }
        }
        sort_by_columns(&mut merged, SORT_COLUMNS);

        // Persist the denormalized table for downstream viewers.
        let csv = storage::table_to_csv(&merged)?;
        self.store
            .store_artifact(version, &storage::web_data_file(version), &csv)?;

        let mut outcomes = Vec::with_capacity(languages.len());
        for language in languages {
            let status = self.export_language(&merged, &language, version)?;
            match &status {
                LanguageStatus::Exported { artifacts } => {
                    tracing::info!(version, language = %language, count = artifacts.len(), "Language exported")
                }
                LanguageStatus::Skipped { reason } => {
                    tracing::warn!(version, language = %language, reason = %reason, "Language skipped")
                }
                LanguageStatus::Failed { reason } => {
                    tracing::error!(version, language = %language, reason = %reason, "Language failed")
                }
            }
            outcomes.push(LanguageOutcome {
                language,
                status,
            });
        }

        Ok(RunOutcome {
            version: version.to_string(),
            mode,
            row_count: merged.row_count(),
            languages: outcomes,
        })
    }

    /// Render and store both artifacts for one language. Data gaps and
    /// rendering preconditions degrade the language; storage failures abort
    /// the run.
    fn export_language(
        &self,
        merged: &Table,
        language: &str,
        version: &str,
    ) -> Result<LanguageStatus, PipelineError> {
        let mut projected = match project_language(merged, language) {
            Ok(t) => t,
            Err(PipelineError::LanguageDataGap(_)) => {
                return Ok(LanguageStatus::Skipped {
                    reason: format!("no columns for language '{language}'"),
                })
            }
            Err(e) => return Err(e),
        };

        let phase_columns = match expand_phase_matrix(&mut projected, language) {
            Ok(columns) => columns,
            Err(e @ PipelineError::PhaseColumnCollision { .. }) => {
                return Ok(LanguageStatus::Failed {
                    reason: e.to_string(),
                })
            }
            Err(e) => return Err(e),
        };

        let contract = contract_report(
            &projected,
            &phase_columns,
            language,
            version,
            &self.config,
            &self.translations,
        );
        let imports = import_config(&projected, &phase_columns, language, version, &self.config);

        let (contract, imports) = match (contract, imports) {
            (Ok(c), Ok(i)) => (c, i),
            (Err(e), _) | (_, Err(e)) => {
                return Ok(LanguageStatus::Failed {
                    reason: e.to_string(),
                })
            }
        };

        // Storage errors propagate unchanged and abort the version run.
        self.store
            .store_artifact(version, &contract.file_name, &contract.bytes)?;
        self.store
            .store_artifact(version, &imports.file_name, &imports.bytes)?;

        Ok(LanguageStatus::Exported {
            artifacts: vec![contract.file_name, imports.file_name],
        })
    }
}
