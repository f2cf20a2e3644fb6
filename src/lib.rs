//! Elementplan: requirements ETL and formatted-report pipeline.
//!
//! Turns four linked requirement tables (workflows, models, elements,
//! attributes) into per-language deliverables: a grouped contract report and
//! a CDE import configuration, both as deterministic spreadsheet workbooks,
//! plus a merged CSV for downstream viewers.
//!
//! The flow is strictly one-way, each stage a pure function over owned
//! tables:
//!
//! ```text
//! source tables → exploded links → merged requirement rows
//!   → per-language projection → phase matrix → sorted → rendered artifacts
//! ```
//!
//! [`PipelineRun`] drives a whole version; the stages underneath are public
//! and individually reusable.

pub mod config;
pub mod pipeline;
pub mod project;
pub mod render;
pub mod storage;
pub mod table;
pub mod translate;

pub use config::ReportConfig;
pub use pipeline::runner::{LanguageOutcome, LanguageStatus, PipelineRun, RunOutcome};
pub use pipeline::{PipelineError, RunMode};
pub use project::{provision_project, ProjectSpec};
pub use storage::local::LocalVersionStore;
pub use storage::VersionStore;
pub use table::{Table, Value};
pub use translate::HeaderTranslations;
