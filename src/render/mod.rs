//! Rendering: style-grid computation, artifact assembly and the workbook
//! writer.

pub mod layout;
pub mod report;
pub mod xlsx;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Grouping column '{0}' is missing from the projected table")]
    GroupingColumnMissing(String),

    #[error("Configured column '{0}' is missing from the projected table")]
    ColumnMissing(String),

    #[error("No rows to render")]
    EmptyTable,

    #[error("Workbook has no sheets")]
    EmptyWorkbook,

    #[error("XML write error: {0}")]
    Xml(String),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
