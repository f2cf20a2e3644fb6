//! Language detection and per-language column projection.
//!
//! Supported languages are not configured anywhere; they are whatever
//! suffixes exist on the `AttributeDescription*` columns of the attribute
//! table. Projection keeps the language-invariant columns plus exactly one
//! language's suffixed columns.

use crate::table::Table;

use super::PipelineError;

const LANGUAGE_MARKER: &str = "AttributeDescription";

/// Columns kept for every language: identifiers, link values, sort keys and
/// the language-neutral attribute facts. Entries absent from the merged
/// table are skipped.
pub const INVARIANT_COLUMNS: &[&str] = &[
    "AttributeID",
    "AttributeName",
    "SortAttribute",
    "Pset",
    "DataType",
    "Unit",
    "Applicability",
    "ElementLink",
    "ModelLink",
    "WorkflowLink",
    "ElementID",
    "SortElement",
    "IfcEntity",
    "ModelID",
    "SortModels",
    "WorkflowID",
    "Status",
    "ImageName",
];

/// Language suffixes present in the attribute table, in column order.
pub fn available_languages(attributes: &Table) -> Vec<String> {
    attributes
        .columns()
        .iter()
        .filter_map(|c| c.strip_prefix(LANGUAGE_MARKER))
        .filter(|suffix| !suffix.is_empty())
        .map(str::to_string)
        .collect()
}

/// Project the merged table down to one language.
///
/// Column order of the source table is preserved. A language with no
/// suffixed columns at all is a data gap, not an empty result.
pub fn project_language(merged: &Table, language: &str) -> Result<Table, PipelineError> {
    let mut kept = Vec::new();
    let mut language_columns = 0usize;
    for column in merged.columns() {
        if column.ends_with(language) && !INVARIANT_COLUMNS.contains(&column.as_str()) {
            language_columns += 1;
            kept.push(column.clone());
        } else if INVARIANT_COLUMNS.contains(&column.as_str()) {
            kept.push(column.clone());
        }
    }

    if language_columns == 0 {
        return Err(PipelineError::LanguageDataGap(language.to_string()));
    }

    Ok(merged.select(&kept)?)
}

/// Strip a trailing language suffix from a column name, if present.
pub fn strip_language_suffix<'a>(column: &'a str, language: &str) -> &'a str {
    match column.strip_suffix(language) {
        Some(base) if !base.is_empty() => base,
        _ => column,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged_table() -> Table {
        let columns = [
            "AttributeID",
            "AttributeName",
            "AttributeDescriptionDE",
            "AttributeDescriptionFR",
            "AllowedValuesDE",
            "AllowedValuesFR",
            "DataType",
            "ElementNameDE",
            "ElementNameFR",
            "SortModels",
        ];
        Table::new(columns.iter().map(|c| c.to_string()).collect()).unwrap()
    }

    #[test]
    fn languages_come_from_description_suffixes_in_order() {
        assert_eq!(available_languages(&merged_table()), ["DE", "FR"]);
    }

    #[test]
    fn projection_is_language_isolated() {
        let projected = project_language(&merged_table(), "DE").unwrap();
        assert!(projected.has_column("AttributeDescriptionDE"));
        assert!(projected.has_column("AllowedValuesDE"));
        assert!(projected.has_column("DataType"));
        assert!(!projected.columns().iter().any(|c| c.ends_with("FR")));
    }

    #[test]
    fn unknown_language_is_a_data_gap() {
        let err = project_language(&merged_table(), "IT").unwrap_err();
        assert!(matches!(err, PipelineError::LanguageDataGap(l) if l == "IT"));
    }

    #[test]
    fn suffix_stripping_keeps_non_suffixed_names() {
        assert_eq!(strip_language_suffix("ElementNameDE", "DE"), "ElementName");
        assert_eq!(strip_language_suffix("Pset", "DE"), "Pset");
        assert_eq!(strip_language_suffix("DE", "DE"), "DE");
    }
}
