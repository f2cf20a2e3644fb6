//! Phase-presence matrix expansion.
//!
//! A requirement row applies to several project phases, recorded as a
//! delimited list like `"21 Vorprojekt, 31 Ausschreibung"`. The matrix turns
//! that into one boolean column per distinct phase code found in the data,
//! so the schema of the expanded table is data-dependent by design.

use std::collections::{BTreeSet, HashSet};

use crate::table::{Table, Value};

use super::links::{split_list, LIST_DELIMITER};
use super::PipelineError;

const PHASE_COLUMN_PREFIX: &str = "ProjectPhase";

/// Expand the language's phase column into boolean presence columns.
///
/// Columns are named by the short code (the first whitespace token of the
/// phase value) and appended in lexical order. Returns the added column
/// names. A missing phase column yields no matrix rather than an error; a
/// short code colliding with an existing column fails this language.
pub fn expand_phase_matrix(
    table: &mut Table,
    language: &str,
) -> Result<Vec<String>, PipelineError> {
    let column = format!("{PHASE_COLUMN_PREFIX}{language}");
    let Some(idx) = table.column_index(&column) else {
        tracing::warn!(column = %column, "No phase column; skipping phase matrix");
        return Ok(Vec::new());
    };

    // Short-code membership per row, plus the global code set.
    let mut row_codes: Vec<HashSet<String>> = Vec::with_capacity(table.row_count());
    let mut all_codes: BTreeSet<String> = BTreeSet::new();
    for row in table.rows() {
        let mut codes = HashSet::new();
        for item in split_list(&row[idx], LIST_DELIMITER) {
            if let Some(code) = item.as_text().map(short_code) {
                all_codes.insert(code.to_string());
                codes.insert(code.to_string());
            }
        }
        row_codes.push(codes);
    }

    let mut added = Vec::with_capacity(all_codes.len());
    for code in all_codes {
        if table.has_column(&code) {
            return Err(PipelineError::PhaseColumnCollision { code });
        }
        let values: Vec<Value> = row_codes
            .iter()
            .map(|codes| Value::Bool(codes.contains(&code)))
            .collect();
        table.add_column(&code, values)?;
        added.push(code);
    }

    tracing::debug!(columns = added.len(), source = %column, "Expanded phase matrix");
    Ok(added)
}

/// First whitespace-separated token of a phase value: `"31 Ausschreibung"`
/// names the column `31`.
fn short_code(phase: &str) -> &str {
    phase.split_whitespace().next().unwrap_or(phase)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase_table(cells: &[&str]) -> Table {
        let mut t = Table::new(vec!["AttributeID".into(), "ProjectPhaseDE".into()]).unwrap();
        for (i, cell) in cells.iter().enumerate() {
            t.push_row(vec![Value::text(format!("A{i}")), Value::from_csv_field(cell)])
                .unwrap();
        }
        t
    }

    #[test]
    fn codes_are_collected_across_all_rows_and_sorted() {
        let mut t = phase_table(&["31,21", "41", ""]);
        let added = expand_phase_matrix(&mut t, "DE").unwrap();
        assert_eq!(added, ["21", "31", "41"]);
        assert_eq!(&t.columns()[2..], ["21", "31", "41"]);
    }

    #[test]
    fn descriptive_prefixes_collapse_to_the_short_code() {
        let mut t = phase_table(&["21 Vorprojekt, 31 Ausschreibung"]);
        let added = expand_phase_matrix(&mut t, "DE").unwrap();
        assert_eq!(added, ["21", "31"]);
        assert_eq!(t.cell(0, "21"), Some(&Value::Bool(true)));
        assert_eq!(t.cell(0, "31"), Some(&Value::Bool(true)));
    }

    #[test]
    fn presence_count_matches_distinct_codes_per_row() {
        let mut t = phase_table(&["21,31", "31", ""]);
        let added = expand_phase_matrix(&mut t, "DE").unwrap();

        for (row, expected) in [(0usize, 2usize), (1, 1), (2, 0)] {
            let set: usize = added
                .iter()
                .filter(|code| t.cell(row, code) == Some(&Value::Bool(true)))
                .count();
            assert_eq!(set, expected, "row {row}");
        }
    }

    #[test]
    fn missing_phase_column_yields_empty_matrix() {
        let mut t = Table::new(vec!["AttributeID".into()]).unwrap();
        t.push_row(vec![Value::text("A0")]).unwrap();
        let added = expand_phase_matrix(&mut t, "DE").unwrap();
        assert!(added.is_empty());
        assert_eq!(t.column_count(), 1);
    }

    #[test]
    fn code_colliding_with_existing_column_fails() {
        let mut t = Table::new(vec![
            "AttributeID".into(),
            "ProjectPhaseDE".into(),
            "21".into(),
        ])
        .unwrap();
        t.push_row(vec![Value::text("A0"), Value::text("21"), Value::Null])
            .unwrap();
        let err = expand_phase_matrix(&mut t, "DE").unwrap_err();
        assert!(matches!(err, PipelineError::PhaseColumnCollision { code } if code == "21"));
    }
}
