//! Link-list parsing and cartesian row explosion.
//!
//! Attribute rows carry their many-to-many relations inline: a link column
//! holds a delimited list of target-table IDs. Explosion turns every row into
//! one row per combination of single link values, so the merge step can treat
//! the attribute table as a plain junction table.

use crate::table::{Table, Value};

use super::PipelineError;

/// Default delimiter of link lists and phase lists.
pub const LIST_DELIMITER: char = ',';

/// Split one delimited cell into trimmed scalar values.
///
/// The split honors double quotes: a delimiter inside a quoted sub-value does
/// not split, `""` inside quotes is a literal quote, and the surrounding
/// quotes themselves are not part of the value. Interior items that trim to
/// nothing are dropped; a cell with no items at all (null, empty, or only
/// delimiters) yields a single null so the row survives explosion.
pub fn split_list(value: &Value, delimiter: char) -> Vec<Value> {
    let text = match value {
        Value::Null => return vec![Value::Null],
        Value::Text(s) => s.as_str(),
        // Non-text cells cannot hold a list; pass them through unsplit.
        other => return vec![other.clone()],
    };

    let mut items = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    buf.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            c if c == delimiter && !in_quotes => {
                items.push(std::mem::take(&mut buf));
            }
            c => buf.push(c),
        }
    }
    items.push(buf);

    let values: Vec<Value> = items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .map(Value::Text)
        .collect();

    if values.is_empty() {
        vec![Value::Null]
    } else {
        values
    }
}

/// Explode the given link columns into one scalar link value per row.
///
/// Columns explode independently: a row with n values in one column and m in
/// another produces n·m rows. All other cells are carried unchanged.
pub fn explode_links(
    table: &Table,
    link_columns: &[&str],
    delimiter: char,
) -> Result<Table, PipelineError> {
    let idxs = link_columns
        .iter()
        .map(|c| Ok(table.require_column(c)?))
        .collect::<Result<Vec<usize>, PipelineError>>()?;

    let mut out = Table::new(table.columns().to_vec())?;
    for row in table.rows() {
        let lists: Vec<Vec<Value>> = idxs.iter().map(|&i| split_list(&row[i], delimiter)).collect();

        let mut combos: Vec<Vec<Value>> = vec![Vec::with_capacity(idxs.len())];
        for list in &lists {
            let mut next = Vec::with_capacity(combos.len() * list.len());
            for combo in &combos {
                for value in list {
                    let mut combo = combo.clone();
                    combo.push(value.clone());
                    next.push(combo);
                }
            }
            combos = next;
        }

        for combo in combos {
            let mut new_row = row.clone();
            for (k, &i) in idxs.iter().enumerate() {
                new_row[i] = combo[k].clone();
            }
            out.push_row(new_row)?;
        }
    }

    tracing::debug!(
        rows_in = table.row_count(),
        rows_out = out.row_count(),
        columns = ?link_columns,
        "Exploded link columns"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::text(*s)).collect()
    }

    #[test]
    fn plain_list_splits_and_trims() {
        let got = split_list(&Value::text(" E1, E2 ,E3"), ',');
        assert_eq!(got, texts(&["E1", "E2", "E3"]));
    }

    #[test]
    fn quoted_delimiter_does_not_split() {
        let got = split_list(&Value::text(r#""E1,withComma",E2"#), ',');
        assert_eq!(got, texts(&["E1,withComma", "E2"]));
    }

    #[test]
    fn doubled_quote_is_literal() {
        let got = split_list(&Value::text(r#""say ""hi""",B"#), ',');
        assert_eq!(got, texts(&[r#"say "hi""#, "B"]));
    }

    #[test]
    fn empty_cell_yields_single_null() {
        assert_eq!(split_list(&Value::Null, ','), vec![Value::Null]);
        assert_eq!(split_list(&Value::text(""), ','), vec![Value::Null]);
        assert_eq!(split_list(&Value::text(" , ,"), ','), vec![Value::Null]);
    }

    #[test]
    fn interior_empty_items_are_dropped() {
        let got = split_list(&Value::text("E1,,E2"), ',');
        assert_eq!(got, texts(&["E1", "E2"]));
    }

    fn link_table(element: &str, model: &str) -> Table {
        let mut t = Table::new(vec![
            "AttributeID".into(),
            "ElementLink".into(),
            "ModelLink".into(),
        ])
        .unwrap();
        t.push_row(vec![
            Value::text("A1"),
            Value::from_csv_field(element),
            Value::from_csv_field(model),
        ])
        .unwrap();
        t
    }

    #[test]
    fn explosion_is_cartesian_across_columns() {
        let t = link_table("E1,E2,E3", "M1,M2");
        let out = explode_links(&t, &["ElementLink", "ModelLink"], ',').unwrap();
        assert_eq!(out.row_count(), 6);
        // every row carries exactly one scalar link per column
        for row in out.rows() {
            assert!(row[1].as_text().is_some());
            assert!(row[2].as_text().is_some());
        }
        assert_eq!(out.cell(0, "ElementLink"), Some(&Value::text("E1")));
        assert_eq!(out.cell(0, "ModelLink"), Some(&Value::text("M1")));
        assert_eq!(out.cell(5, "ElementLink"), Some(&Value::text("E3")));
        assert_eq!(out.cell(5, "ModelLink"), Some(&Value::text("M2")));
    }

    #[test]
    fn unlinked_row_is_preserved_with_null() {
        let t = link_table("", "M1");
        let out = explode_links(&t, &["ElementLink", "ModelLink"], ',').unwrap();
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.cell(0, "ElementLink"), Some(&Value::Null));
        assert_eq!(out.cell(0, "ModelLink"), Some(&Value::text("M1")));
    }

    #[test]
    fn missing_link_column_is_an_error() {
        let t = link_table("E1", "M1");
        assert!(explode_links(&t, &["NoSuchLink"], ',').is_err());
    }
}
