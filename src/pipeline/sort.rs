//! Sort-key normalization and the deterministic row order.
//!
//! Sort keys come out of spreadsheet exports as text, sometimes with a comma
//! as the decimal separator. Normalization never fails: a value that cannot
//! be read as a number becomes null and sorts last.

use crate::table::{Table, TableError, Value};

/// The final ordering of requirement rows, applied after merging.
pub const SORT_COLUMNS: &[&str] = &["SortModels", "SortElement", "SortAttribute"];

/// Coerce one cell to a number. Idempotent: numbers pass through untouched.
pub fn normalize_sort_value(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(*n),
        Value::Text(s) => {
            let parsed = s.trim().replace(',', ".").parse::<f64>();
            match parsed {
                Ok(n) if n.is_finite() => Value::Number(n),
                _ => Value::Null,
            }
        }
        _ => Value::Null,
    }
}

/// Normalize a whole sort-key column in place.
pub fn normalize_sort_column(table: &mut Table, column: &str) -> Result<(), TableError> {
    table.map_column(column, normalize_sort_value)
}

/// Stable sort by the listed columns, ascending, nulls last. Columns absent
/// from the table are skipped, so the order degrades gracefully on partial
/// data instead of erroring.
pub fn sort_by_columns(table: &mut Table, columns: &[&str]) {
    let idxs: Vec<usize> = columns
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();
    if idxs.is_empty() {
        return;
    }
    table.sort_rows_by(|a, b| {
        for &i in &idxs {
            let ord = a[i].cmp_nulls_last(&b[i]);
            if ord != std::cmp::Ordering::Equal {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_decimal_parses_like_dot_decimal() {
        assert_eq!(normalize_sort_value(&Value::text("1,5")), Value::Number(1.5));
        assert_eq!(normalize_sort_value(&Value::text("1.5")), Value::Number(1.5));
        assert_eq!(normalize_sort_value(&Value::text(" 2 ")), Value::Number(2.0));
    }

    #[test]
    fn unparseable_becomes_null_not_error() {
        assert_eq!(normalize_sort_value(&Value::text("n/a")), Value::Null);
        assert_eq!(normalize_sort_value(&Value::text("")), Value::Null);
        assert_eq!(normalize_sort_value(&Value::Null), Value::Null);
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_sort_value(&Value::text("3,25"));
        let twice = normalize_sort_value(&once);
        assert_eq!(once, twice);
        assert_eq!(twice, Value::Number(3.25));
    }

    fn keyed_table(keys: &[&str]) -> Table {
        let mut t = Table::new(vec!["SortModels".into(), "Tag".into()]).unwrap();
        for (i, k) in keys.iter().enumerate() {
            t.push_row(vec![Value::from_csv_field(k), Value::text(i.to_string())])
                .unwrap();
        }
        t
    }

    #[test]
    fn nulls_sort_last_and_ties_keep_input_order() {
        let mut t = keyed_table(&["2", "", "1", "2"]);
        normalize_sort_column(&mut t, "SortModels").unwrap();
        sort_by_columns(&mut t, SORT_COLUMNS);

        let tags: Vec<_> = t
            .rows()
            .iter()
            .map(|r| r[1].as_text().unwrap().to_string())
            .collect();
        // 1 first, the two 2s in input order, null last
        assert_eq!(tags, ["2", "0", "3", "1"]);
    }

    #[test]
    fn reordering_is_deterministic() {
        let mut a = keyed_table(&["3", "1,0", "2", "x"]);
        normalize_sort_column(&mut a, "SortModels").unwrap();
        let mut b = a.clone();
        sort_by_columns(&mut a, SORT_COLUMNS);
        sort_by_columns(&mut b, SORT_COLUMNS);
        assert_eq!(a, b);
        // re-sorting an already sorted table is a no-op
        let sorted = a.clone();
        sort_by_columns(&mut a, SORT_COLUMNS);
        assert_eq!(a, sorted);
    }
}
