//! Generic in-memory table: ordered unique columns over rows of [`Value`]
//! cells. Every pipeline stage consumes and produces this shape, so the
//! stages stay pure functions that can be composed and re-run freely.

pub mod schema;
pub mod value;

use std::cmp::Ordering;
use std::collections::HashMap;

use thiserror::Error;

pub use value::Value;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Row has {got} cells but the table has {expected} columns")]
    RowLength { expected: usize, got: usize },

    #[error("Column of {got} values does not match {expected} rows")]
    ColumnLength { expected: usize, got: usize },
}

/// Column-ordered table of [`Value`] cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given column names.
    /// Column names must be unique.
    pub fn new(columns: Vec<String>) -> Result<Table, TableError> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Table {
            columns,
            index,
            rows: Vec::new(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn require_column(&self, name: &str) -> Result<usize, TableError> {
        self.column_index(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    /// Cell by row number and column name. None when either is out of range.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowLength {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a new column with one value per existing row.
    pub fn add_column(&mut self, name: &str, values: Vec<Value>) -> Result<(), TableError> {
        if self.has_column(name) {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        if values.len() != self.rows.len() {
            return Err(TableError::ColumnLength {
                expected: self.rows.len(),
                got: values.len(),
            });
        }
        self.index.insert(name.to_string(), self.columns.len());
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// New table containing only the named columns, in the given order.
    /// Row order is preserved.
    pub fn select(&self, names: &[String]) -> Result<Table, TableError> {
        let idxs = names
            .iter()
            .map(|n| self.require_column(n))
            .collect::<Result<Vec<_>, _>>()?;
        let mut out = Table::new(names.to_vec())?;
        for row in &self.rows {
            out.push_row(idxs.iter().map(|&i| row[i].clone()).collect())?;
        }
        Ok(out)
    }

    /// Rewrite every cell of one column in place.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> Result<(), TableError>
    where
        F: FnMut(&Value) -> Value,
    {
        let col = self.require_column(name)?;
        for row in &mut self.rows {
            row[col] = f(&row[col]);
        }
        Ok(())
    }

    /// Keep only the rows the predicate accepts. Relative order is preserved.
    pub fn retain_rows<F>(&mut self, mut pred: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|row| pred(row));
    }

    /// Stable sort of the rows by the given comparator.
    pub fn sort_rows_by<F>(&mut self, mut cmp: F)
    where
        F: FnMut(&[Value], &[Value]) -> Ordering,
    {
        self.rows.sort_by(|a, b| cmp(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(vec!["A".into(), "B".into()]).unwrap();
        t.push_row(vec![Value::text("a1"), Value::text("b1")]).unwrap();
        t.push_row(vec![Value::text("a2"), Value::Null]).unwrap();
        t
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let err = Table::new(vec!["A".into(), "A".into()]).unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn(_)));
    }

    #[test]
    fn row_arity_is_checked() {
        let mut t = sample();
        let err = t.push_row(vec![Value::Null]).unwrap_err();
        assert!(matches!(err, TableError::RowLength { expected: 2, got: 1 }));
    }

    #[test]
    fn select_reorders_columns() {
        let t = sample();
        let s = t.select(&["B".into(), "A".into()]).unwrap();
        assert_eq!(s.columns(), ["B", "A"]);
        assert_eq!(s.cell(0, "A"), Some(&Value::text("a1")));
        assert_eq!(s.cell(1, "B"), Some(&Value::Null));
    }

    #[test]
    fn select_unknown_column_fails() {
        let err = sample().select(&["C".into()]).unwrap_err();
        assert!(matches!(err, TableError::ColumnNotFound(c) if c == "C"));
    }

    #[test]
    fn add_column_appends_per_row() {
        let mut t = sample();
        t.add_column("C", vec![Value::Bool(true), Value::Bool(false)])
            .unwrap();
        assert_eq!(t.columns(), ["A", "B", "C"]);
        assert_eq!(t.cell(1, "C"), Some(&Value::Bool(false)));

        let err = t.add_column("C", vec![Value::Null, Value::Null]).unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn(_)));
    }

    #[test]
    fn sort_is_stable() {
        let mut t = Table::new(vec!["K".into(), "Tag".into()]).unwrap();
        for (k, tag) in [("1", "first"), ("2", "a"), ("1", "second")] {
            t.push_row(vec![Value::text(k), Value::text(tag)]).unwrap();
        }
        t.sort_rows_by(|a, b| a[0].cmp_nulls_last(&b[0]));
        assert_eq!(t.cell(0, "Tag"), Some(&Value::text("first")));
        assert_eq!(t.cell(1, "Tag"), Some(&Value::text("second")));
    }
}
