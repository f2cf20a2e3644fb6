//! Group-boundary and fade computation for the rendered sheets.
//!
//! The grouped look of the report is pure data: a cell is muted when it
//! repeats the value above it, and a row segment gets a top border when a
//! watched column changes against the previous row. Computing this grid here,
//! before any workbook bytes exist, keeps the grouping logic testable without
//! a spreadsheet engine.

use serde::{Deserialize, Serialize};

use crate::table::Value;

/// Grouping rules, keyed by output column position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingRules {
    /// Leading columns eligible for the repeated-value fade.
    #[serde(default = "default_fade_columns")]
    pub fade_columns: usize,
    /// A change in this column borders the whole row.
    #[serde(default)]
    pub row_boundary_column: usize,
    /// A change in one of these columns borders the row from that column on.
    #[serde(default = "default_section_boundary_columns")]
    pub section_boundary_columns: Vec<usize>,
    /// Columns at or beyond this index are bordered on every row.
    #[serde(default = "default_grid_from")]
    pub grid_from: usize,
}

fn default_fade_columns() -> usize {
    6
}

fn default_section_boundary_columns() -> Vec<usize> {
    vec![2, 5]
}

fn default_grid_from() -> usize {
    6
}

impl Default for GroupingRules {
    fn default() -> Self {
        GroupingRules {
            fade_columns: default_fade_columns(),
            row_boundary_column: 0,
            section_boundary_columns: default_section_boundary_columns(),
            grid_from: default_grid_from(),
        }
    }
}

/// Rendering decision for one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellStyle {
    /// Repeated leading value, rendered in grey.
    pub muted: bool,
    /// Group change, rendered with a top border. A bordered cell is never
    /// muted; the boundary wins.
    pub top_border: bool,
}

/// Compute the style grid for one sheet's data rows.
///
/// Pure function of the cell values and the rules: rendering the same sorted
/// table twice yields identical decisions.
pub fn compute_style_grid(rows: &[Vec<Value>], rules: &GroupingRules) -> Vec<Vec<CellStyle>> {
    let mut grid = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let ncols = row.len();
        let mut styles = vec![CellStyle::default(); ncols];

        if i == 0 {
            // The first data row always starts a group.
            for style in &mut styles {
                style.top_border = true;
            }
            grid.push(styles);
            continue;
        }

        let prev = &rows[i - 1];
        let changed = |c: usize| c < ncols && c < prev.len() && row[c] != prev[c];

        // Leftmost column from which this row is bordered, if any rule fired.
        let mut border_from = usize::MAX;
        if changed(rules.row_boundary_column) {
            border_from = 0;
        }
        for &c in &rules.section_boundary_columns {
            if changed(c) {
                border_from = border_from.min(c);
            }
        }

        for (col, style) in styles.iter_mut().enumerate() {
            style.top_border = col >= rules.grid_from || col >= border_from;
            style.muted = !style.top_border
                && col < rules.fade_columns
                && col < prev.len()
                && row[col] == prev[col];
        }
        grid.push(styles);
    }
    grid
}
