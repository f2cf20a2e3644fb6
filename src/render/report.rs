//! Artifact assembly: column projection, sheet splitting, headers, ordinals
//! and output naming for the two workbook kinds.
//!
//! Both artifacts are cut from the same sorted, phase-expanded table. The
//! contract report splits into one sheet per deliverable file and translates
//! its headers; the import configuration is a single raw-header sheet for
//! the downstream CDE tool.

use std::collections::HashMap;

use crate::config::ReportConfig;
use crate::table::{Table, Value};
use crate::translate::HeaderTranslations;

use super::layout::compute_style_grid;
use super::xlsx::{sanitize_sheet_name, Workbook, Worksheet};
use super::RenderError;

/// Ordinal column appended to every sheet, numbering its rows from 1.
const ORDINAL_COLUMN: &str = "Sort";

/// A rendered artifact, ready for the version store.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Deterministic artifact name: `{kind}_{language}_{version}.xlsx`.
pub fn artifact_name(kind: &str, language: &str, version: &str) -> String {
    format!("{kind}_{language}_{version}.xlsx")
}

/// Render the contract-facing report: one sheet per distinct deliverable
/// file name, translated headers, phase matrix and ordinal column.
///
/// Rows with no deliverable file are omitted; they carry nothing a contract
/// reader could locate. A missing grouping column fails this language's
/// export outright rather than emitting one ungrouped sheet.
pub fn contract_report(
    table: &Table,
    phase_columns: &[String],
    language: &str,
    version: &str,
    config: &ReportConfig,
    translations: &HeaderTranslations,
) -> Result<Artifact, RenderError> {
    let group_column = format!("FileName{language}");
    let group_idx = table
        .column_index(&group_column)
        .ok_or_else(|| RenderError::GroupingColumnMissing(group_column.clone()))?;

    let projection = resolve_columns(
        table,
        &config.contract_columns,
        phase_columns,
        language,
        config.phase_column_width,
    )?;
    let headers: Vec<String> = projection
        .names
        .iter()
        .map(|name| translations.header(name, language))
        .collect();

    // Sheets in order of first appearance of their group value.
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Vec<Value>>> = HashMap::new();
    for row in table.rows() {
        let Some(group) = row[group_idx].as_text() else {
            continue;
        };
        if !groups.contains_key(group) {
            order.push(group.to_string());
        }
        groups
            .entry(group.to_string())
            .or_default()
            .push(projection.project_row(row));
    }
    if order.is_empty() {
        return Err(RenderError::EmptyTable);
    }

    let mut sheets = Vec::with_capacity(order.len());
    let mut taken: HashMap<String, usize> = HashMap::new();
    for group in order {
        let rows = number_rows(groups.remove(&group).unwrap_or_default());
        let styles = compute_style_grid(&rows, &config.grouping);
        sheets.push(Worksheet {
            name: unique_sheet_name(&group, &mut taken),
            headers: headers.clone(),
            widths: projection.widths.clone(),
            centered: projection.centered.clone(),
            rows,
            styles,
        });
    }

    let bytes = Workbook { sheets }.to_bytes()?;
    Ok(Artifact {
        file_name: artifact_name(&config.report_kind, language, version),
        bytes,
    })
}

/// Render the CDE import configuration: a single `Config` sheet with the
/// narrower column set, raw headers and the phase codes.
pub fn import_config(
    table: &Table,
    phase_columns: &[String],
    language: &str,
    version: &str,
    config: &ReportConfig,
) -> Result<Artifact, RenderError> {
    if table.is_empty() {
        return Err(RenderError::EmptyTable);
    }

    let projection = resolve_columns(
        table,
        &config.import_columns,
        phase_columns,
        language,
        config.phase_column_width,
    )?;
    let rows = number_rows(table.rows().iter().map(|r| projection.project_row(r)).collect());
    let styles = compute_style_grid(&rows, &config.grouping);

    let sheet = Worksheet {
        name: "Config".to_string(),
        headers: projection.names.clone(),
        widths: projection.widths.clone(),
        centered: projection.centered.clone(),
        rows,
        styles,
    };

    let bytes = Workbook { sheets: vec![sheet] }.to_bytes()?;
    Ok(Artifact {
        file_name: artifact_name(&config.config_kind, language, version),
        bytes,
    })
}

/// Resolved output layout: source column indexes plus per-column furniture.
struct Projection {
    /// Resolved source column names, then phase codes, then the ordinal.
    names: Vec<String>,
    /// Source indexes of the configured and phase columns (the ordinal has
    /// no source; it is generated per sheet).
    indexes: Vec<usize>,
    widths: Vec<f64>,
    centered: Vec<bool>,
}

impl Projection {
    fn project_row(&self, row: &[Value]) -> Vec<Value> {
        // ordinal appended later by number_rows
        self.indexes.iter().map(|&i| row[i].clone()).collect()
    }
}

fn resolve_columns(
    table: &Table,
    configured: &[crate::config::ColumnSpec],
    phase_columns: &[String],
    language: &str,
    phase_width: f64,
) -> Result<Projection, RenderError> {
    let mut names = Vec::new();
    let mut indexes = Vec::new();
    let mut widths = Vec::new();
    let mut centered = Vec::new();

    for spec in configured {
        let name = spec.resolve(language);
        let idx = table
            .column_index(&name)
            .ok_or_else(|| RenderError::ColumnMissing(name.clone()))?;
        names.push(name);
        indexes.push(idx);
        widths.push(spec.width);
        centered.push(false);
    }
    for code in phase_columns {
        let idx = table
            .column_index(code)
            .ok_or_else(|| RenderError::ColumnMissing(code.clone()))?;
        names.push(code.clone());
        indexes.push(idx);
        widths.push(phase_width);
        centered.push(true);
    }
    // the ordinal column shares the phase layout
    names.push(ORDINAL_COLUMN.to_string());
    widths.push(phase_width);
    centered.push(true);

    Ok(Projection {
        names,
        indexes,
        widths,
        centered,
    })
}

/// Append the 1-based ordinal to every row.
fn number_rows(mut rows: Vec<Vec<Value>>) -> Vec<Vec<Value>> {
    for (i, row) in rows.iter_mut().enumerate() {
        row.push(Value::Number((i + 1) as f64));
    }
    rows
}

/// Sanitize a sheet name and disambiguate collisions (two deliverables that
/// only differ in stripped characters or beyond the length cap).
fn unique_sheet_name(raw: &str, taken: &mut HashMap<String, usize>) -> String {
    let base = sanitize_sheet_name(raw);
    let count = taken.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        return base;
    }

    let suffix = format!(" {count}");
    let keep = 31usize.saturating_sub(suffix.chars().count());
    let truncated: String = base.chars().take(keep).collect();
    let name = format!("{truncated}{suffix}");
    tracing::warn!(sheet = %raw, renamed = %name, "Sheet name collision");
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn phase_width_config() -> ReportConfig {
        let mut config = ReportConfig::default();
        config.contract_columns = vec![
            crate::config::ColumnSpec::new("FileName*", 20.0),
            crate::config::ColumnSpec::new("ElementName*", 25.0),
            crate::config::ColumnSpec::new("AttributeName", 25.0),
        ];
        config.import_columns = vec![
            crate::config::ColumnSpec::new("ElementName*", 20.0),
            crate::config::ColumnSpec::new("AttributeName", 20.0),
            crate::config::ColumnSpec::new("AttributeName", 35.0),
        ];
        config
    }

    fn projected_table() -> (Table, Vec<String>) {
        let mut t = Table::new(vec![
            "FileNameDE".into(),
            "ElementNameDE".into(),
            "AttributeName".into(),
            "21".into(),
            "31".into(),
        ])
        .unwrap();
        let rows = [
            ("ARC.ifc", "Wand", "FireRating", true, false),
            ("ARC.ifc", "Decke", "FireRating", true, true),
            ("STA.ifc", "Stütze", "LoadBearing", false, true),
        ];
        for (file, element, attribute, p21, p31) in rows {
            t.push_row(vec![
                Value::text(file),
                Value::text(element),
                Value::text(attribute),
                Value::Bool(p21),
                Value::Bool(p31),
            ])
            .unwrap();
        }
        (t, vec!["21".into(), "31".into()])
    }

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut content = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn contract_report_splits_one_sheet_per_file_name() {
        let (table, phases) = projected_table();
        let artifact = contract_report(
            &table,
            &phases,
            "DE",
            "V1.0",
            &phase_width_config(),
            &HeaderTranslations::default(),
        )
        .unwrap();

        assert_eq!(artifact.file_name, "Elementplan_DE_V1.0.xlsx");
        let workbook = part(&artifact.bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="ARC.ifc""#));
        assert!(workbook.contains(r#"name="STA.ifc""#));

        // sheet 1 holds the two ARC rows, numbered 1 and 2
        let sheet1 = part(&artifact.bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet1.contains("<t>Wand</t>"));
        assert!(sheet1.contains("<t>Decke</t>"));
        assert!(!sheet1.contains("<t>Stütze</t>"));
        // sheet 2 restarts the ordinal at 1
        let sheet2 = part(&artifact.bytes, "xl/worksheets/sheet2.xml");
        assert!(sheet2.contains("<v>1</v>"));
    }

    #[test]
    fn rows_without_group_value_are_omitted_from_contract() {
        let (mut table, phases) = projected_table();
        table
            .push_row(vec![
                Value::Null,
                Value::text("Türe"),
                Value::text("FireRating"),
                Value::Bool(false),
                Value::Bool(false),
            ])
            .unwrap();
        let artifact = contract_report(
            &table,
            &phases,
            "DE",
            "V1.0",
            &phase_width_config(),
            &HeaderTranslations::default(),
        )
        .unwrap();
        for sheet in ["xl/worksheets/sheet1.xml", "xl/worksheets/sheet2.xml"] {
            assert!(!part(&artifact.bytes, sheet).contains("Türe"));
        }
    }

    #[test]
    fn missing_grouping_column_fails_the_language() {
        let (table, phases) = projected_table();
        let err = contract_report(
            &table,
            &phases,
            "FR",
            "V1.0",
            &phase_width_config(),
            &HeaderTranslations::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::GroupingColumnMissing(c) if c == "FileNameFR"));
    }

    #[test]
    fn missing_configured_column_fails_the_language() {
        let (table, _) = projected_table();
        let mut config = phase_width_config();
        config.contract_columns.push(crate::config::ColumnSpec::new("NoSuchColumn", 10.0));
        let err = contract_report(
            &table,
            &[],
            "DE",
            "V1.0",
            &config,
            &HeaderTranslations::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::ColumnMissing(c) if c == "NoSuchColumn"));
    }

    #[test]
    fn headers_are_translated_in_contract_report() {
        let (table, phases) = projected_table();
        let translations: HeaderTranslations = serde_json::from_str(
            r#"{"column_names": {"ElementName": {"DE": "Bauteil"}}}"#,
        )
        .unwrap();
        let artifact = contract_report(
            &table,
            &phases,
            "DE",
            "V1.0",
            &phase_width_config(),
            &translations,
        )
        .unwrap();
        let sheet1 = part(&artifact.bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet1.contains("<t>Bauteil</t>"));
        // untranslated headers fall back to the language-stripped base name
        assert!(sheet1.contains("<t>FileName</t>"));
    }

    #[test]
    fn import_config_is_one_raw_sheet_with_duplicate_columns() {
        let (table, phases) = projected_table();
        let artifact = import_config(&table, &phases, "DE", "V1.0", &phase_width_config()).unwrap();

        assert_eq!(artifact.file_name, "CdeConfig_DE_V1.0.xlsx");
        let workbook = part(&artifact.bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="Config""#));

        let sheet = part(&artifact.bytes, "xl/worksheets/sheet1.xml");
        // raw suffixed header, no translation
        assert!(sheet.contains("<t>ElementNameDE</t>"));
        // AttributeName projected twice
        assert_eq!(sheet.matches("<t>AttributeName</t>").count(), 2);
        // ungrouped: the null-group row from the contract report would be here
        assert!(sheet.contains("<t>Stütze</t>"));
    }

    #[test]
    fn empty_table_is_a_rendering_precondition_failure() {
        let (table, phases) = projected_table();
        let empty = Table::new(table.columns().to_vec()).unwrap();
        assert!(matches!(
            import_config(&empty, &phases, "DE", "V1.0", &phase_width_config()),
            Err(RenderError::EmptyTable)
        ));
        assert!(matches!(
            contract_report(
                &empty,
                &phases,
                "DE",
                "V1.0",
                &phase_width_config(),
                &HeaderTranslations::default()
            ),
            Err(RenderError::EmptyTable)
        ));
    }

    #[test]
    fn colliding_sheet_names_get_numeric_suffixes() {
        let mut taken = HashMap::new();
        assert_eq!(unique_sheet_name("A[1]", &mut taken), "A1");
        assert_eq!(unique_sheet_name("A:1", &mut taken), "A1 2");
        assert_eq!(unique_sheet_name("A*1", &mut taken), "A1 3");
    }
}
