//! Deterministic OOXML spreadsheet writer.
//!
//! Builds the workbook package from scratch: a zip container holding
//! quick-xml-generated parts. All strings are inline, the style sheet is a
//! fixed cross-product of the grouping decisions, and every zip entry gets
//! the same timestamp, so identical input produces byte-identical artifacts.
//! No formulas; grouping is already decided in the style grid.

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::table::Value;

use super::layout::CellStyle;
use super::RenderError;

const NS_SPREADSHEET: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const DEFAULT_COLUMN_WIDTH: f64 = 8.0;

/// Rows frozen above / columns frozen left of the scroll area.
const FROZEN_ROWS: u32 = 1;
const FROZEN_COLS: u32 = 3;

/// One output sheet: headers, per-column layout, data rows and the
/// precomputed style grid (one [`CellStyle`] per data cell).
#[derive(Debug, Clone)]
pub struct Worksheet {
    pub name: String,
    pub headers: Vec<String>,
    /// Width per column; columns beyond the list get the default width.
    pub widths: Vec<f64>,
    /// Center-aligned columns (phase matrix and ordinal columns).
    pub centered: Vec<bool>,
    pub rows: Vec<Vec<Value>>,
    pub styles: Vec<Vec<CellStyle>>,
}

/// A whole workbook, written as one artifact.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Worksheet>,
}

impl Workbook {
    /// Serialize the workbook package. Deterministic: fixed entry order,
    /// fixed timestamps, no randomness anywhere.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        if self.sheets.is_empty() {
            return Err(RenderError::EmptyWorkbook);
        }

        let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
        let mut add = |name: &str, bytes: Vec<u8>| -> Result<(), RenderError> {
            // Fixed timestamp keeps repeated renders byte-identical.
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .last_modified_time(zip::DateTime::default());
            archive.start_file(name, options)?;
            archive.write_all(&bytes)?;
            Ok(())
        };

        add("[Content_Types].xml", content_types_xml(self.sheets.len())?)?;
        add("_rels/.rels", root_rels_xml()?)?;
        add("xl/workbook.xml", workbook_xml(&self.sheets)?)?;
        add("xl/_rels/workbook.xml.rels", workbook_rels_xml(self.sheets.len())?)?;
        add("xl/styles.xml", styles_xml()?)?;
        for (i, sheet) in self.sheets.iter().enumerate() {
            add(&format!("xl/worksheets/sheet{}.xml", i + 1), worksheet_xml(sheet)?)?;
        }

        Ok(archive.finish()?.into_inner())
    }
}

/// Style-sheet slot for a data cell. Slot 0 is the bare default and slot 1
/// the header; data slots cover the muted/border/centered cross-product.
fn cell_style_slot(style: CellStyle, centered: bool) -> u32 {
    2 + centered as u32 + 2 * style.top_border as u32 + 4 * style.muted as u32
}

const HEADER_STYLE_SLOT: u32 = 1;

/// Strip characters the format forbids in sheet names and cap the length.
/// Collision handling after truncation is the caller's concern.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | '?' | '*' | '[' | ']' | ':'))
        .collect();
    let cleaned = cleaned.trim();
    let capped: String = cleaned.chars().take(31).collect();
    if capped.is_empty() {
        "Sheet".to_string()
    } else {
        capped
    }
}

/// Spreadsheet column reference: 0 → A, 25 → Z, 26 → AA.
fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_else(|_| "A".to_string())
}

// ---------------------------------------------------------------------------
// XML part builders
// ---------------------------------------------------------------------------

type XmlWriter = Writer<Vec<u8>>;

fn xml_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Xml(e.to_string())
}

fn new_writer() -> Result<XmlWriter, RenderError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(xml_error)?;
    Ok(writer)
}

fn start(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), RenderError> {
    let mut el = BytesStart::new(name);
    for &(k, v) in attrs {
        el.push_attribute((k, v));
    }
    writer.write_event(Event::Start(el)).map_err(xml_error)
}

fn empty(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), RenderError> {
    let mut el = BytesStart::new(name);
    for &(k, v) in attrs {
        el.push_attribute((k, v));
    }
    writer.write_event(Event::Empty(el)).map_err(xml_error)
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<(), RenderError> {
    writer.write_event(Event::End(BytesEnd::new(name))).map_err(xml_error)
}

fn text(writer: &mut XmlWriter, value: &str) -> Result<(), RenderError> {
    writer.write_event(Event::Text(BytesText::new(value))).map_err(xml_error)
}

fn content_types_xml(sheet_count: usize) -> Result<Vec<u8>, RenderError> {
    let mut w = new_writer()?;
    start(&mut w, "Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    empty(&mut w, "Default", &[
        ("Extension", "rels"),
        ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
    ])?;
    empty(&mut w, "Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    empty(&mut w, "Override", &[
        ("PartName", "/xl/workbook.xml"),
        (
            "ContentType",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
        ),
    ])?;
    empty(&mut w, "Override", &[
        ("PartName", "/xl/styles.xml"),
        (
            "ContentType",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml",
        ),
    ])?;
    for i in 1..=sheet_count {
        let part = format!("/xl/worksheets/sheet{i}.xml");
        empty(&mut w, "Override", &[
            ("PartName", part.as_str()),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
            ),
        ])?;
    }
    end(&mut w, "Types")?;
    Ok(w.into_inner())
}

fn root_rels_xml() -> Result<Vec<u8>, RenderError> {
    let mut w = new_writer()?;
    start(&mut w, "Relationships", &[("xmlns", NS_PACKAGE_RELS)])?;
    empty(&mut w, "Relationship", &[
        ("Id", "rId1"),
        (
            "Type",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
        ),
        ("Target", "xl/workbook.xml"),
    ])?;
    end(&mut w, "Relationships")?;
    Ok(w.into_inner())
}

fn workbook_xml(sheets: &[Worksheet]) -> Result<Vec<u8>, RenderError> {
    let mut w = new_writer()?;
    start(&mut w, "workbook", &[("xmlns", NS_SPREADSHEET), ("xmlns:r", NS_RELATIONSHIPS)])?;
    start(&mut w, "sheets", &[])?;
    for (i, sheet) in sheets.iter().enumerate() {
        let sheet_id = (i + 1).to_string();
        let rel_id = format!("rId{}", i + 1);
        empty(&mut w, "sheet", &[
            ("name", sheet.name.as_str()),
            ("sheetId", sheet_id.as_str()),
            ("r:id", rel_id.as_str()),
        ])?;
    }
    end(&mut w, "sheets")?;
    end(&mut w, "workbook")?;
    Ok(w.into_inner())
}

fn workbook_rels_xml(sheet_count: usize) -> Result<Vec<u8>, RenderError> {
    let mut w = new_writer()?;
    start(&mut w, "Relationships", &[("xmlns", NS_PACKAGE_RELS)])?;
    for i in 1..=sheet_count {
        let id = format!("rId{i}");
        let target = format!("worksheets/sheet{i}.xml");
        empty(&mut w, "Relationship", &[
            ("Id", id.as_str()),
            (
                "Type",
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet",
            ),
            ("Target", target.as_str()),
        ])?;
    }
    let styles_id = format!("rId{}", sheet_count + 1);
    empty(&mut w, "Relationship", &[
        ("Id", styles_id.as_str()),
        (
            "Type",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles",
        ),
        ("Target", "styles.xml"),
    ])?;
    end(&mut w, "Relationships")?;
    Ok(w.into_inner())
}

/// Fixed style sheet: default font, muted grey font, bold header font, the
/// thin top border, and one cell format per (muted, border, centered)
/// combination at the slots [`cell_style_slot`] hands out.
fn styles_xml() -> Result<Vec<u8>, RenderError> {
    let mut w = new_writer()?;
    start(&mut w, "styleSheet", &[("xmlns", NS_SPREADSHEET)])?;

    start(&mut w, "fonts", &[("count", "3")])?;
    for font in ["normal", "muted", "bold"] {
        start(&mut w, "font", &[])?;
        if font == "bold" {
            empty(&mut w, "b", &[])?;
        }
        empty(&mut w, "sz", &[("val", "11")])?;
        if font == "muted" {
            empty(&mut w, "color", &[("rgb", "FFD3D3D3")])?;
        }
        empty(&mut w, "name", &[("val", "Calibri")])?;
        end(&mut w, "font")?;
    }
    end(&mut w, "fonts")?;

    start(&mut w, "fills", &[("count", "2")])?;
    for pattern in ["none", "gray125"] {
        start(&mut w, "fill", &[])?;
        empty(&mut w, "patternFill", &[("patternType", pattern)])?;
        end(&mut w, "fill")?;
    }
    end(&mut w, "fills")?;

    start(&mut w, "borders", &[("count", "2")])?;
    for top_border in [false, true] {
        start(&mut w, "border", &[])?;
        empty(&mut w, "left", &[])?;
        empty(&mut w, "right", &[])?;
        if top_border {
            empty(&mut w, "top", &[("style", "thin")])?;
        } else {
            empty(&mut w, "top", &[])?;
        }
        empty(&mut w, "bottom", &[])?;
        empty(&mut w, "diagonal", &[])?;
        end(&mut w, "border")?;
    }
    end(&mut w, "borders")?;

    start(&mut w, "cellStyleXfs", &[("count", "1")])?;
    empty(&mut w, "xf", &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")])?;
    end(&mut w, "cellStyleXfs")?;

    start(&mut w, "cellXfs", &[("count", "10")])?;
    // slot 0: package default
    empty(&mut w, "xf", &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")])?;
    // slot 1: header row
    empty(&mut w, "xf", &[
        ("numFmtId", "0"),
        ("fontId", "2"),
        ("fillId", "0"),
        ("borderId", "0"),
        ("applyFont", "1"),
    ])?;
    // slots 2-9: the order must match cell_style_slot
    for muted in [false, true] {
        for border in [false, true] {
            for centered in [false, true] {
                let font_id = if muted { "1" } else { "0" };
                let border_id = if border { "1" } else { "0" };
                start(&mut w, "xf", &[
                    ("numFmtId", "0"),
                    ("fontId", font_id),
                    ("fillId", "0"),
                    ("borderId", border_id),
                    ("applyFont", "1"),
                    ("applyBorder", "1"),
                    ("applyAlignment", "1"),
                ])?;
                if centered {
                    empty(&mut w, "alignment", &[
                        ("horizontal", "center"),
                        ("vertical", "top"),
                        ("wrapText", "1"),
                    ])?;
                } else {
                    empty(&mut w, "alignment", &[("vertical", "top"), ("wrapText", "1")])?;
                }
                end(&mut w, "xf")?;
            }
        }
    }
    end(&mut w, "cellXfs")?;

    end(&mut w, "styleSheet")?;
    Ok(w.into_inner())
}

fn worksheet_xml(sheet: &Worksheet) -> Result<Vec<u8>, RenderError> {
    let ncols = sheet.headers.len();
    let nrows = sheet.rows.len();
    let mut w = new_writer()?;
    start(&mut w, "worksheet", &[("xmlns", NS_SPREADSHEET), ("xmlns:r", NS_RELATIONSHIPS)])?;

    // Frozen panes: header row plus the leading identity columns.
    let top_left = format!("{}{}", column_letter(FROZEN_COLS as usize), FROZEN_ROWS + 1);
    start(&mut w, "sheetViews", &[])?;
    start(&mut w, "sheetView", &[("workbookViewId", "0")])?;
    let x_split = FROZEN_COLS.to_string();
    let y_split = FROZEN_ROWS.to_string();
    empty(&mut w, "pane", &[
        ("xSplit", x_split.as_str()),
        ("ySplit", y_split.as_str()),
        ("topLeftCell", top_left.as_str()),
        ("activePane", "bottomRight"),
        ("state", "frozen"),
    ])?;
    end(&mut w, "sheetView")?;
    end(&mut w, "sheetViews")?;

    if ncols > 0 {
        start(&mut w, "cols", &[])?;
        for col in 0..ncols {
            let width = sheet.widths.get(col).copied().unwrap_or(DEFAULT_COLUMN_WIDTH);
            let col_ref = (col + 1).to_string();
            let width_str = format!("{width}");
            empty(&mut w, "col", &[
                ("min", col_ref.as_str()),
                ("max", col_ref.as_str()),
                ("width", width_str.as_str()),
                ("customWidth", "1"),
            ])?;
        }
        end(&mut w, "cols")?;
    }

    start(&mut w, "sheetData", &[])?;
    start(&mut w, "row", &[("r", "1")])?;
    for (col, header) in sheet.headers.iter().enumerate() {
        write_cell(&mut w, 0, col, &Value::Text(header.clone()), HEADER_STYLE_SLOT)?;
    }
    end(&mut w, "row")?;

    for (i, row) in sheet.rows.iter().enumerate() {
        let row_ref = (i + 2).to_string();
        start(&mut w, "row", &[("r", row_ref.as_str())])?;
        for col in 0..ncols {
            let value = row.get(col).unwrap_or(&Value::Null);
            let style = sheet
                .styles
                .get(i)
                .and_then(|r| r.get(col))
                .copied()
                .unwrap_or_default();
            let centered = sheet.centered.get(col).copied().unwrap_or(false);
            write_cell(&mut w, i + 1, col, value, cell_style_slot(style, centered))?;
        }
        end(&mut w, "row")?;
    }
    end(&mut w, "sheetData")?;

    if ncols > 0 {
        let filter = format!("A1:{}{}", column_letter(ncols - 1), nrows + 1);
        empty(&mut w, "autoFilter", &[("ref", filter.as_str())])?;
    }

    end(&mut w, "worksheet")?;
    Ok(w.into_inner())
}

/// One cell. Text goes out as an inline string, numbers as plain values,
/// phase booleans as `X`/blank, nulls as an empty styled cell so border
/// lines run across gaps in the data.
fn write_cell(
    w: &mut XmlWriter,
    row: usize,
    col: usize,
    value: &Value,
    style_slot: u32,
) -> Result<(), RenderError> {
    let cell_ref = format!("{}{}", column_letter(col), row + 1);
    let slot = style_slot.to_string();

    let inline = match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("X".to_string()),
        Value::Text(s) => Some(s.clone()),
        Value::Number(n) => {
            start(w, "c", &[("r", cell_ref.as_str()), ("s", slot.as_str())])?;
            start(w, "v", &[])?;
            text(w, &format!("{n}"))?;
            end(w, "v")?;
            end(w, "c")?;
            return Ok(());
        }
    };

    match inline {
        None => empty(w, "c", &[("r", cell_ref.as_str()), ("s", slot.as_str())]),
        Some(s) => {
            start(w, "c", &[
                ("r", cell_ref.as_str()),
                ("s", slot.as_str()),
                ("t", "inlineStr"),
            ])?;
            start(w, "is", &[])?;
            if s.trim().len() == s.len() {
                start(w, "t", &[])?;
            } else {
                start(w, "t", &[("xml:space", "preserve")])?;
            }
            text(w, &s)?;
            end(w, "t")?;
            end(w, "is")?;
            end(w, "c")
        }
    }
}
