use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet, XlsxError};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ReconError, Result};
use crate::models::ColumnMapping;
use crate::types::{Reconciliation, SpreadsheetRecord};

/// Text that identifies the header row, matched case-sensitively anywhere in a cell.
pub const HEADER_MARKER: &str = "SKU";
/// Supplier prefix removed from every material code.
pub const CODE_PREFIX: &str = "TR-";

pub const ITEM_SHEET: &str = "Item_Comparison";
pub const TOTALS_SHEET: &str = "Grand_Totals";

const ITEM_HEADERS: [&str; 4] = ["Material Code", "Total_EXCEL", "Total_PDF", "Status"];
const TOTALS_HEADERS: [&str; 5] = ["Metric", "PDF Data", "Excel (Sum)", "Difference", "Status"];

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Cell as text, `None` for empty or error cells. Whole floats drop the ".0"
/// so numeric material codes compare equal to their OCR text.
fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            Some(format!("{}", *f as i64))
        }
        Data::Float(f) => Some(f.to_string()),
        other => Some(other.to_string()),
    }
}

/// Keep digits and '.', parse the rest as a float. Anything unparsable is 0.0,
/// and so is a missing cell. The minus sign is stripped with everything else.
pub fn clean_currency(value: Option<&str>) -> f64 {
    let Some(value) = value else {
        return 0.0;
    };
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    cleaned.parse::<f64>().unwrap_or(0.0)
}

/// Remove every `TR-` and surrounding whitespace.
pub fn clean_code(raw: &str) -> String {
    raw.replace(CODE_PREFIX, "").trim().to_string()
}

/// 0-based index of the first row with a cell containing [`HEADER_MARKER`].
pub fn find_header_row(rows: &[Vec<Option<String>>]) -> Option<usize> {
    rows.iter().position(|row| {
        row.iter()
            .flatten()
            .any(|cell| cell.contains(HEADER_MARKER))
    })
}

/// Turn already-stringified sheet rows into records.
pub fn normalize_rows(rows: &[Vec<Option<String>>], mapping: &ColumnMapping) -> Result<Vec<SpreadsheetRecord>> {
    let header_idx = find_header_row(rows).ok_or_else(|| ReconError::HeaderNotFound {
        marker: HEADER_MARKER.to_string(),
    })?;
    let headers: Vec<String> = rows[header_idx]
        .iter()
        .map(|c| c.as_deref().unwrap_or("").trim().to_string())
        .collect();
    let cols = mapping.resolve(&headers)?;
    debug!(header_row = header_idx + 1, columns = headers.len(), "header row located");

    fn cell(row: &[Option<String>], idx: usize) -> Option<&str> {
        row.get(idx).and_then(|c| c.as_deref())
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in &rows[header_idx + 1..] {
        let code = match cell(row, cols.code) {
            Some(raw) => clean_code(raw),
            None => {
                skipped += 1;
                continue;
            }
        };
        // A bare "TR-" cleans to "" and still counts toward the totals.
        if code == "nan" {
            skipped += 1;
            continue;
        }
        records.push(SpreadsheetRecord {
            code,
            quantity: clean_currency(cell(row, cols.quantity)),
            tax: clean_currency(cell(row, cols.tax)),
            total: clean_currency(cell(row, cols.total)),
        });
    }
    debug!(kept = records.len(), skipped, "rows without material code skipped");
    Ok(records)
}

/// Read the first worksheet of an Excel payload and normalize it.
pub fn normalize(bytes: &[u8], mapping: &ColumnMapping) -> Result<Vec<SpreadsheetRecord>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReconError::Spreadsheet("workbook has no worksheets".to_string()))??;

    // Range starts at the first used cell; pad so positions count from column A.
    let left_pad = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    let rows: Vec<Vec<Option<String>>> = range
        .rows()
        .map(|row| {
            std::iter::repeat(None)
                .take(left_pad)
                .chain(row.iter().map(cell_to_string))
                .collect()
        })
        .collect();

    let records = normalize_rows(&rows, mapping)?;
    info!(records = records.len(), "spreadsheet normalized");
    Ok(records)
}

pub fn normalize_path(path: &Path, mapping: &ColumnMapping) -> Result<Vec<SpreadsheetRecord>> {
    let bytes = fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ReconError::InvalidInput(format!("File not found: {}", path.display()))
        } else {
            ReconError::Io(e)
        }
    })?;
    normalize(&bytes, mapping)
}

// ---------------------------------------------------------------------------
// Report export
// ---------------------------------------------------------------------------

/// Drop control chars (except tab, newline, CR) that make Excel report "unreadable content".
fn sanitize_cell(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            let u = c as u32;
            c == '\t' || c == '\n' || c == '\r' || !(u < 0x20 || u == 0x7F || u == 0xFFFE || u == 0xFFFF)
        })
        .collect()
}

fn write_header_row(worksheet: &mut Worksheet, headers: &[&str], format: &Format) -> std::result::Result<(), XlsxError> {
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, format)?;
    }
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_report_sheets(workbook: &mut Workbook, recon: &Reconciliation) -> std::result::Result<(), XlsxError> {
    let header_format = Format::new()
        .set_bold()
        .set_background_color(rust_xlsxwriter::Color::RGB(0x2563EB))
        .set_font_color(rust_xlsxwriter::Color::RGB(0xFFFFFF));
    let amount_format = Format::new()
        .set_num_format("#,##0.00")
        .set_align(FormatAlign::Right);

    let items = workbook.add_worksheet();
    items.set_name(ITEM_SHEET)?;
    write_header_row(items, &ITEM_HEADERS, &header_format)?;
    items.set_column_width(0, 22)?;
    for col in 1..=3u16 {
        items.set_column_width(col, 14)?;
    }
    for (i, row) in recon.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        items.write_string(r, 0, sanitize_cell(&row.code))?;
        items.write_number_with_format(r, 1, row.from_spreadsheet, &amount_format)?;
        items.write_number_with_format(r, 2, row.from_document, &amount_format)?;
        items.write_string(r, 3, row.status.to_string())?;
    }

    let totals = workbook.add_worksheet();
    totals.set_name(TOTALS_SHEET)?;
    write_header_row(totals, &TOTALS_HEADERS, &header_format)?;
    totals.set_column_width(0, 18)?;
    for col in 1..=4u16 {
        totals.set_column_width(col, 14)?;
    }
    for (i, agg) in recon.aggregates.rows().into_iter().enumerate() {
        let r = (i + 1) as u32;
        totals.write_string(r, 0, agg.metric.to_string())?;
        totals.write_number_with_format(r, 1, agg.from_document, &amount_format)?;
        totals.write_number_with_format(r, 2, agg.from_spreadsheet, &amount_format)?;
        totals.write_number_with_format(r, 3, agg.difference, &amount_format)?;
        totals.write_string(r, 4, agg.status.to_string())?;
    }
    Ok(())
}

/// The two-sheet report as an in-memory `.xlsx`.
pub fn report_to_buffer(recon: &Reconciliation) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    write_report_sheets(&mut workbook, recon)?;
    Ok(workbook.save_to_buffer()?)
}

fn default_report_path() -> Result<PathBuf> {
    let dir = dirs::download_dir()
        .or_else(dirs::desktop_dir)
        .ok_or_else(|| ReconError::Report("Could not find Downloads or Desktop folder.".to_string()))?;
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    Ok(unused_report_path(&dir, &stamp))
}

/// `reconciliation_report_<stamp>.xlsx` in `dir`, suffixed `_2`, `_3`, ... if taken.
fn unused_report_path(dir: &Path, stamp: &str) -> PathBuf {
    let mut path = dir.join(format!("reconciliation_report_{}.xlsx", stamp));
    let mut counter = 2u32;
    while path.exists() {
        path = dir.join(format!("reconciliation_report_{}_{}.xlsx", stamp, counter));
        counter += 1;
    }
    path
}

/// Save the report to `path_override` (forcing an `.xlsx` extension) or to a
/// timestamped file in Downloads. Returns where it was written.
pub fn export_report(recon: &Reconciliation, path_override: Option<&Path>) -> Result<PathBuf> {
    let path = match path_override {
        Some(p) => {
            let mut pb = p.to_path_buf();
            if pb.extension().and_then(|e| e.to_str()) != Some("xlsx") {
                pb.set_extension("xlsx");
            }
            pb
        }
        None => default_report_path()?,
    };
    let mut workbook = Workbook::new();
    write_report_sheets(&mut workbook, recon)?;
    workbook.save(&path)?;
    info!(path = %path.display(), "report written");
    Ok(path)
}
