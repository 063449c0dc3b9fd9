use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Tolerance;
use crate::error::{ReconError, Result};
use crate::excel;
use crate::models::ColumnMapping;
use crate::ocr::{self, DocumentAnalyzer, Extraction, KnownCodes};
use crate::services::reconcile;
use crate::types::{Reconciliation, SpreadsheetRecord};

const MAX_PDF_BYTES: u64 = 50 * 1024 * 1024;
const MAX_EXCEL_BYTES: u64 = 100 * 1024 * 1024;

fn read_magic(path: &Path, len: usize) -> Result<Vec<u8>> {
    let mut f = fs::File::open(path)
        .map_err(|e| ReconError::InvalidInput(format!("Could not open {}: {}", path.display(), e)))?;
    let mut header = vec![0u8; len];
    let read = f.read(&mut header)?;
    header.truncate(read);
    Ok(header)
}

fn check_size(path: &Path, max: u64, label: &str) -> Result<()> {
    if !path.exists() {
        return Err(ReconError::InvalidInput(format!("File not found: {}", path.display())));
    }
    let metadata = fs::metadata(path)?;
    if metadata.len() > max {
        return Err(ReconError::InvalidInput(format!(
            "{} too large (max {}MB).",
            label,
            max / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Reject anything that is not a readable PDF of at most 50 MB.
pub fn validate_document_file(path: &Path) -> Result<()> {
    check_size(path, MAX_PDF_BYTES, "PDF")?;
    let header = read_magic(path, 8)?;
    if header.len() < 5 {
        return Err(ReconError::InvalidInput("Not a valid PDF (could not read header).".to_string()));
    }
    if !header.starts_with(b"%PDF-") {
        return Err(ReconError::InvalidInput("Not a valid PDF file.".to_string()));
    }
    Ok(())
}

/// Reject anything that is not an `.xlsx` (ZIP) package of at most 100 MB.
pub fn validate_excel_file(path: &Path) -> Result<()> {
    check_size(path, MAX_EXCEL_BYTES, "Excel file")?;
    let header = read_magic(path, 4)?;
    if header.len() < 4 {
        return Err(ReconError::InvalidInput(
            "Not a valid Excel file (could not read header).".to_string(),
        ));
    }
    if header != [0x50, 0x4B, 0x03, 0x04] {
        return Err(ReconError::InvalidInput("Not a valid Excel file (.xlsx).".to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub pdf: PathBuf,
    pub excel: PathBuf,
    pub tolerance: Tolerance,
    pub mapping: ColumnMapping,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub records: Vec<SpreadsheetRecord>,
    pub extraction: Extraction,
    pub reconciliation: Reconciliation,
}

/// Whole pipeline: validate inputs, read the sheet first so its codes can
/// filter the OCR rows, then compare.
pub fn run_reconciliation(analyzer: &dyn DocumentAnalyzer, options: &RunOptions) -> Result<RunOutcome> {
    validate_document_file(&options.pdf)?;
    validate_excel_file(&options.excel)?;

    let records = excel::normalize_path(&options.excel, &options.mapping)?;
    let known = KnownCodes::from_records(&records);
    info!(codes = known.len(), excel = %options.excel.display(), "material codes loaded");

    let document = fs::read(&options.pdf)?;
    let extraction = ocr::extract(analyzer, &document, &known)?;

    let reconciliation = reconcile(&extraction.items, &records, &extraction.summary, options.tolerance);
    Ok(RunOutcome {
        records,
        extraction,
        reconciliation,
    })
}
