//! Reconcile an OCR-scanned invoice against the Excel sheet of its line items.
//!
//! Pipeline: [`excel::normalize`] the sheet, [`ocr::extract`] the invoice
//! filtered by the sheet's material codes, then [`reconcile`] the two.

pub mod commands;
pub mod config;
pub mod error;
pub mod excel;
pub mod models;
pub mod ocr;
pub mod services;
pub mod types;

pub use config::{AzureConfig, Tolerance};
pub use error::{ReconError, Result};
pub use excel::{export_report, normalize};
pub use models::{ColumnBinding, ColumnMapping};
pub use ocr::{extract, is_known_code, AzureInvoiceClient, DocumentAnalyzer, Extraction, KnownCodes};
pub use services::reconcile;
pub use types::{
    AggregateRow, AggregateSummary, ComparisonRow, ExtractedSummary, LineItem, MatchStatus, Metric, Reconciliation,
    SpreadsheetRecord,
};
