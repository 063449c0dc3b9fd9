use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One product/amount pair read off the invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub code: String,
    pub amount: f64,
}

/// One data row of the Excel sheet after cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetRecord {
    pub code: String,
    pub quantity: f64,
    pub tax: f64,
    pub total: f64,
}

/// Footer figures reported once per invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSummary {
    pub gross_qty: f64,
    pub total_tax: f64,
    pub grand_total: f64,
    /// Number of documents the service recognized. When greater than one,
    /// `total_tax` and `grand_total` come from the last of them.
    pub document_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Match,
    Mismatch,
}

impl MatchStatus {
    pub fn from_bool(matched: bool) -> Self {
        if matched {
            Self::Match
        } else {
            Self::Mismatch
        }
    }

    pub fn is_match(self) -> bool {
        self == Self::Match
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match => write!(f, "Match"),
            Self::Mismatch => write!(f, "Mismatch"),
        }
    }
}

/// One row of the item-wise comparison (full outer join on code).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub code: String,
    pub from_document: f64,
    pub from_spreadsheet: f64,
    pub status: MatchStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Quantity,
    Tax,
    GrandTotal,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quantity => write!(f, "Total Quantity"),
            Self::Tax => write!(f, "Total Tax"),
            Self::GrandTotal => write!(f, "Grand Total"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub metric: Metric,
    pub from_document: f64,
    pub from_spreadsheet: f64,
    /// `from_document - from_spreadsheet`, sign kept.
    pub difference: f64,
    pub status: MatchStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub quantity: AggregateRow,
    pub tax: AggregateRow,
    pub grand_total: AggregateRow,
}

impl AggregateSummary {
    pub fn rows(&self) -> [&AggregateRow; 3] {
        [&self.quantity, &self.tax, &self.grand_total]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub rows: Vec<ComparisonRow>,
    pub aggregates: AggregateSummary,
    pub tolerance: f64,
}

impl Reconciliation {
    /// Percentage of comparison rows that matched; `None` when there are no rows.
    pub fn accuracy(&self) -> Option<f64> {
        if self.rows.is_empty() {
            return None;
        }
        let matched = self.rows.iter().filter(|r| r.status.is_match()).count();
        Some(matched as f64 / self.rows.len() as f64 * 100.0)
    }

    pub fn accuracy_label(&self) -> String {
        match self.accuracy() {
            Some(pct) => format!("{:.2}%", pct),
            None => "no data".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Azure prebuilt-invoice result (only the parts we read)
// ---------------------------------------------------------------------------

/// `analyzeResult` of a finished analysis operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub documents: Vec<AnalyzedDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub fields: HashMap<String, DocumentField>,
}

/// A recognized field. Azure fills exactly one `value*` member depending on
/// `type`, plus the raw `content` text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentField {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_number: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_currency: Option<CurrencyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_array: Option<Vec<DocumentField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_object: Option<HashMap<String, DocumentField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyValue {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_symbol: Option<String>,
}
