use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ReconError, Result};

/// Where a field lives in the sheet: a fixed 0-based position or a header text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnBinding {
    Index(usize),
    Header(String),
}

impl ColumnBinding {
    /// Resolve against the trimmed header row, returning a 0-based column index.
    pub fn resolve(&self, field: &str, headers: &[String]) -> Result<usize> {
        let found = match self {
            Self::Index(i) => (*i < headers.len()).then_some(*i),
            Self::Header(name) => headers.iter().position(|h| h == name.trim()),
        };
        found.ok_or_else(|| ReconError::ColumnNotFound {
            field: field.to_string(),
            binding: self.to_string(),
        })
    }
}

impl fmt::Display for ColumnBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "column index {}", i),
            Self::Header(name) => write!(f, "header '{}'", name),
        }
    }
}

/// Numbers become indices, anything else a header name.
impl FromStr for ColumnBinding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("column binding must not be empty".to_string());
        }
        Ok(match s.parse::<usize>() {
            Ok(i) => Self::Index(i),
            Err(_) => Self::Header(s.to_string()),
        })
    }
}

/// Binding of the four fields we read from the Excel sheet.
///
/// The default matches the supplier template: code in A, quantity in E,
/// tax in K, total in L.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub code: ColumnBinding,
    pub quantity: ColumnBinding,
    pub tax: ColumnBinding,
    pub total: ColumnBinding,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            code: ColumnBinding::Index(0),
            quantity: ColumnBinding::Index(4),
            tax: ColumnBinding::Index(10),
            total: ColumnBinding::Index(11),
        }
    }
}

/// Column positions after resolving a [`ColumnMapping`] against a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub code: usize,
    pub quantity: usize,
    pub tax: usize,
    pub total: usize,
}

impl ColumnMapping {
    pub fn resolve(&self, headers: &[String]) -> Result<ResolvedColumns> {
        Ok(ResolvedColumns {
            code: self.code.resolve("code", headers)?,
            quantity: self.quantity.resolve("quantity", headers)?,
            tax: self.tax.resolve("tax", headers)?,
            total: self.total.resolve("total", headers)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_mapping_resolves_on_wide_header() {
        let row: Vec<String> = (0..12).map(|i| format!("H{}", i)).collect();
        let cols = ColumnMapping::default().resolve(&row).unwrap();
        assert_eq!(cols, ResolvedColumns { code: 0, quantity: 4, tax: 10, total: 11 });
    }

    #[test]
    fn narrow_header_reports_missing_column() {
        let row = headers(&["SKU", "Desc", "HSN", "Rate", "Qty"]);
        let err = ColumnMapping::default().resolve(&row).unwrap_err();
        match err {
            ReconError::ColumnNotFound { field, binding } => {
                assert_eq!(field, "tax");
                assert_eq!(binding, "column index 10");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_binding_finds_named_column() {
        let row = headers(&["SKU", "Qty", "GST", "Amount"]);
        let mapping = ColumnMapping {
            code: "SKU".parse().unwrap(),
            quantity: "Qty".parse().unwrap(),
            tax: "GST".parse().unwrap(),
            total: " Amount ".parse().unwrap(),
        };
        let cols = mapping.resolve(&row).unwrap();
        assert_eq!(cols, ResolvedColumns { code: 0, quantity: 1, tax: 2, total: 3 });
    }

    #[test]
    fn binding_parses_numbers_as_indices() {
        assert_eq!("4".parse::<ColumnBinding>().unwrap(), ColumnBinding::Index(4));
        assert_eq!("Net Qty".parse::<ColumnBinding>().unwrap(), ColumnBinding::Header("Net Qty".into()));
        assert!("  ".parse::<ColumnBinding>().is_err());
    }
}
