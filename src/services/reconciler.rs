//! Outer join of invoice line items against Excel records, plus footer checks.

use std::collections::BTreeMap;
use tracing::info;

use crate::config::Tolerance;
use crate::types::{
    AggregateRow, AggregateSummary, ComparisonRow, ExtractedSummary, LineItem, MatchStatus, Metric, Reconciliation,
    SpreadsheetRecord,
};

/// Amounts seen for one code on each side.
#[derive(Default)]
struct Sides {
    document: Vec<f64>,
    spreadsheet: Vec<f64>,
}

/// Full outer join on code, ordered by code. A side with no entry for the
/// code contributes a single 0.0; repeated codes pair up every combination.
pub fn compare_items(items: &[LineItem], records: &[SpreadsheetRecord], tolerance: Tolerance) -> Vec<ComparisonRow> {
    let mut by_code: BTreeMap<&str, Sides> = BTreeMap::new();
    for item in items {
        by_code.entry(item.code.as_str()).or_default().document.push(item.amount);
    }
    for record in records {
        by_code.entry(record.code.as_str()).or_default().spreadsheet.push(record.total);
    }

    let mut rows = Vec::new();
    for (code, sides) in by_code {
        let document = if sides.document.is_empty() { vec![0.0] } else { sides.document };
        let spreadsheet = if sides.spreadsheet.is_empty() { vec![0.0] } else { sides.spreadsheet };
        for &from_document in &document {
            for &from_spreadsheet in &spreadsheet {
                rows.push(ComparisonRow {
                    code: code.to_string(),
                    from_document,
                    from_spreadsheet,
                    status: MatchStatus::from_bool(tolerance.allows(from_document - from_spreadsheet)),
                });
            }
        }
    }
    rows
}

fn aggregate(metric: Metric, from_document: f64, from_spreadsheet: f64, matched: impl Fn(f64) -> bool) -> AggregateRow {
    let difference = from_document - from_spreadsheet;
    AggregateRow {
        metric,
        from_document,
        from_spreadsheet,
        difference,
        status: MatchStatus::from_bool(matched(difference)),
    }
}

/// Footer figures against column sums. Quantity must match exactly; tax and
/// grand total use the tolerance.
pub fn compare_totals(summary: &ExtractedSummary, records: &[SpreadsheetRecord], tolerance: Tolerance) -> AggregateSummary {
    let qty_sum: f64 = records.iter().map(|r| r.quantity).sum();
    let tax_sum: f64 = records.iter().map(|r| r.tax).sum();
    let total_sum: f64 = records.iter().map(|r| r.total).sum();

    AggregateSummary {
        quantity: aggregate(Metric::Quantity, summary.gross_qty, qty_sum, |d| d == 0.0),
        tax: aggregate(Metric::Tax, summary.total_tax, tax_sum, |d| tolerance.allows(d)),
        grand_total: aggregate(Metric::GrandTotal, summary.grand_total, total_sum, |d| tolerance.allows(d)),
    }
}

pub fn reconcile(
    items: &[LineItem],
    records: &[SpreadsheetRecord],
    summary: &ExtractedSummary,
    tolerance: Tolerance,
) -> Reconciliation {
    let rows = compare_items(items, records, tolerance);
    let aggregates = compare_totals(summary, records, tolerance);
    let recon = Reconciliation {
        rows,
        aggregates,
        tolerance: tolerance.value(),
    };
    info!(
        rows = recon.rows.len(),
        accuracy = %recon.accuracy_label(),
        tolerance = %tolerance,
        "reconciliation complete"
    );
    recon
}
