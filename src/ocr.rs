use regex::Regex;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::config::AzureConfig;
use crate::error::{ReconError, Result};
use crate::types::{AnalyzeResult, DocumentField, ExtractedSummary, LineItem, SpreadsheetRecord};

const API_VERSION: &str = "2024-11-30";
const INVOICE_MODEL: &str = "prebuilt-invoice";

/// Anything that can turn a document into a prebuilt-invoice result.
pub trait DocumentAnalyzer {
    fn analyze(&self, document: &[u8]) -> Result<AnalyzeResult>;
}

// ---------------------------------------------------------------------------
// Azure Document Intelligence client
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: Option<ServiceErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationStatus {
    #[serde(default)]
    status: String,
    analyze_result: Option<AnalyzeResult>,
    error: Option<ServiceErrorDetail>,
}

fn detail_message(detail: &ServiceErrorDetail) -> String {
    match (&detail.code, &detail.message) {
        (Some(code), Some(msg)) => format!("{}: {}", code, msg),
        (None, Some(msg)) => msg.clone(),
        (Some(code), None) => code.clone(),
        (None, None) => "Unknown error".to_string(),
    }
}

/// Map a non-success HTTP response onto the error taxonomy.
fn status_error(status: StatusCode, body: &str) -> ReconError {
    let message = serde_json::from_str::<ServiceErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .map(|d| detail_message(&d))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Invalid key or endpoint?".to_string()
            } else {
                body.trim().to_string()
            }
        });
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ReconError::AuthRejected(message),
        StatusCode::TOO_MANY_REQUESTS => ReconError::QuotaExceeded(message),
        StatusCode::BAD_REQUEST | StatusCode::UNSUPPORTED_MEDIA_TYPE | StatusCode::UNPROCESSABLE_ENTITY => {
            ReconError::DocumentRejected(message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ReconError::Timeout(message),
        _ => ReconError::ServiceStatus {
            status: status.as_u16(),
            message,
        },
    }
}

fn transport_error(e: reqwest::Error) -> ReconError {
    if e.is_timeout() {
        ReconError::Timeout(e.to_string())
    } else if e.is_connect() {
        ReconError::ServiceUnreachable(format!("Check your internet connection and try again. ({})", e))
    } else {
        ReconError::ServiceUnreachable(format!("Network error: {}", e))
    }
}

fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(status_error(status, &body))
}

/// Blocking client for the `prebuilt-invoice` model: submit, then poll the
/// `Operation-Location` until the analysis finishes.
pub struct AzureInvoiceClient {
    config: AzureConfig,
    client: Client,
}

impl AzureInvoiceClient {
    pub fn new(config: AzureConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ReconError::Config(format!("could not build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}",
            self.config.endpoint, INVOICE_MODEL, API_VERSION
        )
    }

    /// POST the document, returning the operation URL to poll.
    fn submit(&self, document: &[u8]) -> Result<String> {
        let response = self
            .client
            .post(self.analyze_url())
            .header("Ocp-Apim-Subscription-Key", &self.config.key)
            .header("Content-Type", "application/octet-stream")
            .body(document.to_vec())
            .send()
            .map_err(transport_error)?;
        let response = ensure_success(response)?;
        response
            .headers()
            .get("Operation-Location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ReconError::MalformedResponse("No Operation-Location in response".to_string()))
    }

    fn poll(&self, operation_url: &str) -> Result<AnalyzeResult> {
        for attempt in 1..=self.config.max_polls {
            std::thread::sleep(self.config.poll_interval);
            let response = self
                .client
                .get(operation_url)
                .header("Ocp-Apim-Subscription-Key", &self.config.key)
                .send()
                .map_err(transport_error)?;
            let op: OperationStatus = ensure_success(response)?
                .json()
                .map_err(|e| ReconError::MalformedResponse(format!("Invalid JSON: {}", e)))?;
            debug!(attempt, status = %op.status, "polled analysis operation");
            match op.status.as_str() {
                "succeeded" => {
                    return op
                        .analyze_result
                        .ok_or_else(|| ReconError::MalformedResponse("No analyzeResult".to_string()));
                }
                "failed" => {
                    let message = op
                        .error
                        .as_ref()
                        .map(detail_message)
                        .unwrap_or_else(|| "Unknown error".to_string());
                    return Err(ReconError::AnalysisFailed(message));
                }
                _ => {}
            }
        }
        Err(ReconError::Timeout(format!(
            "analysis not finished after {} polls",
            self.config.max_polls
        )))
    }
}

impl DocumentAnalyzer for AzureInvoiceClient {
    fn analyze(&self, document: &[u8]) -> Result<AnalyzeResult> {
        info!(bytes = document.len(), model = INVOICE_MODEL, "submitting document for analysis");
        let operation_url = self.submit(document)?;
        self.poll(&operation_url)
    }
}

// ---------------------------------------------------------------------------
// Field coercion
// ---------------------------------------------------------------------------

/// Absolute numeric value of a field: `valueNumber`, then `valueCurrency.amount`,
/// then the digits and dots of `content`. Missing or unparsable is 0.0.
pub fn clean_num_strict(field: Option<&DocumentField>) -> f64 {
    let Some(field) = field else {
        return 0.0;
    };
    if let Some(n) = field.value_number {
        return n.abs();
    }
    if let Some(currency) = &field.value_currency {
        return currency.amount.unwrap_or(0.0).abs();
    }
    let cleaned: String = field
        .content
        .as_deref()
        .unwrap_or("0")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    cleaned.parse::<f64>().map(f64::abs).unwrap_or(0.0)
}

fn gross_total_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Gross\s+Total\s*[:\-]?\s*(\d+)").expect("valid regex"))
}

fn total_qty_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Total\s+Qty\s*[:\-]?\s*(\d+)").expect("valid regex"))
}

/// Total quantity printed in the invoice footer ("Gross Total: 42" or "Total Qty 42").
pub fn extract_gross_total_qty(full_content: &str) -> f64 {
    [gross_total_re(), total_qty_re()]
        .iter()
        .find_map(|re| re.captures(full_content))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Cross-reference filter
// ---------------------------------------------------------------------------

/// Material codes present in the Excel sheet.
#[derive(Debug, Clone, Default)]
pub struct KnownCodes(HashSet<String>);

impl KnownCodes {
    pub fn from_records(records: &[SpreadsheetRecord]) -> Self {
        Self(records.iter().map(|r| r.code.clone()).collect())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for KnownCodes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Keep an OCR row only when its code is a known material code. This is what
/// keeps HSN summary rows out of the comparison.
pub fn is_known_code(code: &str, known: &KnownCodes) -> bool {
    known.contains(code)
}

fn is_footer_or_empty(code: &str, amount: f64) -> bool {
    code.to_lowercase().contains("total") || amount == 0.0
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Why candidate rows were dropped; logged, and handy when a run looks thin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounts {
    pub missing_code: usize,
    pub unknown_code: usize,
    pub footer_or_zero: usize,
    pub duplicate: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub items: Vec<LineItem>,
    pub summary: ExtractedSummary,
    pub dropped: DropCounts,
}

/// Reduce a prebuilt-invoice result to filtered line items and footer figures.
pub fn reduce_analysis(result: &AnalyzeResult, known: &KnownCodes) -> Extraction {
    let mut items: Vec<LineItem> = Vec::new();
    let mut seen: HashSet<(String, u64)> = HashSet::new();
    let mut dropped = DropCounts::default();
    let mut summary = ExtractedSummary::default();

    for document in &result.documents {
        let rows = document
            .fields
            .get("Items")
            .and_then(|f| f.value_array.as_deref())
            .unwrap_or(&[]);
        for row in rows {
            let Some(obj) = row.value_object.as_ref() else {
                continue;
            };
            let code = match obj
                .get("ProductCode")
                .and_then(|f| f.content.as_deref())
                .map(str::trim)
            {
                Some(c) if !c.is_empty() => c,
                _ => {
                    dropped.missing_code += 1;
                    continue;
                }
            };
            let amount = clean_num_strict(obj.get("Amount"));
            if !is_known_code(code, known) {
                dropped.unknown_code += 1;
                continue;
            }
            if is_footer_or_empty(code, amount) {
                dropped.footer_or_zero += 1;
                continue;
            }
            if !seen.insert((code.to_string(), amount.to_bits())) {
                dropped.duplicate += 1;
                continue;
            }
            items.push(LineItem {
                code: code.to_string(),
                amount,
            });
        }

        // Each document overwrites the footer figures.
        summary.total_tax = clean_num_strict(document.fields.get("TotalTax"));
        summary.grand_total = clean_num_strict(document.fields.get("InvoiceTotal"));
    }

    summary.document_count = result.documents.len();
    if summary.document_count > 1 {
        warn!(
            documents = summary.document_count,
            "multiple invoices recognized; tax and grand total taken from the last one"
        );
    }
    summary.gross_qty = extract_gross_total_qty(&result.content);

    debug!(?dropped, "candidate rows dropped");
    info!(items = items.len(), "line items extracted");
    Extraction { items, summary, dropped }
}

/// Analyze `document` and keep only rows whose code is in `known`.
pub fn extract(analyzer: &dyn DocumentAnalyzer, document: &[u8], known: &KnownCodes) -> Result<Extraction> {
    let result = analyzer.analyze(document)?;
    Ok(reduce_analysis(&result, known))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalyzedDocument, CurrencyValue};
    use httpmock::prelude::*;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn text(content: &str) -> DocumentField {
        DocumentField {
            content: Some(content.to_string()),
            ..DocumentField::default()
        }
    }

    fn number(n: f64) -> DocumentField {
        DocumentField {
            value_number: Some(n),
            content: Some(n.to_string()),
            ..DocumentField::default()
        }
    }

    fn currency(amount: f64) -> DocumentField {
        DocumentField {
            value_currency: Some(CurrencyValue {
                amount: Some(amount),
                ..CurrencyValue::default()
            }),
            ..DocumentField::default()
        }
    }

    fn item(code: Option<&str>, amount: DocumentField) -> DocumentField {
        let mut obj = HashMap::new();
        if let Some(code) = code {
            obj.insert("ProductCode".to_string(), text(code));
        }
        obj.insert("Amount".to_string(), amount);
        DocumentField {
            value_object: Some(obj),
            ..DocumentField::default()
        }
    }

    fn invoice(items: Vec<DocumentField>, tax: f64, total: f64) -> AnalyzedDocument {
        let mut fields = HashMap::new();
        fields.insert(
            "Items".to_string(),
            DocumentField {
                value_array: Some(items),
                ..DocumentField::default()
            },
        );
        fields.insert("TotalTax".to_string(), currency(tax));
        fields.insert("InvoiceTotal".to_string(), currency(total));
        AnalyzedDocument { doc_type: Some("invoice".into()), fields }
    }

    fn known(codes: &[&str]) -> KnownCodes {
        codes.iter().copied().collect()
    }

    struct FakeAnalyzer(AnalyzeResult);

    impl DocumentAnalyzer for FakeAnalyzer {
        fn analyze(&self, _document: &[u8]) -> Result<AnalyzeResult> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn strict_number_prefers_value_number() {
        let field = DocumentField {
            value_number: Some(-12.5),
            value_currency: Some(CurrencyValue { amount: Some(99.0), ..CurrencyValue::default() }),
            content: Some("77".into()),
            ..DocumentField::default()
        };
        assert_eq!(clean_num_strict(Some(&field)), 12.5);
    }

    #[test]
    fn strict_number_falls_back_to_currency_then_content() {
        assert_eq!(clean_num_strict(Some(&currency(-300.0))), 300.0);
        assert_eq!(clean_num_strict(Some(&text("₹ -1,234.50"))), 1234.5);
        assert_eq!(clean_num_strict(Some(&text("n/a"))), 0.0);
        assert_eq!(clean_num_strict(Some(&DocumentField::default())), 0.0);
        assert_eq!(clean_num_strict(None), 0.0);
    }

    #[test]
    fn sign_is_erased() {
        assert_eq!(clean_num_strict(Some(&text("-123.45"))), clean_num_strict(Some(&text("123.45"))));
        assert_eq!(clean_num_strict(Some(&number(-123.45))), 123.45);
    }

    #[test]
    fn gross_total_wins_over_total_qty() {
        let content = "Total Qty: 7\n...\nGROSS TOTAL - 42\n";
        assert_eq!(extract_gross_total_qty(content), 42.0);
    }

    #[test]
    fn total_qty_is_the_fallback() {
        assert_eq!(extract_gross_total_qty("Sub total 10\ntotal   qty:15 pcs"), 15.0);
        assert_eq!(extract_gross_total_qty("Qty 3, Amount 40"), 0.0);
        assert_eq!(extract_gross_total_qty(""), 0.0);
    }

    #[test]
    fn hsn_rows_and_footer_rows_are_dropped() {
        let result = AnalyzeResult {
            content: "Gross Total: 5".into(),
            documents: vec![invoice(
                vec![
                    item(Some(" A1 "), currency(110.0)),
                    item(Some("HSN9999"), currency(55.0)),
                    item(Some("B2"), currency(0.0)),
                    item(Some("SubTotal"), currency(165.0)),
                    item(None, currency(12.0)),
                    item(Some("   "), currency(12.0)),
                ],
                10.0,
                110.0,
            )],
        };
        let extraction = reduce_analysis(&result, &known(&["A1", "B2", "SubTotal"]));
        assert_eq!(extraction.items, vec![LineItem { code: "A1".into(), amount: 110.0 }]);
        assert_eq!(
            extraction.dropped,
            DropCounts { missing_code: 2, unknown_code: 1, footer_or_zero: 2, duplicate: 0 }
        );
        assert_eq!(extraction.summary.gross_qty, 5.0);
        assert_eq!(extraction.summary.total_tax, 10.0);
        assert_eq!(extraction.summary.grand_total, 110.0);
        assert_eq!(extraction.summary.document_count, 1);
    }

    #[test]
    fn identical_pairs_are_deduplicated_in_order() {
        let result = AnalyzeResult {
            content: String::new(),
            documents: vec![invoice(
                vec![
                    item(Some("B2"), currency(20.0)),
                    item(Some("A1"), currency(10.0)),
                    item(Some("B2"), currency(20.0)),
                    item(Some("B2"), currency(21.0)),
                ],
                0.0,
                0.0,
            )],
        };
        let extraction = reduce_analysis(&result, &known(&["A1", "B2"]));
        let pairs: Vec<(&str, f64)> = extraction.items.iter().map(|i| (i.code.as_str(), i.amount)).collect();
        assert_eq!(pairs, vec![("B2", 20.0), ("A1", 10.0), ("B2", 21.0)]);
        assert_eq!(extraction.dropped.duplicate, 1);
    }

    #[test]
    fn last_document_supplies_footer_figures() {
        let result = AnalyzeResult {
            content: String::new(),
            documents: vec![
                invoice(vec![item(Some("A1"), currency(10.0))], 5.0, 50.0),
                invoice(vec![item(Some("B2"), currency(20.0))], 7.0, 70.0),
            ],
        };
        let extraction = reduce_analysis(&result, &known(&["A1", "B2"]));
        assert_eq!(extraction.items.len(), 2);
        assert_eq!(extraction.summary.document_count, 2);
        assert_eq!(extraction.summary.total_tax, 7.0);
        assert_eq!(extraction.summary.grand_total, 70.0);
    }

    #[test]
    fn missing_footer_field_in_last_document_reads_as_zero() {
        let mut last = invoice(vec![], 0.0, 0.0);
        last.fields.remove("TotalTax");
        let result = AnalyzeResult {
            content: String::new(),
            documents: vec![invoice(vec![], 5.0, 50.0), last],
        };
        let extraction = reduce_analysis(&result, &known(&[]));
        assert_eq!(extraction.summary.total_tax, 0.0);
    }

    #[test]
    fn no_documents_yields_empty_extraction() {
        let extraction = reduce_analysis(&AnalyzeResult::default(), &known(&["A1"]));
        assert!(extraction.items.is_empty());
        assert_eq!(extraction.summary, ExtractedSummary::default());
    }

    #[test]
    fn extract_runs_through_the_analyzer() {
        let fake = FakeAnalyzer(AnalyzeResult {
            content: "Total Qty 3".into(),
            documents: vec![invoice(vec![item(Some("A1"), number(30.0))], 3.0, 30.0)],
        });
        let extraction = extract(&fake, b"%PDF-1.7", &known(&["A1"])).unwrap();
        assert_eq!(extraction.items, vec![LineItem { code: "A1".into(), amount: 30.0 }]);
        assert_eq!(extraction.summary.gross_qty, 3.0);
    }

    proptest! {
        #[test]
        fn filter_never_admits_unknown_codes(
            codes in proptest::collection::vec("[A-Z]{1,2}[0-9]{1,3}", 0..20),
            valid in proptest::collection::vec("[A-Z]{1,2}[0-9]{1,3}", 0..10),
        ) {
            let known_codes: KnownCodes = valid.iter().cloned().collect();
            let result = AnalyzeResult {
                content: String::new(),
                documents: vec![invoice(
                    codes.iter().map(|c| item(Some(c.as_str()), currency(1.0))).collect(),
                    0.0,
                    0.0,
                )],
            };
            let extraction = reduce_analysis(&result, &known_codes);
            for it in &extraction.items {
                prop_assert!(valid.contains(&it.code));
            }
        }

        #[test]
        fn content_fallback_is_never_negative(raw in ".{0,24}") {
            let value = clean_num_strict(Some(&text(&raw)));
            prop_assert!(value >= 0.0);
        }
    }

    // ── HTTP client ────────────────────────────────────────────────────

    fn client_for(server: &MockServer) -> AzureInvoiceClient {
        let config = AzureConfig::new(server.base_url(), "test-key")
            .with_poll_interval(Duration::ZERO)
            .with_max_polls(3);
        AzureInvoiceClient::new(config).unwrap()
    }

    const ANALYZE_PATH: &str = "/documentintelligence/documentModels/prebuilt-invoice:analyze";

    #[test]
    fn submits_then_polls_until_succeeded() {
        let server = MockServer::start();
        let submit = server.mock(|when, then| {
            when.method(POST)
                .path(ANALYZE_PATH)
                .query_param("api-version", API_VERSION);
            then.status(202)
                .header("Operation-Location", server.url("/operations/1"));
        });
        let poll = server.mock(|when, then| {
            when.method(GET).path("/operations/1");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({
                    "status": "succeeded",
                    "analyzeResult": {
                        "content": "Gross Total: 2",
                        "documents": [{ "fields": { "InvoiceTotal": { "type": "number", "valueNumber": 20.0 } } }]
                    }
                }));
        });

        let result = client_for(&server).analyze(b"%PDF-1.7 test").unwrap();
        submit.assert();
        poll.assert();
        assert_eq!(result.content, "Gross Total: 2");
        assert_eq!(clean_num_strict(result.documents[0].fields.get("InvoiceTotal")), 20.0);
    }

    #[test]
    fn unauthorized_is_an_auth_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(ANALYZE_PATH);
            then.status(401).json_body(serde_json::json!({
                "error": { "code": "401", "message": "Access denied due to invalid subscription key" }
            }));
        });
        let err = client_for(&server).analyze(b"%PDF").unwrap_err();
        assert!(matches!(err, ReconError::AuthRejected(ref m) if m.contains("invalid subscription key")));
    }

    #[test]
    fn rate_limit_is_a_quota_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(ANALYZE_PATH);
            then.status(429).body("");
        });
        let err = client_for(&server).analyze(b"%PDF").unwrap_err();
        assert!(matches!(err, ReconError::QuotaExceeded(_)));
    }

    #[test]
    fn bad_request_means_document_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(ANALYZE_PATH);
            then.status(400).json_body(serde_json::json!({
                "error": { "code": "InvalidRequest", "message": "The file is corrupted or format is unsupported." }
            }));
        });
        let err = client_for(&server).analyze(b"garbage").unwrap_err();
        assert!(matches!(err, ReconError::DocumentRejected(ref m) if m.starts_with("InvalidRequest")));
    }

    #[test]
    fn server_error_keeps_status_code() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(ANALYZE_PATH);
            then.status(500).body("backend unavailable");
        });
        let err = client_for(&server).analyze(b"%PDF").unwrap_err();
        assert!(matches!(
            err,
            ReconError::ServiceStatus { status: 500, ref message } if message == "backend unavailable"
        ));
        assert!(err.is_service_error());
    }

    #[test]
    fn failed_operation_is_analysis_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(ANALYZE_PATH);
            then.status(202).header("Operation-Location", server.url("/operations/2"));
        });
        server.mock(|when, then| {
            when.method(GET).path("/operations/2");
            then.status(200).json_body(serde_json::json!({
                "status": "failed",
                "error": { "code": "InternalServerError", "message": "An unexpected error occurred." }
            }));
        });
        let err = client_for(&server).analyze(b"%PDF").unwrap_err();
        assert!(matches!(err, ReconError::AnalysisFailed(_)));
    }

    #[test]
    fn running_forever_times_out_after_poll_budget() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(ANALYZE_PATH);
            then.status(202).header("Operation-Location", server.url("/operations/3"));
        });
        let poll = server.mock(|when, then| {
            when.method(GET).path("/operations/3");
            then.status(200).json_body(serde_json::json!({ "status": "running" }));
        });
        let err = client_for(&server).analyze(b"%PDF").unwrap_err();
        assert!(matches!(err, ReconError::Timeout(_)));
        poll.assert_calls(3);
    }

    #[test]
    fn missing_operation_location_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(ANALYZE_PATH);
            then.status(202);
        });
        let err = client_for(&server).analyze(b"%PDF").unwrap_err();
        assert!(matches!(err, ReconError::MalformedResponse(_)));
    }

    #[test]
    fn closed_port_is_unreachable() {
        let config = AzureConfig::new("http://127.0.0.1:1", "k")
            .with_poll_interval(Duration::ZERO)
            .with_request_timeout(Duration::from_secs(5));
        let err = AzureInvoiceClient::new(config).unwrap().analyze(b"%PDF").unwrap_err();
        assert!(matches!(err, ReconError::ServiceUnreachable(_) | ReconError::Timeout(_)));
        assert!(err.is_service_error());
    }
}
