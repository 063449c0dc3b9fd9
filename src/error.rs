use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconError>;

/// Everything that can abort a reconciliation run.
///
/// Unparsable numbers are deliberately absent: they degrade to `0.0` where
/// they are read and never reach this type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReconError {
    /// Missing or blank credentials.
    #[error("configuration error: {0}")]
    Config(String),

    /// An input file failed the pre-flight checks (missing, too large, wrong type).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The workbook could not be opened or has no readable worksheet.
    #[error("could not read Excel file: {0}")]
    Spreadsheet(String),

    #[error("no header row found: no cell contains '{marker}'")]
    HeaderNotFound { marker: String },

    #[error("expected column not found: {field} ({binding})")]
    ColumnNotFound { field: String, binding: String },

    #[error("invalid tolerance {0}: must be a finite, non-negative number")]
    InvalidTolerance(f64),

    /// Connection refused, DNS failure and other transport problems.
    #[error("document service unreachable: {0}")]
    ServiceUnreachable(String),

    #[error("document service rejected the credentials: {0}")]
    AuthRejected(String),

    #[error("document service quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The service refused the payload itself (corrupt or unsupported document).
    #[error("document could not be parsed by the service: {0}")]
    DocumentRejected(String),

    /// The analysis operation was accepted but finished with `failed`.
    #[error("document analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("document service error ({status}): {message}")]
    ServiceStatus { status: u16, message: String },

    #[error("malformed response from document service: {0}")]
    MalformedResponse(String),

    #[error("document service timed out: {0}. Try again.")]
    Timeout(String),

    #[error("could not write report: {0}")]
    Report(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReconError {
    /// True for failures that happened while talking to the document service.
    pub fn is_service_error(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnreachable(_)
                | Self::AuthRejected(_)
                | Self::QuotaExceeded(_)
                | Self::DocumentRejected(_)
                | Self::AnalysisFailed(_)
                | Self::ServiceStatus { .. }
                | Self::MalformedResponse(_)
                | Self::Timeout(_)
        )
    }
}

impl From<calamine::Error> for ReconError {
    fn from(e: calamine::Error) -> Self {
        Self::Spreadsheet(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ReconError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Self::Report(e.to_string())
    }
}
