//! Error types for the statsheet export pipeline.
//!
//! One error enum per layer:
//!
//! - [`ReshapeError`] - table normalization and pivot building
//! - [`FetchError`] - provider requests and response decoding
//! - [`ExportError`] - workbook writing
//! - [`JobError`] - top-level per-job orchestration
//!
//! Lower layers convert into [`JobError`] via `From`, so `?` works across
//! layer boundaries inside a job run.

use thiserror::Error;

// =============================================================================
// Reshape Errors
// =============================================================================

/// Errors raised by the reshaping core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReshapeError {
    /// Zero records after normalization.
    #[error("No records to reshape (check the job parameters/filters)")]
    EmptyInput,

    /// Pivot spec references columns the table does not have.
    #[error("Pivot columns missing: {0:?}")]
    MissingColumns(Vec<String>),

    /// Pivot spec is malformed (e.g. `index` is not a list).
    #[error("Invalid pivot spec: {0}")]
    InvalidSpec(String),
}

// =============================================================================
// Fetch Errors
// =============================================================================

/// Errors while talking to a data provider.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Required credential is not configured.
    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),

    /// Job descriptor lacks something the provider needs.
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// Transport-level failure.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Body could not be decoded as JSON.
    #[error("Response is not JSON: {0}")]
    NotJson(String),

    /// Provider answered with an error payload.
    #[error("Provider error: {0}")]
    Api(String),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing the output workbook.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Workbook serialization failed.
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Output directory could not be created.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Job Errors (top-level)
// =============================================================================

/// Everything that can fail one job.
///
/// Never propagated past the batch loop: see [`crate::jobs::run_all`].
#[derive(Debug, Error)]
pub enum JobError {
    /// Job file could not be read.
    #[error("Failed to read job file: {0}")]
    Io(#[from] std::io::Error),

    /// Job file is not a valid descriptor.
    #[error("Invalid job JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// `provider` names nothing we know.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Fetch error.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Reshape error.
    #[error("Reshape error: {0}")]
    Reshape(#[from] ReshapeError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for reshaping operations.
pub type ReshapeResult<T> = Result<T, ReshapeError>;

/// Result type for provider operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let reshape_err = ReshapeError::EmptyInput;
        let job_err: JobError = reshape_err.into();
        assert!(job_err.to_string().contains("No records"));

        let fetch_err = FetchError::MissingCredential("KOSIS_API_KEY".into());
        let job_err: JobError = fetch_err.into();
        assert!(job_err.to_string().contains("KOSIS_API_KEY"));
    }

    #[test]
    fn test_missing_columns_format() {
        let err = ReshapeError::MissingColumns(vec!["NOPE".into()]);
        assert_eq!(err.to_string(), "Pivot columns missing: [\"NOPE\"]");
    }

    #[test]
    fn test_status_format() {
        let err = FetchError::Status {
            status: 503,
            body: "busy".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503: busy");
    }
}
