//! Error types for backend calls and workflow steps.
//!
//! Every non-2xx response collapses to a uniform `Status` failure; the only
//! `detail`-sensitive branch distinguishes the known "schema not provisioned"
//! condition, which gets its own display treatment in the shell.

use thiserror::Error;

/// Failure of a single backend call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connection refused, DNS, TLS, timeout).
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response. `detail` is the server's optional `{detail}` text,
    /// empty when the body carried none.
    #[error("API error {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The tenant's schema has not been provisioned yet. Recognized from the
    /// server's `detail` text so the shell can show onboarding guidance
    /// instead of a generic failure.
    #[error("Workspace schema not provisioned")]
    SchemaNotProvisioned,

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Classify a non-2xx response, splitting out the known
    /// "schema not provisioned" condition from generic failures.
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        let detail = detail.unwrap_or_default();
        if detail.to_ascii_lowercase().contains("schema not provisioned") {
            return ApiError::SchemaNotProvisioned;
        }
        ApiError::Status { status, detail }
    }

    /// Whether re-triggering the originating action could plausibly succeed.
    /// Transport failures and server errors are retryable; client errors and
    /// the unprovisioned-schema state are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http(_) => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            ApiError::SchemaNotProvisioned => false,
            ApiError::Json(_) => false,
        }
    }
}

/// Convenience alias for backend call results.
pub type ApiResult<T> = Result<T, ApiError>;
