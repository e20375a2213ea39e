//! Error handling for the dashboard.
//!
//! Normalization never produces an error; everything here comes from the
//! collaborators around it (backend, storage, export writers, templates).

use thiserror::Error;

/// Errors raised while syncing, rendering or exporting
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The backend answered with an error payload
    #[error("Backend error: {0}")]
    Backend(String),

    /// Transport-level failure talking to the backend
    #[error("Network error: {0}")]
    Http(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(String),

    /// Missing or malformed configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed CSV input
    #[error("CSV error: {0}")]
    Csv(String),

    /// Split verification could not proceed
    #[error("Verification error: {0}")]
    Verify(String),
}

impl From<csv::Error> for DashboardError {
    fn from(error: csv::Error) -> Self {
        Self::Csv(error.to_string())
    }
}

#[cfg(feature = "web")]
impl From<reqwest::Error> for DashboardError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.to_string())
    }
}

#[cfg(feature = "web")]
impl From<handlebars::RenderError> for DashboardError {
    fn from(error: handlebars::RenderError) -> Self {
        Self::Template(error.to_string())
    }
}

#[cfg(feature = "web")]
impl From<handlebars::TemplateError> for DashboardError {
    fn from(error: handlebars::TemplateError) -> Self {
        Self::Template(error.to_string())
    }
}

/// Result type for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;
