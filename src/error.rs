//! Error types for the site analysis engine.
//!
//! This module provides structured error handling with:
//! - `AppError`: Domain-specific errors for engine operations
//! - `Result<T>`: Type alias for Results using AppError
//!
//! Only the fetch family (`InvalidUrl`, `Fetch`, `HttpStatus`) ever leaves
//! `SiteAnalyzer::analyze`. Provider failures are recovered where they occur.

use std::time::Duration;
use thiserror::Error;

// ============================================================================
// DOMAIN ERROR TYPE
// ============================================================================

/// Domain-specific errors for engine operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid or malformed URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The target page could not be reached or read
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    /// The target page answered with a non-2xx status
    #[error("Failed to fetch {url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// External service error (PageSpeed, Gemini, probe)
    #[error("Service error ({service}): {message}")]
    ServiceError { service: &'static str, message: String },

    /// A bounded external call did not complete in time
    #[error("{service} timed out after {after:?}")]
    Timeout { service: &'static str, after: Duration },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Create a fetch error
    pub fn fetch(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Create a service error
    pub fn service(service: &'static str, msg: impl Into<String>) -> Self {
        Self::ServiceError {
            service,
            message: msg.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(service: &'static str, after: Duration) -> Self {
        Self::Timeout { service, after }
    }

    /// True for the errors that abort an analysis.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidUrl(_) | AppError::Fetch { .. } | AppError::HttpStatus { .. }
        )
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

/// Run `fut` under `limit`, mapping expiry to [`AppError::Timeout`].
pub async fn with_timeout<T, F>(service: &'static str, limit: Duration, fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::timeout(service, limit)),
    }
}
