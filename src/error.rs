//! Unified error handling for the slotwatch crate
//!
//! Domain errors from the portal layer are wrapped into a single [`Error`]
//! together with the start-up failures the binary reports.
//!
//! - [`SlotwatchErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for logging
//! - [`Error`] - Unified error enum

use thiserror::Error;

pub use crate::utils::error::{PortalError, ScrapeError};

/// Common trait for all slotwatch error types
pub trait SlotwatchErrorTrait: std::error::Error {
    /// Check if a fresh login cycle can get past this error
    fn is_recoverable(&self) -> bool;

    /// Get the error category for logging
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection, timeout and unexpected HTTP status errors
    Network,
    /// Login or session expiry
    Auth,
    /// Errors reported by the portal's JSON API
    Api,
    /// HTML and JSON shape errors
    Parsing,
    /// Configuration and input validation errors
    Config,
}

impl ErrorCategory {
    /// Short lowercase label used as a structured log field
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::Api => "api",
            Self::Parsing => "parsing",
            Self::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the slotwatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Portal interaction errors
    #[error("Portal error: {0}")]
    Portal(#[from] PortalError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// The held date given at start-up is not an ISO calendar date
    #[error("Invalid current booked date: {0:?}")]
    InvalidHeldDate(String),
}

impl SlotwatchErrorTrait for PortalError {
    fn is_recoverable(&self) -> bool {
        // A base URL that does not parse stays broken across restarts.
        !matches!(self, Self::InvalidUrl(_))
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) | Self::UnexpectedStatus { .. } => ErrorCategory::Network,
            Self::Auth { .. } => ErrorCategory::Auth,
            Self::Api { .. } | Self::NoTimeAvailable { .. } => ErrorCategory::Api,
            Self::Scrape(_) | Self::UnexpectedResponse { .. } => ErrorCategory::Parsing,
            Self::InvalidUrl(_) => ErrorCategory::Config,
        }
    }
}

impl SlotwatchErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Portal(e) => e.is_recoverable(),
            Self::Config(_) | Self::InvalidHeldDate(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Portal(e) => e.category(),
            Self::Config(_) | Self::InvalidHeldDate(_) => ErrorCategory::Config,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
