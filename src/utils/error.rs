//! Error types for the portal client
//!
//! This module defines the domain errors raised while talking to the
//! scheduling portal and while scraping its pages.

use thiserror::Error;

/// Errors that can occur while talking to the scheduling portal
#[derive(Error, Debug)]
pub enum PortalError {
    /// Network or connection failure
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The portal answered a JSON query with an `error` field
    #[error("Portal API error: {message}")]
    Api { message: String },

    /// Login did not yield a usable session
    #[error("Authentication failed: {reason}")]
    Auth { reason: String },

    /// An expected HTML element or cookie was absent
    #[error("Scrape failure: {0}")]
    Scrape(#[from] ScrapeError),

    /// The portal answered with a status the flow does not expect
    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body did not have the expected shape
    #[error("Unexpected response: {reason}")]
    UnexpectedResponse { reason: String },

    /// The day list offered a date but its time list is empty
    #[error("No time available on {date}")]
    NoTimeAvailable { date: String },

    /// A request URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl PortalError {
    /// Create an authentication error
    pub fn auth(reason: impl Into<String>) -> Self {
        Self::Auth {
            reason: reason.into(),
        }
    }

    /// Create an unexpected-response error
    pub fn unexpected(reason: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            reason: reason.into(),
        }
    }

    /// Whether this error means "nothing to do this round" rather than "something is broken"
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::NoTimeAvailable { .. })
    }
}

/// Errors that can occur while scraping portal pages
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScrapeError {
    /// The CSRF meta tag is missing or empty
    #[error("Anti-forgery token not found in page")]
    MissingAntiForgeryToken,

    /// The response did not set the session cookie
    #[error("Session cookie not found in response")]
    MissingSessionCookie,

    /// A caller-supplied CSS selector did not parse
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// A scraped cookie or token cannot be sent back as a header
    #[error("Invalid header value: {0:?}")]
    InvalidHeaderValue(String),
}
