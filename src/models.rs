// Core data structures for slotwatch

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;
use crate::utils::error::ScrapeError;

/// Date format used by the portal and by the command line
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Header carrying the anti-forgery token on XHR-style requests
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Authenticated header set for one portal session
///
/// A context is never mutated; refreshing the cookie or token yields a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    cookie: String,
    anti_forgery_token: String,
    fixed_headers: HeaderMap,
}

impl SessionContext {
    /// Build a context, rejecting values that cannot travel in an HTTP header
    pub fn new(
        cookie: impl Into<String>,
        anti_forgery_token: impl Into<String>,
        fixed_headers: HeaderMap,
    ) -> Result<Self, ScrapeError> {
        let cookie = cookie.into();
        let anti_forgery_token = anti_forgery_token.into();

        for value in [&cookie, &anti_forgery_token] {
            if HeaderValue::from_str(value).is_err() {
                return Err(ScrapeError::InvalidHeaderValue(value.clone()));
            }
        }

        Ok(Self {
            cookie,
            anti_forgery_token,
            fixed_headers,
        })
    }

    /// Session cookie in `name=value` form
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    pub fn anti_forgery_token(&self) -> &str {
        &self.anti_forgery_token
    }

    pub fn fixed_headers(&self) -> &HeaderMap {
        &self.fixed_headers
    }

    /// Same token and fixed headers, different cookie
    pub fn with_cookie(&self, cookie: impl Into<String>) -> Result<Self, ScrapeError> {
        Self::new(
            cookie,
            self.anti_forgery_token.clone(),
            self.fixed_headers.clone(),
        )
    }

    /// Headers to send on an authenticated request
    #[must_use]
    pub fn request_headers(&self) -> HeaderMap {
        let mut headers = self.fixed_headers.clone();

        if let Ok(cookie) = HeaderValue::from_str(&self.cookie) {
            headers.insert(COOKIE, cookie);
        }
        if let Ok(token) = HeaderValue::from_str(&self.anti_forgery_token) {
            headers.insert(HeaderName::from_static(CSRF_HEADER), token);
        }

        headers
    }
}

/// One bookable appointment opportunity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSlot {
    pub date: NaiveDate,
    pub time: String, // local time of day, e.g. "09:00"
}

impl AppointmentSlot {
    pub fn new(date: NaiveDate, time: impl Into<String>) -> Self {
        Self {
            date,
            time: time.into(),
        }
    }

    /// Date in the portal's wire format
    pub fn date_param(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for AppointmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date_param(), self.time)
    }
}

/// The appointment currently considered booked
///
/// The date only ever moves earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldBooking {
    date: NaiveDate,
}

impl HeldBooking {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Parse the held date given at start-up
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidHeldDate` for empty or non-ISO input
    pub fn parse(input: &str) -> Result<Self, Error> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidHeldDate(input.to_string()));
        }

        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map(Self::new)
            .map_err(|_| Error::InvalidHeldDate(input.to_string()))
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Whether `candidate` is strictly earlier than the held date
    pub fn is_improved_by(&self, candidate: NaiveDate) -> bool {
        candidate < self.date
    }

    /// Move the held date to `date` if it is strictly earlier; returns whether it moved
    pub fn advance_to(&mut self, date: NaiveDate) -> bool {
        if self.is_improved_by(date) {
            self.date = date;
            true
        } else {
            false
        }
    }
}

impl fmt::Display for HeldBooking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format(DATE_FORMAT))
    }
}

/// Facility identifiers offered by the booking form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacilityRegistry {
    pub consulate: Vec<String>,
    pub asc: Vec<String>,
}

impl FacilityRegistry {
    pub fn is_empty(&self) -> bool {
        self.consulate.is_empty() && self.asc.is_empty()
    }

    pub fn offers_consulate(&self, facility_id: &str) -> bool {
        self.consulate.iter().any(|id| id == facility_id)
    }
}

/// Observed result of a booking submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    /// The portal accepted the booking and redirected away from the form
    Confirmed { location: Option<String> },
    /// The portal re-rendered the form instead of accepting it
    Rejected { reason: String },
}

impl BookingOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

/// Booking outcome together with the session refreshed while booking
#[derive(Debug, Clone)]
pub struct BookingReceipt {
    pub session: SessionContext,
    pub outcome: BookingOutcome,
}

/// Supervisor states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleState {
    LoggingIn,
    Polling,
    Idle,
    Booking,
    Sleeping,
    Recovering,
}

impl CycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoggingIn => "logging_in",
            Self::Polling => "polling",
            Self::Idle => "idle",
            Self::Booking => "booking",
            Self::Sleeping => "sleeping",
            Self::Recovering => "recovering",
        }
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one poll round decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDecision {
    /// The day list was empty
    NoDateAvailable,
    /// The nearest date does not beat the held one
    NotEarlier { candidate: NaiveDate },
    /// The nearest date had no time left by the time it was queried
    NoTimeAvailable { candidate: NaiveDate },
    /// Dry run: the slot would have been booked
    WouldBook(AppointmentSlot),
    Booked(AppointmentSlot),
    Rejected {
        slot: AppointmentSlot,
        reason: String,
    },
}

impl PollDecision {
    /// State the supervisor passes through for this decision
    pub fn state(&self) -> CycleState {
        match self {
            Self::NoDateAvailable | Self::NotEarlier { .. } | Self::NoTimeAvailable { .. } => {
                CycleState::Idle
            }
            Self::WouldBook(_) | Self::Booked(_) | Self::Rejected { .. } => CycleState::Booking,
        }
    }
}

/// Supervisor counters
#[derive(Debug, Clone, Serialize)]
pub struct CycleStats {
    pub logins: u32,
    pub polls: u64,
    pub bookings: u32,
    pub rejections: u32,
    pub recoveries: u32,
    pub started_at: DateTime<Utc>,
}

impl CycleStats {
    pub fn new() -> Self {
        Self {
            logins: 0,
            polls: 0,
            bookings: 0,
            rejections: 0,
            recoveries: 0,
            started_at: Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    pub fn record(&mut self, decision: &PollDecision) {
        self.polls += 1;
        match decision {
            PollDecision::Booked(_) => self.bookings += 1,
            PollDecision::Rejected { .. } => self.rejections += 1,
            _ => {}
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}
