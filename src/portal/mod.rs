//! Scheduling portal client
//!
//! This module groups everything that talks to the portal over HTTP:
//!
//! - [`client`] - transport wrapper returning fully read responses
//! - [`cookie`] - session cookie extraction
//! - [`headers`] - fixed browser headers
//! - [`session`] - login handshake and token refresh
//! - [`availability`] - day and time queries
//! - [`booking`] - booking submission
//!
//! [`VisaPortal`] wires them together behind the [`Portal`] trait, which is the
//! seam the supervisor is written against.

pub mod availability;
pub mod booking;
pub mod client;
pub mod cookie;
pub mod headers;
pub mod session;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::config::{Config, Credentials};
use crate::models::{AppointmentSlot, BookingReceipt, SessionContext};
use crate::utils::error::PortalError;

pub use availability::AvailabilityPoller;
pub use booking::BookingExecutor;
pub use client::{PortalClient, PortalResponse};
pub use session::SessionManager;

/// Operations the supervisor needs from the portal
#[async_trait]
pub trait Portal: Send + Sync {
    /// Establish a fresh authenticated session
    async fn login(&self) -> Result<SessionContext, PortalError>;

    /// Nearest available date, if any
    async fn check_available_date(
        &self,
        session: &SessionContext,
    ) -> Result<Option<NaiveDate>, PortalError>;

    /// Best time on `date`
    async fn check_available_time(
        &self,
        session: &SessionContext,
        date: NaiveDate,
    ) -> Result<String, PortalError>;

    /// Submit a booking and observe its outcome
    async fn book(
        &self,
        session: &SessionContext,
        slot: &AppointmentSlot,
    ) -> Result<BookingReceipt, PortalError>;
}

/// The real portal, reached over HTTP
pub struct VisaPortal {
    credentials: Credentials,
    sessions: SessionManager,
    poller: AvailabilityPoller,
    booking: BookingExecutor,
}

impl VisaPortal {
    /// Build the portal components from configuration
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidUrl` or `PortalError::Transport` if the HTTP client cannot be built
    pub fn new(config: &Config) -> Result<Self, PortalError> {
        let client = Arc::new(PortalClient::new(&config.portal)?);
        let portal = &config.portal;

        let sessions = SessionManager::new(client.clone(), portal.user_agent.clone());
        let poller = AvailabilityPoller::new(
            client.clone(),
            portal.schedule_id.clone(),
            portal.facility_id.clone(),
        );
        let booking = BookingExecutor::new(
            client,
            sessions.clone(),
            portal.schedule_id.clone(),
            portal.facility_id.clone(),
        );

        Ok(Self {
            credentials: config.credentials.clone(),
            sessions,
            poller,
            booking,
        })
    }
}

#[async_trait]
impl Portal for VisaPortal {
    async fn login(&self) -> Result<SessionContext, PortalError> {
        self.sessions.login(&self.credentials).await
    }

    async fn check_available_date(
        &self,
        session: &SessionContext,
    ) -> Result<Option<NaiveDate>, PortalError> {
        self.poller.check_available_date(session).await
    }

    async fn check_available_time(
        &self,
        session: &SessionContext,
        date: NaiveDate,
    ) -> Result<String, PortalError> {
        self.poller.check_available_time(session, date).await
    }

    async fn book(
        &self,
        session: &SessionContext,
        slot: &AppointmentSlot,
    ) -> Result<BookingReceipt, PortalError> {
        self.booking.book(session, slot).await
    }
}
