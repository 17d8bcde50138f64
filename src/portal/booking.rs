//! Booking submission
//!
//! The booking form's anti-forgery token must match the page last rendered to
//! the session, so every submission starts by re-fetching the form.

use reqwest::header::{HeaderValue, REFERER};
use std::sync::Arc;
use url::Url;

use crate::models::{AppointmentSlot, BookingOutcome, BookingReceipt, SessionContext};
use crate::parser::PageScraper;
use crate::portal::client::{PortalClient, PortalResponse};
use crate::portal::cookie::extract_session_cookie;
use crate::portal::headers::with_form_headers;
use crate::portal::session::{SessionManager, UTF8_MARKER};
use crate::utils::error::PortalError;

/// Re-fetches the booking form and submits it
pub struct BookingExecutor {
    client: Arc<PortalClient>,
    sessions: SessionManager,
    scraper: PageScraper,
    schedule_id: String,
    facility_id: String,
}

impl BookingExecutor {
    pub fn new(
        client: Arc<PortalClient>,
        sessions: SessionManager,
        schedule_id: impl Into<String>,
        facility_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            sessions,
            scraper: PageScraper::new(),
            schedule_id: schedule_id.into(),
            facility_id: facility_id.into(),
        }
    }

    fn appointment_path(&self) -> String {
        format!("/schedule/{}/appointment", self.schedule_id)
    }

    /// Book `slot` and report what the portal did with the submission
    ///
    /// # Errors
    ///
    /// - `PortalError::Auth` if the session expired before or during booking
    /// - `PortalError::Scrape` if the booking page has no anti-forgery token
    /// - `PortalError::UnexpectedStatus` for any other non-2xx, non-redirect answer
    pub async fn book(
        &self,
        session: &SessionContext,
        slot: &AppointmentSlot,
    ) -> Result<BookingReceipt, PortalError> {
        let path = self.appointment_path();

        let page = self
            .client
            .get(&path, &[], session.request_headers())
            .await?;
        if page.redirects_to_sign_in() {
            return Err(PortalError::auth("session expired before booking"));
        }
        let page = page.error_for_status()?;

        let fresh = self.sessions.refresh_token_from(&page, session)?;
        self.check_facility(&page);

        let date = slot.date_param();
        let form = [
            ("utf8", UTF8_MARKER),
            ("authenticity_token", fresh.anti_forgery_token()),
            ("confirmed_limit_message", "1"),
            ("use_consulate_appointment_capacity", "true"),
            (
                "appointments[consulate_appointment][facility_id]",
                self.facility_id.as_str(),
            ),
            ("appointments[consulate_appointment][date]", date.as_str()),
            ("appointments[consulate_appointment][time]", slot.time.as_str()),
            ("appointments[asc_appointment][facility_id]", ""),
            ("appointments[asc_appointment][date]", ""),
            ("appointments[asc_appointment][time]", ""),
        ];

        let mut headers = with_form_headers(fresh.request_headers());
        if let Ok(referer) = HeaderValue::from_str(&page.url) {
            headers.insert(REFERER, referer);
        }

        tracing::debug!(slot = %slot, facility_id = %self.facility_id, "Submitting booking");
        let response = self.client.post_form(&path, &form, headers).await?;

        let outcome = self.interpret_submission(&response)?;

        let session = match response.set_cookie.as_deref().and_then(extract_session_cookie) {
            Some(cookie) => fresh.with_cookie(cookie)?,
            None => fresh,
        };

        Ok(BookingReceipt { session, outcome })
    }

    /// Classify the portal's answer to a booking submission
    pub fn interpret_submission(
        &self,
        response: &PortalResponse,
    ) -> Result<BookingOutcome, PortalError> {
        if response.redirects_to_sign_in() {
            return Err(PortalError::auth("session expired while booking"));
        }

        if response.is_redirect() {
            if self.redirects_to_form(response) {
                let reason = self
                    .scraper
                    .extract_flash_message(&response.body)
                    .unwrap_or_else(|| "redirected back to the booking form".to_string());
                return Ok(BookingOutcome::Rejected { reason });
            }

            return Ok(BookingOutcome::Confirmed {
                location: response.location.clone(),
            });
        }

        if response.is_success() {
            let reason = self
                .scraper
                .extract_flash_message(&response.body)
                .unwrap_or_else(|| "booking form rendered again".to_string());
            return Ok(BookingOutcome::Rejected { reason });
        }

        Err(PortalError::UnexpectedStatus {
            status: response.status.as_u16(),
            url: response.url.clone(),
        })
    }

    /// Whether a redirect points back at the booking form itself
    ///
    /// Relative locations are resolved against the submitted URL.
    fn redirects_to_form(&self, response: &PortalResponse) -> bool {
        let Some(location) = response.location.as_deref() else {
            return false;
        };

        let target = Url::parse(&response.url)
            .and_then(|base| base.join(location))
            .or_else(|_| Url::parse(location));

        match target {
            Ok(url) => url
                .path()
                .trim_end_matches('/')
                .ends_with(&self.appointment_path()),
            Err(_) => false,
        }
    }

    /// Log whether the configured facility is among those the form offers
    fn check_facility(&self, page: &PortalResponse) {
        let registry = self.scraper.facility_registry(&page.body);
        if registry.is_empty() {
            tracing::debug!("Booking form lists no facilities");
            return;
        }

        tracing::debug!(
            consulate = ?registry.consulate,
            asc = ?registry.asc,
            "Booking form facilities"
        );

        if !registry.offers_consulate(&self.facility_id) {
            tracing::warn!(
                facility_id = %self.facility_id,
                offered = ?registry.consulate,
                "Configured facility is not offered by the booking form"
            );
        }
    }
}
