//! Poll, decide, book, sleep, forever
//!
//! The supervisor owns the two pieces of mutable state: the current
//! [`SessionContext`] (discarded on every restart) and the [`HeldBooking`]
//! (kept across restarts). Any failure inside a cycle ends that cycle; the
//! supervisor logs it, waits one refresh delay and starts over with a fresh
//! login.

use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;

use crate::error::SlotwatchErrorTrait;
use crate::models::{
    AppointmentSlot, BookingOutcome, CycleState, CycleStats, HeldBooking, PollDecision,
    SessionContext,
};
use crate::portal::Portal;
use crate::utils::error::PortalError;

/// Drives the watch loop against a [`Portal`]
pub struct Supervisor<P: Portal> {
    portal: P,
    held: HeldBooking,
    refresh_delay: Duration,
    dry_run: bool,
    state: CycleState,
    stats: CycleStats,
}

impl<P: Portal> Supervisor<P> {
    pub fn new(portal: P, held: HeldBooking, refresh_delay: Duration) -> Self {
        Self {
            portal,
            held,
            refresh_delay,
            dry_run: false,
            state: CycleState::LoggingIn,
            stats: CycleStats::new(),
        }
    }

    /// Poll and decide but never submit bookings
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn held(&self) -> HeldBooking {
        self.held
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn portal(&self) -> &P {
        &self.portal
    }

    /// Run until the process is terminated
    pub async fn run(&mut self) {
        self.run_until(std::future::pending::<()>()).await;
    }

    /// Run until `shutdown` completes
    ///
    /// Each session cycle is raced against `shutdown`; a cycle that fails is
    /// logged, followed by one refresh delay, and replaced by a new one.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tracing::info!(held = %self.held, dry_run = self.dry_run, "Initializing with current date");

        loop {
            let outcome = tokio::select! {
                _ = &mut shutdown => None,
                result = self.session_cycle() => Some(result),
            };

            let err = match outcome {
                None => break,
                Some(Ok(never)) => match never {},
                Some(Err(err)) => err,
            };

            self.recover(&err);

            let interrupted = tokio::select! {
                _ = &mut shutdown => true,
                _ = tokio::time::sleep(self.refresh_delay) => false,
            };
            if interrupted {
                break;
            }
        }

        tracing::info!(
            held = %self.held,
            logins = self.stats.logins,
            polls = self.stats.polls,
            bookings = self.stats.bookings,
            rejections = self.stats.rejections,
            recoveries = self.stats.recoveries,
            uptime_secs = self.stats.uptime_secs(),
            "Supervisor stopped"
        );
    }

    /// Log in, then poll until something fails
    async fn session_cycle(&mut self) -> Result<Infallible, PortalError> {
        self.state = CycleState::LoggingIn;
        let mut session = self.portal.login().await?;
        self.stats.logins += 1;

        loop {
            let (next, _decision) = self.poll_once(session).await?;
            session = next;

            self.state = CycleState::Sleeping;
            tokio::time::sleep(self.refresh_delay).await;
        }
    }

    /// One poll round: query, decide, and book if the candidate beats the held date
    ///
    /// Returns the session to use next (booking refreshes it) and the decision taken.
    ///
    /// # Errors
    ///
    /// Any portal failure other than a vanished time slot
    pub async fn poll_once(
        &mut self,
        session: SessionContext,
    ) -> Result<(SessionContext, PollDecision), PortalError> {
        self.state = CycleState::Polling;

        let (session, decision) = match self.portal.check_available_date(&session).await? {
            None => {
                tracing::info!("No dates available");
                (session, PollDecision::NoDateAvailable)
            }
            Some(candidate) if !self.held.is_improved_by(candidate) => {
                tracing::info!(
                    held = %self.held,
                    nearest = %candidate,
                    "Nearest date is further than already booked"
                );
                (session, PollDecision::NotEarlier { candidate })
            }
            Some(candidate) => {
                self.state = CycleState::Booking;
                tracing::info!(held = %self.held, candidate = %candidate, "Earlier date found");

                match self.portal.check_available_time(&session, candidate).await {
                    Ok(time) => {
                        let slot = AppointmentSlot::new(candidate, time);
                        self.book(session, slot).await?
                    }
                    Err(err) if err.is_benign() => {
                        tracing::warn!(candidate = %candidate, error = %err, "Date vanished before a time could be picked");
                        (session, PollDecision::NoTimeAvailable { candidate })
                    }
                    Err(err) => return Err(err),
                }
            }
        };

        self.state = decision.state();
        self.stats.record(&decision);

        Ok((session, decision))
    }

    async fn book(
        &mut self,
        session: SessionContext,
        slot: AppointmentSlot,
    ) -> Result<(SessionContext, PollDecision), PortalError> {
        if self.dry_run {
            tracing::info!(slot = %slot, "Dry run, not booking");
            return Ok((session, PollDecision::WouldBook(slot)));
        }

        let receipt = self.portal.book(&session, &slot).await?;

        let decision = match receipt.outcome {
            BookingOutcome::Confirmed { location } => {
                self.held.advance_to(slot.date);
                tracing::info!(
                    date = %slot.date_param(),
                    time = %slot.time,
                    location = ?location,
                    "Booked time at"
                );
                PollDecision::Booked(slot)
            }
            BookingOutcome::Rejected { reason } => {
                tracing::warn!(slot = %slot, reason = %reason, held = %self.held, "Booking rejected");
                PollDecision::Rejected { slot, reason }
            }
        };

        Ok((receipt.session, decision))
    }

    fn recover(&mut self, err: &PortalError) {
        self.state = CycleState::Recovering;
        self.stats.recoveries += 1;

        tracing::error!(
            category = %err.category(),
            recoverable = err.is_recoverable(),
            error = %err,
            held = %self.held,
            recoveries = self.stats.recoveries,
            "Error occurred"
        );
        tracing::info!(delay_secs = self.refresh_delay.as_secs_f64(), "Trying again");
    }
}
