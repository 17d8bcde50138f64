//! slotwatch - visa appointment watcher
//!
//! Watches a visa-scheduling portal for an appointment date earlier than the
//! one already held and re-books automatically when one shows up.
//!
//! # Architecture
//!
//! - [`config`] - Configuration from environment variables or TOML
//! - [`parser`] - HTML scraping of portal pages
//! - [`portal`] - HTTP session, availability queries and booking
//! - [`supervisor`] - The poll/decide/book/sleep loop with crash recovery
//! - [`models`] - Core data structures
//! - [`utils`] - Common utilities and domain errors
//!
//! # Example
//!
//! ```no_run
//! use slotwatch::config::Config;
//! use slotwatch::models::HeldBooking;
//! use slotwatch::portal::VisaPortal;
//! use slotwatch::supervisor::Supervisor;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     config.validate()?;
//!
//!     let held = HeldBooking::parse("2024-12-31")?;
//!     let portal = VisaPortal::new(&config)?;
//!     let mut supervisor = Supervisor::new(portal, held, config.refresh_delay());
//!     supervisor.run().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod portal;
pub mod supervisor;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result, SlotwatchErrorTrait};
    pub use crate::models::{AppointmentSlot, BookingOutcome, HeldBooking, SessionContext};
    pub use crate::portal::{Portal, VisaPortal};
    pub use crate::supervisor::Supervisor;
}

// Direct re-exports for convenience
pub use models::{AppointmentSlot, HeldBooking, SessionContext};
