use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slotwatch::config::Config;
use slotwatch::error::{Error, SlotwatchErrorTrait};
use slotwatch::models::HeldBooking;
use slotwatch::portal::VisaPortal;
use slotwatch::supervisor::Supervisor;

#[derive(Parser)]
#[command(
    name = "slotwatch",
    version,
    about = "Watches the visa appointment portal and re-books earlier dates",
    long_about = None
)]
struct Cli {
    /// Date of the appointment currently held (YYYY-MM-DD)
    current_booked_date: String,

    /// TOML config file; environment variables are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long)]
    log_format: Option<String>,

    /// Seconds between polls and before every restart
    #[arg(long)]
    refresh_delay: Option<u64>,

    /// Poll and decide, but never submit a booking
    #[arg(long, default_value = "false")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    if let Some(delay) = cli.refresh_delay {
        config.polling.refresh_delay_secs = delay;
    }
    if cli.dry_run {
        config.polling.dry_run = true;
    }

    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    let held = HeldBooking::parse(&cli.current_booked_date).map_err(fail_fast)?;

    config
        .validate()
        .map_err(|e| fail_fast(Error::Config(format!("{e:#}"))))?;

    tracing::info!(
        base_uri = %config.portal.base_uri(),
        schedule_id = %config.portal.schedule_id,
        facility_id = %config.portal.facility_id,
        refresh_delay_secs = config.polling.refresh_delay_secs,
        "slotwatch starting"
    );

    let portal = VisaPortal::new(&config).map_err(|e| fail_fast(Error::from(e)))?;
    let mut supervisor =
        Supervisor::new(portal, held, config.refresh_delay()).dry_run(config.polling.dry_run);

    supervisor
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown requested");
        })
        .await;

    tracing::info!(held = %supervisor.held(), "slotwatch stopped");
    Ok(())
}

/// Log a start-up failure with its category before the process exits
fn fail_fast(err: Error) -> anyhow::Error {
    tracing::error!(category = %err.category(), error = %err, "Cannot start");
    err.into()
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("slotwatch=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("slotwatch={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_target(false).compact())
                .init();
        }
    }

    Ok(())
}
