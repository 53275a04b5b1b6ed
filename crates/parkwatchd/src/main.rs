//! parkwatchd - The parkwatch background service
//!
//! Wires together:
//! - Configuration loading
//! - The slot snapshot source
//! - The overtime monitor and its timer
//! - Alert output
//! - Unix signals for stop, refresh and manual checks

mod sink;
mod source;

use anyhow::{Context, Result};
use clap::Parser;
use parkwatch_config::{load_config, MonitorPolicy};
use parkwatch_core::{MonitorScheduler, OvertimeMonitor, OvertimeRule};
use parkwatch_host_api::{AlertSink, Clock, SnapshotProvider, SystemClock};
use parkwatch_util::{default_config_path, is_mock_time_active};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::sink::make_sink;
use crate::source::FileSnapshotProvider;

/// parkwatchd - Overtime alerts for parking sessions
#[derive(Parser, Debug)]
#[command(name = "parkwatchd")]
#[command(about = "Overtime alerts for parking sessions", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/parkwatch/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Slot snapshot file override (or set PARKWATCH_SLOTS env var)
    #[arg(short, long, env = "PARKWATCH_SLOTS")]
    slots: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Run a single check, print alerts and exit
    #[arg(long)]
    once: bool,
}

/// Main service state
struct Service {
    policy: MonitorPolicy,
    provider: Arc<dyn SnapshotProvider>,
    sink: Arc<dyn AlertSink>,
    clock: Arc<dyn Clock>,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let mut policy = if args.config.exists() {
            let policy = load_config(&args.config)
                .with_context(|| format!("Failed to load config from {:?}", args.config))?;
            info!(config_path = %args.config.display(), "Configuration loaded");
            policy
        } else {
            warn!(
                config_path = %args.config.display(),
                "Config file not found, using defaults"
            );
            MonitorPolicy::default()
        };

        if let Some(slots) = &args.slots {
            policy.source.slots_path = slots.clone();
        }

        if is_mock_time_active() {
            warn!("Mock time is active, overtime is computed against a shifted clock");
        }

        info!(
            slots_path = %policy.source.slots_path.display(),
            interval_secs = policy.monitor.interval.as_secs(),
            hourly_allowance_hours = policy.rules.hourly_allowance_hours,
            "Monitor configured"
        );

        let provider: Arc<dyn SnapshotProvider> =
            Arc::new(FileSnapshotProvider::new(policy.source.slots_path.clone()));
        let sink = make_sink(policy.alerts.format);

        Ok(Self {
            policy,
            provider,
            sink,
            clock: Arc::new(SystemClock),
        })
    }

    /// Single check without a timer
    async fn run_once(self) -> Result<()> {
        let mut monitor = OvertimeMonitor::new(OvertimeRule::from(self.policy.rules));
        let outcome = monitor
            .tick(self.clock.now(), self.provider.as_ref(), self.sink.as_ref())
            .await
            .context("Overtime check failed")?;

        info!(
            overtime = outcome.current.len(),
            skipped = outcome.current.skipped().len(),
            "Check complete"
        );
        Ok(())
    }

    async fn run(self) -> Result<()> {
        let handle =
            MonitorScheduler::from_policy(&self.policy, self.provider, self.sink, self.clock)
                .start();

        // Set up signal handlers
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup =
            signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;
        let mut sigusr1 = signal(SignalKind::user_defined1())
            .context("Failed to create SIGUSR1 handler")?;

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                // Slot data changed out-of-band: recompute without alerting
                _ = sighup.recv() => {
                    info!("Received SIGHUP, refreshing overtime set");
                    handle.request_refresh();
                }

                // Manual "check now"
                _ = sigusr1.recv() => {
                    info!("Received SIGUSR1, checking now");
                    match handle.check_now().await {
                        Ok(outcome) => info!(
                            overtime = outcome.current.len(),
                            alerted = outcome.newly_overtime.len(),
                            "Manual check complete"
                        ),
                        Err(e) => error!(error = %e, "Manual check failed"),
                    }
                }
            }
        }

        let status = handle.status().await;
        handle.stop().await;

        info!(
            alerts_dispatched = status.alerts_dispatched,
            overtime = status.overtime_count,
            "Shutdown complete"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "parkwatchd starting");

    let once = args.once;
    let service = Service::new(&args)?;
    if once {
        service.run_once().await
    } else {
        service.run().await
    }
}
