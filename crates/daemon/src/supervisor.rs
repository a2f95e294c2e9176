//! Wires a digitizer driver into the acquisition engine and event
//! store, and runs until the caller's shutdown future resolves:
//! `tokio::signal::ctrl_c()` races the running system and triggers a
//! graceful engine shutdown. No network surface: this supervises a
//! single long-running subsystem, the acquisition engine.

use std::future::Future;

use daq_driver::{connect, DigitizerDriver, MockDriver};
use daq_engine::{AcquisitionEngine, EventStore};
use daq_types::notify::Notification;
use daq_types::state::DaemonState;

use crate::config::CliArgs;

/// Opens a driver (mock or real, per `args`), spawns the acquisition
/// engine against the persisted trigger/retention configuration, logs
/// notifications as they arrive, and blocks until `shutdown` resolves.
/// Persists the (possibly unchanged) state back to `args.state_path`
/// before returning.
pub async fn run(args: &CliArgs, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
    let state = DaemonState::load_or_default(&args.state_path)?;
    tracing::info!(state_path = %args.state_path.display(), "loaded persisted state");

    let driver: Box<dyn DigitizerDriver> = if args.mock {
        tracing::info!(seed = args.mock_seed, "using mock driver");
        Box::new(MockDriver::new(args.mock_seed))
    } else {
        let (driver, info) = connect()?;
        tracing::info!(family = %info.family, serial = %info.serial, "connected to digitizer");
        driver
    };

    let store = EventStore::new(state.retention.max_events);
    let engine = AcquisitionEngine::spawn(driver, state.trigger_spec.clone(), state.retention, store.clone())?;
    engine.resume();

    let notifications = engine.notifications().clone();
    let log_handle = std::thread::spawn(move || {
        while let Ok(notification) = notifications.recv() {
            log_notification(&notification);
        }
    });

    shutdown.await;
    tracing::info!("shutdown requested, stopping acquisition engine");
    engine.shutdown();
    log_handle.join().ok();

    state.save(&args.state_path)?;
    Ok(())
}

fn log_notification(notification: &Notification) {
    match notification {
        Notification::StateChanged(state) => tracing::info!(?state, "engine state changed"),
        Notification::BatchComplete { count, events_per_second } => {
            tracing::debug!(count, events_per_second, "batch complete")
        }
        Notification::StorageWarning { fill_fraction } => {
            tracing::warn!(fill_fraction, "event store nearing capacity")
        }
        Notification::AcquisitionError(message) => tracing::error!(%message, "acquisition error"),
        Notification::WaveformReady(_) => tracing::trace!("representative waveform ready"),
    }
}
