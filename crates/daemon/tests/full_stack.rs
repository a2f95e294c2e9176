//! Exercises the daemon's supervisor wiring end to end against the
//! mock driver: load state, run a short acquisition, shut down on
//! signal, and confirm the state file is still there afterward.

use std::time::Duration;

use daq_daemon::config::CliArgs;
use daq_daemon::supervisor;
use daq_types::state::DaemonState;

#[tokio::test]
async fn supervisor_runs_and_shuts_down_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");

    let mut state = DaemonState::default();
    state.retention.event_limit = Some(20);
    state.save(&state_path).unwrap();

    let args = CliArgs {
        state_path: state_path.clone(),
        mock: true,
        mock_seed: 99,
    };

    supervisor::run(&args, async {
        tokio::time::sleep(Duration::from_millis(500)).await;
    })
    .await
    .expect("supervisor should run to completion against the mock driver");

    // The supervisor persists state back to the same path on shutdown.
    let reloaded = DaemonState::load_or_default(&state_path).unwrap();
    assert_eq!(reloaded.retention.event_limit, Some(20));
}
