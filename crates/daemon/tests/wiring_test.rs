//! Confirms `DaemonState` round-trips through the path the daemon's
//! CLI flags actually point at.

use daq_daemon::config::parse_args_from;
use daq_types::state::DaemonState;

#[test]
fn state_path_flag_round_trips_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let args = parse_args_from(["daq_daemon", "--state-path", path.to_str().unwrap()]);
    assert_eq!(args.state_path, path);

    let mut state = DaemonState::default();
    state.retention.event_limit = Some(250);
    state.save(&args.state_path).unwrap();

    let reloaded = DaemonState::load_or_default(&args.state_path).unwrap();
    assert_eq!(reloaded.retention.event_limit, Some(250));
}
