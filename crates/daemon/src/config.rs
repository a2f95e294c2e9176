//! CLI surface for the daemon binary: the core itself exposes no CLI,
//! so this binary is the shell that owns one, built with `clap`'s
//! `Command` builder.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

/// Parsed command-line flags.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Where the persisted `DaemonState` JSON lives.
    pub state_path: PathBuf,
    /// Use `MockDriver` instead of probing for real hardware.
    pub mock: bool,
    /// RNG seed for the mock driver's synthetic waveforms.
    pub mock_seed: u64,
}

fn command() -> Command {
    Command::new("daq_daemon")
        .about("Event-mode PALS/gamma-coincidence acquisition daemon")
        .arg(
            Arg::new("state_path")
                .long("state-path")
                .value_name("PATH")
                .default_value("./daq_state.json")
                .help("path to the persisted JSON daemon state"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .action(ArgAction::SetTrue)
                .help("use the synthetic mock driver instead of probing for real hardware"),
        )
        .arg(
            Arg::new("mock_seed")
                .long("mock-seed")
                .value_name("SEED")
                .default_value("1")
                .help("RNG seed for the mock driver's synthetic waveforms"),
        )
}

pub fn parse_args() -> CliArgs {
    parse_args_from(std::env::args_os())
}

pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().get_matches_from(args);
    CliArgs {
        state_path: PathBuf::from(matches.get_one::<String>("state_path").unwrap()),
        mock: matches.get_flag("mock"),
        mock_seed: matches
            .get_one::<String>("mock_seed")
            .unwrap()
            .parse()
            .unwrap_or(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_no_flags_are_given() {
        let args = parse_args_from(["daq_daemon"]);
        assert_eq!(args.state_path, PathBuf::from("./daq_state.json"));
        assert!(!args.mock);
        assert_eq!(args.mock_seed, 1);
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse_args_from(["daq_daemon", "--mock", "--mock-seed", "42", "--state-path", "/tmp/state.json"]);
        assert!(args.mock);
        assert_eq!(args.mock_seed, 42);
        assert_eq!(args.state_path, PathBuf::from("/tmp/state.json"));
    }
}
