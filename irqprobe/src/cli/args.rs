//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::config::{
    DEFAULT_BINARY_PATH, DEFAULT_INTERRUPTS_PATH, DEFAULT_PROCESS_NAME, DEFAULT_PROC_ROOT,
    DEFAULT_SERVICE_PATH, DEFAULT_VERSION_FLAG,
};

#[derive(Parser, Debug)]
#[command(
    name = "irqprobe",
    version,
    about = "Check that the irqbalance daemon is installed, intact and running",
    after_help = "\
EXAMPLES:
    irqprobe                                     Check the system irqbalance
    irqprobe --binary /opt/irqbalance/sbin/irqbalance
    irqprobe --marker libnuma.so.1 --marker irqbalance
    RUST_LOG=debug irqprobe                      Show diagnostics on stderr

EXIT STATUS:
    0  report completed (individual checks may have failed)
    1  the daemon exists but could not be started to query its version
    2  invalid command line
    3  the interrupt table could not be parsed
    4  the report could not be written"
)]
pub struct Args {
    /// Path to the daemon executable
    #[arg(long, value_name = "PATH", default_value = DEFAULT_BINARY_PATH)]
    pub binary: PathBuf,

    /// Path to the systemd service unit
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SERVICE_PATH)]
    pub service: PathBuf,

    /// Kernel interrupt-accounting table
    #[arg(long, value_name = "PATH", default_value = DEFAULT_INTERRUPTS_PATH)]
    pub interrupts: PathBuf,

    /// Process-list directory searched for a running daemon
    #[arg(long, value_name = "DIR", default_value = DEFAULT_PROC_ROOT)]
    pub proc_root: PathBuf,

    /// Command-line substring identifying the running daemon
    #[arg(long, value_name = "NAME", default_value = DEFAULT_PROCESS_NAME)]
    pub process_name: String,

    /// Byte string expected in the executable (repeatable, replaces the defaults)
    #[arg(long = "marker", value_name = "STRING")]
    pub markers: Vec<String>,

    /// Flag passed to the daemon to print its version
    #[arg(long, value_name = "FLAG", default_value = DEFAULT_VERSION_FLAG, allow_hyphen_values = true)]
    pub version_flag: String,

    /// Seconds to wait for the version query before giving up
    #[arg(long, value_name = "SECS", default_value = "5")]
    pub version_timeout: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["irqprobe"]);
        assert_eq!(args.binary, PathBuf::from("/usr/sbin/irqbalance"));
        assert_eq!(args.interrupts, PathBuf::from("/proc/interrupts"));
        assert_eq!(args.version_flag, "--version");
        assert_eq!(args.version_timeout, 5);
        assert!(args.markers.is_empty());
    }

    #[test]
    fn test_repeated_markers() {
        let args = Args::parse_from(["irqprobe", "--marker", "a", "--marker", "b"]);
        assert_eq!(args.markers, vec!["a".to_string(), "b".to_string()]);
    }
}
