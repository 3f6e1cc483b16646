//! Immutable run configuration.
//!
//! Built once from the command line and handed to every check, so no
//! component reaches for a global path or marker list.

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Args;
use crate::scanner::MarkerSet;

pub const DEFAULT_BINARY_PATH: &str = "/usr/sbin/irqbalance";
pub const DEFAULT_SERVICE_PATH: &str = "/usr/lib/systemd/system/irqbalance.service";
pub const DEFAULT_INTERRUPTS_PATH: &str = "/proc/interrupts";
pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_PROCESS_NAME: &str = "irqbalance";
pub const DEFAULT_VERSION_FLAG: &str = "--version";
pub const DEFAULT_VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything a probe run needs to know.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub binary_path: PathBuf,
    pub service_path: PathBuf,
    pub interrupts_path: PathBuf,
    pub proc_root: PathBuf,
    pub online_cpus_path: PathBuf,
    pub process_name: String,
    pub markers: MarkerSet,
    pub version_flag: String,
    pub version_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            binary_path: DEFAULT_BINARY_PATH.into(),
            service_path: DEFAULT_SERVICE_PATH.into(),
            interrupts_path: DEFAULT_INTERRUPTS_PATH.into(),
            proc_root: DEFAULT_PROC_ROOT.into(),
            online_cpus_path: crate::cpu_utils::ONLINE_CPUS_PATH.into(),
            process_name: DEFAULT_PROCESS_NAME.to_string(),
            markers: MarkerSet::default(),
            version_flag: DEFAULT_VERSION_FLAG.to_string(),
            version_timeout: DEFAULT_VERSION_TIMEOUT,
        }
    }
}

impl From<Args> for ProbeConfig {
    fn from(args: Args) -> Self {
        // An empty --marker list means "use the built-in set"
        let markers = MarkerSet::new(args.markers).unwrap_or_default();
        Self {
            binary_path: args.binary,
            service_path: args.service,
            interrupts_path: args.interrupts,
            proc_root: args.proc_root,
            process_name: args.process_name,
            markers,
            version_flag: args.version_flag,
            version_timeout: Duration::from_secs(args.version_timeout),
            ..Self::default()
        }
    }
}

impl ProbeConfig {
    /// File name of the daemon executable, for report messages.
    #[must_use]
    pub fn daemon_name(&self) -> String {
        self.binary_path
            .file_name()
            .map_or_else(|| self.process_name.clone(), |n| n.to_string_lossy().into_owned())
    }
}
