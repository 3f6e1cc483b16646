//! Structured error types for irqprobe
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures of the interrupt-table parser.
#[derive(Error, Debug)]
pub enum IrqStatsError {
    #[error("Interrupt table {} is not available: {error}", path.display())]
    NotAvailable { path: PathBuf, error: io::Error },

    #[error("Line {line_no} (IRQ {irq}): column {column} is not a count: '{value}'")]
    Parse {
        line_no: usize,
        irq: String,
        column: usize,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failures of the version subprocess.
///
/// Everything except [`SpawnError::TimedOut`] means the child never started.
/// A missing executable is reported and the run goes on; the daemon exists
/// but cannot be run for the remaining start failures.
#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("{} not found", path.display())]
    NotFound { path: PathBuf },

    #[error("Permission denied executing {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Failed to run {}: {error}", path.display())]
    Failed { path: PathBuf, error: io::Error },

    #[error("{} did not finish within {}s", path.display(), timeout.as_secs_f64())]
    TimedOut { path: PathBuf, timeout: Duration },
}

impl SpawnError {
    /// Classify an I/O error returned by `Command::spawn`.
    #[must_use]
    pub fn from_spawn(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => SpawnError::NotFound { path },
            io::ErrorKind::PermissionDenied => SpawnError::PermissionDenied { path },
            _ => SpawnError::Failed { path, error: err },
        }
    }

    /// True when the executable exists but could not be started.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, SpawnError::PermissionDenied { .. } | SpawnError::Failed { .. })
    }
}

/// Errors that end a probe run early.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Version query could not be started")]
    VersionQuery(#[source] SpawnError),

    #[error("Interrupt statistics are malformed")]
    InterruptTable(#[source] IrqStatsError),

    #[error("Failed to write report")]
    Report(#[from] io::Error),
}

impl ProbeError {
    /// Process exit status for this failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            ProbeError::VersionQuery(_) => 1,
            ProbeError::InterruptTable(_) => 3,
            ProbeError::Report(_) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_classification() {
        let err = SpawnError::from_spawn("/usr/sbin/irqbalance", io::ErrorKind::NotFound.into());
        assert!(matches!(err, SpawnError::NotFound { .. }));
        assert!(!err.is_fatal());

        let err = SpawnError::from_spawn("/x", io::ErrorKind::PermissionDenied.into());
        assert!(matches!(err, SpawnError::PermissionDenied { .. }));
        assert!(err.is_fatal());

        let err = SpawnError::from_spawn("/x", io::Error::other("boom"));
        assert!(matches!(err, SpawnError::Failed { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_timeout_is_not_fatal() {
        let err = SpawnError::TimedOut { path: "/x".into(), timeout: Duration::from_secs(5) };
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "/x did not finish within 5s");
    }

    #[test]
    fn test_parse_error_display() {
        let source = "x1".parse::<u64>().unwrap_err();
        let err = IrqStatsError::Parse {
            line_no: 4,
            irq: "16".to_string(),
            column: 2,
            value: "x1".to_string(),
            source,
        };
        assert_eq!(err.to_string(), "Line 4 (IRQ 16): column 2 is not a count: 'x1'");
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let spawn = ProbeError::VersionQuery(SpawnError::PermissionDenied { path: "/x".into() });
        let source = "-1".parse::<u64>().unwrap_err();
        let table = ProbeError::InterruptTable(IrqStatsError::Parse {
            line_no: 2,
            irq: "0".to_string(),
            column: 1,
            value: "-1".to_string(),
            source,
        });
        let report = ProbeError::Report(io::ErrorKind::BrokenPipe.into());
        assert_eq!(spawn.exit_code(), 1);
        assert_eq!(table.exit_code(), 3);
        assert_eq!(report.exit_code(), 4);
    }
}
