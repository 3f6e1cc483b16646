//! Host checks for the daemon installation
//!
//! Answers the simple questions asked before the heavier analysis: is the
//! executable there and runnable, is the service unit readable, and does the
//! daemon report a version when asked.

#![allow(unsafe_code)] // access() and memory mapping require unsafe

use log::{debug, warn};
use memmap2::Mmap;
use object::{Object, ObjectSection};
use std::ffi::CString;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::domain::SpawnError;

/// How often a running version query is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

fn access(path: &Path, mode: libc::c_int) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: c_path is a valid NUL-terminated string for the duration of the call
    unsafe { libc::access(c_path.as_ptr(), mode) == 0 }
}

/// Check whether the current user may execute `path`.
#[must_use]
pub fn is_executable(path: &Path) -> bool {
    path.is_file() && access(path, libc::X_OK)
}

/// Check whether the current user may read `path`.
#[must_use]
pub fn is_readable(path: &Path) -> bool {
    access(path, libc::R_OK)
}

/// What the daemon printed when asked for its version.
#[derive(Debug)]
pub struct VersionOutput {
    /// First line of standard output, trimmed; empty if nothing was printed.
    pub first_line: String,
    pub status: ExitStatus,
}

impl VersionOutput {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status.success()
    }

    /// Human-readable reason for an unsuccessful status.
    #[must_use]
    pub fn failure_reason(&self) -> String {
        match (self.status.code(), self.status.signal()) {
            (Some(code), _) => format!("exit code {code}"),
            (None, Some(signal)) => format!("signal {signal}"),
            (None, None) => "unknown status".to_string(),
        }
    }
}

/// Run `binary flag` and capture its first line of output and exit status.
///
/// Output is read on a separate thread while the child runs, so a chatty
/// child never blocks on a full pipe. Everything after the first line is
/// discarded. The child is killed if it has not exited within `timeout`.
///
/// # Errors
/// - [`SpawnError::NotFound`] / [`SpawnError::PermissionDenied`] /
///   [`SpawnError::Failed`] if the child could not be started
/// - [`SpawnError::TimedOut`] if it ran longer than `timeout`
pub fn query_version(
    binary: &Path,
    flag: &str,
    timeout: Duration,
) -> Result<VersionOutput, SpawnError> {
    debug!("Running {} {flag}", binary.display());
    let mut child = Command::new(binary)
        .arg(flag)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| SpawnError::from_spawn(binary, e))?;

    let reader = child
        .stdout
        .take()
        .map(|stdout| thread::spawn(move || read_version_line(stdout)));

    // On timeout the reader is detached; a lingering grandchild may hold the pipe
    let status = wait_with_timeout(&mut child, binary, timeout)?;
    let first_line = match reader.map(JoinHandle::join) {
        Some(Ok(Ok(line))) => line,
        Some(Ok(Err(e))) => {
            warn!("Could not read output of {}: {e}", binary.display());
            String::new()
        }
        Some(Err(_)) => {
            warn!("Output reader for {} panicked", binary.display());
            String::new()
        }
        None => String::new(),
    };

    Ok(VersionOutput { first_line, status })
}

/// Read the first line, then drain the rest so the writer never blocks.
fn read_version_line(stdout: ChildStdout) -> io::Result<String> {
    let mut reader = BufReader::new(stdout);
    let mut first_line = String::new();
    reader.read_line(&mut first_line)?;
    io::copy(&mut reader, &mut io::sink())?;
    Ok(first_line.trim().to_string())
}

fn wait_with_timeout(
    child: &mut Child,
    binary: &Path,
    timeout: Duration,
) -> Result<ExitStatus, SpawnError> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                // Already-exited children make kill() fail; nothing to do then
                child.kill().ok();
                child.wait().ok();
                return Err(SpawnError::TimedOut { path: binary.to_path_buf(), timeout });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(error) => return Err(SpawnError::Failed { path: binary.to_path_buf(), error }),
        }
    }
}

/// Summary of the executable's object file headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: String,
    pub architecture: String,
    /// No `.symtab` section
    pub stripped: bool,
}

/// Inspect the object headers of `path`.
///
/// Returns `None` if the file cannot be read, `Some(Err(_))` with the parser
/// message if it is not a recognised object file.
#[must_use]
pub fn inspect_image(path: &Path) -> Option<Result<ImageInfo, String>> {
    let file = File::open(path).ok()?;
    if file.metadata().ok()?.len() == 0 {
        return Some(parse_image(&[]));
    }
    // SAFETY: the map is read-only and dropped before returning
    let mmap = unsafe { Mmap::map(&file) }.ok()?;
    Some(parse_image(&mmap))
}

fn parse_image(data: &[u8]) -> Result<ImageInfo, String> {
    let obj = object::File::parse(data).map_err(|e| e.to_string())?;
    let has_symtab = obj.section_by_name(".symtab").is_some_and(|s| s.size() > 0);
    Ok(ImageInfo {
        format: format!("{:?}", obj.format()),
        architecture: format!("{:?}", obj.architecture()),
        stripped: !has_symtab,
    })
}
