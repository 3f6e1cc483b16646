//! Find a running daemon by its command line.

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::domain::Pid;

/// Read the first line of a file, trimmed.
///
/// Any I/O error yields `None`; an empty file yields `Some("")`.
#[must_use]
pub fn read_first_line(path: &Path) -> Option<String> {
    let file = fs::File::open(path).ok()?;
    let mut line = String::new();
    BufReader::new(file).read_line(&mut line).ok()?;
    Some(line.trim().to_string())
}

/// Read `<proc_root>/<pid>/cmdline` with NUL separators turned into spaces.
fn read_cmdline(proc_root: &Path, pid: Pid) -> Option<String> {
    let raw = read_first_line(&proc_root.join(pid.0.to_string()).join("cmdline"))?;
    Some(raw.replace('\0', " ").trim().to_string())
}

/// Find a process whose command line contains `needle`.
///
/// Scans numeric entries under `proc_root` (normally `/proc`) and returns
/// the lowest matching PID. Our own process is never reported, since its
/// arguments may mention the daemon's path. Kernel threads have an empty
/// command line and never match.
///
/// # Errors
/// Returns error if `proc_root` cannot be listed.
pub fn find_process_by_cmdline(proc_root: &Path, needle: &str) -> Result<Option<Pid>> {
    let own_pid = Pid(std::process::id());

    let entries = fs::read_dir(proc_root)
        .with_context(|| format!("Failed to read {}", proc_root.display()))?;

    let mut pids: Vec<Pid> = entries
        .flatten()
        .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok().map(Pid))
        .filter(|&pid| pid != own_pid)
        .collect();
    pids.sort_unstable();

    for pid in pids {
        // Processes may exit while we scan
        let Some(cmdline) = read_cmdline(proc_root, pid) else {
            continue;
        };
        if !cmdline.is_empty() && cmdline.contains(needle) {
            debug!("PID {pid} matches '{needle}': {cmdline}");
            return Ok(Some(pid));
        }
    }

    Ok(None)
}
