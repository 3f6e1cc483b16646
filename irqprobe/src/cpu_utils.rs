//! CPU utility functions
//!
//! Utilities for querying CPU information from /sys filesystem.

use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::Path;

use crate::domain::CpuId;

/// Default location of the online CPU list.
pub const ONLINE_CPUS_PATH: &str = "/sys/devices/system/cpu/online";

/// Get list of online CPU IDs from `path` (normally [`ONLINE_CPUS_PATH`])
///
/// # Errors
/// Returns an error if the file cannot be read or is not a CPU list.
pub fn online_cpus(path: &Path) -> Result<Vec<CpuId>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_cpu_list(&content)
}

/// Parse a kernel CPU list.
///
/// Returns a vector of CPU IDs (e.g., [0, 1, 2, 3] for a 4-core system).
/// The format in /sys is like "0-3" or "0-3,8-11" for NUMA systems.
///
/// # Errors
/// Returns an error if a range bound is not a number.
pub fn parse_cpu_list(content: &str) -> Result<Vec<CpuId>> {
    let mut cpus = Vec::new();

    for range in content.trim().split(',').filter(|r| !r.is_empty()) {
        if let Some((start, end)) = range.split_once('-') {
            // Range like "0-3"
            let start: u32 = start.parse().with_context(|| format!("Bad CPU range '{range}'"))?;
            let end: u32 = end.parse().with_context(|| format!("Bad CPU range '{range}'"))?;
            for cpu in start..=end {
                cpus.push(CpuId(cpu));
            }
        } else {
            // Single CPU like "5"
            let cpu: u32 = range.parse().with_context(|| format!("Bad CPU id '{range}'"))?;
            cpus.push(CpuId(cpu));
        }
    }

    Ok(cpus)
}

/// Number of online processors.
///
/// Falls back to [`std::thread::available_parallelism`] when the sysfs list
/// is missing or unreadable, and to 1 when that fails too.
#[must_use]
pub fn online_cpu_count(path: &Path) -> usize {
    match online_cpus(path) {
        Ok(cpus) if !cpus.is_empty() => cpus.len(),
        Ok(_) => fallback_cpu_count(),
        Err(e) => {
            warn!("{e:#}, falling back to available parallelism");
            fallback_cpu_count()
        }
    }
}

fn fallback_cpu_count() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}
