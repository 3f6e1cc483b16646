//! Probe sequencing
//!
//! Runs every check in a fixed order and turns each outcome into a report
//! line. Per-check problems become FAIL/INFO/SKIP lines; only a daemon that
//! exists but cannot be started and a malformed interrupt table end the run
//! early.

use log::{debug, info};
use std::io::Write;

use crate::config::ProbeConfig;
use crate::cpu_utils::online_cpu_count;
use crate::domain::{IrqStatsError, ProbeError, SpawnError};
use crate::irq_stats::{exclusive_load, read_interrupts, summarize};
use crate::preflight::{inspect_image, is_executable, is_readable, query_version};
use crate::process_lookup::find_process_by_cmdline;
use crate::report::Report;
use crate::scanner::{scan_markers, ScanOutcome};

/// Run all checks, writing findings to `report`.
///
/// # Errors
/// - [`ProbeError::VersionQuery`] if the daemon exists but could not be started
/// - [`ProbeError::InterruptTable`] if the interrupt table is malformed
/// - [`ProbeError::Report`] if writing the report fails
pub fn run_probe<W: Write>(config: &ProbeConfig, report: &mut Report<W>) -> Result<(), ProbeError> {
    let cpu_count = online_cpu_count(&config.online_cpus_path);
    report.info(format_args!("processor count: {cpu_count}"))?;

    check_executable(config, report)?;
    check_version(config, report)?;
    check_service_unit(config, report)?;
    check_markers(config, report)?;
    check_image(config, report)?;
    check_running(config, report)?;
    check_irq_distribution(config, cpu_count, report)?;

    info!("Probe finished: {:?}", report.tally());
    Ok(())
}

fn check_executable<W: Write>(config: &ProbeConfig, report: &mut Report<W>) -> Result<(), ProbeError> {
    let path = config.binary_path.display();
    if is_executable(&config.binary_path) {
        report.ok(format_args!("{path} exists and is executable"))?;
    } else {
        report.fail(format_args!("{path} does not exist, or is not accessible"))?;
    }
    Ok(())
}

fn check_version<W: Write>(config: &ProbeConfig, report: &mut Report<W>) -> Result<(), ProbeError> {
    let command = format!("{} {}", config.binary_path.display(), config.version_flag);
    match query_version(&config.binary_path, &config.version_flag, config.version_timeout) {
        Ok(output) if output.succeeded() => {
            report.ok(format_args!("{command} returns '{}'", output.first_line))?;
        }
        Ok(output) => {
            report.fail(format_args!("{command} failed with {}", output.failure_reason()))?;
        }
        Err(e @ SpawnError::TimedOut { .. }) => {
            report.fail(format_args!("{command} did not finish: {e}"))?;
        }
        Err(e) => {
            report.fail(format_args!("{command} did not execute correctly: {e}"))?;
            if e.is_fatal() {
                return Err(ProbeError::VersionQuery(e));
            }
        }
    }
    Ok(())
}

fn check_service_unit<W: Write>(
    config: &ProbeConfig,
    report: &mut Report<W>,
) -> Result<(), ProbeError> {
    let path = config.service_path.display();
    if is_readable(&config.service_path) {
        report.ok(format_args!("{path} exists and is readable"))?;
    } else {
        report.fail(format_args!("{path} does not exist or is not readable"))?;
    }
    Ok(())
}

fn check_markers<W: Write>(config: &ProbeConfig, report: &mut Report<W>) -> Result<(), ProbeError> {
    let daemon = config.daemon_name();
    match scan_markers(&config.binary_path, &config.markers) {
        ScanOutcome::Skipped { path, reason } => {
            report.skip(format_args!(
                "no {daemon} executable, cannot test markers ({}: {reason})",
                path.display()
            ))?;
        }
        ScanOutcome::Scanned(matches) => {
            for m in matches {
                let marker = m.display_marker();
                if m.found {
                    report.ok(format_args!("marker '{marker}' found in the {daemon} executable"))?;
                } else {
                    report.fail(format_args!(
                        "marker '{marker}' not found in the {daemon} executable"
                    ))?;
                }
            }
        }
    }
    Ok(())
}

fn check_image<W: Write>(config: &ProbeConfig, report: &mut Report<W>) -> Result<(), ProbeError> {
    let path = config.binary_path.display();
    match inspect_image(&config.binary_path) {
        // Unreadable images were already reported by the marker scan
        None => debug!("Skipping image inspection of {path}"),
        Some(Ok(image)) => {
            let symbols = if image.stripped { "stripped" } else { "with symbol table" };
            report.info(format_args!(
                "{path} is a {} {} image, {symbols}",
                image.format, image.architecture
            ))?;
        }
        Some(Err(reason)) => {
            report.info(format_args!("{path} is not a recognised object file: {reason}"))?;
        }
    }
    Ok(())
}

fn check_running<W: Write>(config: &ProbeConfig, report: &mut Report<W>) -> Result<(), ProbeError> {
    let name = &config.process_name;
    match find_process_by_cmdline(&config.proc_root, name) {
        Ok(Some(pid)) => report.ok(format_args!("{name} currently running (PID {pid})"))?,
        Ok(None) => report.info(format_args!("{name} seems not to be running"))?,
        Err(e) => report.info(format_args!("cannot tell whether {name} is running: {e:#}"))?,
    }
    Ok(())
}

fn check_irq_distribution<W: Write>(
    config: &ProbeConfig,
    cpu_count: usize,
    report: &mut Report<W>,
) -> Result<(), ProbeError> {
    let table = match read_interrupts(&config.interrupts_path) {
        Ok(table) => table,
        Err(e @ IrqStatsError::NotAvailable { .. }) => {
            report.skip(format_args!("{e}, no per-CPU IRQ statistics"))?;
            return Ok(());
        }
        Err(e) => return Err(ProbeError::InterruptTable(e)),
    };

    if table.cpu_count() != cpu_count {
        report.info(format_args!(
            "{} lists {} CPUs, processor count is {cpu_count}",
            config.interrupts_path.display(),
            table.cpu_count()
        ))?;
    }

    let load = exclusive_load(&table);
    for (cpu, count) in load.per_cpu().iter().enumerate() {
        report.info(format_args!("IRQs handled exclusively by CPU #{cpu}: {count}"))?;
    }

    let summary = summarize(&table);
    report.info(format_args!(
        "{} IRQs: {} CPU-exclusive, {} shared, {} idle",
        table.len(),
        summary.exclusive,
        summary.shared,
        summary.idle
    ))?;
    Ok(())
}
