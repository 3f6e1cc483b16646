//! # irqprobe - Main Entry Point
//!
//! Parses the command line, runs every check and maps fatal errors to exit
//! codes. The report goes to stdout, diagnostics (`RUST_LOG`) to stderr.

use anyhow::Result;
use clap::Parser;
use log::debug;
use std::io;

use irqprobe::cli::Args;
use irqprobe::config::ProbeConfig;
use irqprobe::domain::ProbeError;
use irqprobe::probe::run_probe;
use irqprobe::report::Report;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ProbeError>().map_or(EXIT_ERROR, ProbeError::exit_code)
}

fn run() -> Result<()> {
    let config = ProbeConfig::from(Args::parse());
    debug!("Configuration: {config:?}");

    let stdout = io::stdout();
    let mut report = Report::new(stdout.lock());
    run_probe(&config, &mut report)?;
    Ok(())
}
