//! # irqprobe - irqbalance Installation and Runtime Probe
//!
//! irqprobe checks that the `irqbalance` daemon is installed, looks like a
//! genuine build, is running, and that interrupts on this host are actually
//! spread across CPUs. It only reads; it never starts, stops or configures
//! the daemon.
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌──────────────┐     ┌──────────────┐
//!  │  cli::Args   │────▶│ ProbeConfig  │
//!  └──────────────┘     └──────┬───────┘
//!                              ▼
//!  ┌───────────────────────────────────────────────────────┐
//!  │                     probe::run_probe                  │
//!  │  preflight   scanner   process_lookup   irq_stats     │
//!  └──────────────────────────┬────────────────────────────┘
//!                             ▼
//!                     report::Report  ──▶ stdout
//! ```
//!
//! ## Module Structure
//!
//! - [`scanner`]: memory-maps the daemon executable and looks for marker
//!   byte strings (linked library names, procfs/sysfs paths, glib symbols)
//! - [`irq_stats`]: parses `/proc/interrupts` and sums, per CPU, the counts
//!   of IRQs handled by that CPU alone
//! - [`preflight`]: executable/readable checks, `--version` query, ELF headers
//! - [`process_lookup`]: finds the running daemon by command line
//! - [`cpu_utils`]: online processor count
//! - [`report`]: `[ OK ]` / `[FAIL]` / `[INFO]` / `[SKIP]` lines
//! - [`cli`], [`config`]: command line and the immutable run configuration
//! - [`domain`]: newtypes and error types
//!
//! ## Typical Usage
//!
//! ```bash
//! # Check the system daemon
//! irqprobe
//!
//! # Check a locally built daemon with diagnostics on stderr
//! RUST_LOG=debug irqprobe --binary ./irqbalance
//! ```

pub mod cli;
pub mod config;
pub mod cpu_utils;
pub mod domain;
pub mod irq_stats;
pub mod preflight;
pub mod probe;
pub mod process_lookup;
pub mod report;
pub mod scanner;
