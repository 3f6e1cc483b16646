//! Line-oriented console report.
//!
//! Every checked fact becomes one line prefixed with a fixed-width tag:
//!
//! ```text
//! [ OK ] /usr/sbin/irqbalance exists and is executable
//! [FAIL] marker 'libnuma.so.1' not found in the irqbalance executable
//! [INFO] processor count: 8
//! [SKIP] no irqbalance executable, cannot test markers
//! ```

use std::fmt;
use std::io::{self, Write};

/// Severity of a report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Ok,
    Fail,
    Info,
    Skip,
}

impl Severity {
    /// Prefix printed before the message, trailing space included.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Severity::Ok => "[ OK ] ",
            Severity::Fail => "[FAIL] ",
            Severity::Info => "[INFO] ",
            Severity::Skip => "[SKIP] ",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag().trim_end())
    }
}

/// Number of lines written per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub ok: usize,
    pub fail: usize,
    pub info: usize,
    pub skip: usize,
}

/// Writes tagged lines to `out`, flushing after each one so that partial
/// reports survive an early exit.
pub struct Report<W: Write> {
    out: W,
    tally: Tally,
}

impl<W: Write> Report<W> {
    pub fn new(out: W) -> Self {
        Self { out, tally: Tally::default() }
    }

    /// Write one line.
    ///
    /// # Errors
    /// Returns the underlying write error.
    pub fn line(&mut self, severity: Severity, message: impl fmt::Display) -> io::Result<()> {
        writeln!(self.out, "{}{message}", severity.tag())?;
        self.out.flush()?;
        match severity {
            Severity::Ok => self.tally.ok += 1,
            Severity::Fail => self.tally.fail += 1,
            Severity::Info => self.tally.info += 1,
            Severity::Skip => self.tally.skip += 1,
        }
        Ok(())
    }

    /// # Errors
    /// Returns the underlying write error.
    pub fn ok(&mut self, message: impl fmt::Display) -> io::Result<()> {
        self.line(Severity::Ok, message)
    }

    /// # Errors
    /// Returns the underlying write error.
    pub fn fail(&mut self, message: impl fmt::Display) -> io::Result<()> {
        self.line(Severity::Fail, message)
    }

    /// # Errors
    /// Returns the underlying write error.
    pub fn info(&mut self, message: impl fmt::Display) -> io::Result<()> {
        self.line(Severity::Info, message)
    }

    /// # Errors
    /// Returns the underlying write error.
    pub fn skip(&mut self, message: impl fmt::Display) -> io::Result<()> {
        self.line(Severity::Skip, message)
    }

    #[must_use]
    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
