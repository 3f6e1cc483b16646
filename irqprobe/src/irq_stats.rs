//! Per-CPU interrupt statistics from `/proc/interrupts`.
//!
//! The table is a header row of CPU labels followed by one row per IRQ:
//!
//! ```text
//!            CPU0       CPU1
//!   0:         44          0   IO-APIC   2-edge      timer
//!  16:          0      18317   IO-APIC  16-fasteoi   ehci_hcd:usb1
//! NMI:          0          0   Non-maskable interrupts
//! ERR:          0
//! ```
//!
//! An IRQ whose counts are nonzero on exactly one CPU is pinned to that CPU.
//! Summing those counts per CPU shows how the balancing daemon spread
//! exclusive interrupt load across the machine.

use log::{debug, trace};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::domain::{CpuId, IrqStatsError};

/// Rows without per-CPU columns.
const NO_PER_CPU_DATA: [&str; 2] = ["ERR", "MIS"];

/// One IRQ row: name and one count per CPU column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptLine {
    pub name: String,
    pub counts: Vec<u64>,
}

/// Snapshot of one parse of the interrupt table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterruptTable {
    cpu_labels: Vec<String>,
    lines: Vec<InterruptLine>,
}

impl InterruptTable {
    /// Number of CPU columns in the header.
    #[must_use]
    pub fn cpu_count(&self) -> usize {
        self.cpu_labels.len()
    }

    #[must_use]
    pub fn cpu_labels(&self) -> &[String] {
        &self.cpu_labels
    }

    /// IRQ rows in file order.
    #[must_use]
    pub fn lines(&self) -> &[InterruptLine] {
        &self.lines
    }

    /// Counts for the IRQ called `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[u64]> {
        self.lines.iter().find(|l| l.name == name).map(|l| l.counts.as_slice())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// How an IRQ's load is distributed over CPUs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Affinity {
    /// No CPU has handled it yet.
    Idle,
    /// Handled by exactly one CPU.
    Exclusive { cpu: CpuId, count: u64 },
    /// Handled by two or more CPUs.
    Shared { cpus: usize },
}

/// Classify a row of per-CPU counts.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn classify(counts: &[u64]) -> Affinity {
    let mut nonzero = counts.iter().enumerate().filter(|&(_, &c)| c != 0);
    match (nonzero.next(), nonzero.count()) {
        (None, _) => Affinity::Idle,
        (Some((index, &count)), 0) => Affinity::Exclusive { cpu: CpuId(index as u32), count },
        (Some(_), rest) => Affinity::Shared { cpus: rest + 1 },
    }
}

/// Sum of exclusive IRQ counts per CPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusiveLoad {
    per_cpu: Vec<u64>,
}

impl ExclusiveLoad {
    #[must_use]
    pub fn per_cpu(&self) -> &[u64] {
        &self.per_cpu
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.per_cpu.iter().sum()
    }
}

/// Number of IRQ rows in each affinity class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AffinitySummary {
    pub idle: usize,
    pub exclusive: usize,
    pub shared: usize,
}

/// Aggregate exclusive IRQ counts per CPU.
///
/// The result has one slot per header column. Idle and shared rows add
/// nothing.
#[must_use]
pub fn exclusive_load(table: &InterruptTable) -> ExclusiveLoad {
    let mut per_cpu = vec![0u64; table.cpu_count()];
    for line in &table.lines {
        if let Affinity::Exclusive { cpu, count } = classify(&line.counts) {
            let slot = &mut per_cpu[cpu.0 as usize];
            *slot = slot.saturating_add(count);
        }
    }
    ExclusiveLoad { per_cpu }
}

/// Count IRQ rows per affinity class.
#[must_use]
pub fn summarize(table: &InterruptTable) -> AffinitySummary {
    table.lines.iter().fold(AffinitySummary::default(), |mut acc, line| {
        match classify(&line.counts) {
            Affinity::Idle => acc.idle += 1,
            Affinity::Exclusive { .. } => acc.exclusive += 1,
            Affinity::Shared { .. } => acc.shared += 1,
        }
        acc
    })
}

/// Parse an interrupt table.
///
/// # Errors
/// - [`IrqStatsError::Parse`] if a count column is not a non-negative integer
/// - [`IrqStatsError::Io`] if reading fails midway
pub fn parse_interrupts<R: BufRead>(reader: R) -> Result<InterruptTable, IrqStatsError> {
    let mut lines = reader.lines();

    let Some(header) = lines.next().transpose()? else {
        return Ok(InterruptTable::default());
    };
    let cpu_labels: Vec<String> = header.split_whitespace().map(str::to_string).collect();
    let cpu_count = cpu_labels.len();
    debug!("Interrupt table header has {cpu_count} CPU columns");

    let mut table = InterruptTable { cpu_labels, lines: Vec::new() };

    for (index, line) in lines.enumerate() {
        let line = line?;
        let line_no = index + 2;
        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.len() <= 1 {
            trace!("End of interrupt table at line {line_no}");
            break;
        }

        let name = columns[0].strip_suffix(':').unwrap_or(columns[0]);
        if NO_PER_CPU_DATA.contains(&name) {
            continue;
        }

        // Trailers such as arm64's `Err:` carry a single total, not per-CPU counts
        let available = columns.len() - 1;
        if available < cpu_count {
            trace!("Row {line_no} ({name}) has {available} of {cpu_count} counts, end of table");
            break;
        }

        let counts = columns[1..=cpu_count]
            .iter()
            .enumerate()
            .map(|(offset, value)| {
                value.parse::<u64>().map_err(|source| IrqStatsError::Parse {
                    line_no,
                    irq: name.to_string(),
                    column: offset + 1,
                    value: (*value).to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<u64>, _>>()?;

        table.lines.push(InterruptLine { name: name.to_string(), counts });
    }

    debug!("Parsed {} IRQ rows", table.lines.len());
    Ok(table)
}

/// Open and parse the interrupt table at `path`.
///
/// # Errors
/// [`IrqStatsError::NotAvailable`] if the file cannot be opened, otherwise
/// as [`parse_interrupts`].
pub fn read_interrupts(path: &Path) -> Result<InterruptTable, IrqStatsError> {
    let file = File::open(path)
        .map_err(|error| IrqStatsError::NotAvailable { path: path.to_path_buf(), error })?;
    parse_interrupts(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<InterruptTable, IrqStatsError> {
        parse_interrupts(text.as_bytes())
    }

    #[test]
    fn test_single_exclusive_line() {
        let table = parse("CPU0 CPU1\n5: 10 0 IO-APIC 5-edge parport0\n").unwrap();
        assert_eq!(table.cpu_count(), 2);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("5"), Some(&[10, 0][..]));
        assert_eq!(classify(&[10, 0]), Affinity::Exclusive { cpu: CpuId(0), count: 10 });
        assert_eq!(exclusive_load(&table).per_cpu(), &[10, 0]);
    }

    #[test]
    fn test_last_cpu_column_is_kept() {
        let table = parse("CPU0 CPU1 CPU2\n9: 0 0 7 IO-APIC acpi\n").unwrap();
        assert_eq!(table.get("9"), Some(&[0, 0, 7][..]));
        assert_eq!(exclusive_load(&table).per_cpu(), &[0, 0, 7]);
    }

    #[test]
    fn test_err_and_mis_excluded() {
        let table = parse("CPU0 CPU1\nERR: 3\nMIS: 0\n1: 0 4 IO-APIC i8042\n").unwrap();
        assert_eq!(table.get("ERR"), None);
        assert_eq!(table.get("MIS"), None);
        assert_eq!(table.get("1"), Some(&[0, 4][..]));
    }

    #[test]
    fn test_err_with_per_cpu_like_columns_still_excluded() {
        let table = parse("CPU0 CPU1\nERR: 1 2\n").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_named_rows_parsed() {
        let text = "CPU0 CPU1\nNMI: 1 2 Non-maskable interrupts\nLOC: 5 0 Local timer interrupts\n";
        let table = parse(text).unwrap();
        assert_eq!(table.get("NMI"), Some(&[1, 2][..]));
        assert_eq!(table.get("LOC"), Some(&[5, 0][..]));
    }

    #[test]
    fn test_idle_line_contributes_nothing() {
        let table = parse("CPU0 CPU1\n3: 0 0 IO-APIC\n").unwrap();
        assert_eq!(classify(&[0, 0]), Affinity::Idle);
        assert_eq!(exclusive_load(&table).per_cpu(), &[0, 0]);
    }

    #[test]
    fn test_shared_line_excluded() {
        let table = parse("CPU0 CPU1\n4: 3 4 IO-APIC\n").unwrap();
        assert_eq!(classify(&[3, 4]), Affinity::Shared { cpus: 2 });
        assert_eq!(exclusive_load(&table).per_cpu(), &[0, 0]);
    }

    #[test]
    fn test_parsing_stops_at_short_row() {
        let table = parse("CPU0 CPU1\n1: 1 0 x\nTRAILER\n2: 0 9 y\n").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("2"), None);
    }

    #[test]
    fn test_parsing_stops_at_blank_line() {
        let table = parse("CPU0 CPU1\n1: 1 0 x\n\n2: 0 9 y\n").unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_non_numeric_count_is_error() {
        let err = parse("CPU0 CPU1\n1: 1 0 x\n2: 7 abc y\n").unwrap_err();
        match err {
            IrqStatsError::Parse { line_no, irq, column, value, .. } => {
                assert_eq!(line_no, 3);
                assert_eq!(irq, "2");
                assert_eq!(column, 2);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_count_is_error() {
        assert!(matches!(parse("CPU0\n1: -1 x\n"), Err(IrqStatsError::Parse { .. })));
    }

    #[test]
    fn test_arm64_err_trailer_ends_table() {
        let text = "CPU0 CPU1\n11: 100 0 GICv3 27 Level arch_timer\n\
                    IPI0: 5 6 Rescheduling interrupts\nErr: 0\n";
        let table = parse(text).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("IPI0"), Some(&[5, 6][..]));
        assert_eq!(table.get("Err"), None);
        assert_eq!(exclusive_load(&table).per_cpu(), &[100, 0]);
    }

    #[test]
    fn test_row_with_too_few_counts_ends_table() {
        let table = parse("CPU0 CPU1 CPU2\n0: 1 0 0 x\n1: 5 6\n2: 0 0 9 y\n").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("1"), None);
        assert_eq!(table.get("2"), None);
    }

    #[test]
    fn test_empty_input() {
        let table = parse("").unwrap();
        assert_eq!(table.cpu_count(), 0);
        assert!(exclusive_load(&table).per_cpu().is_empty());
    }

    #[test]
    fn test_end_to_end_three_cpus() {
        let text = "CPU0 CPU1 CPU2\n16: 100 0 0 IO-APIC\n17: 0 0 50 IO-APIC\nERR: 3\n";
        let table = parse(text).unwrap();
        let load = exclusive_load(&table);
        assert_eq!(load.per_cpu(), &[100, 0, 50]);
        assert_eq!(load.total(), 150);
    }

    #[test]
    fn test_summarize() {
        let text = "CPU0 CPU1\n1: 1 0 a\n2: 0 0 b\n3: 2 2 c\n4: 0 8 d\n";
        let summary = summarize(&parse(text).unwrap());
        assert_eq!(summary, AffinitySummary { idle: 1, exclusive: 2, shared: 1 });
    }

    #[test]
    fn test_read_missing_file_not_available() {
        let err = read_interrupts(Path::new("/nonexistent/interrupts")).unwrap_err();
        assert!(matches!(err, IrqStatsError::NotAvailable { .. }));
    }
}
