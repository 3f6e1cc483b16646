//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep process IDs and CPU indices from being mixed
//! up with plain interrupt counts in function signatures.

use std::fmt;

/// Process ID
///
/// Represents a process ID discovered under the process-list directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// CPU ID
///
/// Zero-based CPU column index in the interrupt table (0, 1, 2, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CpuId(pub u32);

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CPU#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_display_is_bare_number() {
        assert_eq!(Pid(1234).to_string(), "1234");
    }

    #[test]
    fn test_cpu_id_display() {
        assert_eq!(CpuId(3).to_string(), "CPU#3");
    }

    #[test]
    fn test_pid_ordering() {
        let mut pids = vec![Pid(300), Pid(2), Pid(41)];
        pids.sort();
        assert_eq!(pids, vec![Pid(2), Pid(41), Pid(300)]);
    }
}
