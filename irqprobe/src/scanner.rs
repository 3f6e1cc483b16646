//! Marker scanning of the daemon executable.
//!
//! A properly built `irqbalance` image always carries a handful of byte
//! strings: the names of the shared libraries it links, the sysfs/procfs
//! paths it reads, and a few glib symbols. Their absence hints at a broken or
//! foreign binary. The scan is informational; nothing here is fatal.

#![allow(unsafe_code)] // memmap2::Mmap::map is unsafe

use log::{debug, warn};
use memchr::memmem;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Byte strings expected in every `irqbalance` build.
pub const DEFAULT_MARKERS: &[&str] = &[
    "libcap-ng.so.0",
    "libnuma.so.1",
    "/sys/devices/system/cpu",
    "%s/topology/core_siblings",
    "/proc/interrupts",
    "/proc/irq/%i/node",
    "g_main_loop_run",
    "g_list_append",
    "irqbalance",
];

/// Ordered, non-empty set of markers to look for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSet {
    markers: Vec<Vec<u8>>,
}

impl MarkerSet {
    /// Build a marker set, preserving order. Returns `None` for an empty set.
    pub fn new<I, B>(markers: I) -> Option<Self>
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        let markers: Vec<Vec<u8>> = markers.into_iter().map(Into::into).collect();
        if markers.is_empty() {
            None
        } else {
            Some(Self { markers })
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.markers.iter().map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self { markers: DEFAULT_MARKERS.iter().map(|m| m.as_bytes().to_vec()).collect() }
    }
}

/// Result of searching for one marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMatch {
    pub marker: Vec<u8>,
    pub found: bool,
}

impl MarkerMatch {
    /// Marker rendered for the report; invalid UTF-8 is replaced.
    #[must_use]
    pub fn display_marker(&self) -> String {
        String::from_utf8_lossy(&self.marker).into_owned()
    }
}

/// Outcome of a whole scan.
#[derive(Debug)]
pub enum ScanOutcome {
    /// The image could not be opened or mapped; no marker was checked.
    Skipped { path: PathBuf, reason: String },
    /// One entry per marker, in marker-set order.
    Scanned(Vec<MarkerMatch>),
}

/// Search `haystack` for every marker, in order.
#[must_use]
pub fn scan_bytes(haystack: &[u8], markers: &MarkerSet) -> Vec<MarkerMatch> {
    markers
        .iter()
        .map(|marker| MarkerMatch {
            marker: marker.to_vec(),
            found: memmem::find(haystack, marker).is_some(),
        })
        .collect()
}

/// Map the file at `path` read-only and scan it for `markers`.
///
/// The map and file handle are released before this function returns.
pub fn scan_markers(path: &Path, markers: &MarkerSet) -> ScanOutcome {
    let skipped = |reason: String| {
        warn!("Skipping marker scan of {}: {reason}", path.display());
        ScanOutcome::Skipped { path: path.to_path_buf(), reason }
    };

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return skipped(e.to_string()),
    };

    let len = match file.metadata() {
        Ok(meta) if meta.is_dir() => return skipped("is a directory".to_string()),
        Ok(meta) => meta.len(),
        Err(e) => return skipped(e.to_string()),
    };

    // Mapping a zero-length file fails on Linux
    if len == 0 {
        debug!("{} is empty, scanning zero bytes", path.display());
        return ScanOutcome::Scanned(scan_bytes(&[], markers));
    }

    // SAFETY: the map is read-only and dropped at the end of this scope. A
    // concurrent truncation of the daemon image would be a packaging bug.
    let mmap = match unsafe { Mmap::map(&file) } {
        Ok(mmap) => mmap,
        Err(e) => return skipped(e.to_string()),
    };

    debug!("Scanning {} bytes of {} for {} markers", mmap.len(), path.display(), markers.len());
    ScanOutcome::Scanned(scan_bytes(&mmap, markers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn markers(list: &[&str]) -> MarkerSet {
        MarkerSet::new(list.iter().map(|m| m.as_bytes().to_vec())).unwrap()
    }

    #[test]
    fn test_empty_marker_set_rejected() {
        assert!(MarkerSet::new(Vec::<Vec<u8>>::new()).is_none());
    }

    #[test]
    fn test_default_markers_in_order() {
        let set = MarkerSet::default();
        assert_eq!(set.len(), DEFAULT_MARKERS.len());
        assert_eq!(set.iter().next(), Some(&b"libcap-ng.so.0"[..]));
        assert_eq!(set.iter().last(), Some(&b"irqbalance"[..]));
    }

    #[test]
    fn test_scan_bytes_preserves_order() {
        let data = b"\x7fELF\0\0libnuma.so.1\0g_list_append\0";
        let result = scan_bytes(data, &markers(&["g_list_append", "missing", "libnuma.so.1"]));

        let found: Vec<(String, bool)> =
            result.iter().map(|m| (m.display_marker(), m.found)).collect();
        assert_eq!(
            found,
            vec![
                ("g_list_append".to_string(), true),
                ("missing".to_string(), false),
                ("libnuma.so.1".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_scan_bytes_handles_binary_markers() {
        let data = [0u8, 1, 2, 0xff, 0xfe, 3];
        let set = MarkerSet::new(vec![vec![0xffu8, 0xfe], vec![0xfe, 0xff]]).unwrap();
        let result = scan_bytes(&data, &set);
        assert!(result[0].found);
        assert!(!result[1].found);
    }

    #[test]
    fn test_scan_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"prefix /proc/interrupts suffix").unwrap();
        file.flush().unwrap();

        match scan_markers(file.path(), &markers(&["/proc/interrupts", "libcap-ng.so.0"])) {
            ScanOutcome::Scanned(result) => {
                assert!(result[0].found);
                assert!(!result[1].found);
            }
            ScanOutcome::Skipped { reason, .. } => panic!("unexpected skip: {reason}"),
        }
    }

    #[test]
    fn test_scan_empty_file() {
        let file = NamedTempFile::new().unwrap();
        match scan_markers(file.path(), &MarkerSet::default()) {
            ScanOutcome::Scanned(result) => {
                assert_eq!(result.len(), DEFAULT_MARKERS.len());
                assert!(result.iter().all(|m| !m.found));
            }
            ScanOutcome::Skipped { reason, .. } => panic!("unexpected skip: {reason}"),
        }
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let outcome = scan_markers(Path::new("/nonexistent/irqbalance"), &MarkerSet::default());
        assert!(matches!(outcome, ScanOutcome::Skipped { .. }));
    }

    #[test]
    fn test_directory_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = scan_markers(dir.path(), &MarkerSet::default());
        assert!(matches!(outcome, ScanOutcome::Skipped { .. }));
    }
}
