//! Non-fatal conditions met while demultiplexing.
//!
//! Every diagnostic goes to the `log` facade at `warn` level and is also kept
//! in a bounded queue so callers can inspect what went wrong without scraping
//! log output.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

/// One reported, recoverable condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Section does not fit in the packet that starts it; reassembly is not supported.
    UnsupportedSectionSpan {
        pid: u16,
        table_id: u8,
        section_length: u16,
        available: usize,
    },
    /// Descriptor length does not match what its tag requires.
    MalformedDescriptor { pid: u16, tag: u8, length: u8 },
    /// Section header or body inconsistent with the bytes present.
    MalformedSection {
        pid: u16,
        table_id: u8,
        reason: &'static str,
    },
    /// Record did not start with 0x47 (only with sync verification on).
    SyncByteMismatch { offset: usize, found: u8 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnsupportedSectionSpan { pid, table_id, section_length, available } => write!(
                f,
                "[0x{pid:04X}] table 0x{table_id:02X} section length {section_length} > payload available {available} in 1 packet - not supported"
            ),
            Diagnostic::MalformedDescriptor { pid, tag, length } => {
                write!(f, "[0x{pid:04X}] descriptor tag 0x{tag:02X} has unexpected length {length}")
            }
            Diagnostic::MalformedSection { pid, table_id, reason } => {
                write!(f, "[0x{pid:04X}] table 0x{table_id:02X} malformed: {reason}")
            }
            Diagnostic::SyncByteMismatch { offset, found } => {
                write!(f, "sync byte 0x{found:02X} at offset {offset}, expected 0x47")
            }
        }
    }
}

/// Bounded FIFO of diagnostics plus a running total.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    entries: VecDeque<Diagnostic>,
    capacity: usize,
    total: u64,
}

impl Diagnostics {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
            total: 0,
        }
    }

    /// Log and keep a diagnostic, evicting the oldest when full.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
        self.total += 1;
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(diagnostic);
    }

    /// Diagnostics reported since creation, evicted ones included.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Take the retained diagnostics, leaving the total untouched.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        self.entries.drain(..).collect()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::with_capacity(crate::constants::DEFAULT_DIAGNOSTICS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(tag: u8) -> Diagnostic {
        Diagnostic::MalformedDescriptor { pid: 0x100, tag, length: 2 }
    }

    #[test]
    fn test_report_keeps_and_counts() {
        let mut d = Diagnostics::default();
        assert!(d.is_empty());
        d.report(descriptor(5));
        assert_eq!(d.len(), 1);
        assert_eq!(d.total(), 1);
        assert_eq!(d.iter().next(), Some(&descriptor(5)));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut d = Diagnostics::with_capacity(2);
        d.report(descriptor(1));
        d.report(descriptor(2));
        d.report(descriptor(3));
        assert_eq!(d.total(), 3);
        assert_eq!(d.drain(), vec![descriptor(2), descriptor(3)]);
        assert!(d.is_empty());
        assert_eq!(d.total(), 3);
    }

    #[test]
    fn test_zero_capacity_only_counts() {
        let mut d = Diagnostics::with_capacity(0);
        d.report(descriptor(1));
        assert!(d.is_empty());
        assert_eq!(d.total(), 1);
    }

    #[test]
    fn test_display() {
        let diag = Diagnostic::UnsupportedSectionSpan {
            pid: 0,
            table_id: 0,
            section_length: 400,
            available: 180,
        };
        assert_eq!(
            diag.to_string(),
            "[0x0000] table 0x00 section length 400 > payload available 180 in 1 packet - not supported"
        );
    }
}
