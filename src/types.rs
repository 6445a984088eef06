use std::net::SocketAddr;
use std::path::PathBuf;

use crate::constants::DEFAULT_DIAGNOSTICS_CAPACITY;

/// Tunables for one [`crate::processor::Demuxer`] session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemuxConfig {
    /// Run PCR-driven bitrate slicing for every tracked PID
    pub estimate_bitrate: bool,
    /// Skip (and report) records whose first byte is not 0x47
    pub verify_sync_byte: bool,
    /// Compute PCR deltas modulo the 2^33 * 300 wrap point
    pub correct_pcr_wraparound: bool,
    /// How many diagnostics are kept before the oldest are dropped
    pub diagnostics_capacity: usize,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            estimate_bitrate: true,
            verify_sync_byte: false,
            correct_pcr_wraparound: false,
            diagnostics_capacity: DEFAULT_DIAGNOSTICS_CAPACITY,
        }
    }
}

/// Where TS bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Unicast or multicast IPv4 UDP
    Udp(SocketAddr),
    /// Recorded .ts file, read to the end
    File(PathBuf),
}

/// Configuration options for the inspector
#[derive(Debug, Clone)]
pub struct Options {
    pub source: Source,
    pub refresh_secs: u64,
    pub config: DemuxConfig,
}
