//! Per-PID continuity and bitrate tracking

use std::collections::HashMap;

use serde::Serialize;

use crate::constants::{PCR_CLOCK_HZ, PCR_WRAP_THRESHOLD, TS_PACKET_SIZE};
use crate::packet::TsPacket;
use crate::types::DemuxConfig;

/// Statistics kept for one PID, created on first sighting
#[derive(Debug, Clone, Default, Serialize)]
pub struct PidStats {
    pub packets: u64,
    pub cc_errors: u64,
    /// Last bitrate slice result, bits/second
    pub bitrate_bps: u64,
    #[serde(skip)]
    last_cc: Option<u8>,
    #[serde(skip)]
    duplicate_seen: bool,
    #[serde(skip)]
    slice_packets: u64,
    #[serde(skip)]
    slice_pcr: Option<u64>,
}

impl PidStats {
    pub fn last_continuity_counter(&self) -> Option<u8> {
        self.last_cc
    }

    fn track_continuity(&mut self, cc: u8, has_payload: bool, discontinuity: bool) {
        match self.last_cc {
            None => self.last_cc = Some(cc),
            // packets without payload don't advance the counter
            Some(last) if has_payload => {
                // a packet may be sent twice in a row with the same counter
                if cc == last && !self.duplicate_seen {
                    self.duplicate_seen = true;
                    return;
                }
                self.duplicate_seen = false;
                let expected = (last + 1) & 0x0F;
                if cc != expected && !discontinuity {
                    self.cc_errors += 1;
                }
                self.last_cc = Some(cc);
            }
            Some(_) => {}
        }
    }
}

/// Tracks every PID of one session.
///
/// The first PID seen carrying a PCR becomes the reference clock; each later
/// PCR on that PID closes a bitrate slice for all PIDs. Bitrates assume a
/// constant rate between PCR samples.
#[derive(Debug, Clone)]
pub struct StreamTracker {
    pids: HashMap<u16, PidStats>,
    reference_pid: Option<u16>,
    estimate_bitrate: bool,
    correct_wraparound: bool,
}

impl StreamTracker {
    pub fn new(config: &DemuxConfig) -> Self {
        Self {
            pids: HashMap::new(),
            reference_pid: None,
            estimate_bitrate: config.estimate_bitrate,
            correct_wraparound: config.correct_pcr_wraparound,
        }
    }

    /// Account one packet against its PID
    pub fn on_packet(&mut self, packet: &TsPacket<'_>) {
        let header = &packet.header;
        let stats = self.pids.entry(header.pid).or_default();
        stats.packets += 1;
        stats.track_continuity(header.continuity_counter, header.has_payload(), packet.discontinuity());

        if self.estimate_bitrate {
            if let Some(pcr) = packet.pcr() {
                self.on_pcr(header.pid, pcr);
            }
        }
    }

    fn on_pcr(&mut self, pid: u16, pcr: u64) {
        match self.reference_pid {
            None => {
                log::info!("PID 0x{pid:04X} selected as bitrate reference clock");
                self.reference_pid = Some(pid);
                self.slice(pcr);
            }
            Some(reference) if reference == pid => self.slice(pcr),
            Some(_) => {}
        }
    }

    fn slice(&mut self, pcr: u64) {
        let wrap = self.correct_wraparound;
        for stats in self.pids.values_mut() {
            if let Some(prev) = stats.slice_pcr {
                let packet_delta = stats.packets - stats.slice_packets;
                stats.bitrate_bps = slice_bitrate(packet_delta, pcr_delta(prev, pcr, wrap));
            }
            stats.slice_packets = stats.packets;
            stats.slice_pcr = Some(pcr);
        }
    }

    pub fn get(&self, pid: u16) -> Option<&PidStats> {
        self.pids.get(&pid)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u16, &PidStats)> {
        self.pids.iter()
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    pub fn reference_pid(&self) -> Option<u16> {
        self.reference_pid
    }

    /// Continuity errors summed over all PIDs
    pub fn continuity_errors(&self) -> u64 {
        self.pids.values().map(|s| s.cc_errors).sum()
    }
}

/// Ticks elapsed between two PCR samples. Without correction a wrap yields a
/// huge delta (and a near-zero slice).
fn pcr_delta(prev: u64, now: u64, correct_wraparound: bool) -> u64 {
    if correct_wraparound {
        let (prev, now) = (prev % PCR_WRAP_THRESHOLD, now % PCR_WRAP_THRESHOLD);
        (now + PCR_WRAP_THRESHOLD - prev) % PCR_WRAP_THRESHOLD
    } else {
        now.wrapping_sub(prev)
    }
}

/// `188 * 8 * packets * 27 MHz / (pcr_delta + 1)`; the +1 guards colliding samples
fn slice_bitrate(packet_delta: u64, pcr_delta: u64) -> u64 {
    let bits = (TS_PACKET_SIZE as u128) * 8 * packet_delta as u128 * PCR_CLOCK_HZ as u128;
    u64::try_from(bits / (pcr_delta as u128 + 1)).unwrap_or(u64::MAX)
}
