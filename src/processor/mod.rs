//! Main packet processing logic

use crate::catalog::ServiceCatalog;
use crate::constants::*;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{DemuxError, Result};
use crate::packet::TsPacket;
use crate::psi::{SectionOutcome, TableRegistry};
use crate::stats::StreamTracker;
use crate::types::DemuxConfig;

/// One demultiplexing session.
///
/// Owns all cross-packet state; feed it consecutive buffers of the same
/// stream so continuity counters, tables and services carry over.
pub struct Demuxer {
    config: DemuxConfig,
    tracker: StreamTracker,
    registry: TableRegistry,
    catalog: ServiceCatalog,
    diagnostics: Diagnostics,
    packets_processed: u64,
    sync_errors: u64,
}

impl Demuxer {
    pub fn new(config: DemuxConfig) -> Self {
        Self {
            tracker: StreamTracker::new(&config),
            registry: TableRegistry::new(),
            catalog: ServiceCatalog::new(),
            diagnostics: Diagnostics::with_capacity(config.diagnostics_capacity),
            packets_processed: 0,
            sync_errors: 0,
            config,
        }
    }

    /// Process every whole 188-byte record in `data`.
    ///
    /// Returns how many bytes were consumed; a trailing partial record is
    /// left for the caller to carry into the next call.
    pub fn parse_blob(&mut self, data: &[u8]) -> Result<usize> {
        let usable = (data.len() / TS_PACKET_SIZE) * TS_PACKET_SIZE;
        if usable == 0 {
            return Err(DemuxError::InputTooShort { len: data.len() });
        }

        for (i, chunk) in data[..usable].chunks_exact(TS_PACKET_SIZE).enumerate() {
            if self.config.verify_sync_byte && chunk[0] != TS_SYNC_BYTE {
                self.sync_errors += 1;
                self.diagnostics.report(Diagnostic::SyncByteMismatch {
                    offset: i * TS_PACKET_SIZE,
                    found: chunk[0],
                });
                continue;
            }
            self.process_packet(chunk)?;
        }

        Ok(usable)
    }

    /// Process a single TS packet
    pub fn process_packet(&mut self, chunk: &[u8]) -> Result<SectionOutcome> {
        let packet = TsPacket::parse(chunk)?;
        let header = packet.header;
        self.packets_processed += 1;

        self.tracker.on_packet(&packet);

        Ok(self.registry.check_for_si_psi(
            header.pid,
            header.payload_unit_start,
            packet.payload,
            &mut self.catalog,
            &mut self.diagnostics,
        ))
    }

    pub fn config(&self) -> &DemuxConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn stream_stats(&self) -> &StreamTracker {
        &self.tracker
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn drain_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain()
    }

    /// Session error count: continuity errors over all PIDs
    pub fn continuity_errors(&self) -> u64 {
        self.tracker.continuity_errors()
    }

    pub fn packets_processed(&self) -> u64 {
        self.packets_processed
    }

    /// Records skipped for a bad sync byte (sync verification only)
    pub fn sync_errors(&self) -> u64 {
        self.sync_errors
    }
}

impl Default for Demuxer {
    fn default() -> Self {
        Self::new(DemuxConfig::default())
    }
}
