// src/lib.rs
//! MPEG-2 transport stream demultiplexer with SI/PSI table tracking.
//!
//! [`Demuxer`] is the library entry point; [`inspector::run`] wraps it in a
//! file or UDP ingestion loop that prints JSON snapshots.

pub mod catalog;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod packet;
pub mod processor;
pub mod psi;
pub mod report;
pub mod stats;
pub mod types;

mod ingest;
mod network;

pub use catalog::{ServiceCatalog, ServiceInfo, StreamComponent};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{DemuxError, Result};
pub use packet::{AdaptationField, TsHeader, TsPacket, extract_pcr};
pub use processor::Demuxer;
pub use psi::{SectionOutcome, TableId, TableKind, TableRegistry};
pub use report::{InspectorReport, Reporter};
pub use stats::{PidStats, StreamTracker};
pub use types::DemuxConfig;

pub mod inspector {
    pub use crate::types::{DemuxConfig, Options, Source};

    /// Async entry-point; returns at end of file, on Ctrl-C or on a socket error
    pub async fn run(opts: Options) -> anyhow::Result<()> {
        crate::ingest::run(opts).await
    }
}
