//! SI/PSI table registry and section dispatch.
//!
//! The registry knows which PIDs carry tables. It starts with the PAT and SDT
//! PIDs; everything else is learned from PAT sections. Only sections that
//! start and end inside one packet are decoded.

pub mod descriptor;
pub mod pat;
pub mod pmt;
pub mod sdt;
pub mod section;

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::catalog::ServiceCatalog;
use crate::constants::*;
use crate::diagnostics::{Diagnostic, Diagnostics};
use section::{Located, SectionHeader, Truncated, locate};

pub use pat::{PatEntry, parse_pat};
pub use pmt::parse_pmt;
pub use sdt::{decode_dvb_text, parse_sdt};

/// What a registered PID is expected to carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    ProgramAssociation,
    ProgramMap,
    ServiceDescription,
    NetworkInformation,
    /// Reserved for splice_info_section PIDs; no decoder yet
    Scte35Splice,
    #[default]
    Unknown,
}

/// table_id values this crate tells apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableId {
    ProgramAssociation,
    ProgramMap,
    ServiceDescriptionActual,
    Scte35SpliceInfo,
    Other(u8),
}

impl From<u8> for TableId {
    fn from(id: u8) -> Self {
        match id {
            TID_PAT => TableId::ProgramAssociation,
            TID_PMT => TableId::ProgramMap,
            TID_SDT_ACTUAL => TableId::ServiceDescriptionActual,
            TID_SCTE35 => TableId::Scte35SpliceInfo,
            other => TableId::Other(other),
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableId::ProgramAssociation => f.write_str("program_association_section"),
            TableId::ProgramMap => f.write_str("program_map_section"),
            TableId::ServiceDescriptionActual => f.write_str("service_description_section (actual)"),
            TableId::Scte35SpliceInfo => f.write_str("splice_info_section"),
            TableId::Other(id) => write!(f, "table 0x{id:02X}"),
        }
    }
}

/// Bookkeeping for one table PID
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableEntry {
    pub kind: TableKind,
    /// Set for PMT (and NIT, as 0) entries learned from the PAT
    pub program_number: u16,
    pub latest_version: Option<u8>,
    /// Number of distinct consecutive versions decoded
    pub versions_seen: u64,
    pub sections_seen: u64,
    /// Sections received here whose table_id is not decoded
    pub ignored_sections: u64,
    /// last_section_number of the latest section was 0
    pub single_section: bool,
}

impl TableEntry {
    fn with_kind(kind: TableKind) -> Self {
        Self { kind, ..Self::default() }
    }

    fn note_section(&mut self, header: &SectionHeader) {
        if self.latest_version != Some(header.version) {
            self.versions_seen += 1;
            self.latest_version = Some(header.version);
        }
        self.sections_seen += 1;
        self.single_section = header.last_section_number == 0;
    }
}

/// Result of offering one packet to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionOutcome {
    /// PID carries no known table
    NotRegistered,
    /// No section starts in this packet
    NotStarted,
    /// Section longer than this packet; reported
    Unsupported,
    /// Header or body inconsistent; reported
    Malformed,
    /// Recognised but not decoded (e.g. SCTE-35, EIT)
    Ignored(TableId),
    Parsed(TableId),
}

/// PID → expected table
#[derive(Debug, Clone)]
pub struct TableRegistry {
    entries: HashMap<u16, TableEntry>,
}

impl TableRegistry {
    /// Registry seeded with PAT on 0x0000 and SDT on 0x0011
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(PAT_PID, TableEntry::with_kind(TableKind::ProgramAssociation));
        entries.insert(SDT_PID, TableEntry::with_kind(TableKind::ServiceDescription));
        Self { entries }
    }

    /// Overwrite kind and program number for `pid`, keeping its version counters
    pub fn record(&mut self, pid: u16, kind: TableKind, program_number: u16) {
        let entry = self.entries.entry(pid).or_default();
        entry.kind = kind;
        entry.program_number = program_number;
    }

    pub fn get(&self, pid: u16) -> Option<&TableEntry> {
        self.entries.get(&pid)
    }

    pub fn contains(&self, pid: u16) -> bool {
        self.entries.contains_key(&pid)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u16, &TableEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offer one packet's payload (bytes after the adaptation field).
    ///
    /// Sections are only looked for when payload_unit_start is set. Parsers may
    /// add registry entries (PAT) and update the catalog (PMT, SDT).
    pub fn check_for_si_psi(
        &mut self,
        pid: u16,
        payload_unit_start: bool,
        payload: &[u8],
        catalog: &mut ServiceCatalog,
        diagnostics: &mut Diagnostics,
    ) -> SectionOutcome {
        let Some(entry) = self.entries.get(&pid) else {
            log::trace!(".");
            return SectionOutcome::NotRegistered;
        };
        let (kind, program_number) = (entry.kind, entry.program_number);

        // TODO: reassemble sections continuing from earlier packets, keyed by PID
        if !payload_unit_start || payload.is_empty() {
            return SectionOutcome::NotStarted;
        }

        let section = match locate(payload) {
            Located::Section(section) => section,
            Located::SpansPackets { table_id, section_length, available } => {
                diagnostics.report(Diagnostic::UnsupportedSectionSpan {
                    pid,
                    table_id,
                    section_length,
                    available,
                });
                return SectionOutcome::Unsupported;
            }
            Located::Malformed { table_id, reason } => {
                diagnostics.report(Diagnostic::MalformedSection { pid, table_id, reason });
                return SectionOutcome::Malformed;
            }
        };

        let raw_table_id = section.header.table_id;
        let table_id = TableId::from(raw_table_id);
        let result: Result<(), Truncated> = match table_id {
            TableId::ProgramAssociation => parse_pat(&section, self, catalog).map(drop),
            TableId::ProgramMap if kind == TableKind::ProgramMap => {
                parse_pmt(&section, pid, program_number, catalog, diagnostics)
            }
            TableId::ServiceDescriptionActual => parse_sdt(&section, pid, catalog, diagnostics).map(drop),
            TableId::ProgramMap | TableId::Scte35SpliceInfo | TableId::Other(_) => {
                log::debug!("[0x{pid:04X}] {table_id} received, not decoded");
                if let Some(entry) = self.entries.get_mut(&pid) {
                    entry.ignored_sections += 1;
                }
                return SectionOutcome::Ignored(table_id);
            }
        };

        match result {
            Ok(()) => {
                if let Some(entry) = self.entries.get_mut(&pid) {
                    entry.note_section(&section.header);
                }
                SectionOutcome::Parsed(table_id)
            }
            Err(Truncated(reason)) => {
                diagnostics.report(Diagnostic::MalformedSection { pid, table_id: raw_table_id, reason });
                SectionOutcome::Malformed
            }
        }
    }
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new()
    }
}
