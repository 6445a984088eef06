// psi/section.rs
//! Locates the section that starts in a packet payload and decodes its
//! long-form header. No CRC check: table data is trusted once its length is
//! consistent with the packet.

use crate::constants::{SECTION_PREFIX, SECTION_SYNTAX_HEADER};

/// Fixed fields preceding every table body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    pub table_id: u8,
    /// 12-bit section_length: bytes after this field, CRC included
    pub section_length: u16,
    /// transport_stream_id (PAT), program_number (PMT), service owner (SDT)
    pub table_id_extension: u16,
    pub version: u8,
    pub current_next: bool,
    pub section_number: u8,
    pub last_section_number: u8,
}

/// A section wholly contained in one packet.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    pub header: SectionHeader,
    /// Bytes after last_section_number up to the end of the section (CRC included)
    pub body: &'a [u8],
}

impl Section<'_> {
    /// Declared bytes left after the syntax header: `section_length - 5`
    pub fn remaining(&self) -> usize {
        self.body.len()
    }
}

/// What [`locate`] found at the start of a payload.
#[derive(Debug, Clone)]
pub enum Located<'a> {
    Section(Section<'a>),
    /// Declared length runs past this packet; multi-packet sections are not reassembled
    SpansPackets {
        table_id: u8,
        section_length: u16,
        available: usize,
    },
    Malformed {
        table_id: u8,
        reason: &'static str,
    },
}

/// Follow the pointer field and decode the section header.
///
/// `payload` starts right after the adaptation field of a packet whose
/// payload_unit_start flag is set.
pub fn locate(payload: &[u8]) -> Located<'_> {
    let Some(&pointer) = payload.first() else {
        return Located::Malformed { table_id: 0xFF, reason: "empty payload" };
    };
    let start = 1 + pointer as usize;
    let Some(prefix) = payload.get(start..start + SECTION_PREFIX) else {
        return Located::Malformed { table_id: 0xFF, reason: "pointer field runs past payload" };
    };

    let table_id = prefix[0];
    let section_length = u16::from_be_bytes([prefix[1], prefix[2]]) & 0x0FFF;
    let available = payload.len() - start - SECTION_PREFIX;

    if section_length as usize > available {
        return Located::SpansPackets { table_id, section_length, available };
    }
    if (section_length as usize) < SECTION_SYNTAX_HEADER {
        return Located::Malformed { table_id, reason: "section_length shorter than syntax header" };
    }

    let h = &payload[start + SECTION_PREFIX..];
    let header = SectionHeader {
        table_id,
        section_length,
        table_id_extension: u16::from_be_bytes([h[0], h[1]]),
        version: (h[2] >> 1) & 0x1F,
        current_next: h[2] & 0x01 != 0,
        section_number: h[3],
        last_section_number: h[4],
    };
    let body = &h[SECTION_SYNTAX_HEADER..section_length as usize];

    Located::Section(Section { header, body })
}

/// Body ended before a field the section claims to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncated(pub &'static str);

/// Big-endian u16 at `at`, bounds-checked
pub(crate) fn be_u16(buf: &[u8], at: usize) -> Result<u16, Truncated> {
    match buf.get(at..at + 2) {
        Some(b) => Ok(u16::from_be_bytes([b[0], b[1]])),
        None => Err(Truncated("field runs past section end")),
    }
}

pub(crate) fn byte(buf: &[u8], at: usize) -> Result<u8, Truncated> {
    buf.get(at).copied().ok_or(Truncated("field runs past section end"))
}
