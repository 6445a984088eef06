// psi/pmt.rs
//! Program Map: PCR PID, program descriptors and the component loop.

use crate::catalog::{ProgramMap, ServiceCatalog, StreamComponent};
use crate::constants::{CUEI_IDENTIFIER, SECTION_CRC_SIZE};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::psi::descriptor::{Descriptors, KnownDescriptor};
use crate::psi::section::{Section, Truncated, be_u16, byte};

/// Decode a PMT section and replace the catalog entry for `program_number`.
///
/// Descriptors with a bad length for their tag are reported and skipped.
/// Nothing is written to the catalog when the section turns out truncated.
pub fn parse_pmt(
    section: &Section<'_>,
    pid: u16,
    program_number: u16,
    catalog: &mut ServiceCatalog,
    diagnostics: &mut Diagnostics,
) -> Result<(), Truncated> {
    let b = section.body;

    /* fixed header inside the body */
    let pcr_pid = be_u16(b, 0)? & 0x1FFF;
    let prog_info_len = (be_u16(b, 2)? & 0x0FFF) as usize;
    let mut remaining = section
        .remaining()
        .checked_sub(4 + prog_info_len)
        .ok_or(Truncated("program_info_length runs past section"))?;

    let mut pmt = ProgramMap { pcr_pid, ..Default::default() };

    /* program level descriptors */
    for desc in Descriptors::new(&b[4..4 + prog_info_len]) {
        match desc?.decode() {
            KnownDescriptor::Registration { format_identifier } => {
                if format_identifier == CUEI_IDENTIFIER {
                    log::info!("program {program_number}: SCTE-35 registration descriptor seen");
                    pmt.has_scte35 = true;
                }
            }
            KnownDescriptor::MaximumBitrate { bits_per_second } => {
                log::debug!("program {program_number}: max bitrate {bits_per_second} bps");
                pmt.max_bitrate = bits_per_second;
            }
            KnownDescriptor::Malformed { tag, length } => {
                diagnostics.report(Diagnostic::MalformedDescriptor { pid, tag, length });
            }
            _ => {}
        }
    }

    /* elementary stream loop; stops before the CRC */
    let mut idx = 4 + prog_info_len;
    while remaining > SECTION_CRC_SIZE {
        let stream_type = byte(b, idx)?;
        let es_pid = be_u16(b, idx + 1)? & 0x1FFF;
        let es_info_len = (be_u16(b, idx + 3)? & 0x0FFF) as usize;
        let es_info = b
            .get(idx + 5..idx + 5 + es_info_len)
            .ok_or(Truncated("ES_info_length runs past section"))?;

        let mut cue_descriptor = false;
        for desc in Descriptors::new(es_info) {
            if let KnownDescriptor::CueIdentifier = desc?.decode() {
                cue_descriptor = true;
            }
        }

        pmt.components.push(StreamComponent { stream_type, pid: es_pid, cue_descriptor });
        idx += 5 + es_info_len;
        remaining = remaining.saturating_sub(5 + es_info_len);
    }

    log::debug!(
        "PMT prog #{program_number} on 0x{pid:04X}: PCR 0x{pcr_pid:04X}, {} components",
        pmt.components.len()
    );
    catalog.apply_program_map(program_number, pmt);
    Ok(())
}
