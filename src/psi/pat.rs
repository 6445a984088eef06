// psi/pat.rs
//! Program Association: tells where each program's PMT lives.

use crate::catalog::ServiceCatalog;
use crate::constants::SECTION_CRC_SIZE;
use crate::psi::section::{Section, Truncated, be_u16};
use crate::psi::{TableKind, TableRegistry};

/// One program_number → PID pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatEntry {
    pub program_number: u16,
    pub pid: u16,
}

/// Register every PID named by the section and seed catalog entries.
///
/// program_number 0 points at the NIT; every other pair points at a PMT.
/// Returns the pairs in section order.
pub fn parse_pat(
    section: &Section<'_>,
    registry: &mut TableRegistry,
    catalog: &mut ServiceCatalog,
) -> Result<Vec<PatEntry>, Truncated> {
    let b = section.body;
    let mut remaining = section.remaining();
    let mut idx = 0;
    let mut entries = Vec::new();

    while remaining > SECTION_CRC_SIZE {
        let program_number = be_u16(b, idx)?;
        let pid = be_u16(b, idx + 2)? & 0x1FFF;
        idx += 4;
        remaining -= 4;

        if program_number == 0 {
            registry.record(pid, TableKind::NetworkInformation, program_number);
        } else {
            log::info!("From PAT :: PMT prog #{program_number} is 0x{pid:04X}");
            registry.record(pid, TableKind::ProgramMap, program_number);
            catalog.ensure(program_number).program_number = program_number;
        }
        entries.push(PatEntry { program_number, pid });
    }

    Ok(entries)
}
