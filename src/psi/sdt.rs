// psi/sdt.rs
//! Service Description (actual TS): names each service and writes the name
//! into the catalog under its service_id (== program_number).

use crate::catalog::{ServiceCatalog, ServiceDescription};
use crate::constants::SECTION_CRC_SIZE;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::psi::descriptor::{Descriptors, KnownDescriptor};
use crate::psi::section::{Section, Truncated, be_u16};

/// Walk the service loop and apply every service descriptor found.
/// Returns the ids of the services that were named.
pub fn parse_sdt(
    section: &Section<'_>,
    pid: u16,
    catalog: &mut ServiceCatalog,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<u16>, Truncated> {
    let b = section.body;
    // original_network_id :16, reserved_future_use :8
    let mut remaining = section
        .remaining()
        .checked_sub(3)
        .ok_or(Truncated("SDT body too short"))?;
    let mut idx = 3;
    let mut named = Vec::new();

    while remaining > SECTION_CRC_SIZE {
        let service_id = be_u16(b, idx)?;
        // idx + 2 holds EIT_schedule / EIT_present_following flags
        let desc_len = (be_u16(b, idx + 3)? & 0x0FFF) as usize;
        let loop_bytes = b
            .get(idx + 5..idx + 5 + desc_len)
            .ok_or(Truncated("descriptors_loop_length runs past section"))?;

        for desc in Descriptors::new(loop_bytes) {
            match desc?.decode() {
                KnownDescriptor::Service { service_type, provider_name, service_name } => {
                    let service_name = decode_dvb_text(service_name);
                    log::info!("SDT : [{service_id}] :: {service_name}");
                    catalog.apply_service_description(
                        service_id,
                        ServiceDescription {
                            service_type,
                            provider_name: decode_dvb_text(provider_name),
                            service_name,
                        },
                    );
                    named.push(service_id);
                }
                KnownDescriptor::Malformed { tag, length } => {
                    diagnostics.report(Diagnostic::MalformedDescriptor { pid, tag, length });
                }
                _ => {}
            }
        }

        idx += 5 + desc_len;
        remaining = remaining.saturating_sub(5 + desc_len);
    }

    Ok(named)
}

/// DVB strings may open with a character table selector (< 0x20). The
/// selector is dropped; the rest is read as UTF-8, else Latin-1.
pub fn decode_dvb_text(raw: &[u8]) -> String {
    let text = match raw.first() {
        Some(0x10) => raw.get(3..).unwrap_or_default(),
        Some(0x1F) => raw.get(2..).unwrap_or_default(),
        Some(&b) if b < 0x20 => &raw[1..],
        _ => raw,
    };
    match std::str::from_utf8(text) {
        Ok(s) => s.to_string(),
        Err(_) => text.iter().map(|&c| c as char).collect(),
    }
}
