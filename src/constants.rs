//! Constants for MPEG-TS demultiplexing and SI/PSI table parsing

/// MPEG-TS packet constants
pub const TS_PACKET_SIZE: usize = 188;
pub const TS_SYNC_BYTE: u8 = 0x47;
pub const TS_HEADER_SIZE: usize = 4;
/// Bytes left after the 4-byte header
pub const TS_BODY_SIZE: usize = TS_PACKET_SIZE - TS_HEADER_SIZE;

/// PCR constants
pub const PCR_CLOCK_HZ: u64 = 27_000_000; // 27 MHz
pub const PCR_WRAP_THRESHOLD: u64 = (1u64 << 33) * 300; // PCR wrap-around point

/// Well-known PIDs seeded into the table registry
pub const PAT_PID: u16 = 0x0000;
pub const SDT_PID: u16 = 0x0011;
pub const NULL_PID: u16 = 0x1FFF;

/// table_id assignments (ISO 13818-1 table 2-31, EN 300 468, SCTE 35)
pub const TID_PAT: u8 = 0x00;
pub const TID_PMT: u8 = 0x02;
pub const TID_SDT_ACTUAL: u8 = 0x42;
pub const TID_SCTE35: u8 = 0xFC;

/// Fixed bytes of the long section header after section_length:
/// ts_id/program_number (2), version/current_next (1), section_number (1), last_section_number (1)
pub const SECTION_SYNTAX_HEADER: usize = 5;
/// table_id (1) + section_length (2)
pub const SECTION_PREFIX: usize = 3;
/// Trailing CRC-32 bytes counted by section_length
pub const SECTION_CRC_SIZE: usize = 4;

/// Descriptor tags
pub const DESC_REGISTRATION: u8 = 0x05;
pub const DESC_MAX_BITRATE: u8 = 0x0E;
pub const DESC_SERVICE: u8 = 0x48;
pub const DESC_CUE_IDENTIFIER: u8 = 0x8A;

/// format_identifier carried by SCTE-35 registration descriptors ("CUEI")
pub const CUEI_IDENTIFIER: u32 = 0x4355_4549;
/// maximum_bitrate descriptor unit: 50 bytes/s
pub const MAX_BITRATE_UNIT_BPS: u32 = 50 * 8;

/// Service name placeholder until an SDT names the service
pub const SERVICE_NAME_UNSEEN: &str = "not yet seen";

/// Default bound of the in-memory diagnostics queue
pub const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 1024;
