//! Bit-field decoder for the 4-byte TS header and the adaptation field.
//!
//! Everything here is a pure view transform over a borrowed 188-byte record:
//! no state, no I/O. The sync byte is decoded but not checked; that is left
//! to the caller (see [`crate::types::DemuxConfig::verify_sync_byte`]).

use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::constants::*;
use crate::error::{DemuxError, Result};

/// Decoded 4-byte transport packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TsHeader {
    pub sync_byte: u8,
    pub transport_error: bool,
    /// A new PES packet or table section starts in this packet.
    pub payload_unit_start: bool,
    pub transport_priority: bool,
    /// 13-bit packet identifier.
    pub pid: u16,
    pub scrambling_control: u8,
    /// bit 1 = adaptation field present, bit 0 = payload present.
    pub adaptation_field_control: u8,
    pub continuity_counter: u8,
}

impl TsHeader {
    /// Decode the header of one record. Fails only when the record is short.
    pub fn parse(packet: &[u8]) -> Result<Self> {
        if packet.len() < TS_PACKET_SIZE {
            return Err(DemuxError::PacketTooShort(packet.len()));
        }
        let mut br = BitReader::endian(&packet[..TS_HEADER_SIZE], BigEndian);
        read_header(&mut br).map_err(|_| DemuxError::PacketTooShort(packet.len()))
    }

    pub fn has_adaptation_field(&self) -> bool {
        self.adaptation_field_control & 0b10 != 0
    }

    pub fn has_payload(&self) -> bool {
        self.adaptation_field_control & 0b01 != 0
    }
}

fn read_header<R: std::io::Read>(br: &mut BitReader<R, BigEndian>) -> std::io::Result<TsHeader> {
    Ok(TsHeader {
        sync_byte: br.read::<8, u8>()?,
        transport_error: br.read_bit()?,
        payload_unit_start: br.read_bit()?,
        transport_priority: br.read_bit()?,
        pid: br.read::<13, u16>()?,
        scrambling_control: br.read::<2, u8>()?,
        adaptation_field_control: br.read::<2, u8>()?,
        continuity_counter: br.read::<4, u8>()?,
    })
}

/// Adaptation field flags plus the clock references it may carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdaptationField {
    /// adaptation_field_length, excluding the length byte itself.
    pub length: u8,
    pub discontinuity: bool,
    pub random_access: bool,
    pub es_priority: bool,
    pub pcr_flag: bool,
    pub opcr_flag: bool,
    pub splicing_point_flag: bool,
    /// PCR in 27 MHz ticks.
    pub pcr: Option<u64>,
    /// OPCR in 27 MHz ticks.
    pub opcr: Option<u64>,
    pub splice_countdown: Option<i8>,
}

impl AdaptationField {
    /// Decode an adaptation field. `data` starts at the length byte.
    ///
    /// Fields flagged as present but not fitting inside the declared length
    /// are left as `None`; this never fails.
    pub fn parse(data: &[u8]) -> Self {
        let Some(&length) = data.first() else {
            return Self::default();
        };
        if length == 0 || data.len() < 2 {
            return Self { length, ..Self::default() };
        }

        let flags = data[1];
        let mut af = Self {
            length,
            discontinuity: flags & 0x80 != 0,
            random_access: flags & 0x40 != 0,
            es_priority: flags & 0x20 != 0,
            pcr_flag: flags & 0x10 != 0,
            opcr_flag: flags & 0x08 != 0,
            splicing_point_flag: flags & 0x04 != 0,
            ..Self::default()
        };

        // the field can't extend past its own length byte
        let end = (1 + length as usize).min(data.len());
        let field = &data[..end];
        let mut offset = 2;

        if af.pcr_flag {
            af.pcr = field.get(offset..offset + 6).and_then(extract_pcr);
            offset += 6;
        }
        if af.opcr_flag {
            af.opcr = field.get(offset..offset + 6).and_then(extract_pcr);
            offset += 6;
        }
        if af.splicing_point_flag {
            af.splice_countdown = field.get(offset).map(|&b| b as i8);
        }
        af
    }

    /// Bytes consumed in the packet, length byte included.
    pub fn total_size(&self) -> usize {
        1 + self.length as usize
    }
}

/// Rebuild a 42-bit PCR from its 6-byte encoding as a 27 MHz tick count.
///
/// Layout: 33-bit base (90 kHz), 6 reserved bits, 9-bit extension.
/// Result is `base * 300 + extension`.
pub fn extract_pcr(bytes: &[u8]) -> Option<u64> {
    let mut br = BitReader::endian(bytes.get(..6)?, BigEndian);
    let base = br.read::<33, u64>().ok()?;
    br.skip(6).ok()?;
    let ext = br.read::<9, u16>().ok()?;
    Some(base * 300 + ext as u64)
}

/// Borrowed view of one decoded 188-byte record.
#[derive(Debug, Clone)]
pub struct TsPacket<'a> {
    pub header: TsHeader,
    pub adaptation: Option<AdaptationField>,
    /// Bytes following the adaptation field; empty when no payload is flagged.
    pub payload: &'a [u8],
}

impl<'a> TsPacket<'a> {
    pub fn parse(packet: &'a [u8]) -> Result<Self> {
        let header = TsHeader::parse(packet)?;
        let packet = &packet[..TS_PACKET_SIZE];

        let mut payload_offset = TS_HEADER_SIZE;
        let adaptation = if header.has_adaptation_field() {
            let af = AdaptationField::parse(&packet[TS_HEADER_SIZE..]);
            payload_offset += af.total_size();
            Some(af)
        } else {
            None
        };

        let payload = if header.has_payload() && payload_offset < TS_PACKET_SIZE {
            &packet[payload_offset..]
        } else {
            &[]
        };

        Ok(Self { header, adaptation, payload })
    }

    pub fn pcr(&self) -> Option<u64> {
        self.adaptation.as_ref().and_then(|af| af.pcr)
    }

    pub fn discontinuity(&self) -> bool {
        self.adaptation.as_ref().is_some_and(|af| af.discontinuity)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Encode a PCR the way a multiplexer writes it.
    pub(crate) fn encode_pcr(base: u64, ext: u16) -> [u8; 6] {
        [
            (base >> 25) as u8,
            (base >> 17) as u8,
            (base >> 9) as u8,
            (base >> 1) as u8,
            (((base & 0x01) << 7) as u8) | 0x7E | ((ext >> 8) & 0x01) as u8,
            (ext & 0xFF) as u8,
        ]
    }

    fn packet_with_header(b1: u8, b2: u8, b3: u8) -> [u8; TS_PACKET_SIZE] {
        let mut p = [0xFFu8; TS_PACKET_SIZE];
        p[0] = TS_SYNC_BYTE;
        p[1] = b1;
        p[2] = b2;
        p[3] = b3;
        p
    }

    #[test]
    fn test_header_fields() {
        // TEI + PUSI + priority, PID 0x1ABC, scrambling 2, AFC 1, CC 5
        let p = packet_with_header(0xE0 | 0x1A, 0xBC, 0x80 | 0x10 | 0x05);
        let h = TsHeader::parse(&p).unwrap();
        assert_eq!(h.sync_byte, 0x47);
        assert!(h.transport_error);
        assert!(h.payload_unit_start);
        assert!(h.transport_priority);
        assert_eq!(h.pid, 0x1ABC);
        assert_eq!(h.scrambling_control, 2);
        assert_eq!(h.adaptation_field_control, 1);
        assert!(h.has_payload());
        assert!(!h.has_adaptation_field());
        assert_eq!(h.continuity_counter, 5);
    }

    #[test]
    fn test_header_rejects_short_record() {
        assert_eq!(TsHeader::parse(&[0x47, 0, 0, 0x10]), Err(DemuxError::PacketTooShort(4)));
    }

    #[test]
    fn test_sync_byte_is_not_checked() {
        let mut p = packet_with_header(0x00, 0x20, 0x10);
        p[0] = 0x00;
        let h = TsHeader::parse(&p).unwrap();
        assert_eq!(h.sync_byte, 0x00);
        assert_eq!(h.pid, 0x20);
    }

    #[test]
    fn test_extract_pcr_examples() {
        assert_eq!(extract_pcr(&encode_pcr(0, 0)), Some(0));
        assert_eq!(extract_pcr(&encode_pcr(1, 0)), Some(300));
        assert_eq!(extract_pcr(&encode_pcr(0x1_FFFF_FFFF, 299)), Some(0x1_FFFF_FFFF * 300 + 299));
        assert_eq!(extract_pcr(&[0u8; 5]), None);
    }

    #[test]
    fn test_adaptation_field_with_pcr() {
        let mut p = packet_with_header(0x01, 0x00, 0x30 | 0x07);
        p[4] = 7;
        p[5] = 0x80 | 0x40 | 0x10; // discontinuity, random access, PCR
        p[6..12].copy_from_slice(&encode_pcr(90_000, 12));

        let pkt = TsPacket::parse(&p).unwrap();
        let af = pkt.adaptation.clone().unwrap();
        assert!(af.discontinuity);
        assert!(af.random_access);
        assert!(af.pcr_flag);
        assert!(!af.opcr_flag);
        assert_eq!(af.pcr, Some(90_000 * 300 + 12));
        assert_eq!(pkt.pcr(), Some(27_000_012));
        assert!(pkt.discontinuity());
        assert_eq!(pkt.payload.len(), TS_BODY_SIZE - 8);
    }

    #[test]
    fn test_adaptation_field_opcr_and_splice_countdown() {
        let mut p = packet_with_header(0x01, 0x00, 0x20);
        p[4] = 14;
        p[5] = 0x10 | 0x08 | 0x04;
        p[6..12].copy_from_slice(&encode_pcr(1, 1));
        p[12..18].copy_from_slice(&encode_pcr(2, 0));
        p[18] = 0xFE;

        let pkt = TsPacket::parse(&p).unwrap();
        let af = pkt.adaptation.unwrap();
        assert_eq!(af.pcr, Some(301));
        assert_eq!(af.opcr, Some(600));
        assert_eq!(af.splice_countdown, Some(-2));
        assert!(pkt.payload.is_empty());
    }

    #[test]
    fn test_pcr_flag_without_room_yields_none() {
        let mut p = packet_with_header(0x01, 0x00, 0x30);
        p[4] = 3;
        p[5] = 0x10;
        let af = TsPacket::parse(&p).unwrap().adaptation.unwrap();
        assert!(af.pcr_flag);
        assert_eq!(af.pcr, None);
    }

    #[test]
    fn test_zero_length_adaptation_field() {
        let mut p = packet_with_header(0x01, 0x00, 0x30);
        p[4] = 0;
        let pkt = TsPacket::parse(&p).unwrap();
        assert_eq!(pkt.adaptation.as_ref().map(|af| af.length), Some(0));
        assert_eq!(pkt.payload.len(), TS_BODY_SIZE - 1);
        assert!(!pkt.discontinuity());
    }

    #[test]
    fn test_payload_only_offset() {
        let p = packet_with_header(0x40, 0x00, 0x10);
        let pkt = TsPacket::parse(&p).unwrap();
        assert!(pkt.adaptation.is_none());
        assert_eq!(pkt.payload.len(), TS_BODY_SIZE);
        assert_eq!(pkt.pcr(), None);
    }

    #[test]
    fn test_oversized_adaptation_length_leaves_no_payload() {
        let mut p = packet_with_header(0x01, 0x00, 0x30);
        p[4] = 200;
        p[5] = 0x00;
        let pkt = TsPacket::parse(&p).unwrap();
        assert!(pkt.payload.is_empty());
    }
}
