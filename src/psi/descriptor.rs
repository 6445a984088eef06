// psi/descriptor.rs
//! Descriptor loops shared by PMT and SDT parsing.

use crate::constants::*;
use crate::psi::section::Truncated;

/// Raw tag/length/payload triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor<'a> {
    pub tag: u8,
    pub data: &'a [u8],
}

/// Descriptors this crate understands. Anything else is skipped by length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownDescriptor<'a> {
    /// tag 0x05, exactly 4 bytes
    Registration { format_identifier: u32 },
    /// tag 0x0E, exactly 3 bytes; already scaled to bits/second
    MaximumBitrate { bits_per_second: u32 },
    /// tag 0x8A, SCTE-35 cue stream
    CueIdentifier,
    /// tag 0x48
    Service {
        service_type: u8,
        provider_name: &'a [u8],
        service_name: &'a [u8],
    },
    /// Known tag whose length does not match its layout
    Malformed { tag: u8, length: u8 },
    Unhandled { tag: u8 },
}

impl<'a> Descriptor<'a> {
    pub fn decode(&self) -> KnownDescriptor<'a> {
        let d = self.data;
        let malformed = KnownDescriptor::Malformed { tag: self.tag, length: d.len() as u8 };
        match self.tag {
            DESC_REGISTRATION => match d {
                [a, b, c, e] => KnownDescriptor::Registration {
                    format_identifier: u32::from_be_bytes([*a, *b, *c, *e]),
                },
                _ => malformed,
            },
            DESC_MAX_BITRATE => match d {
                [a, b, c] => {
                    let raw = u32::from_be_bytes([0, *a, *b, *c]) & 0x3F_FFFF;
                    KnownDescriptor::MaximumBitrate { bits_per_second: raw * MAX_BITRATE_UNIT_BPS }
                }
                _ => malformed,
            },
            DESC_CUE_IDENTIFIER => KnownDescriptor::CueIdentifier,
            DESC_SERVICE => decode_service(d).unwrap_or(malformed),
            tag => KnownDescriptor::Unhandled { tag },
        }
    }
}

fn decode_service(d: &[u8]) -> Option<KnownDescriptor<'_>> {
    let service_type = *d.first()?;
    let provider_len = *d.get(1)? as usize;
    let provider_name = d.get(2..2 + provider_len)?;
    let name_at = 2 + provider_len;
    let name_len = *d.get(name_at)? as usize;
    let service_name = d.get(name_at + 1..name_at + 1 + name_len)?;
    Some(KnownDescriptor::Service { service_type, provider_name, service_name })
}

/// Walks a descriptor loop; yields `Err` once if a declared length overruns the loop.
#[derive(Debug, Clone)]
pub struct Descriptors<'a> {
    buf: &'a [u8],
}

impl<'a> Descriptors<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }
}

impl<'a> Iterator for Descriptors<'a> {
    type Item = Result<Descriptor<'a>, Truncated>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }
        let buf = std::mem::take(&mut self.buf);
        let (tag, len) = match buf {
            [tag, len, ..] => (*tag, *len as usize),
            _ => return Some(Err(Truncated("descriptor header runs past loop"))),
        };
        match buf.get(2..2 + len) {
            Some(data) => {
                self.buf = &buf[2 + len..];
                Some(Ok(Descriptor { tag, data }))
            }
            None => Some(Err(Truncated("descriptor length runs past loop"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(tag: u8, data: &[u8]) -> KnownDescriptor<'_> {
        Descriptor { tag, data }.decode()
    }

    #[test]
    fn test_registration() {
        assert_eq!(
            decode(0x05, b"CUEI"),
            KnownDescriptor::Registration { format_identifier: CUEI_IDENTIFIER }
        );
        assert_eq!(decode(0x05, b"CUE"), KnownDescriptor::Malformed { tag: 0x05, length: 3 });
    }

    #[test]
    fn test_max_bitrate() {
        assert_eq!(
            decode(0x0E, &[0xC0, 0x00, 0x10]),
            KnownDescriptor::MaximumBitrate { bits_per_second: 16 * 400 }
        );
        assert_eq!(
            decode(0x0E, &[0xFF, 0xFF, 0xFF]),
            KnownDescriptor::MaximumBitrate { bits_per_second: 0x3F_FFFF * 400 }
        );
        assert_eq!(decode(0x0E, &[0, 0, 0, 0]), KnownDescriptor::Malformed { tag: 0x0E, length: 4 });
    }

    #[test]
    fn test_service() {
        let data = [0x01, 3, b'B', b'B', b'C', 4, b'O', b'n', b'e', b'!'];
        assert_eq!(
            decode(0x48, &data),
            KnownDescriptor::Service { service_type: 1, provider_name: b"BBC", service_name: b"One!" }
        );
        assert_eq!(decode(0x48, &data[..8]), KnownDescriptor::Malformed { tag: 0x48, length: 8 });
    }

    #[test]
    fn test_unhandled_and_cue() {
        assert_eq!(decode(0x8A, &[0x01]), KnownDescriptor::CueIdentifier);
        assert_eq!(decode(0x52, &[0x01]), KnownDescriptor::Unhandled { tag: 0x52 });
    }

    #[test]
    fn test_loop_walk() {
        let buf = [0x52, 1, 0x07, 0x8A, 0, 0x05, 4, b'C', b'U', b'E', b'I'];
        let tags: Vec<u8> = Descriptors::new(&buf).map(|d| d.unwrap().tag).collect();
        assert_eq!(tags, vec![0x52, 0x8A, 0x05]);
    }

    #[test]
    fn test_loop_overrun_stops() {
        let buf = [0x52, 1, 0x07, 0x05, 9, 0x00];
        let items: Vec<_> = Descriptors::new(&buf).collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
        assert_eq!(Descriptors::new(&[0x05]).count(), 1);
    }
}
