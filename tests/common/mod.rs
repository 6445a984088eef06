//! Hand-built transport stream records for integration tests.
#![allow(dead_code)]

pub const PACKET: usize = 188;

/// One payload-only packet; `payload` is padded with 0xFF to 184 bytes
pub fn ts_packet(pid: u16, pusi: bool, cc: u8, payload: &[u8]) -> Vec<u8> {
    let mut p = vec![
        0x47,
        ((pusi as u8) << 6) | ((pid >> 8) as u8 & 0x1F),
        pid as u8,
        0x10 | (cc & 0x0F),
    ];
    p.extend_from_slice(payload);
    p.resize(PACKET, 0xFF);
    p
}

/// 6-byte PCR field: 33-bit base, 6 reserved bits, 9-bit extension
pub fn encode_pcr(base: u64, ext: u16) -> [u8; 6] {
    [
        (base >> 25) as u8,
        (base >> 17) as u8,
        (base >> 9) as u8,
        (base >> 1) as u8,
        (((base & 1) << 7) as u8) | 0x7E | ((ext >> 8) & 1) as u8,
        ext as u8,
    ]
}

/// Packet with an adaptation field holding a PCR, plus a stuffed payload
pub fn pcr_packet(pid: u16, cc: u8, base: u64, ext: u16, discontinuity: bool) -> Vec<u8> {
    let flags = 0x10 | if discontinuity { 0x80 } else { 0x00 };
    let mut p = vec![0x47, (pid >> 8) as u8 & 0x1F, pid as u8, 0x30 | (cc & 0x0F), 7, flags];
    p.extend_from_slice(&encode_pcr(base, ext));
    p.resize(PACKET, 0xFF);
    p
}

/// Pointer field + long-form section header + body + placeholder CRC
pub fn section(table_id: u8, table_id_extension: u16, version: u8, body: &[u8]) -> Vec<u8> {
    let section_length = 5 + body.len() + 4;
    let mut s = vec![
        0x00,
        table_id,
        0xB0 | ((section_length >> 8) as u8 & 0x0F),
        section_length as u8,
    ];
    s.extend_from_slice(&table_id_extension.to_be_bytes());
    s.extend_from_slice(&[0xC1 | ((version & 0x1F) << 1), 0x00, 0x00]);
    s.extend_from_slice(body);
    s.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    s
}

pub fn pat(programs: &[(u16, u16)]) -> Vec<u8> {
    let body: Vec<u8> = programs
        .iter()
        .flat_map(|&(program, pid)| {
            let [a, b] = program.to_be_bytes();
            [a, b, 0xE0 | (pid >> 8) as u8, pid as u8]
        })
        .collect();
    section(0x00, 1, 0, &body)
}

/// One elementary stream: (stream_type, pid, ES descriptors)
pub struct Es<'a>(pub u8, pub u16, pub &'a [u8]);

pub fn pmt(program: u16, version: u8, pcr_pid: u16, program_info: &[u8], streams: &[Es<'_>]) -> Vec<u8> {
    let mut body = vec![
        0xE0 | (pcr_pid >> 8) as u8,
        pcr_pid as u8,
        0xF0 | (program_info.len() >> 8) as u8,
        program_info.len() as u8,
    ];
    body.extend_from_slice(program_info);
    for Es(stream_type, pid, info) in streams {
        body.extend_from_slice(&[
            *stream_type,
            0xE0 | (pid >> 8) as u8,
            *pid as u8,
            0xF0 | (info.len() >> 8) as u8,
            info.len() as u8,
        ]);
        body.extend_from_slice(info);
    }
    section(0x02, program, version, &body)
}

pub fn service_descriptor(service_type: u8, provider: &str, name: &str) -> Vec<u8> {
    let mut d = vec![0x48, (3 + provider.len() + name.len()) as u8, service_type];
    d.push(provider.len() as u8);
    d.extend_from_slice(provider.as_bytes());
    d.push(name.len() as u8);
    d.extend_from_slice(name.as_bytes());
    d
}

pub fn sdt(services: &[(u16, Vec<u8>)]) -> Vec<u8> {
    let mut body = vec![0x00, 0x01, 0xFF];
    for (service_id, descriptors) in services {
        body.extend_from_slice(&service_id.to_be_bytes());
        body.push(0xFC);
        body.extend_from_slice(&(0x8000 | descriptors.len() as u16).to_be_bytes());
        body.extend_from_slice(descriptors);
    }
    section(0x42, 1, 0, &body)
}

pub fn concat(packets: &[Vec<u8>]) -> Vec<u8> {
    packets.concat()
}
