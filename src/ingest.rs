//! Ingestion loop: pulls bytes from a file or UDP socket into one long-lived demuxer.

use std::path::Path;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::AsyncReadExt;

use crate::constants::{TS_PACKET_SIZE, TS_SYNC_BYTE};
use crate::processor::Demuxer;
use crate::report::Reporter;
use crate::types::{Options, Source};

/// Datagram / read size; 7 packets per UDP datagram is the usual framing
const READ_CHUNK: usize = 64 * 1024;

pub async fn run(opts: Options) -> anyhow::Result<()> {
    let mut demuxer = Demuxer::new(opts.config);
    let refresh = Duration::from_secs(opts.refresh_secs.max(1));

    match opts.source {
        Source::File(path) => run_file(&path, &mut demuxer).await?,
        Source::Udp(addr) => run_udp(addr, refresh, &mut demuxer).await?,
    }

    println!("{}", Reporter::generate_json_report(&demuxer));
    Ok(())
}

async fn run_file(path: &Path, demuxer: &mut Demuxer) -> anyhow::Result<()> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut feeder = PacketFeeder::default();
    let mut buf = BytesMut::with_capacity(READ_CHUNK);

    loop {
        buf.clear();
        let n = file.read_buf(&mut buf).await?;
        if n == 0 {
            break;
        }
        feeder.feed(demuxer, &buf)?;
    }

    if feeder.pending() > 0 {
        log::warn!("{} trailing bytes do not form a whole packet", feeder.pending());
    }
    log::info!("{}: {} packets", path.display(), demuxer.packets_processed());
    Ok(())
}

async fn run_udp(
    addr: std::net::SocketAddr,
    refresh: Duration,
    demuxer: &mut Demuxer,
) -> anyhow::Result<()> {
    let sock = crate::network::open_udp(addr)?;
    let mut feeder = PacketFeeder::default();
    let mut buf = vec![0u8; READ_CHUNK];
    let mut ticker = tokio::time::interval(refresh);
    ticker.tick().await;

    log::info!("listening on {addr}");
    loop {
        tokio::select! {
            res = sock.recv(&mut buf) => {
                let n = res?;
                if n == 0 {
                    continue;
                }
                feeder.feed(demuxer, &buf[..n])?;
            }
            _ = ticker.tick() => {
                println!("{}", Reporter::generate_json_report(demuxer));
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted");
                return Ok(());
            }
        }
    }
}

/// Carries partial packets between reads so the demuxer only sees whole records
#[derive(Default)]
struct PacketFeeder {
    pending: BytesMut,
}

impl PacketFeeder {
    fn feed(&mut self, demuxer: &mut Demuxer, data: &[u8]) -> anyhow::Result<()> {
        self.pending.extend_from_slice(data);
        loop {
            self.resync();
            let aligned = self.aligned_len();
            if aligned == 0 {
                return Ok(());
            }
            let used = demuxer.parse_blob(&self.pending[..aligned])?;
            self.pending.advance(used);
        }
    }

    /// Bytes covered by the leading run of whole records that start with 0x47
    fn aligned_len(&self) -> usize {
        self.pending
            .chunks_exact(TS_PACKET_SIZE)
            .take_while(|record| record[0] == TS_SYNC_BYTE)
            .count()
            * TS_PACKET_SIZE
    }

    /// Drop leading bytes until a sync byte lines up
    fn resync(&mut self) {
        if self.pending.first().is_none_or(|&b| b == TS_SYNC_BYTE) {
            return;
        }
        let skip = self
            .pending
            .iter()
            .position(|&b| b == TS_SYNC_BYTE)
            .unwrap_or(self.pending.len());
        log::debug!("skipping {skip} bytes to regain sync");
        self.pending.advance(skip);
    }

    fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn null_packet(cc: u8) -> Vec<u8> {
        let mut p = vec![0xFFu8; TS_PACKET_SIZE];
        p[..4].copy_from_slice(&[0x47, 0x1F, 0xFF, 0x10 | cc]);
        p
    }

    #[test]
    fn test_feeder_carries_partial_packets() {
        let mut demuxer = Demuxer::default();
        let mut feeder = PacketFeeder::default();
        let stream: Vec<u8> = (0..4).flat_map(null_packet).collect();

        feeder.feed(&mut demuxer, &stream[..100]).unwrap();
        assert_eq!(demuxer.packets_processed(), 0);
        feeder.feed(&mut demuxer, &stream[100..400]).unwrap();
        assert_eq!(demuxer.packets_processed(), 2);
        assert_eq!(feeder.pending(), 400 - 2 * TS_PACKET_SIZE);
        feeder.feed(&mut demuxer, &stream[400..]).unwrap();
        assert_eq!(demuxer.packets_processed(), 4);
        assert_eq!(feeder.pending(), 0);
        assert_eq!(demuxer.continuity_errors(), 0);
    }

    #[test]
    fn test_feeder_resyncs_on_garbage() {
        let mut demuxer = Demuxer::default();
        let mut feeder = PacketFeeder::default();
        let mut data = vec![0x00, 0x12, 0x34];
        data.extend(null_packet(0));
        feeder.feed(&mut demuxer, &data).unwrap();
        assert_eq!(demuxer.packets_processed(), 1);
    }

    #[test]
    fn test_feeder_resyncs_mid_buffer() {
        let mut demuxer = Demuxer::default();
        let mut feeder = PacketFeeder::default();
        let mut data = null_packet(0);
        data.extend([0x00, 0x00]);
        data.extend(null_packet(1));
        data.extend(null_packet(2));
        feeder.feed(&mut demuxer, &data).unwrap();
        assert_eq!(demuxer.packets_processed(), 3);
        assert_eq!(feeder.pending(), 0);
        assert_eq!(demuxer.continuity_errors(), 0);
        assert!(demuxer.diagnostics().is_empty());
    }
}
