use std::path::PathBuf;

use clap::Parser;
use ts_si_inspector::constants::DEFAULT_DIAGNOSTICS_CAPACITY;
use ts_si_inspector::inspector::{DemuxConfig, Options, Source, run};

#[derive(Parser)]
#[command(version, about = "Inspect PAT/PMT/SDT tables of an MPEG-TS stream")]
struct Opt {
    /// UDP socket to bind + listen (IPv4, multicast joins the group)
    #[arg(long, default_value = "239.1.1.2:1234", conflicts_with = "file")]
    addr: String,

    /// Read a recorded .ts file instead of the network
    #[arg(long)]
    file: Option<PathBuf>,

    /// Refresh interval for the JSON snapshot (UDP only)
    #[arg(long, default_value_t = 2)]
    refresh: u64,

    /// Skip records whose first byte is not 0x47
    #[arg(long, default_value_t = false)]
    verify_sync: bool,

    /// Disable PCR-driven bitrate estimation
    #[arg(long, default_value_t = false)]
    no_bitrate: bool,

    /// Compute PCR deltas across the 33-bit wrap
    #[arg(long, default_value_t = false)]
    correct_pcr_wrap: bool,

    /// Diagnostics kept before the oldest are dropped
    #[arg(long, default_value_t = DEFAULT_DIAGNOSTICS_CAPACITY)]
    diagnostics_capacity: usize,
}

impl Opt {
    fn into_options(self) -> anyhow::Result<Options> {
        let source = match self.file {
            Some(path) => Source::File(path),
            None => Source::Udp(self.addr.parse()?),
        };
        Ok(Options {
            source,
            refresh_secs: self.refresh,
            config: DemuxConfig {
                estimate_bitrate: !self.no_bitrate,
                verify_sync_byte: self.verify_sync,
                correct_pcr_wraparound: self.correct_pcr_wrap,
                diagnostics_capacity: self.diagnostics_capacity,
            },
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    run(Opt::parse().into_options()?).await
}
