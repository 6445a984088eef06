//! Report generation for demultiplexing results

use serde::Serialize;

use crate::catalog::{ServiceInfo, StreamComponent};
use crate::processor::Demuxer;

/// Component plus the statistics of its PID
#[derive(Debug, Clone, Serialize)]
pub struct ComponentReport {
    pub pid: u16,
    pub stream_type: u8,
    pub codec: &'static str,
    pub cue_descriptor: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate_kbps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_errors: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceReport {
    pub program_number: u16,
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcr_pid: Option<u16>,
    pub scte35: bool,
    pub max_bitrate: u32,
    pub components: Vec<ComponentReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PidReport {
    pub pid: u16,
    pub packets: u64,
    pub cc_errors: u64,
    pub bitrate_kbps: f64,
}

/// Snapshot of one demuxer session
#[derive(Debug, Clone, Serialize)]
pub struct InspectorReport {
    pub timestamp: String,
    pub packets: u64,
    pub continuity_errors: u64,
    pub diagnostics: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_pcr_pid: Option<u16>,
    pub services: Vec<ServiceReport>,
    pub pids: Vec<PidReport>,
}

/// Report generator for demuxer sessions
pub struct Reporter;

impl Reporter {
    /// Build a structured report for API consumers
    pub fn create_report(demuxer: &Demuxer) -> InspectorReport {
        let stats = demuxer.stream_stats();

        let services = demuxer
            .catalog()
            .iter()
            .map(|service| Self::service_report(demuxer, service))
            .collect();

        let mut pids: Vec<PidReport> = stats
            .iter()
            .map(|(&pid, s)| PidReport {
                pid,
                packets: s.packets,
                cc_errors: s.cc_errors,
                bitrate_kbps: s.bitrate_bps as f64 / 1000.0,
            })
            .collect();
        pids.sort_by_key(|p| p.pid);

        InspectorReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            packets: demuxer.packets_processed(),
            continuity_errors: demuxer.continuity_errors(),
            diagnostics: demuxer.diagnostics().total(),
            reference_pcr_pid: stats.reference_pid(),
            services,
            pids,
        }
    }

    fn service_report(demuxer: &Demuxer, service: &ServiceInfo) -> ServiceReport {
        ServiceReport {
            program_number: service.program_number,
            service_name: service.service_name.clone(),
            provider_name: service.provider_name.clone(),
            pcr_pid: service.pcr_pid,
            scte35: service.has_scte35,
            max_bitrate: service.max_bitrate,
            components: service
                .components
                .iter()
                .map(|c| Self::component_report(demuxer, c))
                .collect(),
        }
    }

    fn component_report(demuxer: &Demuxer, c: &StreamComponent) -> ComponentReport {
        let stats = demuxer.stream_stats().get(c.pid);
        ComponentReport {
            pid: c.pid,
            stream_type: c.stream_type,
            codec: stream_type_name(c.stream_type),
            cue_descriptor: c.cue_descriptor,
            bitrate_kbps: stats.map(|s| s.bitrate_bps as f64 / 1000.0),
            cc_errors: stats.map(|s| s.cc_errors),
        }
    }

    /// Pretty-printed JSON for CLI output
    pub fn generate_json_report(demuxer: &Demuxer) -> String {
        let rep = Self::create_report(demuxer);
        serde_json::to_string_pretty(&rep)
            .unwrap_or_else(|_| "{\"error\": \"JSON serialization failed\"}".to_string())
    }
}

pub fn stream_type_name(st: u8) -> &'static str {
    match st {
        0x02 => "MPEG-2",
        0x03 | 0x04 => "MPEG audio",
        0x0F => "AAC",
        0x11 => "AAC-LATM",
        0x1B => "H.264",
        0x24 => "HEVC",
        0x81 => "AC-3",
        0x86 => "SCTE-35",
        _ => "unknown",
    }
}
