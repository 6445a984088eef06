//! Cross-table view of every service: PAT linkage, PMT components and SDT naming
//! merged under the program number.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::constants::SERVICE_NAME_UNSEEN;

/// One elementary stream listed by a PMT
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamComponent {
    pub stream_type: u8,
    pub pid: u16,
    /// An SCTE-35 cue identifier descriptor sits on this component
    pub cue_descriptor: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    pub program_number: u16,
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcr_pid: Option<u16>,
    pub has_scte35: bool,
    /// bits/second, 0 when no maximum_bitrate descriptor was present
    pub max_bitrate: u32,
    pub components: Vec<StreamComponent>,
}

impl ServiceInfo {
    pub fn new(program_number: u16) -> Self {
        Self {
            program_number,
            service_name: SERVICE_NAME_UNSEEN.to_string(),
            provider_name: None,
            service_type: None,
            pcr_pid: None,
            has_scte35: false,
            max_bitrate: 0,
            components: Vec::new(),
        }
    }

    /// True once an SDT supplied the name
    pub fn is_named(&self) -> bool {
        self.service_name != SERVICE_NAME_UNSEEN
    }
}

/// Facts from one PMT section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramMap {
    pub pcr_pid: u16,
    pub has_scte35: bool,
    pub max_bitrate: u32,
    pub components: Vec<StreamComponent>,
}

/// Facts from one SDT service loop entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescription {
    pub service_type: u8,
    pub provider_name: String,
    pub service_name: String,
}

/// program_number → service
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    services: BTreeMap<u16, ServiceInfo>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /* called by the section parsers */

    /// Create the entry if absent
    pub fn ensure(&mut self, program_number: u16) -> &mut ServiceInfo {
        self.services
            .entry(program_number)
            .or_insert_with(|| ServiceInfo::new(program_number))
    }

    /// Replace PMT-derived fields; the component list is rebuilt, never merged
    pub fn apply_program_map(&mut self, program_number: u16, pmt: ProgramMap) {
        let service = self.ensure(program_number);
        service.pcr_pid = Some(pmt.pcr_pid);
        service.has_scte35 = pmt.has_scte35;
        service.max_bitrate = pmt.max_bitrate;
        service.components = pmt.components;
    }

    pub fn apply_service_description(&mut self, service_id: u16, sdt: ServiceDescription) {
        let service = self.ensure(service_id);
        service.service_name = sdt.service_name;
        service.provider_name = Some(sdt.provider_name);
        service.service_type = Some(sdt.service_type);
    }

    /* query surface */

    pub fn get(&self, program_number: u16) -> Option<&ServiceInfo> {
        self.services.get(&program_number)
    }

    /// Services in program-number order
    pub fn iter(&self) -> impl Iterator<Item = &ServiceInfo> {
        self.services.values()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
