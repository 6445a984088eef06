//! Demultiplexer error types.
//!
//! Only conditions that abort a whole call live here. Per-record and
//! per-descriptor problems are reported through [`crate::diagnostics`].

use thiserror::Error;

/// Errors returned by the demultiplexer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DemuxError {
    /// Input buffer holds less than one whole packet.
    #[error("TS parsing requires at least 188 bytes, got {len}")]
    InputTooShort {
        /// Length of the buffer that was offered.
        len: usize,
    },

    /// Header decoder was handed a short record.
    #[error("Packet too short: expected 188 bytes, got {0}")]
    PacketTooShort(usize),
}

/// Result type for demultiplexer operations.
pub type Result<T> = std::result::Result<T, DemuxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DemuxError::InputTooShort { len: 100 };
        assert_eq!(err.to_string(), "TS parsing requires at least 188 bytes, got 100");
    }

    #[test]
    fn test_packet_too_short_display() {
        let err = DemuxError::PacketTooShort(4);
        assert_eq!(err.to_string(), "Packet too short: expected 188 bytes, got 4");
    }
}
