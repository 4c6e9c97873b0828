use thiserror::Error;

use crate::protocols::plcp::error::PlcpError;
use crate::protocols::signature::error::SignatureError;

/// Errors returned while scanning and decoding a capture stream.
///
/// Offsets are absolute byte positions in the stream, pointing at the start of
/// the record header that failed.
///
/// # Examples
/// ```
/// use vwrcap_core::source::vwr::error::VwrError;
///
/// let err = VwrError::InvalidRecordLength { offset: 0, length: 40_000, max: 32_768 };
/// assert!(err.to_string().contains("invalid record length"));
/// ```
#[derive(Debug, Error)]
pub enum VwrError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a recognised capture log: no known hardware layout matched")]
    FormatMismatch,
    #[error("invalid record length at offset {offset}: {length} bytes exceeds maximum {max}")]
    InvalidRecordLength {
        offset: u64,
        length: usize,
        max: usize,
    },
    #[error("short record header at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortHeader {
        offset: u64,
        expected: usize,
        actual: usize,
    },
    #[error("short record body at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortBody {
        offset: u64,
        expected: usize,
        actual: usize,
    },
    #[error("record at offset {offset} too short for trailer: need {needed} bytes, got {actual}")]
    RecordTooShort {
        offset: u64,
        needed: usize,
        actual: usize,
    },
    #[error("no frame record at offset {offset}")]
    NoFrameAt { offset: u64 },
    #[error("PLCP decode error: {0}")]
    Plcp(#[from] PlcpError),
    #[error("signature scan error: {0}")]
    Signature(#[from] SignatureError),
}
