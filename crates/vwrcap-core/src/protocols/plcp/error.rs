use thiserror::Error;

/// Errors returned by PLCP decoding.
///
/// # Examples
/// ```
/// use vwrcap_core::protocols::plcp::error::PlcpError;
///
/// let err = PlcpError::UnknownModulation { value: 7 };
/// assert!(err.to_string().contains("unknown modulation"));
/// ```
#[derive(Debug, Error)]
pub enum PlcpError {
    #[error("PLCP too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("unknown modulation code: {value}")]
    UnknownModulation { value: u8 },
}
