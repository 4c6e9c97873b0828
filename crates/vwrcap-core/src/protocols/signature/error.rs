use thiserror::Error;

/// Errors returned while reading a signature candidate.
///
/// A missing signature is not an error; scanners return `Ok(None)`.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signature truncated: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
}
