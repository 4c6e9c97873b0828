pub mod vwr;

pub use vwr::VwrFileSource;

use thiserror::Error;

use crate::DecodedFrame;

/// Sequential supplier of decoded frames.
pub trait PacketSource {
    fn next_frame(&mut self) -> Result<Option<DecodedFrame>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("input is not a recognised capture log")]
    FormatMismatch,
    #[error("capture decode error ({context}): {message}")]
    Malformed {
        context: &'static str,
        message: String,
    },
}

impl From<vwr::error::VwrError> for SourceError {
    fn from(value: vwr::error::VwrError) -> Self {
        use vwr::error::VwrError;

        match value {
            VwrError::Io(err) => SourceError::Io(err),
            VwrError::FormatMismatch => SourceError::FormatMismatch,
            err @ (VwrError::InvalidRecordLength { .. } | VwrError::RecordTooShort { .. }) => {
                SourceError::Malformed {
                    context: "malformed record",
                    message: err.to_string(),
                }
            }
            err @ (VwrError::ShortHeader { .. } | VwrError::ShortBody { .. }) => {
                SourceError::Malformed {
                    context: "short read",
                    message: err.to_string(),
                }
            }
            err => SourceError::Malformed {
                context: "frame decode",
                message: err.to_string(),
            },
        }
    }
}
