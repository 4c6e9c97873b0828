//! Capture-log source.
//!
//! A capture log is a flat sequence of 16-byte record headers, each followed
//! by a body. Frame records carry one captured frame plus a statistics trailer
//! whose layout depends on the capture hardware revision; control records are
//! skipped. Nothing in the stream names the revision, so it is inferred from
//! the first frame record (`detect`), after which `decoder` turns every frame
//! record into a [`crate::DecodedFrame`].
//!
//! Layering follows the protocol decoders: `layout` holds the constants and
//! per-revision tables, `reader` the bounds-checked accessors, `record` the
//! header scanner, and `parser` the file-facing source.

pub mod decoder;
pub mod detect;
pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod record;

pub use decoder::decode_frame;
pub use detect::detect_revision;
pub use error::VwrError;
pub use layout::{Encapsulation, FieldLayout, Revision};
pub use parser::{VwrFileSource, read_frame_at};
pub use reader::decode_word_swapped_u64;
pub use record::{FrameRecord, RecordHeader, RecordKind, next_frame_record, read_record_header};
