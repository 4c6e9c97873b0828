//! Byte-level decoders used by the frame decoder.
//!
//! Each decoder follows a layered structure:
//! - `layout`: byte offsets, masks and tables (source of truth)
//! - `reader`: safe byte access and field conventions
//! - `parser`: domain-level decoding (no direct byte indexing)
//! - `error`: explicit, actionable errors
//!
//! Decoders are pure and contain no I/O; the capture source handles stream
//! access and record framing.

pub mod plcp;
pub mod signature;
