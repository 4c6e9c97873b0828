//! Embedded test-signature scanning and latency computation.
//!
//! Traffic generators stamp a 16-byte signature into the payload of test
//! frames. The scanner looks for it at the offset implied by the frame's
//! protocol stack, then slides forward through a bounded window, accepting
//! only candidates whose flow id and sequence number match the frame's own.
//! Most frames carry no signature; that is reported as `Ok(None)`.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::{
    Signature, SignatureFormat, Transport, ethernet_link_header_len, expected_offset,
    find_signature, latency, wlan_link_header_len,
};
