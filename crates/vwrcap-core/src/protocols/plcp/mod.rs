//! 802.11 PLCP header decoding.
//!
//! Turns the PLCP prefix of a wireless frame record into a PHY rate and
//! modulation family. Legacy OFDM rates come from the RATE nibble, CCK rates
//! from the SIGNAL byte, and HT frames report their MCS index with bandwidth
//! and guard-interval flags. Byte positions inside the prefix differ between
//! hardware revisions and are passed in as a `PlcpLayout`.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use layout::PlcpLayout;
pub use parser::{Modulation, PhyRate, channel_flags, decode_plcp, ht_rate_mbps};
