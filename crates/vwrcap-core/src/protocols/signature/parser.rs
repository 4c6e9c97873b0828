use serde::{Deserialize, Serialize};

use super::error::SignatureError;
use super::layout;
use super::reader::SignatureReader;

/// Signature sub-format, selected by the marker byte at the end of the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureFormat {
    Compact,
    Extended,
}

/// A verified signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Offset of the magic byte within the MAC payload.
    pub offset: usize,
    pub format: SignatureFormat,
    pub timestamp: u32,
}

/// Transport carried by an IP frame, as reported by the frame-type bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Udp,
    Icmp,
    Igmp,
    OtherIp,
}

impl Transport {
    fn header_len(self) -> usize {
        match self {
            Transport::Tcp => layout::TCP_SIGNATURE_OFFSET,
            Transport::Udp => layout::UDP_SIGNATURE_OFFSET,
            Transport::Icmp => layout::ICMP_SIGNATURE_OFFSET,
            Transport::Igmp => layout::IGMP_SIGNATURE_OFFSET,
            Transport::OtherIp => layout::IP_SIGNATURE_OFFSET,
        }
    }
}

/// 802.11 MAC header plus SNAP encapsulation.
pub fn wlan_link_header_len(qos: bool) -> usize {
    let mac = if qos {
        layout::WLAN_MAC_HEADER_LEN + layout::WLAN_QOS_CONTROL_LEN
    } else {
        layout::WLAN_MAC_HEADER_LEN
    };
    mac + layout::SNAP_HEADER_LEN
}

pub fn ethernet_link_header_len(vlan: bool) -> usize {
    if vlan {
        layout::ETHERNET_HEADER_LEN + layout::VLAN_TAG_LEN
    } else {
        layout::ETHERNET_HEADER_LEN
    }
}

/// Where a signature is expected when the payload has no IP options.
pub fn expected_offset(link_header_len: usize, transport: Transport) -> usize {
    link_header_len + transport.header_len()
}

/// Find the signature belonging to this frame.
///
/// Candidates start at `expected` and move forward one byte at a time through
/// the scan window. A candidate is accepted only when its magic byte, sequence
/// number and 24-bit flow id all match.
///
/// # Examples
/// ```
/// use vwrcap_core::protocols::signature::find_signature;
///
/// let mut payload = vec![0u8; 48];
/// payload[20] = 0xdd;
/// payload[21..24].copy_from_slice(&[0x34, 0x12, 0x00]);
/// payload[25] = 7;
/// payload[28..32].copy_from_slice(&500u32.to_le_bytes());
///
/// let sig = find_signature(&payload, 16, 0x1234, 7)?.unwrap();
/// assert_eq!(sig.offset, 20);
/// assert_eq!(sig.timestamp, 500);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn find_signature(
    payload: &[u8],
    expected: usize,
    flow_id: u32,
    sequence: u8,
) -> Result<Option<Signature>, SignatureError> {
    for start in expected..expected.saturating_add(layout::SCAN_WINDOW) {
        let reader = SignatureReader::new(payload, start);
        if !reader.fits() {
            break;
        }
        if reader.read_u8(layout::MAGIC_OFFSET)? != layout::MAGIC {
            continue;
        }
        if let Some(signature) = verify_candidate(&reader, start, flow_id, sequence)? {
            return Ok(Some(signature));
        }
    }
    Ok(None)
}

fn verify_candidate(
    reader: &SignatureReader<'_>,
    start: usize,
    flow_id: u32,
    sequence: u8,
) -> Result<Option<Signature>, SignatureError> {
    let (format, sequence_offset, timestamp_range) = if reader.is_compact()? {
        (
            SignatureFormat::Compact,
            layout::COMPACT_SEQUENCE_OFFSET,
            layout::COMPACT_TIMESTAMP_RANGE,
        )
    } else {
        (
            SignatureFormat::Extended,
            layout::EXTENDED_SEQUENCE_OFFSET,
            layout::EXTENDED_TIMESTAMP_RANGE,
        )
    };

    if reader.read_u8(sequence_offset)? != sequence {
        return Ok(None);
    }
    if reader.read_u24_le(layout::FLOW_ID_RANGE)? != flow_id {
        return Ok(None);
    }
    Ok(Some(Signature {
        offset: start,
        format,
        timestamp: reader.read_u32_le(timestamp_range)?,
    }))
}

/// One-way latency from a signature timestamp, in hardware counter ticks.
///
/// Compared against the low 32 bits of the frame start counter. A signature
/// stamped apparently after arrival by more than 2^28 ticks is a counter
/// rollover and yields 0. Transmitted frames never report latency.
pub fn latency(signature_ts: u32, start: u64, is_tx: bool) -> u32 {
    if is_tx {
        return 0;
    }
    let start = start as u32;
    if signature_ts <= start {
        return start - signature_ts;
    }
    let delta = signature_ts - start;
    if delta > layout::ROLLOVER_THRESHOLD {
        0
    } else {
        delta
    }
}
