use tracing::{trace, warn};

use crate::protocols::plcp::{self, Modulation};
use crate::protocols::signature::{self, Signature, Transport};
use crate::{DecodedFrame, FrameMeta, error_flags, vendor_flags};

use super::error::VwrError;
use super::layout::{self, Encapsulation, ErrorBits, FieldLayout, FrameTypeBits, has_bit};
use super::reader::{RecordReader, TrailerReader};

const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MICRO: u64 = 1_000;

/// Decode one frame record body into a normalized frame.
///
/// `offset` is the stream position of the record header; it is carried into
/// the output and into error context. A declared payload longer than the body
/// can hold is clamped and flagged as truncated rather than rejected.
///
/// # Errors
/// Returns `VwrError::RecordTooShort` when the body cannot hold the layout's
/// PLCP prefix and trailer, or `VwrError::Plcp` when the PLCP prefix cannot
/// be decoded.
pub fn decode_frame(
    body: &[u8],
    is_tx: bool,
    layout: &FieldLayout,
    offset: u64,
) -> Result<DecodedFrame, VwrError> {
    let trailer = TrailerReader::new(body, layout, offset)?;
    let common = CommonFields::read(body, &trailer, layout, offset)?;

    let record = RecordReader::new(body, offset);
    let mac_start = layout.plcp_len();
    let mac = record.read_slice(mac_start..mac_start + common.payload_len)?;

    let link = match layout.encapsulation() {
        Encapsulation::Wlan => decode_wlan_link(&record, &trailer, layout, &common)?,
        Encapsulation::Ethernet => decode_ethernet_link(layout, &common),
    };

    let found = match common.transport(&layout.frame_type_bits) {
        Some(transport) if common.flow_valid => signature::find_signature(
            mac,
            signature::expected_offset(link.header_len, transport),
            common.flow_id,
            common.sequence,
        )?,
        _ => None,
    };
    let latency = found
        .map(|sig| signature::latency(sig.timestamp, common.start_ticks, is_tx))
        .unwrap_or(0);

    let (original_len, captured_len) = frame_lengths(common.declared, common.payload_len);
    let frame = assemble(
        offset,
        layout,
        is_tx,
        &common,
        link,
        found,
        latency,
        original_len,
        captured_len,
        mac,
    );
    trace!(
        offset,
        captured_len,
        original_len,
        flow_id = common.flow_id,
        "decoded frame"
    );
    Ok(frame)
}

/// Original and captured lengths with the trailing FCS removed.
///
/// The FCS is dropped from each length that is at least 4 bytes; the captured
/// length never exceeds the original.
pub fn frame_lengths(declared: usize, payload_len: usize) -> (usize, usize) {
    let strip_fcs = |len: usize| {
        if len >= layout::FCS_LEN {
            len - layout::FCS_LEN
        } else {
            len
        }
    };
    let original = strip_fcs(declared);
    let captured = strip_fcs(payload_len).min(original);
    (original, captured)
}

/// Trailer fields shared by both encapsulations.
struct CommonFields {
    declared: usize,
    payload_len: usize,
    truncated: bool,
    start_ticks: u64,
    end_ticks: u64,
    tick_ns: u64,
    frame_type: u32,
    raw_errors: u32,
    flow_valid: bool,
    vc_id: u16,
    flow_id: u32,
    sequence: u8,
}

impl CommonFields {
    fn read(
        body: &[u8],
        trailer: &TrailerReader<'_>,
        layout: &FieldLayout,
        offset: u64,
    ) -> Result<Self, VwrError> {
        let available = body.len() - layout.fixed_len();
        let declared = trailer.msdu_length()?;
        let truncated = declared > available;
        if truncated {
            warn!(offset, declared, available, "payload truncated on capture");
        }

        Ok(Self {
            declared,
            payload_len: declared.min(available),
            truncated,
            start_ticks: trailer.start_time()?,
            end_ticks: trailer.end_time()?,
            tick_ns: layout.tick_ns(),
            frame_type: trailer.frame_type()?,
            raw_errors: trailer.errors()?,
            flow_valid: trailer.flow_valid()?,
            vc_id: trailer.vc_id()?,
            flow_id: trailer.flow_id()?,
            sequence: trailer.sequence()?,
        })
    }

    fn start_ns(&self) -> u64 {
        self.start_ticks.saturating_mul(self.tick_ns)
    }

    fn duration_ns(&self) -> u64 {
        self.end_ticks
            .saturating_mul(self.tick_ns)
            .saturating_sub(self.start_ns())
    }

    fn has(&self, bit: u32) -> bool {
        has_bit(self.frame_type, bit)
    }

    fn transport(&self, bits: &FrameTypeBits) -> Option<Transport> {
        if !self.has(bits.ip) {
            return None;
        }
        let transport = if self.has(bits.tcp) {
            Transport::Tcp
        } else if self.has(bits.udp) {
            Transport::Udp
        } else if self.has(bits.icmp) {
            Transport::Icmp
        } else if self.has(bits.igmp) {
            Transport::Igmp
        } else {
            Transport::OtherIp
        };
        Some(transport)
    }
}

/// Encapsulation-specific results.
struct LinkFields {
    header_len: usize,
    rate: u16,
    modulation: Option<Modulation>,
    signal: Option<i8>,
    channel_flags: u16,
    vendor_flags: u16,
    errors: u32,
    duration: u64,
}

fn decode_wlan_link(
    record: &RecordReader<'_>,
    trailer: &TrailerReader<'_>,
    layout: &FieldLayout,
    common: &CommonFields,
) -> Result<LinkFields, VwrError> {
    let bits = &layout.frame_type_bits;
    let mut vendor = 0u16;

    let (rate, modulation, channel_flags) = match (layout.plcp, trailer.modulation()?) {
        (Some(plcp_layout), Some(code)) => {
            let modulation = Modulation::from_code(code)?;
            let plcp_bytes = record.read_slice(0..plcp_layout.len)?;
            let phy = plcp::decode_plcp(plcp_bytes, modulation, &plcp_layout)?;
            if phy.is_ht() {
                vendor |= vendor_flags::HT;
            }
            if phy.cbw40 {
                vendor |= vendor_flags::CBW40;
            }
            if phy.short_gi {
                vendor |= vendor_flags::SHORT_GI;
            }
            let channel = plcp::channel_flags(modulation, common.has(bits.band_5ghz));
            (phy.rate, Some(modulation), channel)
        }
        _ => (0, None, 0),
    };

    for (bit, flag) in [
        (bits.wep, vendor_flags::WEP),
        (bits.tkip, vendor_flags::TKIP),
        (bits.ccmp, vendor_flags::CCMP),
    ] {
        if common.has(bit) {
            vendor |= flag;
        }
    }

    Ok(LinkFields {
        header_len: signature::wlan_link_header_len(common.has(bits.qos)),
        rate,
        modulation,
        signal: trailer.signal()?,
        channel_flags,
        vendor_flags: vendor,
        errors: normalize_errors(common.raw_errors, &layout.error_bits),
        duration: common.duration_ns() / NANOS_PER_MICRO,
    })
}

fn decode_ethernet_link(layout: &FieldLayout, common: &CommonFields) -> LinkFields {
    LinkFields {
        header_len: signature::ethernet_link_header_len(
            common.has(layout.frame_type_bits.vlan),
        ),
        rate: 0,
        modulation: None,
        signal: None,
        channel_flags: 0,
        vendor_flags: 0,
        errors: normalize_errors(common.raw_errors, &layout.error_bits),
        duration: common.duration_ns(),
    }
}

/// Map a revision's error word onto the normalized error flags.
pub fn normalize_errors(raw: u32, bits: &ErrorBits) -> u32 {
    let mut errors = 0;
    if has_bit(raw, bits.fcs) {
        errors |= error_flags::FCS;
    }
    if has_bit(raw, bits.decrypt) {
        errors |= error_flags::DECRYPT;
    }
    if has_bit(raw, bits.retry) {
        errors |= error_flags::RETRY;
    }
    if raw & !(bits.fcs | bits.decrypt | bits.retry) != 0 {
        errors |= error_flags::OTHER;
    }
    errors
}

#[allow(clippy::too_many_arguments)]
fn assemble(
    offset: u64,
    layout: &FieldLayout,
    is_tx: bool,
    common: &CommonFields,
    link: LinkFields,
    signature: Option<Signature>,
    latency: u32,
    original_len: usize,
    captured_len: usize,
    mac: &[u8],
) -> DecodedFrame {
    let mut vendor = link.vendor_flags;
    if is_tx {
        vendor |= vendor_flags::TX;
    }
    if common.truncated {
        vendor |= vendor_flags::TRUNCATED;
    }
    if signature.is_some() {
        vendor |= vendor_flags::SIGNATURE;
    }

    let start_ns = common.start_ns();
    DecodedFrame {
        offset,
        revision: layout.revision,
        encapsulation: layout.encapsulation(),
        ts_sec: start_ns / NANOS_PER_SEC,
        ts_usec: ((start_ns % NANOS_PER_SEC) / NANOS_PER_MICRO) as u32,
        original_len: original_len as u32,
        captured_len: captured_len as u32,
        meta: FrameMeta {
            rate: link.rate,
            modulation: link.modulation,
            signal: link.signal,
            channel_flags: link.channel_flags,
            vendor_flags: vendor,
            vc_id: common.vc_id,
            flow_id: common.flow_id,
            sequence: common.sequence,
            latency,
            duration: link.duration,
            signature_ts: signature.map(|sig| sig.timestamp),
            errors: link.errors,
        },
        payload: mac[..captured_len].to_vec(),
    }
}
