#![allow(dead_code)]

use vwrcap_core::protocols::signature::layout as sig;
use vwrcap_core::source::vwr::layout::{self, FieldLayout};

/// Inverse of the word-swapped timestamp decode.
pub fn encode_word_swapped(value: u64) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[0..4].copy_from_slice(&(value as u32).to_be_bytes());
    out[4..8].copy_from_slice(&((value >> 32) as u32).to_be_bytes());
    out
}

/// Synthetic frame record for one hardware layout.
#[derive(Clone)]
pub struct FrameBuilder {
    pub layout: &'static FieldLayout,
    pub command: u8,
    pub payload: Vec<u8>,
    pub declared: Option<usize>,
    pub payload_area: Option<usize>,
    pub plcp: Vec<u8>,
    pub modulation: u8,
    pub frame_type: u32,
    pub errors: u32,
    pub flow_valid: bool,
    pub vc_id: u16,
    pub flow_id: u32,
    pub sequence: u8,
    pub signal: i8,
    pub start: u64,
    pub end: u64,
}

impl FrameBuilder {
    pub fn new(layout: &'static FieldLayout, payload: Vec<u8>) -> Self {
        Self {
            layout,
            command: layout::COMMAND_RX,
            payload,
            declared: None,
            payload_area: None,
            plcp: Vec::new(),
            modulation: 0,
            frame_type: 0,
            errors: 0,
            flow_valid: false,
            vc_id: 0,
            flow_id: 0,
            sequence: 0,
            signal: 0,
            start: 0,
            end: 0,
        }
    }

    pub fn tx(mut self) -> Self {
        self.command = layout::COMMAND_TX;
        self
    }

    /// Mark the frame as belonging to a test flow.
    pub fn flow(mut self, vc_id: u16, flow_id: u32, sequence: u8) -> Self {
        self.flow_valid = true;
        self.vc_id = vc_id;
        self.flow_id = flow_id;
        self.sequence = sequence;
        self
    }

    /// Keep only `area` bytes of payload space in the body.
    pub fn truncate_to(mut self, area: usize) -> Self {
        self.payload_area = Some(area);
        self
    }

    pub fn body(&self) -> Vec<u8> {
        let layout = self.layout;
        let declared = self.declared.unwrap_or(self.payload.len());
        let area = self
            .payload_area
            .unwrap_or_else(|| layout::pad4(self.payload.len()));
        let plcp_len = layout.plcp_len();
        let mut body = vec![0u8; plcp_len + area + layout.stats_len];

        let plcp = self.plcp.len().min(plcp_len);
        body[..plcp].copy_from_slice(&self.plcp[..plcp]);
        let copied = self.payload.len().min(area);
        body[plcp_len..plcp_len + copied].copy_from_slice(&self.payload[..copied]);

        let stats = body.len() - layout.stats_len;
        let trailer = &mut body[stats..];
        put(trailer, layout.msdu_length, &(declared as u16).to_be_bytes());
        if self.flow_valid {
            trailer[layout.valid.offset] |= layout.valid.mask;
        }
        if let Some(field) = layout.modulation {
            trailer[field.offset] |= (self.modulation << field.shift()) & field.mask;
        }
        if let Some(pos) = layout.signal {
            trailer[pos] = self.signal as u8;
        }
        trailer[layout.sequence] = self.sequence;
        put(trailer, layout.vc_id, &self.vc_id.to_be_bytes());
        put(trailer, layout.flow_id, &self.flow_id.to_be_bytes()[1..]);
        put(trailer, layout.errors, &self.errors.to_be_bytes());
        put(trailer, layout.frame_type, &self.frame_type.to_be_bytes());
        put(trailer, layout.start_time, &encode_word_swapped(self.start));
        put(trailer, layout.end_time, &encode_word_swapped(self.end));
        body
    }

    pub fn record(&self) -> Vec<u8> {
        record(self.command, &self.body())
    }
}

fn put(buf: &mut [u8], at: usize, bytes: &[u8]) {
    buf[at..at + bytes.len()].copy_from_slice(bytes);
}

pub fn record(command: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; layout::RECORD_HEADER_LEN];
    out[layout::COMMAND_OFFSET] = command;
    out[layout::FRAME_LENGTH_RANGE].copy_from_slice(&(body.len() as u16).to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// Control record of type A with a filler body.
pub fn control_record(len: usize) -> Vec<u8> {
    record(layout::CONTROL_A_COMMANDS[0], &vec![0xcc; len])
}

pub fn extended_signature(flow_id: u32, sequence: u8, ts: u32) -> [u8; sig::SIGNATURE_LEN] {
    let mut out = [0u8; sig::SIGNATURE_LEN];
    out[sig::MAGIC_OFFSET] = sig::MAGIC;
    out[sig::FLOW_ID_RANGE].copy_from_slice(&flow_id.to_le_bytes()[..3]);
    out[sig::EXTENDED_SEQUENCE_OFFSET] = sequence;
    out[sig::EXTENDED_TIMESTAMP_RANGE].copy_from_slice(&ts.to_le_bytes());
    out
}

pub fn compact_signature(flow_id: u32, sequence: u8, ts: u32) -> [u8; sig::SIGNATURE_LEN] {
    let mut out = [0u8; sig::SIGNATURE_LEN];
    out[sig::MAGIC_OFFSET] = sig::MAGIC;
    out[sig::FLOW_ID_RANGE].copy_from_slice(&flow_id.to_le_bytes()[..3]);
    out[sig::COMPACT_SEQUENCE_OFFSET] = sequence;
    out[sig::COMPACT_TIMESTAMP_RANGE].copy_from_slice(&ts.to_le_bytes());
    out[sig::FORMAT_MARKER_OFFSET] = sig::COMPACT_MARKER;
    out
}
