//! vwrcap core library for decoding vendor capture logs.
//!
//! This crate turns the record-oriented capture logs written by wireless and
//! wired test appliances into a normalized sequence of timestamped frames:
//! the `source` layer detects the hardware revision, scans record headers and
//! decodes frame records, calling the byte-level protocol decoders
//! (layout/reader/parser) for PLCP rates and embedded signatures. The
//! `analysis` layer folds decoded frames into a deterministic report.
//! All I/O is isolated in `source`; decoders work on borrowed byte slices.
//!
//! Invariants:
//! - One field layout is selected per stream and used for every record.
//! - `captured_len <= original_len` for every decoded frame.
//! - A missing signature is never an error; latency is then 0.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use vwrcap_core::{PacketSource, VwrFileSource};
//!
//! let mut source = VwrFileSource::open(Path::new("capture.vwr"))?;
//! while let Some(frame) = PacketSource::next_frame(&mut source)? {
//!     println!("{} bytes, latency {}", frame.captured_len, frame.meta.latency);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize, Serializer};

mod analysis;
pub mod protocols;
pub mod source;

pub use analysis::{AnalysisError, analyze_source, analyze_vwr_file};
pub use protocols::plcp::Modulation;
pub use source::vwr::{Encapsulation, FieldLayout, Revision, VwrError, detect_revision};
pub use source::{PacketSource, SourceError, VwrFileSource};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Version byte of the serialized metadata header.
pub const META_HEADER_VERSION: u8 = 1;
/// Length of the serialized metadata header in bytes.
pub const META_HEADER_LEN: usize = 40;

/// Bits of [`FrameMeta::vendor_flags`].
pub mod vendor_flags {
    pub const TX: u16 = 0x0001;
    pub const HT: u16 = 0x0002;
    pub const CBW40: u16 = 0x0004;
    pub const SHORT_GI: u16 = 0x0008;
    pub const WEP: u16 = 0x0010;
    pub const TKIP: u16 = 0x0020;
    pub const CCMP: u16 = 0x0040;
    pub const SIGNATURE: u16 = 0x0080;
    pub const TRUNCATED: u16 = 0x0100;
}

/// Bits of [`FrameMeta::errors`], identical for every hardware revision.
pub mod error_flags {
    pub const FCS: u32 = 0x0001;
    pub const DECRYPT: u32 = 0x0002;
    pub const RETRY: u32 = 0x0004;
    /// Any error bit the revision reports but the decoder does not name.
    pub const OTHER: u32 = 0x8000;
}

/// One decoded frame record.
///
/// # Examples
/// ```
/// use vwrcap_core::{DecodedFrame, Encapsulation, FrameMeta, META_HEADER_LEN, Revision};
///
/// let frame = DecodedFrame {
///     offset: 0,
///     revision: Revision::EthernetGen2,
///     encapsulation: Encapsulation::Ethernet,
///     ts_sec: 1,
///     ts_usec: 500,
///     original_len: 60,
///     captured_len: 2,
///     meta: FrameMeta::default(),
///     payload: vec![0xab, 0xcd],
/// };
/// assert_eq!(frame.to_bytes().len(), META_HEADER_LEN + 2);
/// assert_eq!(serde_json::to_value(&frame)?["payload"], "abcd");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedFrame {
    /// Stream offset of the record header.
    pub offset: u64,
    pub revision: Revision,
    pub encapsulation: Encapsulation,
    /// Capture timestamp, whole seconds of the start counter.
    pub ts_sec: u64,
    /// Capture timestamp, microsecond remainder.
    pub ts_usec: u32,
    /// Declared frame length without FCS.
    pub original_len: u32,
    /// Bytes present in `payload`.
    pub captured_len: u32,
    pub meta: FrameMeta,
    /// MAC-layer payload, FCS removed when present in full.
    #[serde(serialize_with = "serialize_hex", skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<u8>,
}

impl DecodedFrame {
    pub fn is_tx(&self) -> bool {
        self.meta.vendor_flags & vendor_flags::TX != 0
    }

    pub fn is_truncated(&self) -> bool {
        self.meta.vendor_flags & vendor_flags::TRUNCATED != 0
    }

    pub fn has_signature(&self) -> bool {
        self.meta.signature_ts.is_some()
    }

    /// Capture timestamp in nanoseconds since the counter epoch.
    pub fn timestamp_ns(&self) -> i128 {
        self.ts_sec as i128 * 1_000_000_000 + self.ts_usec as i128 * 1_000
    }

    /// Metadata header followed by the payload, as handed to dissectors.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(META_HEADER_LEN + self.payload.len());
        out.extend_from_slice(&self.meta.to_bytes(self.encapsulation));
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Per-frame metadata normalized across hardware revisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameMeta {
    /// Legacy rate in 0.5 Mb/s units, or the MCS index for HT frames.
    pub rate: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modulation: Option<Modulation>,
    /// RSSI for received frames, transmit power for transmitted ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i8>,
    pub channel_flags: u16,
    pub vendor_flags: u16,
    pub vc_id: u16,
    pub flow_id: u32,
    pub sequence: u8,
    /// Signature latency in counter ticks; 0 without a signature.
    pub latency: u32,
    /// End minus start time: microseconds for WLAN, nanoseconds for Ethernet.
    pub duration: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_ts: Option<u32>,
    pub errors: u32,
}

impl FrameMeta {
    /// Serialize the fixed little-endian metadata header.
    pub fn to_bytes(&self, encapsulation: Encapsulation) -> [u8; META_HEADER_LEN] {
        let mut out = [0u8; META_HEADER_LEN];
        out[0] = META_HEADER_VERSION;
        out[1] = encapsulation.tag();
        out[2..4].copy_from_slice(&(META_HEADER_LEN as u16).to_le_bytes());
        out[4..6].copy_from_slice(&self.rate.to_le_bytes());
        out[6] = self.signal.unwrap_or(0) as u8;
        out[7] = self.sequence;
        out[8..10].copy_from_slice(&self.channel_flags.to_le_bytes());
        out[10..12].copy_from_slice(&self.vendor_flags.to_le_bytes());
        out[12..14].copy_from_slice(&self.vc_id.to_le_bytes());
        out[16..20].copy_from_slice(&self.flow_id.to_le_bytes());
        out[20..24].copy_from_slice(&self.errors.to_le_bytes());
        out[24..28].copy_from_slice(&self.latency.to_le_bytes());
        out[28..32].copy_from_slice(&self.signature_ts.unwrap_or(0).to_le_bytes());
        out[32..40].copy_from_slice(&self.duration.to_le_bytes());
        out
    }
}

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    serializer.serialize_str(&hex)
}

/// Aggregated capture report with deterministic ordering.
///
/// # Examples
/// ```
/// use vwrcap_core::make_stub_report;
///
/// let report = make_stub_report("capture.vwr", 123);
/// assert_eq!(report.report_version, vwrcap_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp of the last frame, or the epoch.
    pub generated_at: String,

    /// Input capture metadata.
    pub input: InputInfo,
    /// Detected hardware revision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<Revision>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// Latency over frames carrying a signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<LatencySummary>,
    /// Per-flow summaries sorted by VC id then flow id.
    pub flows: Vec<FlowSummary>,
    /// Transport mix, Ethernet captures only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethernet: Option<EthernetSummary>,
    /// Per-modulation counts, WLAN captures only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phy: Vec<PhySummary>,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use vwrcap_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "vwrcap".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "vwrcap");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Input capture metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Frame counters for the whole capture.
///
/// # Examples
/// ```
/// use vwrcap_core::CaptureSummary;
///
/// let summary = CaptureSummary {
///     frames_total: 10,
///     ..CaptureSummary::default()
/// };
/// assert_eq!(summary.rx_frames + summary.tx_frames, 0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureSummary {
    pub frames_total: u64,
    pub rx_frames: u64,
    pub tx_frames: u64,
    /// Frames whose declared length exceeded the record body.
    pub truncated_frames: u64,
    pub fcs_errors: u64,
    pub decrypt_errors: u64,
    pub retry_errors: u64,
    pub signature_frames: u64,
    /// RFC3339 timestamp of the earliest frame (if any).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the latest frame (if any).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Latency statistics in hardware counter ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub samples: u64,
    pub min: u32,
    pub max: u32,
    pub mean: f64,
}

/// Per-flow summary keyed by VC id and flow id.
///
/// # Examples
/// ```
/// use vwrcap_core::FlowSummary;
///
/// let flow = FlowSummary {
///     vc_id: 1,
///     flow_id: 0x1234,
///     frames: 3,
///     bytes: 180,
///     lost: 0,
///     latency: None,
/// };
/// assert_eq!(flow.frames, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSummary {
    pub vc_id: u16,
    pub flow_id: u32,
    pub frames: u64,
    /// Sum of captured lengths.
    pub bytes: u64,
    /// Sequence numbers skipped, counted modulo 256.
    pub lost: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<LatencySummary>,
}

/// Network and transport mix of Ethernet payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthernetSummary {
    pub ipv4: u64,
    pub ipv6: u64,
    pub tcp: u64,
    pub udp: u64,
    /// Frames without a recognised IP transport, including unparsable ones.
    pub other: u64,
}

/// Frame count and mean PHY rate for one modulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhySummary {
    pub modulation: Modulation,
    pub frames: u64,
    /// Mean nominal bit rate in Mb/s over frames with a known rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_rate_mbps: Option<f64>,
}

/// Build a stub report with base fields filled and empty aggregates.
///
/// # Examples
/// ```
/// use vwrcap_core::make_stub_report;
///
/// let report = make_stub_report("capture.vwr", 123);
/// assert_eq!(report.report_version, vwrcap_core::REPORT_VERSION);
/// assert!(report.flows.is_empty());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "vwrcap".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        revision: None,
        capture_summary: None,
        latency: None,
        flows: vec![],
        ethernet: None,
        phy: vec![],
    }
}
