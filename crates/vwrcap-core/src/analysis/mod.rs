use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::info;

use crate::source::vwr::VwrError;
use crate::source::{PacketSource, SourceError, VwrFileSource};
use crate::{
    CaptureSummary, DEFAULT_GENERATED_AT, DecodedFrame, Encapsulation, EthernetSummary, Report,
    error_flags, make_stub_report,
};

mod ethernet;
mod flows;
mod phy;

use ethernet::add_ethernet_frame;
use flows::{FlowKey, FlowStats, LatencyStats, add_flow_frame, build_flow_summaries};
use phy::{add_phy_frame, build_phy_summaries};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

impl From<VwrError> for AnalysisError {
    fn from(value: VwrError) -> Self {
        AnalysisError::Source(SourceError::from(value))
    }
}

/// Decode every frame of a capture file and summarize it.
///
/// # Errors
/// Returns `AnalysisError::Source` when the file is not a capture log or a
/// record is malformed, and `AnalysisError::Io` for file system errors.
pub fn analyze_vwr_file(path: &Path) -> Result<Report, AnalysisError> {
    let source = VwrFileSource::open(path)?;
    analyze_source(path, source)
}

pub fn analyze_source<S: PacketSource>(
    path: &Path,
    mut source: S,
) -> Result<Report, AnalysisError> {
    let mut capture = CaptureSummary::default();
    let mut revision = None;
    let mut first_ts = None;
    let mut last_ts = None;
    let mut latency = LatencyStats::default();
    let mut flow_stats: HashMap<FlowKey, FlowStats> = HashMap::new();
    let mut phy_stats = BTreeMap::new();
    let mut ethernet: Option<EthernetSummary> = None;

    while let Some(frame) = source.next_frame()? {
        revision.get_or_insert(frame.revision);
        update_ts_bounds(&mut first_ts, &mut last_ts, frame.timestamp_ns());
        count_frame(&mut capture, &frame);
        if frame.has_signature() {
            latency.add(frame.meta.latency);
        }
        add_flow_frame(&mut flow_stats, &frame);
        match frame.encapsulation {
            Encapsulation::Wlan => add_phy_frame(&mut phy_stats, &frame),
            Encapsulation::Ethernet => {
                add_ethernet_frame(ethernet.get_or_insert_with(Default::default), &frame.payload)
            }
        }
    }

    let mut report = make_stub_report(&path.display().to_string(), path.metadata()?.len());
    capture.time_start = ts_to_rfc3339(first_ts);
    capture.time_end = ts_to_rfc3339(last_ts);
    report.generated_at = capture
        .time_end
        .clone()
        .or(capture.time_start.clone())
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    info!(
        frames = capture.frames_total,
        flows = flow_stats.len(),
        "capture analysed"
    );

    report.revision = revision;
    report.capture_summary = Some(capture);
    report.latency = latency.summary();
    report.flows = build_flow_summaries(flow_stats);
    report.ethernet = ethernet;
    report.phy = build_phy_summaries(phy_stats);
    Ok(report)
}

fn count_frame(capture: &mut CaptureSummary, frame: &DecodedFrame) {
    capture.frames_total += 1;
    if frame.is_tx() {
        capture.tx_frames += 1;
    } else {
        capture.rx_frames += 1;
    }
    if frame.is_truncated() {
        capture.truncated_frames += 1;
    }
    if frame.has_signature() {
        capture.signature_frames += 1;
    }
    let errors = frame.meta.errors;
    if errors & error_flags::FCS != 0 {
        capture.fcs_errors += 1;
    }
    if errors & error_flags::DECRYPT != 0 {
        capture.decrypt_errors += 1;
    }
    if errors & error_flags::RETRY != 0 {
        capture.retry_errors += 1;
    }
}

fn update_ts_bounds(first: &mut Option<i128>, last: &mut Option<i128>, ts: i128) {
    if first.is_none_or(|existing| ts < existing) {
        *first = Some(ts);
    }
    if last.is_none_or(|existing| ts > existing) {
        *last = Some(ts);
    }
}

fn ts_to_rfc3339(ts: Option<i128>) -> Option<String> {
    OffsetDateTime::from_unix_timestamp_nanos(ts?)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
