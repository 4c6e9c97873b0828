use std::collections::HashMap;

use crate::{DecodedFrame, FlowSummary, LatencySummary};

/// Sequence gaps at or above this are taken as reordering, not loss.
const REORDER_GAP: u8 = 128;

#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub(crate) struct FlowKey {
    pub vc_id: u16,
    pub flow_id: u32,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct LatencyStats {
    samples: u64,
    min: u32,
    max: u32,
    sum: u64,
}

impl LatencyStats {
    pub fn add(&mut self, latency: u32) {
        if self.samples == 0 {
            self.min = latency;
            self.max = latency;
        } else {
            self.min = self.min.min(latency);
            self.max = self.max.max(latency);
        }
        self.samples += 1;
        self.sum += latency as u64;
    }

    pub fn summary(&self) -> Option<LatencySummary> {
        if self.samples == 0 {
            return None;
        }
        Some(LatencySummary {
            samples: self.samples,
            min: self.min,
            max: self.max,
            mean: self.sum as f64 / self.samples as f64,
        })
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct FlowStats {
    pub frames: u64,
    pub bytes: u64,
    pub lost: u64,
    pub last_seq: Option<u8>,
    pub latency: LatencyStats,
}

pub(crate) fn add_flow_frame(stats: &mut HashMap<FlowKey, FlowStats>, frame: &DecodedFrame) {
    let key = FlowKey {
        vc_id: frame.meta.vc_id,
        flow_id: frame.meta.flow_id,
    };
    let entry = stats.entry(key).or_default();
    entry.frames += 1;
    entry.bytes += frame.captured_len as u64;
    if frame.has_signature() {
        entry.latency.add(frame.meta.latency);
    }

    let seq = frame.meta.sequence;
    if let Some(last) = entry.last_seq {
        let gap = seq.wrapping_sub(last.wrapping_add(1));
        if gap > 0 && gap < REORDER_GAP {
            entry.lost += gap as u64;
        }
    }
    entry.last_seq = Some(seq);
}

pub(crate) fn build_flow_summaries(stats: HashMap<FlowKey, FlowStats>) -> Vec<FlowSummary> {
    let mut flows: Vec<(FlowKey, FlowStats)> = stats.into_iter().collect();
    flows.sort_by_key(|(key, _)| *key);
    flows
        .into_iter()
        .map(|(key, stats)| FlowSummary {
            vc_id: key.vc_id,
            flow_id: key.flow_id,
            frames: stats.frames,
            bytes: stats.bytes,
            lost: stats.lost,
            latency: stats.latency.summary(),
        })
        .collect()
}
