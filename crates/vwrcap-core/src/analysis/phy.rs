use std::collections::BTreeMap;

use crate::protocols::plcp::ht_rate_mbps;
use crate::{DecodedFrame, Modulation, PhySummary, vendor_flags};

#[derive(Debug, Default)]
pub(crate) struct PhyStats {
    frames: u64,
    rated: u64,
    rate_sum: f64,
}

/// Nominal bit rate of a decoded WLAN frame in Mb/s, when known.
fn rate_mbps(frame: &DecodedFrame, modulation: Modulation) -> Option<f64> {
    let meta = &frame.meta;
    if modulation.is_ht() {
        let mcs = u8::try_from(meta.rate).ok()?;
        ht_rate_mbps(
            mcs,
            meta.vendor_flags & vendor_flags::CBW40 != 0,
            meta.vendor_flags & vendor_flags::SHORT_GI != 0,
        )
    } else if meta.rate == 0 {
        None
    } else {
        Some(meta.rate as f64 / 2.0)
    }
}

pub(crate) fn add_phy_frame(stats: &mut BTreeMap<Modulation, PhyStats>, frame: &DecodedFrame) {
    let modulation = match frame.meta.modulation {
        Some(modulation) => modulation,
        None => return,
    };
    let entry = stats.entry(modulation).or_default();
    entry.frames += 1;
    if let Some(rate) = rate_mbps(frame, modulation) {
        entry.rated += 1;
        entry.rate_sum += rate;
    }
}

pub(crate) fn build_phy_summaries(stats: BTreeMap<Modulation, PhyStats>) -> Vec<PhySummary> {
    stats
        .into_iter()
        .map(|(modulation, stats)| PhySummary {
            modulation,
            frames: stats.frames,
            mean_rate_mbps: (stats.rated > 0).then(|| stats.rate_sum / stats.rated as f64),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{add_phy_frame, build_phy_summaries};
    use crate::{DecodedFrame, Encapsulation, FrameMeta, Modulation, Revision, vendor_flags};
    use std::collections::BTreeMap;

    fn frame(modulation: Modulation, rate: u16, vendor: u16) -> DecodedFrame {
        DecodedFrame {
            offset: 0,
            revision: Revision::WlanGen2,
            encapsulation: Encapsulation::Wlan,
            ts_sec: 0,
            ts_usec: 0,
            original_len: 0,
            captured_len: 0,
            meta: FrameMeta {
                rate,
                modulation: Some(modulation),
                vendor_flags: vendor,
                ..FrameMeta::default()
            },
            payload: Vec::new(),
        }
    }

    #[test]
    fn legacy_rates_average_in_mbps() {
        let mut stats = BTreeMap::new();
        add_phy_frame(&mut stats, &frame(Modulation::Ofdm, 12, 0));
        add_phy_frame(&mut stats, &frame(Modulation::Ofdm, 108, 0));
        add_phy_frame(&mut stats, &frame(Modulation::Ofdm, 0, 0));
        let summary = build_phy_summaries(stats);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].frames, 3);
        assert_eq!(summary[0].mean_rate_mbps, Some(30.0));
    }

    #[test]
    fn ht_rates_use_mcs_table() {
        let mut stats = BTreeMap::new();
        add_phy_frame(&mut stats, &frame(Modulation::HtMixed, 7, vendor_flags::HT));
        add_phy_frame(&mut stats, &frame(Modulation::Cck, 22, 0));
        let summary = build_phy_summaries(stats);
        assert_eq!(summary[0].modulation, Modulation::Cck);
        assert_eq!(summary[0].mean_rate_mbps, Some(11.0));
        assert_eq!(summary[1].modulation, Modulation::HtMixed);
        assert_eq!(summary[1].mean_rate_mbps, Some(65.0));
    }

    #[test]
    fn frames_without_modulation_are_skipped() {
        let mut stats = BTreeMap::new();
        let mut ethernet = frame(Modulation::Ofdm, 0, 0);
        ethernet.meta.modulation = None;
        add_phy_frame(&mut stats, &ethernet);
        assert!(build_phy_summaries(stats).is_empty());
    }
}
