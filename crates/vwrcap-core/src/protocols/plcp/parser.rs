use serde::{Deserialize, Serialize};

use super::error::PlcpError;
use super::layout::{self, PlcpLayout};
use super::reader::PlcpReader;

/// Modulation family reported by the capture hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modulation {
    Cck,
    Ofdm,
    HtMixed,
    HtGreenfield,
}

impl Modulation {
    pub fn from_code(value: u8) -> Result<Self, PlcpError> {
        match value {
            layout::MODULATION_CCK => Ok(Modulation::Cck),
            layout::MODULATION_OFDM => Ok(Modulation::Ofdm),
            layout::MODULATION_HT_MIXED => Ok(Modulation::HtMixed),
            layout::MODULATION_HT_GREENFIELD => Ok(Modulation::HtGreenfield),
            value => Err(PlcpError::UnknownModulation { value }),
        }
    }

    pub fn is_ht(self) -> bool {
        matches!(self, Modulation::HtMixed | Modulation::HtGreenfield)
    }
}

/// Decoded PHY rate.
///
/// `rate` is in 0.5 Mb/s units for legacy frames and carries the MCS index
/// for HT frames. Unknown legacy rate codes decode to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhyRate {
    pub modulation: Modulation,
    pub rate: u16,
    pub cbw40: bool,
    pub short_gi: bool,
}

impl PhyRate {
    pub fn is_ht(&self) -> bool {
        self.modulation.is_ht()
    }
}

/// Decode the PHY rate from a PLCP prefix.
///
/// # Errors
/// Returns `PlcpError::TooShort` when the prefix is shorter than the bytes the
/// modulation needs.
pub fn decode_plcp(
    plcp: &[u8],
    modulation: Modulation,
    plcp_layout: &PlcpLayout,
) -> Result<PhyRate, PlcpError> {
    let reader = PlcpReader::new(plcp);
    let legacy = |rate| PhyRate {
        modulation,
        rate,
        cbw40: false,
        short_gi: false,
    };

    match modulation {
        Modulation::Cck => {
            let signal = reader.read_u8(plcp_layout.legacy_rate_offset)?;
            Ok(legacy(lookup(&layout::CCK_RATES, signal)))
        }
        Modulation::Ofdm => {
            let code = reader.read_ofdm_rate_code(plcp_layout.legacy_rate_offset)?;
            Ok(legacy(lookup(&layout::OFDM_RATES, code)))
        }
        Modulation::HtMixed | Modulation::HtGreenfield => {
            let offset = if modulation == Modulation::HtMixed {
                plcp_layout.ht_sig_mixed_offset
            } else {
                plcp_layout.ht_sig_greenfield_offset
            };
            let (mcs, cbw40, short_gi) = reader.read_ht_sig(offset)?;
            Ok(PhyRate {
                modulation,
                rate: mcs as u16,
                cbw40,
                short_gi,
            })
        }
    }
}

fn lookup(table: &[(u8, u16)], code: u8) -> u16 {
    table
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, rate)| *rate)
        .unwrap_or(0)
}

/// Radio channel flags for a decoded frame.
pub fn channel_flags(modulation: Modulation, band_5ghz: bool) -> u16 {
    match modulation {
        Modulation::Cck => layout::CHANNEL_CCK | layout::CHANNEL_2GHZ,
        _ if band_5ghz => layout::CHANNEL_OFDM | layout::CHANNEL_5GHZ,
        _ => layout::CHANNEL_OFDM | layout::CHANNEL_2GHZ,
    }
}

/// Nominal HT bit rate in Mb/s for MCS 0..=31.
///
/// # Examples
/// ```
/// use vwrcap_core::protocols::plcp::ht_rate_mbps;
///
/// assert_eq!(ht_rate_mbps(7, false, false), Some(65.0));
/// assert_eq!(ht_rate_mbps(32, false, false), None);
/// ```
pub fn ht_rate_mbps(mcs: u8, cbw40: bool, short_gi: bool) -> Option<f64> {
    if mcs > layout::HT_MAX_TABLE_MCS {
        return None;
    }
    let streams = (mcs / layout::HT_MCS_PER_STREAM + 1) as f64;
    let mut rate = layout::HT20_STREAM_RATES_MBPS[(mcs % layout::HT_MCS_PER_STREAM) as usize] * streams;
    if cbw40 {
        rate = rate * layout::HT40_DATA_SUBCARRIERS / layout::HT20_DATA_SUBCARRIERS;
    }
    if short_gi {
        rate *= layout::HT_SHORT_GI_FACTOR;
    }
    Some(rate)
}
