/// Position of rate-bearing bytes inside a revision's PLCP prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlcpLayout {
    pub len: usize,
    pub legacy_rate_offset: usize,
    pub ht_sig_mixed_offset: usize,
    pub ht_sig_greenfield_offset: usize,
}

pub const MODULATION_CCK: u8 = 0;
pub const MODULATION_OFDM: u8 = 1;
pub const MODULATION_HT_MIXED: u8 = 2;
pub const MODULATION_HT_GREENFIELD: u8 = 3;

pub const OFDM_RATE_MASK: u8 = 0x0f;

/// 802.11a RATE field to rate in 0.5 Mb/s units.
pub const OFDM_RATES: [(u8, u16); 8] = [
    (0x0b, 12),
    (0x0f, 18),
    (0x0a, 24),
    (0x0e, 36),
    (0x09, 48),
    (0x0d, 72),
    (0x08, 96),
    (0x0c, 108),
];

/// 802.11b SIGNAL field to rate in 0.5 Mb/s units.
pub const CCK_RATES: [(u8, u16); 4] = [(0x0a, 2), (0x14, 4), (0x37, 11), (0x6e, 22)];

pub const HT_MCS_MASK: u8 = 0x7f;
pub const HT_CBW40_BIT: u8 = 0x80;
pub const HT_SIG2_DISTANCE: usize = 3;
pub const HT_SHORT_GI_BIT: u8 = 0x80;

pub const HT_MAX_TABLE_MCS: u8 = 31;
pub const HT_MCS_PER_STREAM: u8 = 8;
/// Single-stream 20 MHz long-GI rates in Mb/s for MCS 0..=7.
pub const HT20_STREAM_RATES_MBPS: [f64; 8] = [6.5, 13.0, 19.5, 26.0, 39.0, 52.0, 58.5, 65.0];
pub const HT40_DATA_SUBCARRIERS: f64 = 108.0;
pub const HT20_DATA_SUBCARRIERS: f64 = 52.0;
pub const HT_SHORT_GI_FACTOR: f64 = 10.0 / 9.0;

pub const CHANNEL_CCK: u16 = 0x0020;
pub const CHANNEL_OFDM: u16 = 0x0040;
pub const CHANNEL_2GHZ: u16 = 0x0080;
pub const CHANNEL_5GHZ: u16 = 0x0100;
