use serde::{Deserialize, Serialize};

use crate::protocols::plcp::PlcpLayout;

pub const RECORD_HEADER_LEN: usize = 16;
pub const MAX_BODY_LEN: usize = 32 * 1024;

pub const COMMAND_OFFSET: usize = 0;
pub const FRAME_LENGTH_RANGE: std::ops::Range<usize> = 10..12;
pub const CONTROL_B_LENGTH_RANGE: std::ops::Range<usize> = 14..16;

pub const COMMAND_RX: u8 = 0x21;
pub const COMMAND_TX: u8 = 0x31;
pub const COMMAND_DIRECTION_MASK: u8 = 0xf0;
pub const COMMAND_TX_NIBBLE: u8 = 0x30;
pub const CONTROL_A_COMMANDS: [u8; 3] = [0xc1, 0x8b, 0xbb];
pub const CONTROL_B_COMMAND: u8 = 0xfe;

pub const FCS_LEN: usize = 4;
pub const TIMESTAMP_LEN: usize = 8;
pub const FLOW_ID_LEN: usize = 3;

pub const WLAN_TICK_NS: u64 = 1_000;
pub const ETHERNET_TICK_NS: u64 = 1;

/// Round a payload length up to the next 4-byte boundary.
pub const fn pad4(len: usize) -> usize {
    (len + 3) & !3
}

/// Link-layer encapsulation of decoded frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encapsulation {
    Wlan,
    Ethernet,
}

impl Encapsulation {
    /// Tag written into the metadata header.
    pub const fn tag(self) -> u8 {
        match self {
            Encapsulation::Wlan => 1,
            Encapsulation::Ethernet => 2,
        }
    }
}

/// Capture hardware revision. Each one has its own record trailer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Revision {
    WlanGen1,
    WlanGen2,
    EthernetGen1,
    EthernetGen2,
}

impl Revision {
    /// Revisions in detection order.
    pub const ALL: [Revision; 4] = [
        Revision::WlanGen1,
        Revision::WlanGen2,
        Revision::EthernetGen1,
        Revision::EthernetGen2,
    ];

    pub const fn encapsulation(self) -> Encapsulation {
        match self {
            Revision::WlanGen1 | Revision::WlanGen2 => Encapsulation::Wlan,
            Revision::EthernetGen1 | Revision::EthernetGen2 => Encapsulation::Ethernet,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Revision::WlanGen1 => "wlan-gen1",
            Revision::WlanGen2 => "wlan-gen2",
            Revision::EthernetGen1 => "ethernet-gen1",
            Revision::EthernetGen2 => "ethernet-gen2",
        }
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Masked field inside a single trailer byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub offset: usize,
    pub mask: u8,
}

impl BitField {
    pub const fn new(offset: usize, mask: u8) -> Self {
        Self { offset, mask }
    }

    pub const fn shift(&self) -> u32 {
        self.mask.trailing_zeros()
    }
}

/// Bits of the trailer error word. Zero means the revision does not report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorBits {
    pub fcs: u32,
    pub decrypt: u32,
    pub retry: u32,
}

/// Bits of the trailer frame-type word. Zero means the revision does not report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTypeBits {
    pub ip: u32,
    pub tcp: u32,
    pub udp: u32,
    pub icmp: u32,
    pub igmp: u32,
    pub qos: u32,
    pub vlan: u32,
    pub wep: u32,
    pub tkip: u32,
    pub ccmp: u32,
    pub band_5ghz: u32,
}

impl FrameTypeBits {
    const NONE: Self = Self {
        ip: 0,
        tcp: 0,
        udp: 0,
        icmp: 0,
        igmp: 0,
        qos: 0,
        vlan: 0,
        wep: 0,
        tkip: 0,
        ccmp: 0,
        band_5ghz: 0,
    };
}

/// Returns true when `bit` is reported by the revision and set in `word`.
pub const fn has_bit(word: u32, bit: u32) -> bool {
    bit != 0 && word & bit != 0
}

/// Byte offsets and masks of every field the decoder reads from a frame record.
///
/// Offsets are relative to the start of the statistics trailer, which always
/// occupies the last `stats_len` bytes of a frame record body. One layout is
/// selected per stream and shared read-only by every decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub revision: Revision,
    pub plcp: Option<PlcpLayout>,
    pub stats_len: usize,
    pub msdu_length: usize,
    pub valid: BitField,
    pub modulation: Option<BitField>,
    pub signal: Option<usize>,
    pub sequence: usize,
    pub vc_id: usize,
    pub flow_id: usize,
    pub errors: usize,
    pub error_bits: ErrorBits,
    pub frame_type: usize,
    pub frame_type_bits: FrameTypeBits,
    pub start_time: usize,
    pub end_time: usize,
}

impl FieldLayout {
    pub fn for_revision(revision: Revision) -> &'static FieldLayout {
        match revision {
            Revision::WlanGen1 => &LAYOUTS[0],
            Revision::WlanGen2 => &LAYOUTS[1],
            Revision::EthernetGen1 => &LAYOUTS[2],
            Revision::EthernetGen2 => &LAYOUTS[3],
        }
    }

    /// All known layouts, in detection order.
    pub fn all() -> &'static [FieldLayout; 4] {
        &LAYOUTS
    }

    pub const fn encapsulation(&self) -> Encapsulation {
        self.revision.encapsulation()
    }

    /// Length of the PLCP prefix in front of the MAC payload.
    pub const fn plcp_len(&self) -> usize {
        match self.plcp {
            Some(plcp) => plcp.len,
            None => 0,
        }
    }

    /// Bytes of a frame record not counted by the declared payload length.
    pub const fn fixed_len(&self) -> usize {
        self.plcp_len() + self.stats_len
    }

    /// Nanoseconds per tick of the hardware timestamp counter.
    pub const fn tick_ns(&self) -> u64 {
        match self.encapsulation() {
            Encapsulation::Wlan => WLAN_TICK_NS,
            Encapsulation::Ethernet => ETHERNET_TICK_NS,
        }
    }
}

pub const WLAN_GEN1: FieldLayout = FieldLayout {
    revision: Revision::WlanGen1,
    plcp: Some(PlcpLayout {
        len: 6,
        legacy_rate_offset: 0,
        ht_sig_mixed_offset: 0,
        ht_sig_greenfield_offset: 0,
    }),
    stats_len: 60,
    msdu_length: 0,
    valid: BitField::new(2, 0x01),
    modulation: Some(BitField::new(3, 0x03)),
    signal: Some(4),
    sequence: 5,
    vc_id: 6,
    flow_id: 8,
    errors: 12,
    error_bits: ErrorBits {
        fcs: 0x0001,
        decrypt: 0x0080,
        retry: 0x0040,
    },
    frame_type: 16,
    frame_type_bits: FrameTypeBits {
        ip: 0x0001,
        tcp: 0x0002,
        udp: 0x0004,
        icmp: 0x0008,
        igmp: 0x0010,
        qos: 0x0020,
        wep: 0x0100,
        tkip: 0x0200,
        ccmp: 0x0400,
        band_5ghz: 0x1000,
        ..FrameTypeBits::NONE
    },
    start_time: 20,
    end_time: 28,
};

pub const WLAN_GEN2: FieldLayout = FieldLayout {
    revision: Revision::WlanGen2,
    plcp: Some(PlcpLayout {
        len: 12,
        legacy_rate_offset: 0,
        ht_sig_mixed_offset: 3,
        ht_sig_greenfield_offset: 0,
    }),
    stats_len: 48,
    msdu_length: 34,
    valid: BitField::new(30, 0x80),
    modulation: Some(BitField::new(31, 0x30)),
    signal: Some(32),
    sequence: 26,
    vc_id: 24,
    flow_id: 27,
    errors: 16,
    error_bits: ErrorBits {
        fcs: 0x0002,
        decrypt: 0x0080,
        retry: 0x0040,
    },
    frame_type: 20,
    frame_type_bits: FrameTypeBits {
        ip: 0x0010,
        tcp: 0x0020,
        udp: 0x0040,
        icmp: 0x0080,
        igmp: 0x0100,
        qos: 0x0200,
        wep: 0x1000,
        tkip: 0x2000,
        ccmp: 0x4000,
        band_5ghz: 0x8000,
        ..FrameTypeBits::NONE
    },
    start_time: 0,
    end_time: 8,
};

pub const ETHERNET_GEN1: FieldLayout = FieldLayout {
    revision: Revision::EthernetGen1,
    plcp: None,
    stats_len: 56,
    msdu_length: 0,
    valid: BitField::new(16, 0x01),
    modulation: None,
    signal: None,
    sequence: 7,
    vc_id: 2,
    flow_id: 4,
    errors: 8,
    error_bits: ErrorBits {
        fcs: 0x0002,
        decrypt: 0,
        retry: 0,
    },
    frame_type: 12,
    frame_type_bits: FrameTypeBits {
        ip: 0x0001,
        tcp: 0x0002,
        udp: 0x0004,
        icmp: 0x0008,
        igmp: 0x0010,
        vlan: 0x0040,
        ..FrameTypeBits::NONE
    },
    start_time: 24,
    end_time: 32,
};

pub const ETHERNET_GEN2: FieldLayout = FieldLayout {
    revision: Revision::EthernetGen2,
    plcp: None,
    stats_len: 52,
    msdu_length: 32,
    valid: BitField::new(30, 0x02),
    modulation: None,
    signal: None,
    sequence: 29,
    vc_id: 24,
    flow_id: 26,
    errors: 20,
    error_bits: ErrorBits {
        fcs: 0x0001,
        decrypt: 0,
        retry: 0,
    },
    frame_type: 16,
    frame_type_bits: FrameTypeBits {
        ip: 0x0100,
        tcp: 0x0200,
        udp: 0x0400,
        icmp: 0x0800,
        igmp: 0x1000,
        vlan: 0x4000,
        ..FrameTypeBits::NONE
    },
    start_time: 0,
    end_time: 8,
};

static LAYOUTS: [FieldLayout; 4] = [WLAN_GEN1, WLAN_GEN2, ETHERNET_GEN1, ETHERNET_GEN2];
