pub const SIGNATURE_LEN: usize = 16;
pub const MAGIC: u8 = 0xdd;
pub const MAGIC_OFFSET: usize = 0;

pub const FORMAT_MARKER_OFFSET: usize = 15;
pub const COMPACT_MARKER: u8 = 0xe2;

pub const FLOW_ID_RANGE: std::ops::Range<usize> = 1..4;
pub const COMPACT_SEQUENCE_OFFSET: usize = 4;
pub const COMPACT_TIMESTAMP_RANGE: std::ops::Range<usize> = 5..9;
pub const EXTENDED_SEQUENCE_OFFSET: usize = 5;
pub const EXTENDED_TIMESTAMP_RANGE: std::ops::Range<usize> = 8..12;

pub const SCAN_WINDOW: usize = 64;

pub const WLAN_MAC_HEADER_LEN: usize = 24;
pub const WLAN_QOS_CONTROL_LEN: usize = 2;
pub const SNAP_HEADER_LEN: usize = 8;
pub const ETHERNET_HEADER_LEN: usize = 14;
pub const VLAN_TAG_LEN: usize = 4;

/// IP header plus transport header in front of the signature.
pub const TCP_SIGNATURE_OFFSET: usize = 40;
pub const UDP_SIGNATURE_OFFSET: usize = 28;
pub const ICMP_SIGNATURE_OFFSET: usize = 24;
pub const IGMP_SIGNATURE_OFFSET: usize = 32;
pub const IP_SIGNATURE_OFFSET: usize = 20;

pub const ROLLOVER_THRESHOLD: u32 = 1 << 28;
