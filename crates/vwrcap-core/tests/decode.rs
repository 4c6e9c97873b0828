mod common;

use std::io::Cursor;

use common::{FrameBuilder, compact_signature, control_record, extended_signature, record};
use etherparse::PacketBuilder;
use vwrcap_core::protocols::plcp::layout as plcp;
use vwrcap_core::protocols::signature::layout as sig;
use vwrcap_core::source::vwr::detect::{candidate_layouts, match_layout};
use vwrcap_core::source::vwr::layout::{
    self, ETHERNET_GEN1, ETHERNET_GEN2, FieldLayout, WLAN_GEN1, WLAN_GEN2,
};
use vwrcap_core::source::vwr::{VwrError, decode_frame, detect_revision};
use vwrcap_core::{
    Encapsulation, META_HEADER_LEN, Modulation, PacketSource, Revision, SourceError,
    VwrFileSource, error_flags, vendor_flags,
};

fn decode(builder: &FrameBuilder) -> vwrcap_core::DecodedFrame {
    decode_frame(
        &builder.body(),
        builder.command == layout::COMMAND_TX,
        builder.layout,
        0,
    )
    .expect("decode frame")
}

fn udp_frame(layout: &'static FieldLayout, mac: Vec<u8>) -> FrameBuilder {
    let bits = &layout.frame_type_bits;
    let mut builder = FrameBuilder::new(layout, mac).flow(3, 0x00_1234, 9);
    builder.frame_type = bits.ip | bits.udp;
    builder
}

#[test]
fn control_record_then_wlan_frame() {
    let mut frame = FrameBuilder::new(&WLAN_GEN2, vec![0xaa; 64]);
    frame.modulation = plcp::MODULATION_OFDM;
    frame.plcp = vec![0x0b];

    let control = control_record(8);
    let mut data = control.clone();
    data.extend(frame.record());

    let mut source = VwrFileSource::from_reader(Cursor::new(data)).expect("open");
    assert_eq!(source.revision(), Revision::WlanGen2);

    let decoded = source.next_frame().expect("decode").expect("one frame");
    assert_eq!(decoded.offset, control.len() as u64);
    assert_eq!(decoded.meta.rate, 12);
    assert_eq!(decoded.meta.modulation, Some(Modulation::Ofdm));
    assert_eq!(decoded.meta.latency, 0);
    assert_eq!(decoded.captured_len, 60);
    assert_eq!(decoded.original_len, 60);
    assert_eq!(decoded.payload, vec![0xaa; 60]);
    assert!(!decoded.is_tx());
    assert!(source.next_frame().expect("eof").is_none());
}

#[test]
fn every_layout_is_detected_as_itself_only() {
    let lengths = (0usize..16).chain([16, 17, 61, 64, 255, 1500]);
    for payload_len in lengths {
        for owner in FieldLayout::all() {
            let frame = FrameBuilder::new(owner, vec![0x5a; payload_len]);
            let body = frame.body();
            assert_eq!(
                match_layout(&body).map(|l| l.revision),
                Some(owner.revision),
                "{} len {payload_len}",
                owner.revision
            );

            let candidates = candidate_layouts(&body);
            assert!(candidates.iter().any(|l| l.revision == owner.revision));
            if payload_len >= 16 {
                assert_eq!(candidates.len(), 1, "{} len {payload_len}", owner.revision);
            }

            let mut cursor = Cursor::new(frame.record());
            assert_eq!(
                detect_revision(&mut cursor).expect("detect"),
                Some(owner.revision),
                "{} len {payload_len}",
                owner.revision
            );
        }
    }
}

#[test]
fn detection_skips_leading_control_records() {
    let mut data = control_record(12);
    data.extend(record(layout::CONTROL_B_COMMAND, &[]));
    data.extend(FrameBuilder::new(&ETHERNET_GEN1, vec![0; 80]).record());
    let mut cursor = Cursor::new(data);
    assert_eq!(
        detect_revision(&mut cursor).expect("detect"),
        Some(Revision::EthernetGen1)
    );
    assert_eq!(cursor.position(), 0);
}

#[test]
fn oversized_record_is_malformed() {
    let first = FrameBuilder::new(&ETHERNET_GEN2, vec![0; 64]).record();
    let mut data = first.clone();
    let mut header = vec![0u8; layout::RECORD_HEADER_LEN];
    header[0] = layout::COMMAND_RX;
    header[layout::FRAME_LENGTH_RANGE].copy_from_slice(&40_000u16.to_be_bytes());
    data.extend(header);

    let mut source = VwrFileSource::from_reader(Cursor::new(data.clone())).expect("open");
    source.next_frame().expect("first frame");
    let err = source.next_frame().unwrap_err();
    assert!(matches!(
        err,
        VwrError::InvalidRecordLength { offset, length: 40_000, .. } if offset == first.len() as u64
    ));

    let mut source = VwrFileSource::from_reader(Cursor::new(data)).expect("open");
    PacketSource::next_frame(&mut source).expect("first frame");
    let err = PacketSource::next_frame(&mut source).unwrap_err();
    assert!(matches!(err, SourceError::Malformed { .. }));
}

#[test]
fn short_body_is_an_error_not_eof() {
    let mut data = FrameBuilder::new(&ETHERNET_GEN2, vec![0; 64]).record();
    let mut second = FrameBuilder::new(&ETHERNET_GEN2, vec![0; 64]).record();
    second.truncate(layout::RECORD_HEADER_LEN + 10);
    data.extend(second);

    let mut source = VwrFileSource::from_reader(Cursor::new(data)).expect("open");
    source.next_frame().expect("first frame");
    let err = source.next_frame().unwrap_err();
    assert!(matches!(err, VwrError::ShortBody { actual: 10, .. }));
}

#[test]
fn truncated_payload_is_clamped_and_flagged() {
    let builder = FrameBuilder::new(&ETHERNET_GEN1, (0..100).collect()).truncate_to(40);
    let first = decode(&builder);
    assert_eq!(first.original_len, 96);
    assert_eq!(first.captured_len, 36);
    assert_eq!(first.payload, (0..36).collect::<Vec<u8>>());
    assert!(first.is_truncated());

    assert_eq!(first, decode(&builder));
}

#[test]
fn tiny_payload_keeps_all_bytes() {
    let decoded = decode(&FrameBuilder::new(&ETHERNET_GEN2, vec![1, 2, 3]));
    assert_eq!(decoded.original_len, 3);
    assert_eq!(decoded.captured_len, 3);
    assert_eq!(decoded.payload, vec![1, 2, 3]);
}

#[test]
fn ethernet_udp_signature_latency() {
    let signature = extended_signature(0x00_1234, 9, 4_200);
    let mut udp_payload = signature.to_vec();
    udp_payload.extend_from_slice(&[0u8; 20]);
    let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
        .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
        .udp(5000, 5001);
    let mut packet = Vec::with_capacity(builder.size(udp_payload.len()));
    builder.write(&mut packet, &udp_payload).expect("build packet");

    let mut mac = packet.clone();
    mac.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    let mut frame = udp_frame(&ETHERNET_GEN1, mac);
    frame.start = 5_000;
    frame.end = 5_640;

    let decoded = decode(&frame);
    assert_eq!(decoded.encapsulation, Encapsulation::Ethernet);
    assert_eq!(decoded.payload, packet);
    assert_eq!(decoded.meta.signature_ts, Some(4_200));
    assert_eq!(decoded.meta.latency, 800);
    assert_eq!(decoded.meta.duration, 640);
    assert_eq!(decoded.meta.flow_id, 0x00_1234);
    assert_eq!(decoded.meta.vc_id, 3);
    assert_eq!(decoded.meta.sequence, 9);
    assert!(decoded.meta.vendor_flags & vendor_flags::SIGNATURE != 0);
}

#[test]
fn displaced_signature_is_found_and_corruption_is_not() {
    let expected = sig::ETHERNET_HEADER_LEN + sig::UDP_SIGNATURE_OFFSET;
    for shift in [0usize, 3, 31, sig::SCAN_WINDOW - 1] {
        let mut mac = vec![0u8; 160];
        let at = expected + shift;
        mac[at..at + sig::SIGNATURE_LEN].copy_from_slice(&extended_signature(0x00_1234, 9, 7));
        let mut frame = udp_frame(&ETHERNET_GEN2, mac);
        frame.start = 10;
        assert_eq!(decode(&frame).meta.latency, 3, "shift {shift}");
    }

    let mut mac = vec![0u8; 160];
    mac[expected..expected + sig::SIGNATURE_LEN]
        .copy_from_slice(&extended_signature(0x00_1235, 9, 7));
    let decoded = decode(&udp_frame(&ETHERNET_GEN2, mac));
    assert_eq!(decoded.meta.signature_ts, None);
    assert_eq!(decoded.meta.latency, 0);
    assert_eq!(decoded.meta.vendor_flags & vendor_flags::SIGNATURE, 0);
}

#[test]
fn flow_invalid_frames_are_not_scanned() {
    let expected = sig::ETHERNET_HEADER_LEN + sig::UDP_SIGNATURE_OFFSET;
    let mut mac = vec![0u8; 120];
    mac[expected..expected + sig::SIGNATURE_LEN]
        .copy_from_slice(&extended_signature(0x00_1234, 9, 7));
    let mut frame = udp_frame(&ETHERNET_GEN1, mac);
    frame.flow_valid = false;
    assert!(!decode(&frame).has_signature());
}

#[test]
fn wlan_qos_compact_signature() {
    let expected = sig::WLAN_MAC_HEADER_LEN
        + sig::WLAN_QOS_CONTROL_LEN
        + sig::SNAP_HEADER_LEN
        + sig::UDP_SIGNATURE_OFFSET;
    let mut mac = vec![0u8; 128];
    mac[expected..expected + sig::SIGNATURE_LEN]
        .copy_from_slice(&compact_signature(0x00_1234, 9, 9_000));
    let mut frame = udp_frame(&WLAN_GEN2, mac);
    frame.frame_type |= WLAN_GEN2.frame_type_bits.qos;
    frame.modulation = plcp::MODULATION_OFDM;
    frame.plcp = vec![0x0c];
    frame.start = 10_000;

    let decoded = decode(&frame);
    assert_eq!(decoded.meta.rate, 108);
    assert_eq!(decoded.meta.signature_ts, Some(9_000));
    assert_eq!(decoded.meta.latency, 1_000);
}

#[test]
fn latency_rollover_reports_zero() {
    let start = 100u64;
    let ts = 100 + sig::ROLLOVER_THRESHOLD + 1;
    let expected = sig::ETHERNET_HEADER_LEN + sig::UDP_SIGNATURE_OFFSET;
    let mut mac = vec![0u8; 120];
    mac[expected..expected + sig::SIGNATURE_LEN]
        .copy_from_slice(&extended_signature(0x00_1234, 9, ts));
    let mut frame = udp_frame(&ETHERNET_GEN1, mac);
    frame.start = start;

    let decoded = decode(&frame);
    assert_eq!(decoded.meta.signature_ts, Some(ts));
    assert_eq!(decoded.meta.latency, 0);
}

#[test]
fn transmitted_frames_never_report_latency() {
    let expected = sig::ETHERNET_HEADER_LEN + sig::UDP_SIGNATURE_OFFSET;
    let mut mac = vec![0u8; 120];
    mac[expected..expected + sig::SIGNATURE_LEN]
        .copy_from_slice(&extended_signature(0x00_1234, 9, 50));
    let mut frame = udp_frame(&ETHERNET_GEN1, mac).tx();
    frame.start = 1_000;

    let decoded = decode(&frame);
    assert!(decoded.is_tx());
    assert!(decoded.has_signature());
    assert_eq!(decoded.meta.latency, 0);
}

#[test]
fn wlan_ht_frame_sets_phy_flags() {
    let mut frame = FrameBuilder::new(&WLAN_GEN2, vec![0; 40]);
    frame.modulation = plcp::MODULATION_HT_MIXED;
    frame.plcp = vec![0, 0, 0, plcp::HT_CBW40_BIT | 5, 0, 0, plcp::HT_SHORT_GI_BIT];
    frame.frame_type = WLAN_GEN2.frame_type_bits.band_5ghz | WLAN_GEN2.frame_type_bits.ccmp;
    frame.signal = -55;

    let decoded = decode(&frame);
    assert_eq!(decoded.meta.rate, 5);
    assert_eq!(decoded.meta.modulation, Some(Modulation::HtMixed));
    assert_eq!(decoded.meta.signal, Some(-55));
    let expected_flags =
        vendor_flags::HT | vendor_flags::CBW40 | vendor_flags::SHORT_GI | vendor_flags::CCMP;
    assert_eq!(decoded.meta.vendor_flags, expected_flags);
    assert_eq!(
        decoded.meta.channel_flags,
        plcp::CHANNEL_OFDM | plcp::CHANNEL_5GHZ
    );
}

#[test]
fn wlan_gen1_cck_rate_and_errors() {
    let mut frame = FrameBuilder::new(&WLAN_GEN1, vec![0; 30]);
    frame.modulation = plcp::MODULATION_CCK;
    frame.plcp = vec![0x6e];
    frame.errors = WLAN_GEN1.error_bits.fcs | WLAN_GEN1.error_bits.retry;

    let decoded = decode(&frame);
    assert_eq!(decoded.meta.rate, 22);
    assert_eq!(decoded.meta.channel_flags, plcp::CHANNEL_CCK | plcp::CHANNEL_2GHZ);
    assert_eq!(decoded.meta.errors, error_flags::FCS | error_flags::RETRY);
}

#[test]
fn wlan_gen2_errors_are_normalized() {
    let mut frame = FrameBuilder::new(&WLAN_GEN2, vec![0; 30]);
    frame.errors = 0x0002 | 0x0080;
    assert_eq!(
        decode(&frame).meta.errors,
        error_flags::FCS | error_flags::DECRYPT
    );
}

#[test]
fn timestamps_follow_tick_units() {
    let mut wlan = FrameBuilder::new(&WLAN_GEN1, vec![0; 20]);
    wlan.start = (1u64 << 32) + 1_500_000;
    wlan.end = wlan.start + 250;
    let decoded = decode(&wlan);
    let start_us = (1u64 << 32) + 1_500_000;
    assert_eq!(decoded.ts_sec, start_us / 1_000_000);
    assert_eq!(decoded.ts_usec as u64, start_us % 1_000_000);
    assert_eq!(decoded.meta.duration, 250);

    let mut ethernet = FrameBuilder::new(&ETHERNET_GEN2, vec![0; 20]);
    ethernet.start = 2_000_001_999;
    ethernet.end = 2_000_003_000;
    let decoded = decode(&ethernet);
    assert_eq!(decoded.ts_sec, 2);
    assert_eq!(decoded.ts_usec, 1);
    assert_eq!(decoded.meta.duration, 1_001);
}

#[test]
fn serialized_frame_is_header_then_payload() {
    let decoded = decode(&FrameBuilder::new(&ETHERNET_GEN1, vec![7; 24]));
    let bytes = decoded.to_bytes();
    assert_eq!(bytes.len(), META_HEADER_LEN + 20);
    assert_eq!(bytes[1], Encapsulation::Ethernet.tag());
    assert_eq!(&bytes[META_HEADER_LEN..], &[7u8; 20][..]);
}
