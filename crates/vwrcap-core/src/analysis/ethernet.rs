use etherparse::{NetSlice, SlicedPacket, TransportSlice};

use crate::EthernetSummary;

/// Count the network and transport layers of one Ethernet payload.
///
/// Payloads etherparse cannot slice, or that carry no TCP/UDP, count as
/// `other`.
pub(crate) fn add_ethernet_frame(summary: &mut EthernetSummary, payload: &[u8]) {
    let sliced = match SlicedPacket::from_ethernet(payload) {
        Ok(sliced) => sliced,
        Err(_) => {
            summary.other += 1;
            return;
        }
    };

    match sliced.net {
        Some(NetSlice::Ipv4(_)) => summary.ipv4 += 1,
        Some(NetSlice::Ipv6(_)) => summary.ipv6 += 1,
        _ => {}
    }
    match sliced.transport {
        Some(TransportSlice::Tcp(_)) => summary.tcp += 1,
        Some(TransportSlice::Udp(_)) => summary.udp += 1,
        _ => summary.other += 1,
    }
}

#[cfg(test)]
mod tests {
    use super::add_ethernet_frame;
    use crate::EthernetSummary;
    use etherparse::PacketBuilder;

    fn build(builder: etherparse::PacketBuilderStep<etherparse::UdpHeader>) -> Vec<u8> {
        let payload = [0u8; 16];
        let mut packet = Vec::with_capacity(builder.size(payload.len()));
        builder.write(&mut packet, &payload).expect("write packet");
        packet
    }

    #[test]
    fn counts_ipv4_udp() {
        let packet = build(
            PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
                .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
                .udp(5000, 5001),
        );
        let mut summary = EthernetSummary::default();
        add_ethernet_frame(&mut summary, &packet);
        assert_eq!(summary.ipv4, 1);
        assert_eq!(summary.udp, 1);
        assert_eq!(summary.other, 0);
    }

    #[test]
    fn counts_ipv6_tcp() {
        let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv6([1; 16], [2; 16], 64)
            .tcp(80, 8080, 1, 1024);
        let mut packet = Vec::with_capacity(builder.size(0));
        builder.write(&mut packet, &[]).expect("write packet");

        let mut summary = EthernetSummary::default();
        add_ethernet_frame(&mut summary, &packet);
        assert_eq!(summary.ipv6, 1);
        assert_eq!(summary.tcp, 1);
    }

    #[test]
    fn garbage_counts_as_other() {
        let mut summary = EthernetSummary::default();
        add_ethernet_frame(&mut summary, &[0u8; 5]);
        assert_eq!(summary.other, 1);
        assert_eq!(summary.ipv4 + summary.ipv6, 0);
    }
}
