//! Synthetic ethernet/IPv4 frames produced by the simulated radio.
//!
//! Each frame carries a little-endian sequence number right after the IPv4
//! header so the consumer can check delivery order.

use mote_relay::MacAddress;

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const IP_PROTO_UDP: u8 = 17;

pub const ETH_HEADER_LEN: usize = 14;
pub const IP_HEADER_LEN: usize = 20;
const SEQ_LEN: usize = 8;
/// Smallest frame `build_frame` will emit.
pub const MIN_FRAME_LEN: usize = ETH_HEADER_LEN + IP_HEADER_LEN + SEQ_LEN;

pub const AP_IP: [u8; 4] = [192, 168, 4, 1];
pub const STATION_IP: [u8; 4] = [192, 168, 4, 2];

/// Build an ethernet header.
pub fn build_eth_header(dst: &[u8], src: &[u8], ethertype: u16) -> [u8; 14] {
    let mut hdr = [0u8; 14];
    hdr[0..6].copy_from_slice(dst);
    hdr[6..12].copy_from_slice(src);
    hdr[12..14].copy_from_slice(&ethertype.to_be_bytes());
    hdr
}

/// Internet checksum over `data`.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum = 0u32;
    for chunk in data.chunks(2) {
        let word = match chunk {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [hi] => u16::from_be_bytes([*hi, 0]),
            _ => 0,
        };
        sum += word as u32;
    }
    while (sum >> 16) != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

/// Build an IPv4 header.
pub fn build_ip_header(src: &[u8], dst: &[u8], proto: u8, payload_len: usize, id: u16) -> [u8; 20] {
    let total_len = (IP_HEADER_LEN + payload_len) as u16;
    let mut hdr = [0u8; 20];
    hdr[0] = 0x45; // version + IHL
    hdr[2..4].copy_from_slice(&total_len.to_be_bytes());
    hdr[4..6].copy_from_slice(&id.to_be_bytes());
    hdr[6..8].copy_from_slice(&[0x40, 0]); // Don't fragment
    hdr[8] = 64;
    hdr[9] = proto;
    hdr[12..16].copy_from_slice(src);
    hdr[16..20].copy_from_slice(dst);

    let cksum = checksum(&hdr);
    hdr[10..12].copy_from_slice(&cksum.to_be_bytes());
    hdr
}

/// Build a frame of `len` bytes (at least [`MIN_FRAME_LEN`]) addressed from the AP to the station.
pub fn build_frame(dst: &MacAddress, src: &MacAddress, seq: u64, len: usize) -> Vec<u8> {
    let len = len.max(MIN_FRAME_LEN);
    let payload_len = len - ETH_HEADER_LEN - IP_HEADER_LEN;

    let mut frame = Vec::with_capacity(len);
    frame.extend_from_slice(&build_eth_header(&dst.0, &src.0, ETHERTYPE_IPV4));
    frame.extend_from_slice(&build_ip_header(
        &AP_IP,
        &STATION_IP,
        IP_PROTO_UDP,
        payload_len,
        seq as u16,
    ));
    frame.extend_from_slice(&seq.to_le_bytes());
    frame.resize(len, (seq & 0xff) as u8);
    frame
}

/// Sequence number of a frame produced by [`build_frame`].
pub fn frame_seq(frame: &[u8]) -> Option<u64> {
    if frame.len() < MIN_FRAME_LEN {
        return None;
    }
    if u16::from_be_bytes([frame[12], frame[13]]) != ETHERTYPE_IPV4 {
        return None;
    }
    let off = ETH_HEADER_LEN + IP_HEADER_LEN;
    let mut seq = [0u8; SEQ_LEN];
    seq.copy_from_slice(&frame[off..off + SEQ_LEN]);
    Some(u64::from_le_bytes(seq))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STA: MacAddress = MacAddress([0x02, 0x4d, 0x4f, 0x54, 0x45, 0x00]);
    const AP: MacAddress = MacAddress([0x02, 0x4d, 0x4f, 0x54, 0x45, 0x01]);

    #[test]
    fn test_ip_header_checksum_verifies() {
        let hdr = build_ip_header(&AP_IP, &STATION_IP, IP_PROTO_UDP, 100, 7);
        assert_eq!(checksum(&hdr), 0);
    }

    #[test]
    fn test_frame_layout() {
        let frame = build_frame(&STA, &AP, 42, 128);
        assert_eq!(frame.len(), 128);
        assert_eq!(&frame[0..6], &STA.0);
        assert_eq!(&frame[6..12], &AP.0);
        assert_eq!(frame_seq(&frame), Some(42));
    }

    #[test]
    fn test_short_request_padded_to_minimum() {
        let frame = build_frame(&STA, &AP, 1, 10);
        assert_eq!(frame.len(), MIN_FRAME_LEN);
        assert_eq!(frame_seq(&frame), Some(1));
    }

    #[test]
    fn test_frame_seq_rejects_garbage() {
        assert_eq!(frame_seq(&[0u8; 8]), None);
        assert_eq!(frame_seq(&[0u8; MIN_FRAME_LEN]), None);
    }
}
