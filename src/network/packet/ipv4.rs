use crate::network::packet::DecodeError;
use std::net::Ipv4Addr;

pub const MIN_HEADER_LEN: usize = 20;
pub const TTL_OFFSET: usize = 8;

// 0                   1                   2                   3
// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |Version|  IHL  |Type of Service|          Total Length         |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |         Identification        |Flags|      Fragment Offset    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |  Time to Live |    Protocol   |         Header Checksum       |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                       Source Address                          |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                    Destination Address                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IPv4Header {
    pub version: u8,
    /// ヘッダー長 (バイト単位、オプション込み)
    pub header_length: usize,
    pub total_length: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

impl IPv4Header {
    /// ヘッダーを解析し、残り (ペイロード) を返す
    ///
    /// ヘッダー長はIHL×4から求める。IHLが5未満の壊れた値の場合は20バイトとみなす。
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        if data.len() < MIN_HEADER_LEN {
            return Err(DecodeError::Truncated {
                needed: MIN_HEADER_LEN,
                actual: data.len(),
            });
        }

        let version = (data[0] >> 4) & 0xF;
        if version != 4 {
            return Err(DecodeError::NotIpv4(version));
        }

        let header_length = ((data[0] & 0xF) as usize * 4).max(MIN_HEADER_LEN);
        if data.len() < header_length {
            return Err(DecodeError::Truncated {
                needed: header_length,
                actual: data.len(),
            });
        }

        Ok((
            Self {
                version,
                header_length,
                total_length: u16::from_be_bytes([data[2], data[3]]),
                ttl: data[TTL_OFFSET],
                protocol: data[9],
                source: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
                destination: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
            },
            &data[header_length..],
        ))
    }
}

/// テスト用にIPv4データグラムを組み立てる (オプション領域はゼロ埋め)
#[cfg(test)]
pub fn build_datagram(source: Ipv4Addr, ttl: u8, options_len: usize, payload: &[u8]) -> Vec<u8> {
    let header_length = MIN_HEADER_LEN + options_len;
    let mut buffer = Vec::with_capacity(header_length + payload.len());
    buffer.push(0x40 | (header_length / 4) as u8);
    buffer.push(0);
    buffer.extend_from_slice(&((header_length + payload.len()) as u16).to_be_bytes());
    buffer.extend_from_slice(&[0, 0, 0, 0]);
    buffer.push(ttl);
    buffer.push(1);
    buffer.extend_from_slice(&[0, 0]);
    buffer.extend_from_slice(&source.octets());
    buffer.extend_from_slice(&Ipv4Addr::new(192, 0, 2, 1).octets());
    buffer.resize(header_length, 0);
    let sum = crate::network::packet::checksum::checksum(&buffer);
    buffer[10..12].copy_from_slice(&sum.to_be_bytes());
    buffer.extend_from_slice(payload);
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::packet::ipv4::Ipv4Packet;

    #[test]
    fn test_parse_plain_header() {
        let datagram = build_datagram(Ipv4Addr::new(8, 8, 8, 8), 57, 0, &[1, 2, 3]);
        let (header, rest) = IPv4Header::parse(&datagram).unwrap();
        assert_eq!(header.header_length, 20);
        assert_eq!(header.ttl, 57);
        assert_eq!(header.protocol, 1);
        assert_eq!(header.source, Ipv4Addr::new(8, 8, 8, 8));
        assert_eq!(rest, &[1, 2, 3]);
    }

    #[test]
    fn test_parse_skips_options() {
        let datagram = build_datagram(Ipv4Addr::new(10, 1, 2, 3), 64, 8, &[9, 9]);
        let (header, rest) = IPv4Header::parse(&datagram).unwrap();
        assert_eq!(header.header_length, 28);
        assert_eq!(rest, &[9, 9]);

        // pnet の解釈と一致すること
        let packet = Ipv4Packet::new(&datagram).unwrap();
        assert_eq!(packet.get_header_length() as usize * 4, header.header_length);
        assert_eq!(packet.get_ttl(), header.ttl);
        assert_eq!(packet.get_source(), header.source);
    }

    #[test]
    fn test_parse_truncated() {
        assert_eq!(
            IPv4Header::parse(&[0x45; 10]),
            Err(DecodeError::Truncated { needed: 20, actual: 10 })
        );

        let mut datagram = build_datagram(Ipv4Addr::LOCALHOST, 64, 0, &[]);
        datagram[0] = 0x46;
        assert_eq!(
            IPv4Header::parse(&datagram),
            Err(DecodeError::Truncated { needed: 24, actual: 20 })
        );
    }

    #[test]
    fn test_parse_rejects_other_versions() {
        let mut datagram = build_datagram(Ipv4Addr::LOCALHOST, 64, 0, &[]);
        datagram[0] = 0x65;
        assert_eq!(IPv4Header::parse(&datagram), Err(DecodeError::NotIpv4(6)));
    }

    #[test]
    fn test_short_ihl_defaults_to_twenty() {
        let mut datagram = build_datagram(Ipv4Addr::LOCALHOST, 64, 0, &[7]);
        datagram[0] = 0x40;
        let (header, rest) = IPv4Header::parse(&datagram).unwrap();
        assert_eq!(header.header_length, 20);
        assert_eq!(rest, &[7]);
    }
}
