use crate::network::packet::checksum::checksum;
use crate::network::packet::ipv4::IPv4Header;
use crate::network::packet::DecodeError;

pub const HEADER_LEN: usize = 8;

pub const TYPE_ECHO_REPLY: u8 = 0;
pub const TYPE_DESTINATION_UNREACHABLE: u8 = 3;
pub const TYPE_ECHO_REQUEST: u8 = 8;
pub const TYPE_TIME_EXCEEDED: u8 = 11;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IcmpBody {
    /// Echo Request / Echo Reply
    Echo {
        identifier: u16,
        sequence: u16,
        payload: Vec<u8>,
    },
    /// Destination Unreachable / Time Exceeded。元データグラムのIPヘッダーと先頭8バイトを含む
    Error {
        unused: u32,
        original_fragment: Vec<u8>,
    },
    Other {
        rest_of_header: u32,
        data: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpMessage {
    pub icmp_type: u8,
    pub icmp_code: u8,
    pub checksum: u16,
    pub body: IcmpBody,
}

impl IcmpMessage {
    pub fn echo(icmp_type: u8, identifier: u16, sequence: u16, payload: Vec<u8>) -> Self {
        Self {
            icmp_type,
            icmp_code: 0,
            checksum: 0,
            body: IcmpBody::Echo {
                identifier,
                sequence,
                payload,
            },
        }
    }

    /// メッセージをワイヤ形式に変換する。チェックサムはゼロにした状態で再計算される
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(HEADER_LEN + self.body_len());

        // タイプ、コード、チェックサム (ゼロ)
        buffer.push(self.icmp_type);
        buffer.push(self.icmp_code);
        buffer.extend_from_slice(&[0, 0]);

        match &self.body {
            IcmpBody::Echo {
                identifier,
                sequence,
                payload,
            } => {
                buffer.extend_from_slice(&identifier.to_be_bytes());
                buffer.extend_from_slice(&sequence.to_be_bytes());
                buffer.extend_from_slice(payload);
            }
            IcmpBody::Error {
                unused,
                original_fragment,
            } => {
                buffer.extend_from_slice(&unused.to_be_bytes());
                buffer.extend_from_slice(original_fragment);
            }
            IcmpBody::Other {
                rest_of_header,
                data,
            } => {
                buffer.extend_from_slice(&rest_of_header.to_be_bytes());
                buffer.extend_from_slice(data);
            }
        }

        let sum = checksum(&buffer);
        buffer[2..4].copy_from_slice(&sum.to_be_bytes());
        buffer
    }

    /// ICMPメッセージを解析する。チェックサムは検証しない
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < HEADER_LEN {
            return Err(DecodeError::Truncated {
                needed: HEADER_LEN,
                actual: data.len(),
            });
        }

        let icmp_type = data[0];
        let icmp_code = data[1];
        let checksum = u16::from_be_bytes([data[2], data[3]]);
        let rest_of_header = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let rest = data[HEADER_LEN..].to_vec();

        let body = match icmp_type {
            TYPE_ECHO_REPLY | TYPE_ECHO_REQUEST => IcmpBody::Echo {
                identifier: u16::from_be_bytes([data[4], data[5]]),
                sequence: u16::from_be_bytes([data[6], data[7]]),
                payload: rest,
            },
            TYPE_DESTINATION_UNREACHABLE | TYPE_TIME_EXCEEDED => IcmpBody::Error {
                unused: rest_of_header,
                original_fragment: rest,
            },
            _ => IcmpBody::Other {
                rest_of_header,
                data: rest,
            },
        };

        Ok(Self {
            icmp_type,
            icmp_code,
            checksum,
            body,
        })
    }

    /// エラーメッセージに埋め込まれた元のEcho Requestの (identifier, sequence)
    pub fn original_echo(&self) -> Option<(u16, u16)> {
        let IcmpBody::Error {
            original_fragment, ..
        } = &self.body
        else {
            return None;
        };

        let (header, rest) = IPv4Header::parse(original_fragment).ok()?;
        if header.protocol != 1 || rest.len() < HEADER_LEN || rest[0] != TYPE_ECHO_REQUEST {
            return None;
        }
        Some((
            u16::from_be_bytes([rest[4], rest[5]]),
            u16::from_be_bytes([rest[6], rest[7]]),
        ))
    }

    fn body_len(&self) -> usize {
        match &self.body {
            IcmpBody::Echo { payload, .. } => payload.len(),
            IcmpBody::Error {
                original_fragment, ..
            } => original_fragment.len(),
            IcmpBody::Other { data, .. } => data.len(),
        }
    }
}

/// Echo Requestを組み立てる。ペイロードはゼロ埋めで、全長は `HEADER_LEN + payload_size`
pub fn encode_echo_request(identifier: u16, sequence: u16, payload_size: usize) -> Vec<u8> {
    IcmpMessage::echo(TYPE_ECHO_REQUEST, identifier, sequence, vec![0; payload_size]).to_bytes()
}

/// 受信したIPデータグラム (IPヘッダー + ICMP)
#[derive(Debug, Clone)]
pub struct InboundDatagram {
    pub ip: IPv4Header,
    pub icmp: IcmpMessage,
    /// ICMP部分のバイト数
    pub icmp_len: usize,
    pub checksum_ok: bool,
}

impl InboundDatagram {
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        let (ip, icmp_bytes) = IPv4Header::parse(data)?;
        let icmp = IcmpMessage::parse(icmp_bytes)?;

        Ok(Self {
            ip,
            icmp,
            icmp_len: icmp_bytes.len(),
            checksum_ok: checksum(icmp_bytes) == 0,
        })
    }
}

/// IPヘッダーを読み飛ばしてICMPメッセージを取り出す
pub fn decode_icmp_from_ip_datagram(data: &[u8]) -> Result<IcmpMessage, DecodeError> {
    InboundDatagram::parse(data).map(|datagram| datagram.icmp)
}
