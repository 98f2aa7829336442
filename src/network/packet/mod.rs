pub mod checksum;
pub mod icmp;
pub mod ipv4;

use thiserror::Error;

pub use icmp::{encode_echo_request, IcmpBody, InboundDatagram};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("パケットが短すぎます (必要: {needed}バイト, 実際: {actual}バイト)")]
    Truncated { needed: usize, actual: usize },

    #[error("IPv4ではないパケットです (version={0})")]
    NotIpv4(u8),
}
