use crate::core::config::ProbeConfig;
use crate::core::error::{PingError, PingResult};
use crate::network::packet::icmp::{
    TYPE_DESTINATION_UNREACHABLE, TYPE_ECHO_REPLY, TYPE_TIME_EXCEEDED,
};
use crate::network::packet::{encode_echo_request, IcmpBody, InboundDatagram};
use crate::network::socket::EchoSocket;
use log::{debug, trace, warn};
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreachableReason {
    Network,
    Host,
    Protocol,
    Port,
    Unknown(u8),
}

impl UnreachableReason {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Network,
            1 => Self::Host,
            2 => Self::Protocol,
            3 => Self::Port,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for UnreachableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "Network Unreachable"),
            Self::Host => write!(f, "Host Unreachable"),
            Self::Protocol => write!(f, "Protocol Unreachable"),
            Self::Port => write!(f, "Port Unreachable"),
            Self::Unknown(code) => write!(f, "Unknown Unreachable (code {})", code),
        }
    }
}

/// 1サイクルの終端状態
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Matched {
        rtt: f64,
        bytes: usize,
        source: Ipv4Addr,
        ttl: u8,
    },
    Unreachable {
        source: Ipv4Addr,
        reason: UnreachableReason,
    },
    TimeExceeded {
        source: Ipv4Addr,
    },
    ForeignReply {
        source: Ipv4Addr,
        identifier: u16,
    },
    TimedOut,
}

/// 送信済みの1プローブ。結果が決まるまでの間だけ存在する
#[derive(Debug, Clone)]
pub struct ProbeRecord {
    pub sequence: u16,
    pub sent_at: Instant,
}

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub identifier: u16,
    pub payload_size: usize,
    pub timeout: Duration,
    pub poll_wait: Duration,
    pub validate_checksum: bool,
}

impl ProbeSettings {
    pub fn from_config(config: &ProbeConfig, identifier: u16) -> Self {
        Self {
            identifier,
            payload_size: config.payload_size(),
            timeout: config.timeout(),
            poll_wait: config.poll_wait(),
            validate_checksum: config.validate_checksum,
        }
    }
}

/// Echo Requestを送り、受信したデータグラムを分類する
pub struct Prober<S> {
    socket: S,
    destination: Ipv4Addr,
    settings: ProbeSettings,
}

impl<S: EchoSocket> Prober<S> {
    pub fn new(socket: S, destination: Ipv4Addr, settings: ProbeSettings) -> Self {
        Self {
            socket,
            destination,
            settings,
        }
    }

    /// Idle -> Sent
    pub async fn send(&self, sequence: u16) -> PingResult<ProbeRecord> {
        let packet = encode_echo_request(self.settings.identifier, sequence, self.settings.payload_size);
        let sent_at = Instant::now();

        self.socket
            .send_to(&packet, self.destination)
            .await
            .map_err(PingError::Send)?;

        Ok(ProbeRecord { sequence, sent_at })
    }

    /// Sent -> 終端状態。タイムアウトまで受信を繰り返す
    pub async fn await_reply(&self, record: &ProbeRecord) -> ProbeOutcome {
        let deadline = record.sent_at + self.settings.timeout;

        loop {
            let now = Instant::now();
            if now >= deadline {
                return ProbeOutcome::TimedOut;
            }
            let wait = (deadline - now).min(self.settings.poll_wait);

            match self.socket.recv(wait).await {
                Ok(Some(datagram)) => {
                    if let Some(outcome) = self.classify(record, &datagram, Instant::now()) {
                        return outcome;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("icmp_seq={}: {}", record.sequence, PingError::Receive(e));
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// 受信データグラムを分類する。Noneの場合は無視して待ち続ける
    pub fn classify(&self, record: &ProbeRecord, datagram: &[u8], received_at: Instant) -> Option<ProbeOutcome> {
        let inbound = match InboundDatagram::parse(datagram) {
            Ok(inbound) => inbound,
            Err(e) => {
                debug!("受信データグラムを破棄しました: {}", e);
                return None;
            }
        };

        if self.settings.validate_checksum && !inbound.checksum_ok {
            debug!("チェックサム不正のICMPを破棄しました (from {})", inbound.ip.source);
            return None;
        }

        let source = inbound.ip.source;
        match inbound.icmp.icmp_type {
            TYPE_ECHO_REPLY => {
                let IcmpBody::Echo { identifier, sequence, .. } = inbound.icmp.body else {
                    return None;
                };

                if identifier != self.settings.identifier {
                    return Some(ProbeOutcome::ForeignReply { source, identifier });
                }
                if sequence != record.sequence {
                    debug!(
                        "古い応答を無視しました: icmp_seq={} (待機中: {})",
                        sequence, record.sequence
                    );
                    return None;
                }

                let rtt = received_at.duration_since(record.sent_at).as_secs_f64() * 1000.0;
                Some(ProbeOutcome::Matched {
                    rtt,
                    bytes: inbound.icmp_len,
                    source,
                    ttl: inbound.ip.ttl,
                })
            }
            TYPE_DESTINATION_UNREACHABLE => {
                if let Some((identifier, sequence)) = inbound.icmp.original_echo() {
                    debug!("到達不能の元パケット: id={} icmp_seq={}", identifier, sequence);
                }
                Some(ProbeOutcome::Unreachable {
                    source,
                    reason: UnreachableReason::from_code(inbound.icmp.icmp_code),
                })
            }
            TYPE_TIME_EXCEEDED => Some(ProbeOutcome::TimeExceeded { source }),
            other => {
                trace!("ICMPタイプ{}を無視しました (from {})", other, source);
                None
            }
        }
    }
}
