//! プローブのテスト用ソケット。送信ごとにスクリプトに従って応答を用意する

use crate::network::packet::icmp::{
    IcmpBody, IcmpMessage, TYPE_DESTINATION_UNREACHABLE, TYPE_ECHO_REPLY, TYPE_TIME_EXCEEDED,
};
use crate::network::packet::ipv4::build_datagram;
use crate::network::socket::EchoSocket;
use crate::probe::trigger::StopHandle;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub const IDENTIFIER: u16 = 0xBEEF;
pub const TARGET: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 10);
pub const ROUTER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 254);

#[derive(Debug, Clone)]
pub enum Script {
    Reply { delay_ms: u64 },
    Silent,
    Unreachable { code: u8 },
    TimeExceeded,
    Foreign { identifier: u16 },
    TruncatedThenReply { delay_ms: u64 },
    /// 1つ前のシーケンス番号への応答
    Stale,
    Corrupted,
    SendError,
}

struct State {
    scripts: VecDeque<Script>,
    pending: Vec<(Instant, Vec<u8>)>,
    sent: Vec<(u16, Instant)>,
    stop_after: Option<(usize, StopHandle)>,
}

#[derive(Clone)]
pub struct ScriptedSocket {
    state: Arc<Mutex<State>>,
}

pub fn datagram(source: Ipv4Addr, icmp: &[u8]) -> Vec<u8> {
    build_datagram(source, 57, 0, icmp)
}

fn echo_reply(identifier: u16, sequence: u16, payload: Vec<u8>) -> Vec<u8> {
    IcmpMessage::echo(TYPE_ECHO_REPLY, identifier, sequence, payload).to_bytes()
}

fn error_message(icmp_type: u8, code: u8, request: &[u8]) -> Vec<u8> {
    IcmpMessage {
        icmp_type,
        icmp_code: code,
        checksum: 0,
        body: IcmpBody::Error {
            unused: 0,
            original_fragment: build_datagram(Ipv4Addr::new(192, 0, 2, 1), 1, 0, &request[..8]),
        },
    }
    .to_bytes()
}

impl ScriptedSocket {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                scripts: scripts.into(),
                pending: Vec::new(),
                sent: Vec::new(),
                stop_after: None,
            })),
        }
    }

    /// `sends` 回目の送信直後に停止要求を出す
    pub fn stop_after(self, sends: usize, handle: StopHandle) -> Self {
        self.state.lock().unwrap().stop_after = Some((sends, handle));
        self
    }

    pub fn sent_sequences(&self) -> Vec<u16> {
        self.state.lock().unwrap().sent.iter().map(|(seq, _)| *seq).collect()
    }

    pub fn send_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().sent.iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl EchoSocket for ScriptedSocket {
    async fn send_to(&self, packet: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        let request = IcmpMessage::parse(packet).expect("echo request");
        let IcmpBody::Echo { identifier, sequence, payload } = request.body else {
            panic!("not an echo request");
        };

        let now = Instant::now();
        let mut state = self.state.lock().unwrap();
        state.sent.push((sequence, now));
        if let Some((sends, handle)) = &state.stop_after {
            if state.sent.len() == *sends {
                handle.stop();
            }
        }

        let after = |ms: u64| now + Duration::from_millis(ms);
        let script = state.scripts.pop_front().unwrap_or(Script::Silent);
        let responses = match script {
            Script::SendError => {
                return Err(io::Error::new(io::ErrorKind::Other, "network is unreachable"));
            }
            Script::Silent => vec![],
            Script::Reply { delay_ms } => vec![(
                after(delay_ms),
                datagram(destination, &echo_reply(identifier, sequence, payload)),
            )],
            Script::Unreachable { code } => vec![(
                after(5),
                datagram(ROUTER, &error_message(TYPE_DESTINATION_UNREACHABLE, code, packet)),
            )],
            Script::TimeExceeded => vec![(
                after(5),
                datagram(ROUTER, &error_message(TYPE_TIME_EXCEEDED, 0, packet)),
            )],
            Script::Foreign { identifier } => vec![(
                after(5),
                datagram(destination, &echo_reply(identifier, sequence, payload)),
            )],
            Script::TruncatedThenReply { delay_ms } => vec![
                (after(5), datagram(destination, &[0, 0, 0, 0])),
                (
                    after(delay_ms),
                    datagram(destination, &echo_reply(identifier, sequence, payload)),
                ),
            ],
            Script::Stale => vec![(
                after(5),
                datagram(destination, &echo_reply(identifier, sequence.wrapping_sub(1), payload)),
            )],
            Script::Corrupted => {
                let mut reply = echo_reply(identifier, sequence, payload);
                let last = reply.len() - 1;
                reply[last] ^= 0xFF;
                vec![(after(5), datagram(destination, &reply))]
            }
        };

        state.pending.extend(responses);
        state.pending.sort_by_key(|(at, _)| *at);
        Ok(packet.len())
    }

    async fn recv(&self, wait: Duration) -> io::Result<Option<Vec<u8>>> {
        let deadline = Instant::now() + wait;
        let next = self.state.lock().unwrap().pending.first().map(|(at, _)| *at);

        match next {
            Some(at) if at <= deadline => {
                tokio::time::sleep_until(at).await;
                let (_, bytes) = self.state.lock().unwrap().pending.remove(0);
                Ok(Some(bytes))
            }
            _ => {
                tokio::time::sleep_until(deadline).await;
                Ok(None)
            }
        }
    }
}
