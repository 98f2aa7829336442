use crate::core::error::{PingError, PingResult};
use async_trait::async_trait;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::{self, Read};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

const RECV_BUFFER_SIZE: usize = 65535;

/// Echo Requestの送信とIPデータグラムの受信を行うソケット
#[async_trait]
pub trait EchoSocket: Send + Sync {
    async fn send_to(&self, packet: &[u8], destination: Ipv4Addr) -> io::Result<usize>;

    /// `wait` 以内に何も届かなければ `None` を返す
    async fn recv(&self, wait: Duration) -> io::Result<Option<Vec<u8>>>;
}

/// AF_INET/SOCK_RAW/IPPROTO_ICMP ソケット。受信データにはIPヘッダーが含まれる
pub struct RawIcmpSocket {
    socket: Arc<Socket>,
}

impl RawIcmpSocket {
    pub fn new(ttl: Option<u32>) -> PingResult<Self> {
        let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))
            .map_err(PingError::SocketCreation)?;

        if let Some(ttl) = ttl {
            socket.set_ttl(ttl).map_err(PingError::SocketCreation)?;
        }

        Ok(Self {
            socket: Arc::new(socket),
        })
    }
}

#[async_trait]
impl EchoSocket for RawIcmpSocket {
    async fn send_to(&self, packet: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        let address = SockAddr::from(SocketAddrV4::new(destination, 0));
        self.socket.send_to(packet, &address)
    }

    async fn recv(&self, wait: Duration) -> io::Result<Option<Vec<u8>>> {
        let socket = Arc::clone(&self.socket);

        // ブロッキング読み込みはランタイムのワーカーを止めないように別スレッドで行う
        tokio::task::spawn_blocking(move || {
            // ゼロのタイムアウトはエラーになる
            socket.set_read_timeout(Some(wait.max(Duration::from_millis(1))))?;

            let mut buffer = vec![0u8; RECV_BUFFER_SIZE];
            match (&*socket).read(&mut buffer) {
                Ok(n) => {
                    buffer.truncate(n);
                    Ok(Some(buffer))
                }
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }
}
