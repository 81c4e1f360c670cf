//! Network transport for nameserver queries.
//!
//! The resolver never touches sockets directly; it hands encoded queries to
//! a [`Transport`] together with the deadline for the exchange. Tests plug
//! in an in-memory implementation, production uses [`NetTransport`].

use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::{Instant, timeout_at};
use tracing::trace;

/// Maximum size of a DNS message over TCP.
const MAX_TCP_MESSAGE: usize = u16::MAX as usize;

/// Transport failure for one exchange with one server.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Socket level failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The deadline passed before a response arrived.
    #[error("Timed out waiting for response")]
    Timeout,

    /// The query does not fit the transport.
    #[error("Query of {0} bytes is too large")]
    QueryTooLarge(usize),

    /// The server closed the connection mid-message.
    #[error("Connection closed")]
    Closed,
}

/// Sends one encoded query to one server and returns the raw response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `query` to `server` over UDP, or over TCP when `reliable` is
    /// set, and waits for the response until `deadline`.
    async fn send(
        &self,
        server: SocketAddr,
        query: &[u8],
        reliable: bool,
        deadline: Instant,
    ) -> Result<Bytes, TransportError>;
}

/// Tokio UDP/TCP transport.
#[derive(Debug, Clone)]
pub struct NetTransport {
    max_udp_size: usize,
}

impl NetTransport {
    /// Creates a transport accepting UDP responses up to `max_udp_size`
    /// bytes.
    pub fn new(max_udp_size: u16) -> Self {
        Self {
            max_udp_size: usize::from(max_udp_size).max(512),
        }
    }

    async fn send_udp(&self, server: SocketAddr, query: &[u8]) -> Result<Bytes, TransportError> {
        let bind: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(server).await?;
        socket.send(query).await?;

        let mut buf = vec![0u8; self.max_udp_size];
        loop {
            let len = socket.recv(&mut buf).await?;
            // Datagrams with a foreign ID are stale or spoofed
            if len >= 2 && query.len() >= 2 && buf[..2] == query[..2] {
                return Ok(Bytes::copy_from_slice(&buf[..len]));
            }
            trace!(%server, len, "discarding datagram with mismatched id");
        }
    }

    async fn send_tcp(&self, server: SocketAddr, query: &[u8]) -> Result<Bytes, TransportError> {
        let len = u16::try_from(query.len()).map_err(|_| TransportError::QueryTooLarge(query.len()))?;

        let mut stream = TcpStream::connect(server).await?;
        let mut framed = Vec::with_capacity(query.len() + 2);
        framed.extend_from_slice(&len.to_be_bytes());
        framed.extend_from_slice(query);
        stream.write_all(&framed).await?;

        let mut len_buf = [0u8; 2];
        read_exact(&mut stream, &mut len_buf).await?;
        let resp_len = usize::from(u16::from_be_bytes(len_buf)).min(MAX_TCP_MESSAGE);

        let mut resp = vec![0u8; resp_len];
        read_exact(&mut stream, &mut resp).await?;
        Ok(Bytes::from(resp))
    }
}

impl Default for NetTransport {
    fn default() -> Self {
        Self::new(descent_proto::DEFAULT_EDNS_UDP_SIZE)
    }
}

async fn read_exact(stream: &mut TcpStream, buf: &mut [u8]) -> Result<(), TransportError> {
    match stream.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(TransportError::Closed),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl Transport for NetTransport {
    async fn send(
        &self,
        server: SocketAddr,
        query: &[u8],
        reliable: bool,
        deadline: Instant,
    ) -> Result<Bytes, TransportError> {
        trace!(%server, reliable, len = query.len(), "exchanging");
        let exchange = async {
            if reliable {
                self.send_tcp(server, query).await
            } else {
                self.send_udp(server, query).await
            }
        };
        timeout_at(deadline, exchange)
            .await
            .map_err(|_| TransportError::Timeout)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_udp_ignores_mismatched_id() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            server.send_to(&[0xFF, 0xFF, 0x00], peer).await.unwrap();
            server.send_to(&buf[..len], peer).await.unwrap();
        });

        let transport = NetTransport::default();
        let deadline = Instant::now() + Duration::from_secs(2);
        let response = transport
            .send(addr, &[0x12, 0x34, 0x01, 0x00], false, deadline)
            .await
            .unwrap();
        assert_eq!(&response[..], &[0x12, 0x34, 0x01, 0x00]);
    }

    #[tokio::test]
    async fn test_tcp_length_prefix() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut len = [0u8; 2];
            stream.read_exact(&mut len).await.unwrap();
            let mut query = vec![0u8; u16::from_be_bytes(len) as usize];
            stream.read_exact(&mut query).await.unwrap();
            query.push(0xAA);
            stream.write_all(&(query.len() as u16).to_be_bytes()).await.unwrap();
            stream.write_all(&query).await.unwrap();
        });

        let transport = NetTransport::default();
        let deadline = Instant::now() + Duration::from_secs(2);
        let response = transport.send(addr, &[0xAB, 0xCD], true, deadline).await.unwrap();
        assert_eq!(&response[..], &[0xAB, 0xCD, 0xAA]);
    }

    #[tokio::test]
    async fn test_deadline() {
        // Bound but never answers
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();

        let transport = NetTransport::default();
        let deadline = Instant::now() + Duration::from_millis(50);
        let result = transport.send(addr, &[0, 1], false, deadline).await;
        assert!(matches!(result, Err(TransportError::Timeout)));
        drop(server);
    }
}
