// SPDX-FileCopyrightText: 2026 Sam Hanes <sam@maltera.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! embassy-net implementations of the network collaborator traits.

use core::net::{IpAddr, SocketAddr};

use embassy_net::dns::{self, DnsQueryType};
use embassy_net::tcp::{self, AcceptError, TcpSocket};
use embassy_net::udp::{self, UdpSocket};
use embassy_net::{IpAddress, IpEndpoint, Stack};
use embassy_time::{Duration, with_timeout};
use embedded_io_async::{ErrorType, Read, Write};

use super::{Connection, DatagramSocket, LinkStatus, Listener, Resolver};
use crate::config::ServerConfig;

/// How long a closing connection may take to drain before it is reset.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

impl LinkStatus for Stack<'_> {
    fn link_up(&self) -> bool {
        self.is_link_up()
    }
}

impl Resolver for Stack<'_> {
    type Error = dns::Error;

    async fn resolve(&self, host: &str) -> Result<Option<IpAddr>, dns::Error> {
        let records = self.dns_query(host, DnsQueryType::A).await?;
        Ok(records.first().map(|addr| match *addr {
            IpAddress::Ipv4(v4) => IpAddr::V4(v4),
        }))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UdpError {
    Send(udp::SendError),
    Recv(udp::RecvError),
    /// Only IPv4 is enabled in the stack.
    Unsupported,
}

impl DatagramSocket for UdpSocket<'_> {
    type Error = UdpError;

    async fn send_to(&mut self, buf: &[u8], peer: SocketAddr) -> Result<(), UdpError> {
        let SocketAddr::V4(peer) = peer else {
            return Err(UdpError::Unsupported);
        };
        let endpoint = IpEndpoint::new(IpAddress::Ipv4(*peer.ip()), peer.port());
        UdpSocket::send_to(self, buf, endpoint).await.map_err(UdpError::Send)
    }

    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr), UdpError> {
        let (len, meta) = UdpSocket::recv_from(self, buf).await.map_err(UdpError::Recv)?;
        let IpAddress::Ipv4(ip) = meta.endpoint.addr;
        Ok((len, SocketAddr::new(IpAddr::V4(ip), meta.endpoint.port)))
    }
}

/// Accepts TCP connections on one port, one at a time.
///
/// Every accept creates a fresh socket over the same buffers, so a connection
/// has to be closed (or dropped) before the next accept. There is no backlog:
/// a SYN that arrives while a client is being served, or between one accept
/// timing out and the next starting, is answered with a reset.
pub struct TcpListener<'d> {
    stack: Stack<'d>,
    port: u16,
    rx_buffer: &'d mut [u8],
    tx_buffer: &'d mut [u8],
    socket_timeout: Duration,
}

impl<'d> TcpListener<'d> {
    pub fn new(
        stack: Stack<'d>,
        port: u16,
        rx_buffer: &'d mut [u8],
        tx_buffer: &'d mut [u8],
    ) -> Self {
        TcpListener {
            stack,
            port,
            rx_buffer,
            tx_buffer,
            socket_timeout: ServerConfig::default().socket_timeout,
        }
    }

    /// Inactivity timeout applied by the TCP stack to accepted connections.
    pub fn with_socket_timeout(self, socket_timeout: Duration) -> Self {
        TcpListener { socket_timeout, ..self }
    }
}

impl Listener for TcpListener<'_> {
    type Conn<'a>
        = TcpConnection<'a>
    where
        Self: 'a;
    type Error = AcceptError;

    async fn accept(&mut self) -> Result<TcpConnection<'_>, AcceptError> {
        let mut socket = TcpSocket::new(self.stack, self.rx_buffer, self.tx_buffer);
        socket.set_timeout(Some(self.socket_timeout));
        socket.accept(self.port).await?;
        if let Some(peer) = socket.remote_endpoint() {
            info!("client connection from {:?}", peer);
        }
        Ok(TcpConnection { socket })
    }
}

pub struct TcpConnection<'a> {
    socket: TcpSocket<'a>,
}

impl ErrorType for TcpConnection<'_> {
    type Error = tcp::Error;
}

impl Read for TcpConnection<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, tcp::Error> {
        self.socket.read(buf).await
    }
}

impl Write for TcpConnection<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, tcp::Error> {
        self.socket.write(buf).await
    }

    async fn flush(&mut self) -> Result<(), tcp::Error> {
        self.socket.flush().await
    }
}

impl Connection for TcpConnection<'_> {
    async fn close(mut self) {
        self.socket.close();
        if !matches!(with_timeout(CLOSE_TIMEOUT, self.socket.flush()).await, Ok(Ok(()))) {
            debug!("connection did not close cleanly, resetting");
            self.socket.abort();
            let _ = with_timeout(CLOSE_TIMEOUT, self.socket.flush()).await;
        }
    }
}
