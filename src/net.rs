// SPDX-FileCopyrightText: 2026 Sam Hanes <sam@maltera.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network collaborators used by the startup sequence and the request loop.
//!
//! The core only talks to these traits. `stack` implements them on top of
//! embassy-net; `ethernet` brings the W5500 up on the board.
//!
//! None of the traits promise to return in bounded time. Callers wrap every
//! call in `embassy_time::with_timeout`.

use core::net::{IpAddr, SocketAddr};

use embedded_io_async::{Read, Write};

use crate::Loggable;

#[cfg(feature = "firmware")]
pub mod ethernet;
pub mod link;
pub mod sntp;
pub mod stack;

/// Physical link indicator.
pub trait LinkStatus {
    fn link_up(&self) -> bool;
}

/// Host name lookup. Only the first record is ever used.
#[allow(async_fn_in_trait)]
pub trait Resolver {
    type Error: Loggable;

    async fn resolve(&self, host: &str) -> Result<Option<IpAddr>, Self::Error>;
}

/// Connectionless socket, one datagram per call.
#[allow(async_fn_in_trait)]
pub trait DatagramSocket {
    type Error: Loggable;

    async fn send_to(&mut self, buf: &[u8], peer: SocketAddr) -> Result<(), Self::Error>;

    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr), Self::Error>;
}

/// Listening stream socket handing out one connection at a time.
#[allow(async_fn_in_trait)]
pub trait Listener {
    type Conn<'a>: Connection
    where
        Self: 'a;
    type Error: Loggable;

    async fn accept(&mut self) -> Result<Self::Conn<'_>, Self::Error>;
}

/// An accepted stream connection.
#[allow(async_fn_in_trait)]
pub trait Connection: Read + Write {
    /// Closes the connection after flushing whatever is queued.
    async fn close(self);
}
