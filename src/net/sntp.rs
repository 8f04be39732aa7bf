// SPDX-FileCopyrightText: 2026 Sam Hanes <sam@maltera.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! One-shot SNTP query.
//!
//! Sends a single client request and reads the transmit timestamp seconds out
//! of the first reply. There is no retry and no offset/delay calculation; the
//! result only needs to be good enough for a clock on a web page.

use core::fmt;
use core::net::SocketAddr;

use embassy_time::{Duration, with_timeout};

use super::{DatagramSocket, Resolver};
use crate::config::{NTP_PACKET_LEN, NTP_PORT, TIME_REPLY_BUFFER_LEN};

pub type UnixSeconds = u64;

/// Seconds from 1900-01-01 (NTP era 0) to 1970-01-01.
pub const EPOCH_OFFSET: u64 = 2_208_988_800;

/// Leap indicator 0, version 3, mode 3 (client).
const CLIENT_REQUEST_HEADER: u8 = 0x1B;

/// Index of the transmit timestamp seconds among the twelve 32-bit words.
const TRANSMIT_SECONDS_WORD: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeClientError {
    /// The server name did not resolve to an address.
    Resolve,
    /// The request could not be sent or the socket failed while receiving.
    Transport,
    /// Nothing came back before the read timeout.
    NoReply,
    /// The reply was too short or carried no timestamp.
    Malformed,
}

impl fmt::Display for TimeClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeClientError::Resolve => "time server did not resolve",
            TimeClientError::Transport => "time request transport error",
            TimeClientError::NoReply => "no reply from time server",
            TimeClientError::Malformed => "malformed time reply",
        })
    }
}

/// The 48-byte client request.
pub fn request_packet() -> [u8; NTP_PACKET_LEN] {
    let mut packet = [0u8; NTP_PACKET_LEN];
    packet[0] = CLIENT_REQUEST_HEADER;
    packet
}

/// Extracts the transmit time from a reply, as Unix seconds.
///
/// Seconds values below the epoch offset belong to era 1 (after the 2036
/// rollover). A zero value is what unsynchronized servers send.
pub fn parse_reply(reply: &[u8]) -> Result<UnixSeconds, TimeClientError> {
    if reply.len() < NTP_PACKET_LEN {
        return Err(TimeClientError::Malformed);
    }

    let at = TRANSMIT_SECONDS_WORD * 4;
    let word = [reply[at], reply[at + 1], reply[at + 2], reply[at + 3]];
    let seconds = u64::from(u32::from_be_bytes(word));

    match seconds {
        0 => Err(TimeClientError::Malformed),
        s if s >= EPOCH_OFFSET => Ok(s - EPOCH_OFFSET),
        s => Ok(s + (1 << 32) - EPOCH_OFFSET),
    }
}

pub struct TimeClient<'a> {
    server: &'a str,
    port: u16,
    timeout: Duration,
}

impl<'a> TimeClient<'a> {
    pub fn new(server: &'a str, timeout: Duration) -> Self {
        TimeClient { server, port: NTP_PORT, timeout }
    }

    pub fn with_port(self, port: u16) -> Self {
        TimeClient { port, ..self }
    }

    /// Resolves the server, sends one request and waits for one reply. The
    /// resolved address is logged at info level.
    ///
    /// Every failure is final; the caller decides whether to go on without a
    /// time.
    pub async fn fetch_time<R, S>(
        &self,
        resolver: &R,
        socket: &mut S,
    ) -> Result<UnixSeconds, TimeClientError>
    where
        R: Resolver,
        S: DatagramSocket,
    {
        let ip = match resolver.resolve(self.server).await {
            Ok(Some(ip)) => ip,
            Ok(None) => {
                warn!("no address records for {}", self.server);
                return Err(TimeClientError::Resolve);
            }
            Err(e) => {
                warn!("lookup of {} failed: {:?}", self.server, e);
                return Err(TimeClientError::Resolve);
            }
        };
        let peer = SocketAddr::new(ip, self.port);
        info!("time server {} is {:?}", self.server, ip);

        if let Err(e) = socket.send_to(&request_packet(), peer).await {
            warn!("time request send failed: {:?}", e);
            return Err(TimeClientError::Transport);
        }

        let mut reply = [0u8; TIME_REPLY_BUFFER_LEN];
        let len = match with_timeout(self.timeout, socket.recv_from(&mut reply)).await {
            Err(_) => return Err(TimeClientError::NoReply),
            Ok(Err(e)) => {
                warn!("time reply receive failed: {:?}", e);
                return Err(TimeClientError::Transport);
            }
            Ok(Ok((len, _from))) => len,
        };
        debug!("time reply: {} bytes", len);

        let unix = parse_reply(&reply[..len])?;
        info!("time server says {} s since the Unix epoch", unix);
        Ok(unix)
    }
}
