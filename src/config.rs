// SPDX-FileCopyrightText: 2026 Sam Hanes <sam@maltera.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Compile-time configuration.
//!
//! Nothing is persisted; the only knob read from the build environment is
//! `TIME_SERVER`.

use embassy_time::Duration;

/// Size of an SNTP request and the minimum size of a usable reply.
pub const NTP_PACKET_LEN: usize = 48;

/// Receive buffer for the time-service reply.
pub const TIME_REPLY_BUFFER_LEN: usize = 1024;

/// Bytes read from each accepted connection. Enough for `GET /?led=off`.
pub const REQUEST_PREFIX_LEN: usize = 20;

pub const TCP_RX_BUFFER_LEN: usize = 1024;
pub const TCP_TX_BUFFER_LEN: usize = 2048;

pub const NTP_PORT: u16 = 123;

const DEFAULT_TIME_SERVER: &str = "time.google.com";

#[derive(Clone, Debug)]
pub struct Config {
    /// The W5500 has no factory address, so a locally administered one is used.
    pub mac_address: [u8; 6],
    pub time_server: &'static str,
    pub link_timeout: Duration,
    pub link_poll_interval: Duration,
    pub address_timeout: Duration,
    pub time_timeout: Duration,
    pub server: ServerConfig,
}

/// Timeouts for the request loop. Every suspension point in the loop is
/// bounded by one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub accept_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// Inactivity timeout the TCP stack applies to an accepted connection.
    pub socket_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mac_address: [0x02, 0x00, 0x00, 0x00, 0x57, 0x50],
            time_server: option_env!("TIME_SERVER").unwrap_or(DEFAULT_TIME_SERVER),
            link_timeout: Duration::from_secs(10),
            link_poll_interval: Duration::from_secs(1),
            address_timeout: Duration::from_secs(10),
            time_timeout: Duration::from_secs(1),
            server: ServerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 80,
            accept_timeout: Duration::from_secs(1),
            read_timeout: Duration::from_millis(500),
            write_timeout: Duration::from_secs(2),
            socket_timeout: Duration::from_secs(5),
        }
    }
}
