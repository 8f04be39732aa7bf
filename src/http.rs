// SPDX-FileCopyrightText: 2026 Sam Hanes <sam@maltera.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Single-connection request loop.
//!
//! Each iteration accepts one client, reads a short prefix of whatever it
//! sends, switches the LED if the prefix carries a directive and answers with
//! the status page. The next client is only accepted after the previous one
//! has been closed. This is not an HTTP parser: the directive is found by a
//! substring scan of the first [`REQUEST_PREFIX_LEN`] bytes.

use alloc::format;

use embassy_time::with_timeout;
use embedded_hal::digital::OutputPin;
use embedded_io_async::{Error, Read, Write};

use crate::clock::WallClock;
use crate::config::{REQUEST_PREFIX_LEN, ServerConfig};
use crate::led::Led;
use crate::net::{Connection, Listener};
use crate::page;

const STATUS_LINE: &[u8] = b"HTTP/1.1 200 OK\n";
const CONNECTION_HEADER: &[u8] = b"Connection: close\n";
const CONTENT_TYPE_HEADER: &[u8] = b"Content-Type: text/html\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Directive {
    On,
    Off,
}

impl Directive {
    const ON: &'static [u8] = b"/?led=on";
    const OFF: &'static [u8] = b"/?led=off";

    /// Finds a directive anywhere in `prefix`.
    ///
    /// The raw bytes are searched, so bytes that aren't valid UTF-8 never hide
    /// a directive. "on" is checked before "off", so a prefix carrying both
    /// ends up off.
    pub fn scan(prefix: &[u8]) -> Option<Directive> {
        let mut found = None;
        if contains(prefix, Self::ON) {
            found = Some(Directive::On);
        }
        if contains(prefix, Self::OFF) {
            found = Some(Directive::Off);
        }
        found
    }

    pub fn is_on(self) -> bool {
        self == Directive::On
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// What one loop iteration did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Nobody connected within the accept timeout.
    NoClient,
    /// The listener reported an error.
    AcceptFailed,
    /// A page was sent; `directive` is what the request asked for, if anything.
    Served { directive: Option<Directive> },
    /// The connection failed and was closed without a complete response.
    Dropped,
}

/// Writes the status line, headers and body, each with its own write.
///
/// Lines end in a bare `\n`, which browsers accept.
async fn write_response<W: Write>(conn: &mut W, body: &str) -> Result<(), W::Error> {
    conn.write_all(STATUS_LINE).await?;
    conn.write_all(CONNECTION_HEADER).await?;
    conn.write_all(CONTENT_TYPE_HEADER).await?;
    conn.write_all(format!("Content-Length: {}\n\n", body.len()).as_bytes()).await?;
    conn.write_all(body.as_bytes()).await?;
    conn.flush().await
}

pub struct Server<L, P> {
    listener: L,
    led: Led<P>,
    clock: WallClock,
    config: ServerConfig,
}

impl<L: Listener, P: OutputPin> Server<L, P> {
    pub fn new(listener: L, led: Led<P>, clock: WallClock, config: ServerConfig) -> Self {
        Server { listener, led, clock, config }
    }

    pub fn led(&self) -> &Led<P> {
        &self.led
    }

    /// Serves clients until the device is reset.
    pub async fn run(mut self) -> ! {
        info!("serving on port {}", self.config.port);
        loop {
            self.serve_once().await;
        }
    }

    /// Runs one accept/read/respond cycle. Never fails; every error ends the
    /// cycle and the next one starts from accept again.
    pub async fn serve_once(&mut self) -> Outcome {
        let Server { listener, led, clock, config } = self;

        let mut conn = match with_timeout(config.accept_timeout, listener.accept()).await {
            Err(_) => {
                trace!("no client");
                return Outcome::NoClient;
            }
            Ok(Err(e)) => {
                warn!("accept failed: {:?}", e);
                return Outcome::AcceptFailed;
            }
            Ok(Ok(conn)) => conn,
        };

        let mut prefix = [0u8; REQUEST_PREFIX_LEN];
        let directive = match with_timeout(config.read_timeout, conn.read(&mut prefix)).await {
            Err(_) => {
                debug!("client sent nothing");
                None
            }
            Ok(Err(e)) => {
                warn!("read failed: {:?}", e.kind());
                conn.close().await;
                return Outcome::Dropped;
            }
            Ok(Ok(len)) => Directive::scan(&prefix[..len]),
        };

        if let Some(directive) = directive {
            info!("turn LED {}", if directive.is_on() { "ON" } else { "OFF" });
            led.set(directive.is_on());
        }

        let body = page::render(led.label(), clock.now_utc());
        let written = with_timeout(config.write_timeout, write_response(&mut conn, &body)).await;
        let outcome = match written {
            Ok(Ok(())) => Outcome::Served { directive },
            Ok(Err(e)) => {
                warn!("write failed: {:?}", e.kind());
                Outcome::Dropped
            }
            Err(_) => {
                warn!("write timed out");
                Outcome::Dropped
            }
        };
        conn.close().await;
        outcome
    }
}
