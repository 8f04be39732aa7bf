// SPDX-FileCopyrightText: 2026 Sam Hanes <sam@maltera.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use core::fmt;

use embassy_time::{Duration, Instant, Timer};

use super::LinkStatus;

/// The link did not come up before the deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkTimeout {
    pub waited_ms: u64,
}

impl fmt::Display for LinkTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link still down after {} ms", self.waited_ms)
    }
}

/// Polls a link indicator at a fixed cadence.
#[derive(Clone, Copy, Debug)]
pub struct LinkMonitor {
    poll_interval: Duration,
}

impl Default for LinkMonitor {
    fn default() -> Self {
        LinkMonitor::new(Duration::from_secs(1))
    }
}

impl LinkMonitor {
    pub fn new(poll_interval: Duration) -> Self {
        LinkMonitor { poll_interval }
    }

    /// Waits for the link to come up.
    ///
    /// Returns as soon as a poll sees the link up. The deadline is fixed when
    /// the wait starts and the last sleep is cut short to land on it, so a
    /// failure is reported no later than `max_wait` plus one poll interval.
    pub async fn await_link<L: LinkStatus>(
        &self,
        link: &L,
        max_wait: Duration,
    ) -> Result<(), LinkTimeout> {
        let start = Instant::now();
        let deadline = start + max_wait;

        loop {
            if link.link_up() {
                debug!("link up after {} ms", start.elapsed().as_millis());
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(LinkTimeout { waited_ms: start.elapsed().as_millis() });
            }

            debug!("waiting for link...");
            Timer::at((now + self.poll_interval).min(deadline)).await;
        }
    }
}
