// SPDX-FileCopyrightText: 2026 Sam Hanes <sam@maltera.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use chrono::{DateTime, NaiveDateTime};
use embassy_time::Instant;

use crate::net::sntp::UnixSeconds;

/// Wall-clock time derived from one time-service reply and the monotonic
/// clock since then.
#[derive(Clone, Copy, Debug)]
pub struct WallClock {
    anchor: Option<(UnixSeconds, Instant)>,
}

impl WallClock {
    pub fn synchronized(unix: UnixSeconds) -> Self {
        Self::anchored(unix, Instant::now())
    }

    pub fn anchored(unix: UnixSeconds, at: Instant) -> Self {
        WallClock { anchor: Some((unix, at)) }
    }

    pub fn unsynchronized() -> Self {
        WallClock { anchor: None }
    }

    pub fn now(&self) -> Option<UnixSeconds> {
        let (unix, at) = self.anchor?;
        Some(unix + at.elapsed().as_secs())
    }

    pub fn now_utc(&self) -> Option<NaiveDateTime> {
        let secs = i64::try_from(self.now()?).ok()?;
        DateTime::from_timestamp(secs, 0).map(|t| t.naive_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsynchronized_has_no_time() {
        let clock = WallClock::unsynchronized();
        assert_eq!(clock.now(), None);
        assert_eq!(clock.now_utc(), None);
    }

    #[test]
    fn advances_with_the_monotonic_clock() {
        let clock = WallClock::anchored(1_578_321_600, Instant::from_ticks(0));
        let before = Instant::now().as_secs();
        let now = clock.now().unwrap();
        let after = Instant::now().as_secs();
        assert!((1_578_321_600 + before..=1_578_321_600 + after).contains(&now));
    }

    #[test]
    fn renders_as_utc() {
        let clock = WallClock::anchored(1_578_321_600, Instant::now());
        let utc = clock.now_utc().unwrap();
        let text = std::format!("{utc}");
        assert!(text.starts_with("2020-01-06 14:40:0"), "{text}");
    }
}
