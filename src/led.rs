// SPDX-FileCopyrightText: 2026 Sam Hanes <sam@maltera.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use embedded_hal::digital::{Error, OutputPin, PinState};

/// The LED output and the state last requested for it.
///
/// Owned by the request loop, which is the only reader and writer. Sharing it
/// with another task needs a mutex around the whole struct.
pub struct Led<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> Led<P> {
    /// Takes the pin and switches it on.
    pub fn new(pin: P) -> Self {
        let mut led = Led { pin, on: false };
        led.set(true);
        led
    }

    pub fn set(&mut self, on: bool) {
        // the requested state sticks even if the pin write fails
        self.on = on;
        if let Err(e) = self.pin.set_state(PinState::from(on)) {
            warn!("LED pin write failed: {:?}", e.kind());
        }
    }

    pub fn get(&self) -> bool {
        self.on
    }

    pub fn label(&self) -> &'static str {
        if self.on { "ON" } else { "OFF" }
    }
}
