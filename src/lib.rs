// SPDX-FileCopyrightText: 2026 Sam Hanes <sam@maltera.com>
// SPDX-License-Identifier: GPL-3.0-or-later

#![cfg_attr(not(test), no_std)]

extern crate alloc;

// must stay first so the logging macros are visible to the modules below
#[macro_use]
mod fmt;

pub mod clock;
pub mod config;
pub mod http;
pub mod led;
pub mod net;
pub mod page;

pub use fmt::Loggable;
