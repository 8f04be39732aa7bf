// SPDX-FileCopyrightText: 2026 Sam Hanes <sam@maltera.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use alloc::format;
use alloc::string::String;

use chrono::NaiveDateTime;

/// The status page with the LED label and the current time.
pub fn render(led_label: &str, now: Option<NaiveDateTime>) -> String {
    let time = match now {
        Some(now) => format!("{} UTC", now),
        None => String::from("not synchronized"),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0"/>
<title>ESP32 Web server - WIZnet W5500</title>
</head>
<body>
<div align="center">
<h2>Control LED</h2>
LED state: <strong>{led_label}</strong>
<p><a href="/?led=on"><button class="button">ON</button></a><br>
</p>
<p><a href="/?led=off"><button class="button button2">OFF</button></a><br>
</p>
Time: {time}
</div>
</body>
</html>
"#
    )
}
