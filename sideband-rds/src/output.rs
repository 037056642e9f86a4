// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output formatting: newline-delimited JSON records and the RDS Spy hex format.

use std::io::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Timelike};
use serde_json::Value;

use crate::group::Group;
use crate::options::Options;

/// Formats a timestamp with an strftime-style format string. `%f` inserts hundredths of
/// seconds.
pub fn time_point_string(time: DateTime<Local>, format: &str) -> String {
    let format = if let Some(found) = format.find("%f") {
        let hundredths = time.nanosecond() / 10_000_000;
        let mut with_fractional = format.to_string();
        with_fractional.replace_range(found..found + 2, &format!("{:02}", hundredths));
        with_fractional
    }
    else {
        format.to_string()
    };

    let items: Vec<Item<'_>> = StrftimeItems::new(&format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return "(format error)".to_string();
    }

    time.format_with_items(items.into_iter()).to_string()
}

/// Prints one group in the RDS Spy hex format, with optional timestamp columns.
pub fn print_hex(group: &Group, options: &Options, stream: &mut dyn Write) {
    if group.is_empty() {
        return;
    }

    let mut line = String::new();
    if group.data_stream() > 0 {
        line += &format!("#S{} ", group.data_stream());
    }
    line += &group.as_hex();

    if options.timestamp {
        if let Some(rx_time) = group.rx_time() {
            line += &format!(" {}", time_point_string(rx_time, &options.time_format));
        }
    }
    if options.time_from_start {
        if let Some(time_from_start) = group.time_from_start() {
            line += &format!(" {:.6}", time_from_start);
        }
    }

    let _ = writeln!(stream, "{}", line);
    let _ = stream.flush();
}

/// Prints one JSON record per line. A serialization failure degrades into a record with only
/// a `debug` field; it never produces partial output.
pub fn print_json(tree: &Value, stream: &mut dyn Write) {
    match serde_json::to_string(tree) {
        Ok(line) => {
            let _ = writeln!(stream, "{}", line);
        }
        Err(err) => {
            let fallback = serde_json::json!({ "debug": err.to_string() });
            let _ = writeln!(stream, "{}", fallback);
        }
    }
    let _ = stream.flush();
}
