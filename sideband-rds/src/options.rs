// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoder options, passed down from the application to every pipeline stage.

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OutputType {
    #[default]
    Json,
    Hex,
}

#[derive(Clone, Debug)]
pub struct Options {
    /// Use North American (RBDS) programme-type names and callsign back-calculation.
    pub rbds: bool,
    /// Emit partially received multi-group data (`partial_ps`, `partial_radiotext`, ...).
    pub show_partial: bool,
    /// Annotate each group with its time of reception.
    pub timestamp: bool,
    /// strftime-style format for `rx_time`; `%f` adds hundredths of seconds.
    pub time_format: String,
    /// Report the running block error rate.
    pub bler: bool,
    /// Include the raw group data as hex in the JSON output.
    pub show_raw: bool,
    /// Attempt burst-error correction on blocks that fail the syndrome check.
    pub use_fec: bool,
    /// Demodulate all four RDS2 data streams instead of only the 57 kHz stream.
    pub streams: bool,
    /// Annotate each group with its offset, in seconds, from the start of the input.
    pub time_from_start: bool,
    pub num_channels: u32,
    pub output_type: OutputType,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            rbds: false,
            show_partial: false,
            timestamp: false,
            time_format: String::new(),
            bler: false,
            show_raw: false,
            use_fec: true,
            streams: false,
            time_from_start: false,
            num_channels: 1,
            output_type: OutputType::Json,
        }
    }
}
