// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoder for the FM Radio Data System (RDS and RDS2): from baseband MPX samples or raw
//! bitstreams down to structured per-group records.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod block_sync;
pub mod channel;
pub mod decode;
pub mod demod;
pub mod group;
pub mod options;
pub mod output;
pub mod rft;
pub mod station;
pub mod tables;
pub mod text;

pub use channel::Channel;
pub use group::{Block, BlockNumber, Group, GroupType, Offset, Version};
pub use options::{Options, OutputType};

/// The RDS bit rate.
pub const BITS_PER_SECOND: f32 = 1187.5;

/// Minimum sensible sample rate to still have RDS below Nyquist.
pub const MINIMUM_SAMPLE_RATE_HZ: f32 = 128_000.0;

/// Upper bound for the input sample rate, set by the resampler's minimum ratio.
pub const MAXIMUM_SAMPLE_RATE_HZ: f32 = 40_000_000.0;

/// All MPX input is internally resampled to this rate.
pub const TARGET_SAMPLE_RATE_HZ: f32 = 171_000.0;

/// The block error rate is averaged over this many groups.
pub const NUM_BLER_AVERAGE_GROUPS: usize = 12;

/// Greatest supported upsampling ratio.
pub const MAX_RESAMPLE_RATIO: f32 = TARGET_SAMPLE_RATE_HZ / MINIMUM_SAMPLE_RATE_HZ;
