// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A `Channel` represents a single FM channel: a multiplex signal on one frequency, or one
//! channel of an audio file. The station on a channel may change, due to propagation changes
//! and the like.
//!
//! A `Channel` receives data either as demodulated bit buffers, single bits, or whole
//! groups. These inputs shouldn't be intermixed.

use std::io::Write;

use chrono::{DateTime, Duration, Local};

use sideband_core::util::{DelayLine, RunningAverage};

use crate::block_sync::BlockStream;
use crate::demod::BitBuffer;
use crate::group::Group;
use crate::options::{Options, OutputType};
use crate::output;
use crate::station::Station;
use crate::{BITS_PER_SECOND, NUM_BLER_AVERAGE_GROUPS};

/// Result of feeding one PI observation into the debounce filter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PiStatus {
    ChangeConfirmed,
    NoChange,
    SpuriousChange,
}

/// The PI code is not expected to change during normal reception. This filter tracks the
/// current PI code and ignores spurious bit errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct CachedPi {
    confirmed: u16,
    prev1: u16,
    prev2: u16,
    has_previous: bool,
}

impl CachedPi {
    pub fn new() -> Self {
        Default::default()
    }

    /// Inputs the most recently received PI code.
    pub fn update(&mut self, pi: u16) -> PiStatus {
        let mut status = PiStatus::SpuriousChange;

        // Three repeats of the same PI --> confirmed change
        if self.has_previous && self.prev1 == self.prev2 && pi == self.prev1 {
            status =
                if pi == self.confirmed { PiStatus::NoChange } else { PiStatus::ChangeConfirmed };
            self.confirmed = pi;
        }

        // So noisy that two PIs in a row get corrupted --> drop
        if self.has_previous
            && pi != self.confirmed
            && self.prev1 != self.confirmed
            && pi != self.prev1
        {
            self.reset();
        }
        else {
            self.has_previous = true;
        }

        self.prev2 = self.prev1;
        self.prev1 = pi;

        status
    }

    pub fn get(&self) -> u16 {
        self.confirmed
    }

    pub fn reset(&mut self) {
        *self = CachedPi::default();
    }
}

pub struct Channel {
    options: Options,
    which_channel: usize,
    cached_pi: CachedPi,
    block_streams: [BlockStream; 4],
    station: Station,
    bler_average: RunningAverage<NUM_BLER_AVERAGE_GROUPS>,
    last_group_rx_time: Option<DateTime<Local>>,
    // Remembers each bit's time offset for 104 bits = the length of one group
    delayed_time_offset: [DelayLine<f64, 104>; 4],
}

impl Channel {
    pub fn new(options: &Options, which_channel: usize) -> Self {
        Channel {
            options: options.clone(),
            which_channel,
            cached_pi: CachedPi::new(),
            block_streams: std::array::from_fn(|_| BlockStream::new(options.use_fec)),
            station: Station::new(options, which_channel),
            bler_average: RunningAverage::new(),
            last_group_rx_time: None,
            delayed_time_offset: Default::default(),
        }
    }

    /// Used for testing, when the PI is already known.
    pub fn with_pi(options: &Options, pi: u16) -> Self {
        let mut channel = Channel::new(options, 0);
        channel.station = Station::with_pi(options, 0, pi);
        channel.cached_pi.update(pi);
        channel.cached_pi.update(pi);
        channel
    }

    /// Receives one bit on the given data stream (0 to 3).
    pub fn process_bit(&mut self, bit: bool, stream: usize, out: &mut dyn Write) {
        self.block_streams[stream].push_bit(bit);

        if let Some(group) = self.block_streams[stream].pop_group() {
            self.process_group(group, stream, out);
        }
    }

    /// Receives the bits demodulated from one chunk.
    pub fn process_bits(&mut self, buffer: &BitBuffer, out: &mut dyn Write) {
        for stream in 0..buffer.num_streams {
            let num_bits = buffer.bits[stream].len();

            for (i_bit, timed_bit) in buffer.bits[stream].iter().enumerate() {
                self.block_streams[stream].push_bit(timed_bit.value);

                if self.options.time_from_start {
                    self.delayed_time_offset[stream].push(
                        buffer.chunk_time_from_start + f64::from(timed_bit.time_from_chunk_start),
                    );
                }

                let Some(mut group) = self.block_streams[stream].pop_group() else { continue };

                if self.options.timestamp {
                    // The group's rx time, extrapolated back from the buffer timestamp by
                    // its bit offset
                    let millis =
                        ((num_bits - 1 - i_bit) as f64 / f64::from(BITS_PER_SECOND) * 1e3) as i64;
                    let mut group_time = buffer.time_received - Duration::milliseconds(millis);

                    // When the source is faster than real time, the backwards calculation
                    // produces meaningless results; keep the timestamps monotonic.
                    if let Some(last) = self.last_group_rx_time {
                        if group_time < last {
                            group_time = last;
                        }
                    }

                    group.set_rx_time(group_time);
                    self.last_group_rx_time = Some(group_time);
                }

                if self.options.time_from_start {
                    // The delay line holds the offset from 104 bits ago, the first bit of
                    // this group
                    group.set_time_from_start(self.delayed_time_offset[stream].get());
                }

                self.process_group(group, stream, out);
            }
        }
    }

    /// Handles a group as if it were just received on the given data stream.
    pub fn process_group(&mut self, mut group: Group, stream: usize, out: &mut dyn Write) {
        if self.options.timestamp && group.rx_time().is_none() {
            let mut now = Local::now();
            if let Some(last) = self.last_group_rx_time {
                if now < last {
                    now = last;
                }
            }
            group.set_rx_time(now);
            self.last_group_rx_time = Some(now);
        }

        if self.options.bler {
            self.bler_average.push(group.num_errors() as f32 / 4.0);
            group.set_average_bler(100.0 * self.bler_average.average());
        }

        if stream != 0 {
            group.set_version_c();
        }
        group.set_data_stream(stream as u32);

        // A change of PI clears all previously received station data, so it's only acted on
        // once confirmed by repeats; spurious bit errors must not destroy the state.
        if group.has_pi() {
            match self.cached_pi.update(group.pi()) {
                PiStatus::ChangeConfirmed => {
                    log::debug!("PI changed to 0x{:04X}, clearing station state", self.cached_pi.get());
                    self.station =
                        Station::with_pi(&self.options, self.which_channel, self.cached_pi.get());
                }
                PiStatus::NoChange | PiStatus::SpuriousChange => (),
            }
        }

        if self.options.output_type == OutputType::Hex {
            output::print_hex(&group, &self.options, out);
        }
        else {
            self.station.update_and_print(&group, out);
        }
    }

    /// Processes any remaining data.
    pub fn flush(&mut self, out: &mut dyn Write) {
        for stream in 0..self.block_streams.len() {
            let remaining_group = self.block_streams[stream].flush_current_group();
            if !remaining_group.is_empty() {
                self.process_group(remaining_group, stream, out);
            }
        }
    }

    /// Not to be used for measurements; may lose precision.
    pub fn seconds_since_carrier_lost(&self) -> f32 {
        self.block_streams[0].num_bits_since_sync_lost() as f32 / BITS_PER_SECOND
    }

    pub fn reset_pi(&mut self) {
        self.cached_pi.reset();
    }
}
