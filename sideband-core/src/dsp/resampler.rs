// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `resampler` module implements a polyphase arbitrary-ratio resampler for real samples.

use crate::errors::{unsupported_error, Result};

use super::{kaiser, kaiser_beta, sinc};

/// Ratios below this are rejected; so are ratios above `MAX_OUTPUTS_PER_INPUT`.
pub const MIN_RESAMPLER_RATIO: f32 = 0.005;

/// An `execute` call yields at most this many output samples.
pub const MAX_OUTPUTS_PER_INPUT: usize = 2;

const NUM_FILTERS: usize = 32;
const CUTOFF: f32 = 0.47;
const ATTENUATION_DB: f32 = 60.0;

/// Polyphase resampler: one real sample in, 0 to `MAX_OUTPUTS_PER_INPUT` samples out,
/// depending on the conversion ratio (output rate / input rate).
#[derive(Clone, Debug)]
pub struct Resampler {
    // One subfilter per fractional delay.
    bank: Vec<Vec<f32>>,
    window: Vec<f32>,
    pos: usize,
    // Input-sample phase accumulator in units of output intervals.
    acc: f32,
    // Input samples consumed per output sample (1 / ratio).
    step: f32,
}

impl Resampler {
    /// `half_length` is the subfilter half-length in input samples.
    pub fn new(half_length: usize) -> Self {
        let sub_len = 2 * half_length;
        let proto_len = sub_len * NUM_FILTERS;
        let center = (proto_len - 1) as f32 / 2.0;
        let beta = kaiser_beta(ATTENUATION_DB);
        let fc = CUTOFF / NUM_FILTERS as f32;

        let proto: Vec<f32> = (0..proto_len)
            .map(|i| 2.0 * fc * sinc(2.0 * fc * (i as f32 - center)) * kaiser(i, proto_len, beta))
            .collect();

        // Partition and normalize each subfilter to unit DC gain so that the passband level
        // is independent of the fractional delay.
        let bank: Vec<Vec<f32>> = (0..NUM_FILTERS)
            .map(|phase| {
                let sub: Vec<f32> = (0..sub_len).map(|j| proto[j * NUM_FILTERS + phase]).collect();
                let sum: f32 = sub.iter().sum();
                if sum.abs() > 1e-9 {
                    sub.iter().map(|t| t / sum).collect()
                }
                else {
                    sub
                }
            })
            .collect();

        Resampler { bank, window: vec![0.0; sub_len], pos: 0, acc: 0.0, step: 1.0 }
    }

    /// Sets the conversion ratio (output rate / input rate).
    pub fn set_ratio(&mut self, ratio: f32) -> Result<()> {
        if ratio < MIN_RESAMPLER_RATIO || ratio > MAX_OUTPUTS_PER_INPUT as f32 {
            return unsupported_error("resampler ratio out of range");
        }
        self.step = 1.0 / ratio;
        Ok(())
    }

    fn filter(&self, taps: &[f32]) -> f32 {
        let len = self.window.len();
        let mut acc = 0.0;
        for (i, &tap) in taps.iter().enumerate() {
            acc += self.window[(self.pos + i) % len] * tap;
        }
        acc
    }

    /// Pushes one input sample and writes any produced output samples to `out`.
    /// Returns the number of outputs produced.
    pub fn execute(&mut self, input: f32, out: &mut [f32; MAX_OUTPUTS_PER_INPUT]) -> usize {
        self.window[self.pos] = input;
        self.pos = (self.pos + 1) % self.window.len();

        let mut num_written = 0;
        while self.acc < 1.0 && num_written < MAX_OUTPUTS_PER_INPUT {
            let phase =
                ((self.acc * NUM_FILTERS as f32) as usize).min(NUM_FILTERS - 1);
            out[num_written] = self.filter(&self.bank[phase]);
            num_written += 1;
            self.acc += self.step;
        }
        self.acc -= 1.0;

        num_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_ratio_bounds() {
        let mut resampler = Resampler::new(13);
        assert!(resampler.set_ratio(0.001).is_err());
        assert!(resampler.set_ratio(3.0).is_err());
        assert!(resampler.set_ratio(171_000.0 / 128_000.0).is_ok());
        assert!(resampler.set_ratio(1.0).is_ok());
    }

    #[test]
    fn verify_output_count_matches_ratio() {
        let mut resampler = Resampler::new(13);
        resampler.set_ratio(171_000.0 / 128_000.0).unwrap();

        let mut out = [0.0f32; MAX_OUTPUTS_PER_INPUT];
        let mut total = 0usize;
        for _ in 0..1000 {
            total += resampler.execute(1.0, &mut out);
        }

        // 1000 inputs at a ratio of 1.336 → about 1336 outputs.
        assert!((total as i32 - 1336).abs() <= 2);
    }

    #[test]
    fn verify_dc_preserved() {
        let mut resampler = Resampler::new(13);
        resampler.set_ratio(1.25).unwrap();

        let mut out = [0.0f32; MAX_OUTPUTS_PER_INPUT];
        let mut last = 0.0;
        for _ in 0..500 {
            if resampler.execute(1.0, &mut out) > 0 {
                last = out[0];
            }
        }

        assert!((last - 1.0).abs() < 0.01);
    }
}
