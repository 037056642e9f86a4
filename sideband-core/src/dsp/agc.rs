// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `agc` module implements an automatic gain control with a logarithmic loop.

use super::complex::Complex;

const MAX_GAIN: f32 = 1e6;
const MIN_GAIN: f32 = 1e-6;

/// Automatic gain control. Drives the average output energy towards unity, one sample in,
/// one sample out.
#[derive(Clone, Debug)]
pub struct Agc {
    bandwidth: f32,
    gain: f32,
}

impl Agc {
    /// `bandwidth` is the loop bandwidth as a fraction of the sample rate.
    pub fn new(bandwidth: f32, initial_gain: f32) -> Self {
        Agc { bandwidth, gain: initial_gain }
    }

    pub fn execute(&mut self, s: Complex) -> Complex {
        let out = s.scale(self.gain);

        let energy = out.norm_sqr();
        if energy > 0.0 {
            // Adjust the gain in the log domain, proportionally to the output level error.
            self.gain *= (-0.5 * self.bandwidth * energy.ln()).exp();
            self.gain = self.gain.clamp(MIN_GAIN, MAX_GAIN);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_agc_converges() {
        let mut agc = Agc::new(0.05, 1.0);

        // A constant-envelope input at one third of full scale should converge to unit level.
        let mut out = Complex::default();
        for _ in 0..10_000 {
            out = agc.execute(Complex::new(0.33, 0.0));
        }

        assert!((out.norm() - 1.0).abs() < 0.05);
    }

    #[test]
    fn verify_agc_ignores_zero_input() {
        let mut agc = Agc::new(0.05, 2.0);
        let out = agc.execute(Complex::new(0.0, 0.0));
        assert_eq!(out, Complex::new(0.0, 0.0));

        // Gain must be untouched by the zero-energy sample.
        let out = agc.execute(Complex::new(0.5, 0.0));
        assert_eq!(out, Complex::new(1.0, 0.0));
    }
}
