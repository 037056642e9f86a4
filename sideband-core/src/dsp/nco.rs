// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `nco` module implements a numerically-controlled oscillator with a phase-locked loop.
//!
//! The oscillator tracks the 57 kHz RDS subcarrier. The three RDS2 subcarriers (66.5, 71.25,
//! and 76 kHz) are not tracked independently: all four are transmitted phase-coherently, so
//! their mixer phases are derived from the tracked phase by scaling each phase increment with
//! the frequency ratio.

use super::complex::Complex;
use super::unwrap_phase;

/// Subcarrier center frequencies for RDS2 data streams 0 to 3, in Hz.
const STREAM_FREQUENCIES: [f32; 4] = [57_000.0, 66_500.0, 71_250.0, 76_000.0];

#[derive(Clone, Debug)]
pub struct Nco {
    initial_frequency: f32,
    frequency: f32,
    phase: f32,
    prev_phase: f32,
    stream_phases: [f32; 4],
    pll_alpha: f32,
    pll_beta: f32,
}

impl Nco {
    /// `frequency` is in radians per sample.
    pub fn new(frequency: f32) -> Self {
        Nco {
            initial_frequency: frequency,
            frequency,
            phase: 0.0,
            prev_phase: 0.0,
            stream_phases: [0.0; 4],
            pll_alpha: 0.0,
            pll_beta: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.frequency = self.initial_frequency;
        self.phase = 0.0;
        self.prev_phase = 0.0;
        self.stream_phases = [0.0; 4];
    }

    /// Mixes the sample down to baseband on the given data stream (0 to 3).
    pub fn mix_down(&self, s: Complex, stream: usize) -> Complex {
        s * Complex::from_polar(1.0, -self.stream_phases[stream])
    }

    /// Advances the oscillator by one sample period and propagates the phase step to all
    /// stream mixers.
    pub fn step(&mut self) {
        self.phase = unwrap_phase(self.phase + self.frequency);

        let delta = unwrap_phase(self.phase - self.prev_phase);
        self.prev_phase = self.phase;

        for (phase, freq) in self.stream_phases.iter_mut().zip(&STREAM_FREQUENCIES) {
            *phase = unwrap_phase(*phase + delta * freq / STREAM_FREQUENCIES[0]);
        }
    }

    /// `bandwidth` is the loop bandwidth as a fraction of the sample rate.
    pub fn set_pll_bandwidth(&mut self, bandwidth: f32) {
        // Proportional-plus-integral loop: the phase reacts at the loop bandwidth, the
        // frequency integrates the squared bandwidth.
        self.pll_beta = bandwidth;
        self.pll_alpha = bandwidth * bandwidth;
    }

    /// Applies one phase-error measurement to the loop.
    pub fn pll_step(&mut self, dphi: f32) {
        self.frequency += self.pll_alpha * dphi;
        self.phase = unwrap_phase(self.phase + self.pll_beta * dphi);
    }
}
