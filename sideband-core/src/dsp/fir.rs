// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `fir` module implements a Kaiser-windowed linear-phase lowpass FIR filter operating on
//! complex samples.

use super::complex::Complex;
use super::{kaiser, kaiser_beta, sinc};

/// A lowpass FIR filter with a push/execute interface: `push` shifts a sample into the delay
/// line, `execute` computes the current output.
#[derive(Clone, Debug)]
pub struct FirFilter {
    taps: Vec<f32>,
    window: Vec<Complex>,
    pos: usize,
    scale: f32,
}

impl FirFilter {
    /// Designs a lowpass filter of length `len` with cutoff `fc` (as a fraction of the sample
    /// rate) and `attenuation_db` of stopband attenuation.
    pub fn lowpass(len: usize, fc: f32, attenuation_db: f32) -> Self {
        assert!(len > 0);
        assert!(fc > 0.0 && fc < 0.5);

        let beta = kaiser_beta(attenuation_db);
        let center = (len - 1) as f32 / 2.0;

        let taps: Vec<f32> = (0..len)
            .map(|i| 2.0 * fc * sinc(2.0 * fc * (i as f32 - center)) * kaiser(i, len, beta))
            .collect();

        FirFilter { taps, window: vec![Complex::default(); len], pos: 0, scale: 2.0 * fc }
    }

    pub fn push(&mut self, s: Complex) {
        self.window[self.pos] = s;
        self.pos = (self.pos + 1) % self.window.len();
    }

    pub fn execute(&self) -> Complex {
        let len = self.window.len();
        let mut acc = Complex::default();

        // window[pos] is the oldest sample; taps are symmetric so ordering within the dot
        // product does not matter.
        for (i, &tap) in self.taps.iter().enumerate() {
            acc += self.window[(self.pos + i) % len] * tap;
        }

        acc.scale(self.scale)
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Group delay in samples.
    pub fn group_delay(&self) -> f32 {
        (self.taps.len() - 1) as f32 / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_lowpass_passes_dc() {
        let mut filter = FirFilter::lowpass(63, 0.1, 60.0);

        for _ in 0..63 {
            filter.push(Complex::new(1.0, 0.0));
        }

        // DC gain of the Kaiser prototype is ~1 before the output scale of 2*fc.
        let out = filter.execute();
        assert!((out.re - 0.2).abs() < 0.02);
        assert!(out.im.abs() < 1e-6);
    }

    #[test]
    fn verify_lowpass_rejects_high_frequency() {
        let mut filter = FirFilter::lowpass(63, 0.05, 60.0);

        // Alternating +1/-1 is the Nyquist frequency, far above the 0.05 cutoff.
        let mut out = Complex::default();
        for i in 0..200 {
            filter.push(Complex::new(if i % 2 == 0 { 1.0 } else { -1.0 }, 0.0));
            out = filter.execute();
        }

        assert!(out.norm() < 1e-3);
    }

    #[test]
    fn verify_group_delay() {
        let filter = FirFilter::lowpass(255, 0.014, 60.0);
        assert_eq!(filter.group_delay(), 127.0);
        assert_eq!(filter.len(), 255);
    }
}
