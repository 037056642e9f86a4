// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `symsync` module implements a polyphase symbol-timing synchronizer.
//!
//! A bank of root-raised-cosine matched filters, each a fractionally-delayed version of the
//! prototype, is indexed by the timing estimate. The timing error is measured with a
//! maximum-likelihood detector (matched filter output times derivative matched filter output)
//! and fed into a proportional-plus-integral loop.

use super::complex::Complex;
use super::PI;

#[derive(Clone, Debug)]
pub struct SymSync {
    samples_per_symbol: usize,
    num_filters: usize,
    // Matched filter bank and its derivative, one subfilter per fractional delay.
    mf: Vec<Vec<f32>>,
    dmf: Vec<Vec<f32>>,
    window: Vec<Complex>,
    pos: usize,
    // Timing estimate as a fraction of one sample, in [0, 1).
    tau: f32,
    // Integrated rate offset.
    rate: f32,
    alpha: f32,
    beta: f32,
    counter: usize,
    // One-shot sample skip/stuff after a timing wrap.
    next_period: usize,
}

/// Root-raised-cosine impulse response at `t` symbol periods from the peak, roll-off `beta`.
fn rrc(t: f32, beta: f32) -> f32 {
    if t.abs() < 1e-6 {
        return 1.0 - beta + 4.0 * beta / PI;
    }

    let quarter = 1.0 / (4.0 * beta);
    if (t.abs() - quarter).abs() < 1e-5 {
        return (beta / 2f32.sqrt())
            * ((1.0 + 2.0 / PI) * (PI / (4.0 * beta)).sin()
                + (1.0 - 2.0 / PI) * (PI / (4.0 * beta)).cos());
    }

    ((PI * t * (1.0 - beta)).sin() + 4.0 * beta * t * (PI * t * (1.0 + beta)).cos())
        / (PI * t * (1.0 - (4.0 * beta * t) * (4.0 * beta * t)))
}

impl SymSync {
    /// Creates a synchronizer with a root-raised-cosine matched filter.
    ///
    /// `samples_per_symbol` is the nominal oversampling factor, `delay` the filter delay in
    /// symbols, `beta` the RRC roll-off, and `num_filters` the number of fractional delays in
    /// the bank.
    pub fn rrc(samples_per_symbol: usize, delay: usize, beta: f32, num_filters: usize) -> Self {
        let k = samples_per_symbol;
        let sub_len = 2 * k * delay + 1;
        let proto_len = sub_len * num_filters;

        // Prototype at the filter-bank oversampled rate.
        let center = (proto_len - 1) as f32 / 2.0;
        let proto: Vec<f32> = (0..proto_len)
            .map(|i| rrc((i as f32 - center) / (k * num_filters) as f32, beta))
            .collect();

        // The numerical derivative drives the timing error detector.
        let dproto: Vec<f32> = (0..proto_len)
            .map(|i| {
                let prev = if i > 0 { proto[i - 1] } else { 0.0 };
                let next = if i + 1 < proto_len { proto[i + 1] } else { 0.0 };
                (next - prev) / 2.0
            })
            .collect();

        let partition = |proto: &[f32]| -> Vec<Vec<f32>> {
            (0..num_filters)
                .map(|phase| {
                    let sub: Vec<f32> =
                        (0..sub_len).map(|j| proto[j * num_filters + phase] / k as f32).collect();
                    sub
                })
                .collect()
        };

        SymSync {
            samples_per_symbol: k,
            num_filters,
            mf: partition(&proto),
            dmf: partition(&dproto),
            window: vec![Complex::default(); sub_len],
            pos: 0,
            tau: 0.0,
            rate: 0.0,
            alpha: 0.01,
            beta: 0.000025,
            counter: 0,
            next_period: k,
        }
    }

    /// `bandwidth` is the loop bandwidth as a fraction of the sample rate.
    pub fn set_bandwidth(&mut self, bandwidth: f32) {
        self.alpha = bandwidth;
        self.beta = 0.25 * bandwidth * bandwidth;
    }

    pub fn reset(&mut self) {
        for s in self.window.iter_mut() {
            *s = Complex::default();
        }
        self.pos = 0;
        self.tau = 0.0;
        self.rate = 0.0;
        self.counter = 0;
        self.next_period = self.samples_per_symbol;
    }

    fn filter(&self, taps: &[f32]) -> Complex {
        let len = self.window.len();
        let mut acc = Complex::default();
        for (i, &tap) in taps.iter().enumerate() {
            acc += self.window[(self.pos + i) % len] * tap;
        }
        acc
    }

    /// Pushes one input sample. Returns a symbol once per symbol period, sampled at the
    /// current timing estimate.
    pub fn execute(&mut self, s: Complex) -> Option<Complex> {
        self.window[self.pos] = s;
        self.pos = (self.pos + 1) % self.window.len();

        self.counter += 1;
        if self.counter < self.next_period {
            return None;
        }
        self.counter = 0;
        self.next_period = self.samples_per_symbol;

        let phase = ((self.tau * self.num_filters as f32) as usize).min(self.num_filters - 1);
        let symbol = self.filter(&self.mf[phase]);
        let dsymbol = self.filter(&self.dmf[phase]);

        // Maximum-likelihood timing error
        let error = (symbol.re * dsymbol.re + symbol.im * dsymbol.im).clamp(-1.0, 1.0);

        self.rate += self.beta * error;
        self.tau += self.alpha * error + self.rate;

        // A wrap of the fractional timing means the symbol clock slipped a whole sample.
        if self.tau >= 1.0 {
            self.tau -= 1.0;
            self.next_period = self.samples_per_symbol + 1;
        }
        else if self.tau < 0.0 {
            self.tau += 1.0;
            self.next_period = self.samples_per_symbol - 1;
        }

        Some(symbol)
    }
}
