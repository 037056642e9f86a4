// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `dsp` module provides the signal-processing primitives used by the subcarrier
//! demodulator: automatic gain control, FIR filtering, a numerically-controlled oscillator
//! with a phase-locked loop, a polyphase symbol synchronizer, and a rational resampler.

pub mod agc;
pub mod complex;
pub mod fir;
pub mod nco;
pub mod resampler;
pub mod symsync;

pub const PI: f32 = std::f32::consts::PI;
pub const TWO_PI: f32 = 2.0 * PI;

/// Hertz to radians per sample.
#[inline(always)]
pub fn angular_freq(hertz: f32, samplerate: f32) -> f32 {
    hertz * TWO_PI / samplerate
}

/// Wraps a phase to (-pi, pi].
#[inline(always)]
pub fn unwrap_phase(phase: f32) -> f32 {
    if phase > PI {
        phase - TWO_PI
    }
    else if phase < -PI {
        phase + TWO_PI
    }
    else {
        phase
    }
}

/// Zeroth-order modified Bessel function of the first kind, by power series.
pub(crate) fn bessel_i0(x: f32) -> f32 {
    let mut sum = 1.0f64;
    let mut term = 1.0f64;
    let half_x = f64::from(x) / 2.0;

    for k in 1..32 {
        term *= (half_x / k as f64) * (half_x / k as f64);
        sum += term;
    }

    sum as f32
}

/// Kaiser window of length `len` with shape parameter `beta`, evaluated at tap `i`.
pub(crate) fn kaiser(i: usize, len: usize, beta: f32) -> f32 {
    let center = (len - 1) as f32 / 2.0;
    let t = (i as f32 - center) / center;
    bessel_i0(beta * (1.0 - t * t).max(0.0).sqrt()) / bessel_i0(beta)
}

/// Kaiser shape parameter for a given stopband attenuation in dB.
pub(crate) fn kaiser_beta(attenuation_db: f32) -> f32 {
    if attenuation_db > 50.0 {
        0.1102 * (attenuation_db - 8.7)
    }
    else if attenuation_db > 21.0 {
        0.5842 * (attenuation_db - 21.0).powf(0.4) + 0.07886 * (attenuation_db - 21.0)
    }
    else {
        0.0
    }
}

/// Normalized sinc.
#[inline]
pub(crate) fn sinc(x: f32) -> f32 {
    if x.abs() < 1e-6 {
        1.0
    }
    else {
        (PI * x).sin() / (PI * x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_unwrap_phase() {
        assert!((unwrap_phase(PI + 0.1) - (0.1 - PI)).abs() < 1e-5);
        assert!((unwrap_phase(-PI - 0.1) - (PI - 0.1)).abs() < 1e-5);
        assert_eq!(unwrap_phase(0.5), 0.5);
    }

    #[test]
    fn verify_bessel_i0() {
        // Known values of I0
        assert!((bessel_i0(0.0) - 1.0).abs() < 1e-6);
        assert!((bessel_i0(1.0) - 1.2660658).abs() < 1e-4);
        assert!((bessel_i0(2.0) - 2.2795852).abs() < 1e-4);
    }

    #[test]
    fn verify_sinc() {
        assert_eq!(sinc(0.0), 1.0);
        assert!(sinc(1.0).abs() < 1e-6);
        assert!(sinc(2.0).abs() < 1e-6);
        assert!((sinc(0.5) - 2.0 / PI).abs() < 1e-5);
    }
}
