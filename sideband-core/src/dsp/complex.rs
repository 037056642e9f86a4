// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `complex` module implements a 32-bit floating point complex number.

/// A complex number.
#[derive(Copy, Clone, Default, Debug, PartialEq)]
#[repr(C)]
pub struct Complex {
    /// The real component.
    pub re: f32,
    /// The imaginary component.
    pub im: f32,
}

impl Complex {
    /// Create a new complex number.
    #[inline(always)]
    pub fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    /// Create a complex number from polar coordinates.
    #[inline(always)]
    pub fn from_polar(r: f32, theta: f32) -> Self {
        Self { re: r * theta.cos(), im: r * theta.sin() }
    }

    /// Scale the complex number.
    #[inline(always)]
    pub fn scale(&self, scale: f32) -> Self {
        Self { re: self.re * scale, im: self.im * scale }
    }

    /// Take the complex conjugate of `self`.
    ///
    /// For a complex number defined as `a + jb` the complex conjugate is defined to be `a - jb`.
    #[inline(always)]
    pub fn conj(&self) -> Self {
        Self { re: self.re, im: -self.im }
    }

    /// The squared magnitude.
    #[inline(always)]
    pub fn norm_sqr(&self) -> f32 {
        self.re * self.re + self.im * self.im
    }

    /// The magnitude.
    #[inline(always)]
    pub fn norm(&self) -> f32 {
        self.norm_sqr().sqrt()
    }

    /// The argument (phase angle) in radians.
    #[inline(always)]
    pub fn arg(&self) -> f32 {
        self.im.atan2(self.re)
    }
}

impl core::ops::Add for Complex {
    type Output = Complex;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Self::Output { re: self.re + rhs.re, im: self.im + rhs.im }
    }
}

impl core::ops::AddAssign for Complex {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl core::ops::Sub for Complex {
    type Output = Complex;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::Output { re: self.re - rhs.re, im: self.im - rhs.im }
    }
}

impl core::ops::SubAssign for Complex {
    #[inline(always)]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl core::ops::Mul for Complex {
    type Output = Complex;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self::Output {
        Self::Output {
            re: (self.re * rhs.re) - (self.im * rhs.im),
            im: (self.re * rhs.im) + (self.im * rhs.re),
        }
    }
}

impl core::ops::MulAssign for Complex {
    #[inline(always)]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl core::ops::Mul<f32> for Complex {
    type Output = Complex;

    #[inline(always)]
    fn mul(self, rhs: f32) -> Self::Output {
        Self::Output { re: self.re * rhs, im: self.im * rhs }
    }
}

impl core::ops::Div<f32> for Complex {
    type Output = Complex;

    #[inline(always)]
    fn div(self, rhs: f32) -> Self::Output {
        Self::Output { re: self.re / rhs, im: self.im / rhs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_complex() {
        // Conjugate
        assert_eq!(Complex::new(1.0, 10.0).conj(), Complex::new(1.0, -10.0));

        // Scale
        assert_eq!(Complex::new(5.0, 2.0).scale(3.0), Complex::new(15.0, 6.0));

        // Addition
        assert_eq!(Complex::new(3.0, 13.0) + Complex::new(7.0, 17.0), Complex::new(10.0, 30.0));

        // Subtraction
        assert_eq!(Complex::new(3.0, 13.0) - Complex::new(7.0, 17.0), Complex::new(-4.0, -4.0));

        // Multiplication
        assert_eq!(Complex::new(3.0, 13.0) * Complex::new(7.0, 17.0), Complex::new(-200.0, 142.0));

        // Magnitude and argument
        assert_eq!(Complex::new(3.0, 4.0).norm(), 5.0);
        assert!((Complex::new(0.0, 1.0).arg() - core::f32::consts::FRAC_PI_2).abs() < 1e-6);

        // Polar
        let p = Complex::from_polar(2.0, core::f32::consts::PI);
        assert!((p.re + 2.0).abs() < 1e-6);
        assert!(p.im.abs() < 1e-6);
    }
}
