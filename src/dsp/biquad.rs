//! Biquad Filter Implementation (IIR 2nd Order)
//!
//! The building block of every filter stage in the EQ chain. Coefficients are
//! a plain `Copy` value kept apart from the per-channel delay state, so one
//! designed set can be handed to both channels while each keeps its own
//! history.
//!
//! # Design Notes
//! - Transposed direct form II, normalized so a0 == 1
//! - Replacing coefficients never touches the delay state
//! - All operations are safe for the audio thread (no allocations)

use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

/// Normalized biquad coefficients (a0 == 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl BiquadCoefficients {
    /// Passes the signal through unchanged.
    pub const IDENTITY: BiquadCoefficients = BiquadCoefficients {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Builds normalized coefficients from raw `b` / `a` terms.
    pub fn from_raw(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        let inv_a0 = 1.0 / a0;
        Self {
            b0: (b0 * inv_a0) as f32,
            b1: (b1 * inv_a0) as f32,
            b2: (b2 * inv_a0) as f32,
            a1: (a1 * inv_a0) as f32,
            a2: (a2 * inv_a0) as f32,
        }
    }

    /// Linear magnitude of the transfer function at `freq` Hz.
    pub fn magnitude_for_frequency(&self, freq: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * freq / sample_rate;
        // z^-1 evaluated on the unit circle
        let z1 = Complex64::from_polar(1.0, -w);
        let z2 = z1 * z1;

        let num = Complex64::new(self.b0 as f64, 0.0)
            + z1 * self.b1 as f64
            + z2 * self.b2 as f64;
        let den = Complex64::new(1.0, 0.0) + z1 * self.a1 as f64 + z2 * self.a2 as f64;

        num.norm() / den.norm()
    }
}

/// Biquad filter implementation (IIR 2nd order)
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    coeffs: BiquadCoefficients,
    z1: f32,
    z2: f32,
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

impl Biquad {
    pub fn new() -> Self {
        Self {
            coeffs: BiquadCoefficients::IDENTITY,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Process a single sample
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let out = input * c.b0 + self.z1;

        // Anti-denormal: tiny DC offset
        self.z1 = input * c.b1 + self.z2 - c.a1 * out + 1e-25;
        self.z2 = input * c.b2 - c.a2 * out + 1e-25;

        out
    }

    /// Swaps in a whole coefficient set. Delay state is kept so the output
    /// stays continuous across the change.
    #[inline]
    pub fn set_coefficients(&mut self, coeffs: BiquadCoefficients) {
        self.coeffs = coeffs;
    }

    #[inline]
    pub fn coefficients(&self) -> &BiquadCoefficients {
        &self.coeffs
    }

    /// Explicitly clear filter delay state.
    ///
    /// IMPORTANT:
    /// - This is NOT called automatically by coefficient updates.
    /// - Use this on transport reset or when the stream is re-prepared.
    #[inline]
    pub fn reset_state(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_passes_signal() {
        let mut bq = Biquad::new();
        for &x in &[0.0, 0.5, -0.25, 1.0] {
            assert!((bq.process(x) - x).abs() < 1e-6);
        }
        let mag = BiquadCoefficients::IDENTITY.magnitude_for_frequency(1000.0, 48000.0);
        assert!((mag - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_coefficient_swap_keeps_state() {
        let half = BiquadCoefficients {
            b0: 0.5,
            b1: 0.5,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        };
        let mut bq = Biquad::new();
        bq.set_coefficients(half);
        bq.process(1.0);

        // The previous input still contributes through z1 after the swap
        bq.set_coefficients(BiquadCoefficients {
            b0: 0.0,
            ..half
        });
        let out = bq.process(0.0);
        assert!((out - 0.5).abs() < 1e-6);

        bq.reset_state();
        assert!(bq.process(0.0).abs() < 1e-6);
    }

    #[test]
    fn test_two_point_average_magnitude() {
        let avg = BiquadCoefficients {
            b0: 0.5,
            b1: 0.5,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        };
        // Unity at DC, null at Nyquist
        assert!((avg.magnitude_for_frequency(0.0, 48000.0) - 1.0).abs() < 1e-9);
        assert!(avg.magnitude_for_frequency(24000.0, 48000.0) < 1e-6);
    }
}
