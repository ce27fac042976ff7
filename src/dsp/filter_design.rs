//! Coefficient factory for the EQ chain.
//!
//! Pure functions: given user-facing settings and a sample rate they return
//! coefficient values and touch no shared state. Callers are expected to hand
//! in sanitized settings (see [`ChainSettings::sanitized`]); nothing here
//! clamps or rejects input.
//!
//! Cut filters are Butterworth designs of order `2 * (slope_index + 1)`,
//! split into that many halves of second-order sections. Section `i` gets
//! `Q = 1 / (2 cos((2i + 1) * pi / (2 * order)))`, and each section is the
//! bilinear-transform (RBJ) high- or low-pass biquad.
//!
//! [`ChainSettings::sanitized`]: crate::settings::ChainSettings::sanitized

use crate::dsp::biquad::BiquadCoefficients;
use crate::dsp::utils::db_to_gain;
use crate::settings::{ChainSettings, Slope};
use std::f64::consts::PI;

/// Number of biquad stages in one cut filter (enough for 48 dB/oct).
pub const MAX_CUT_STAGES: usize = 4;

/// The biquad sections of one Butterworth cut filter. Fixed capacity so a
/// redesign on the audio thread does not allocate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutCoefficients {
    sections: [BiquadCoefficients; MAX_CUT_STAGES],
    len: usize,
}

impl Default for CutCoefficients {
    fn default() -> Self {
        Self {
            sections: [BiquadCoefficients::IDENTITY; MAX_CUT_STAGES],
            len: 0,
        }
    }
}

impl CutCoefficients {
    pub fn as_slice(&self) -> &[BiquadCoefficients] {
        &self.sections[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn push(&mut self, section: BiquadCoefficients) {
        debug_assert!(self.len < MAX_CUT_STAGES);
        self.sections[self.len] = section;
        self.len += 1;
    }
}

#[derive(Clone, Copy)]
enum CutKind {
    HighPass,
    LowPass,
}

/// Butterworth high-pass cascade for the low-cut band.
pub fn design_low_cut(freq: f32, sample_rate: f32, slope: Slope) -> CutCoefficients {
    design_butterworth(CutKind::HighPass, freq, sample_rate, slope.butterworth_order())
}

/// Butterworth low-pass cascade for the high-cut band.
pub fn design_high_cut(freq: f32, sample_rate: f32, slope: Slope) -> CutCoefficients {
    design_butterworth(CutKind::LowPass, freq, sample_rate, slope.butterworth_order())
}

fn design_butterworth(kind: CutKind, freq: f32, sample_rate: f32, order: usize) -> CutCoefficients {
    debug_assert!(order >= 2 && order % 2 == 0 && order / 2 <= MAX_CUT_STAGES);

    let mut out = CutCoefficients::default();
    let order_f = order as f64;
    for i in 0..order / 2 {
        let q = 1.0 / (2.0 * ((2.0 * i as f64 + 1.0) * PI / (2.0 * order_f)).cos());
        let section = match kind {
            CutKind::HighPass => high_pass_section(freq as f64, q, sample_rate as f64),
            CutKind::LowPass => low_pass_section(freq as f64, q, sample_rate as f64),
        };
        out.push(section);
    }
    out
}

fn high_pass_section(cutoff: f64, q: f64, sr: f64) -> BiquadCoefficients {
    let w0 = 2.0 * PI * cutoff / sr;
    let alpha = w0.sin() / (2.0 * q);
    let cw0 = w0.cos();

    BiquadCoefficients::from_raw(
        (1.0 + cw0) * 0.5,
        -(1.0 + cw0),
        (1.0 + cw0) * 0.5,
        1.0 + alpha,
        -2.0 * cw0,
        1.0 - alpha,
    )
}

fn low_pass_section(cutoff: f64, q: f64, sr: f64) -> BiquadCoefficients {
    let w0 = 2.0 * PI * cutoff / sr;
    let alpha = w0.sin() / (2.0 * q);
    let cw0 = w0.cos();

    BiquadCoefficients::from_raw(
        (1.0 - cw0) * 0.5,
        1.0 - cw0,
        (1.0 - cw0) * 0.5,
        1.0 + alpha,
        -2.0 * cw0,
        1.0 - alpha,
    )
}

/// Peaking (bell) filter. `gain_db` is converted to a linear gain first; the
/// response at `freq` equals that gain.
pub fn design_peak(freq: f32, gain_db: f32, quality: f32, sample_rate: f32) -> BiquadCoefficients {
    let gain = db_to_gain(gain_db) as f64;
    let a = gain.max(0.0).sqrt();
    let w0 = 2.0 * PI * freq as f64 / sample_rate as f64;
    let alpha = w0.sin() / (2.0 * quality as f64);
    let cw0 = w0.cos();

    BiquadCoefficients::from_raw(
        1.0 + alpha * a,
        -2.0 * cw0,
        1.0 - alpha * a,
        1.0 + alpha / a,
        -2.0 * cw0,
        1.0 - alpha / a,
    )
}

/// Everything one [`MonoChain`] needs for a settings snapshot. Designed once
/// and applied to both channels.
///
/// [`MonoChain`]: crate::dsp::chain::MonoChain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainCoefficients {
    pub low_cut: CutCoefficients,
    pub low_cut_slope: Slope,
    pub peak: BiquadCoefficients,
    pub high_cut: CutCoefficients,
    pub high_cut_slope: Slope,
}

impl ChainCoefficients {
    pub fn design(settings: &ChainSettings, sample_rate: f32) -> Self {
        Self {
            low_cut: design_low_cut(settings.low_cut_freq, sample_rate, settings.low_cut_slope),
            low_cut_slope: settings.low_cut_slope,
            peak: design_peak(
                settings.peak_freq,
                settings.peak_gain_db,
                settings.peak_quality,
                sample_rate,
            ),
            high_cut: design_high_cut(settings.high_cut_freq, sample_rate, settings.high_cut_slope),
            high_cut_slope: settings.high_cut_slope,
        }
    }
}
