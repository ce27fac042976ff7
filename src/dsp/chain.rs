//! Per-channel EQ chain: low cut -> peak -> high cut.
//!
//! Each cut filter owns four biquad stages with individual bypass flags; a
//! slope of K enables exactly the first K stages. Coefficients arrive as one
//! [`ChainCoefficients`] value and are written between `process()` calls, so
//! a block is always filtered with a single coherent set.

use crate::dsp::biquad::{Biquad, BiquadCoefficients};
use crate::dsp::filter_design::{ChainCoefficients, CutCoefficients, MAX_CUT_STAGES};
use crate::settings::Slope;

/// Capability shared by every stage of the chain.
pub trait FilterStage {
    fn process_sample(&mut self, input: f32) -> f32;
    fn set_coefficients(&mut self, coeffs: BiquadCoefficients);
    fn set_bypassed(&mut self, bypassed: bool);
    fn is_bypassed(&self) -> bool;
    fn reset(&mut self);
    fn magnitude_for_frequency(&self, freq: f64, sample_rate: f64) -> f64;

    /// Runs a whole block in place. Bypassed stages leave it untouched.
    #[inline]
    fn process_block(&mut self, samples: &mut [f32]) {
        if self.is_bypassed() {
            return;
        }
        for s in samples.iter_mut() {
            *s = self.process_sample(*s);
        }
    }
}

/// One biquad with a bypass switch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stage {
    filter: Biquad,
    bypassed: bool,
}

impl FilterStage for Stage {
    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        self.filter.process(input)
    }

    #[inline]
    fn set_coefficients(&mut self, coeffs: BiquadCoefficients) {
        self.filter.set_coefficients(coeffs);
    }

    #[inline]
    fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    #[inline]
    fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    fn reset(&mut self) {
        self.filter.reset_state();
    }

    fn magnitude_for_frequency(&self, freq: f64, sample_rate: f64) -> f64 {
        self.filter
            .coefficients()
            .magnitude_for_frequency(freq, sample_rate)
    }
}

impl Stage {
    pub fn coefficients(&self) -> &BiquadCoefficients {
        self.filter.coefficients()
    }
}

/// Four-stage Butterworth cascade used for both the low and high cut.
#[derive(Debug, Clone, Copy)]
pub struct CutFilter {
    stages: [Stage; MAX_CUT_STAGES],
}

impl Default for CutFilter {
    fn default() -> Self {
        // Everything bypassed until the first coefficient update
        let mut stage = Stage::default();
        stage.set_bypassed(true);
        Self {
            stages: [stage; MAX_CUT_STAGES],
        }
    }
}

impl CutFilter {
    /// Bypasses all stages, then assigns and enables exactly
    /// `slope.stage_count()` of them starting at stage 0. Stages past that
    /// keep stale coefficients, which is harmless while they are bypassed.
    pub fn update(&mut self, coeffs: &CutCoefficients, slope: Slope) {
        for stage in self.stages.iter_mut() {
            stage.set_bypassed(true);
        }

        let count = slope.stage_count().min(coeffs.len());
        for (stage, section) in self.stages.iter_mut().zip(coeffs.as_slice()).take(count) {
            stage.set_coefficients(*section);
            stage.set_bypassed(false);
        }
    }

    pub fn stage(&self, index: usize) -> &Stage {
        &self.stages[index]
    }

    pub fn active_stages(&self) -> usize {
        self.stages.iter().filter(|s| !s.is_bypassed()).count()
    }

    #[inline]
    pub fn process(&mut self, samples: &mut [f32]) {
        for stage in self.stages.iter_mut() {
            stage.process_block(samples);
        }
    }

    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
    }

    pub fn magnitude_for_frequency(&self, freq: f64, sample_rate: f64) -> f64 {
        self.stages
            .iter()
            .filter(|s| !s.is_bypassed())
            .map(|s| s.magnitude_for_frequency(freq, sample_rate))
            .product()
    }
}

/// Chain position, in processing order.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPosition {
    LowCut,
    Peak,
    HighCut,
}

/// The complete filter chain for one channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonoChain {
    low_cut: CutFilter,
    peak: Stage,
    high_cut: CutFilter,
}

impl MonoChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every coefficient in the chain with `coeffs`.
    pub fn update(&mut self, coeffs: &ChainCoefficients) {
        self.low_cut.update(&coeffs.low_cut, coeffs.low_cut_slope);
        self.peak.set_coefficients(coeffs.peak);
        self.high_cut.update(&coeffs.high_cut, coeffs.high_cut_slope);
    }

    /// Filters one channel in place. Audio-thread safe.
    #[inline]
    pub fn process(&mut self, samples: &mut [f32]) {
        self.low_cut.process(samples);
        self.peak.process_block(samples);
        self.high_cut.process(samples);
    }

    pub fn reset(&mut self) {
        self.low_cut.reset();
        self.peak.reset();
        self.high_cut.reset();
    }

    #[cfg(test)]
    pub fn set_bypassed(&mut self, position: ChainPosition, bypassed: bool) {
        match position {
            ChainPosition::LowCut => {
                for stage in self.low_cut.stages.iter_mut() {
                    stage.set_bypassed(bypassed);
                }
            }
            ChainPosition::Peak => self.peak.set_bypassed(bypassed),
            ChainPosition::HighCut => {
                for stage in self.high_cut.stages.iter_mut() {
                    stage.set_bypassed(bypassed);
                }
            }
        }
    }

    pub fn low_cut(&self) -> &CutFilter {
        &self.low_cut
    }

    pub fn peak(&self) -> &Stage {
        &self.peak
    }

    pub fn high_cut(&self) -> &CutFilter {
        &self.high_cut
    }

    /// Linear magnitude of every active stage combined.
    pub fn magnitude_for_frequency(&self, freq: f64, sample_rate: f64) -> f64 {
        let mut mag = 1.0;
        if !self.peak.is_bypassed() {
            mag *= self.peak.magnitude_for_frequency(freq, sample_rate);
        }
        mag * self.low_cut.magnitude_for_frequency(freq, sample_rate)
            * self.high_cut.magnitude_for_frequency(freq, sample_rate)
    }
}
