use crate::dsp::distortion::{DistortionMode, DistortionSettings};
use crate::dsp::utils::{DISPLAY_MAX_HZ, DISPLAY_MIN_HZ};
use crate::EqParams;
use nih_plug::prelude::Enum;

/// Smallest quality factor handed to the peak design.
const MIN_PEAK_QUALITY: f32 = 0.01;
/// Cut and peak frequencies stay this far below Nyquist.
const NYQUIST_GUARD: f32 = 0.999;

// =============================================================================
// CUT FILTER SLOPE
// =============================================================================

/// Steepness of a cut filter. Each step adds one biquad stage (12 dB/oct).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
#[repr(usize)]
pub enum Slope {
    #[name = "12 dB/Oct"]
    Slope12,
    #[name = "24 dB/Oct"]
    Slope24,
    #[name = "36 dB/Oct"]
    Slope36,
    #[name = "48 dB/Oct"]
    Slope48,
}

impl Default for Slope {
    fn default() -> Self {
        Slope::Slope12
    }
}

impl Slope {
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Number of enabled biquad stages for this slope.
    pub fn stage_count(&self) -> usize {
        self.index() + 1
    }

    /// Order of the Butterworth prototype behind this slope.
    pub fn butterworth_order(&self) -> usize {
        2 * self.stage_count()
    }

    pub fn db_per_octave(&self) -> u32 {
        12 * self.stage_count() as u32
    }
}

// =============================================================================
// SETTINGS SNAPSHOTS
// =============================================================================

/// Filter settings read from the parameters once per processed block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainSettings {
    pub peak_freq: f32,
    pub peak_gain_db: f32,
    pub peak_quality: f32,
    pub low_cut_freq: f32,
    pub high_cut_freq: f32,
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            peak_freq: 750.0,
            peak_gain_db: 0.0,
            peak_quality: 1.0,
            low_cut_freq: DISPLAY_MIN_HZ,
            high_cut_freq: DISPLAY_MAX_HZ,
            low_cut_slope: Slope::Slope12,
            high_cut_slope: Slope::Slope12,
        }
    }
}

impl ChainSettings {
    /// Plain (unsmoothed) parameter values, sanitized for `sample_rate`.
    pub fn from_params(params: &EqParams, sample_rate: f32) -> Self {
        Self {
            peak_freq: params.peak_freq.value(),
            peak_gain_db: params.peak_gain.value(),
            peak_quality: params.peak_quality.value(),
            low_cut_freq: params.low_cut_freq.value(),
            high_cut_freq: params.high_cut_freq.value(),
            low_cut_slope: params.low_cut_slope.value(),
            high_cut_slope: params.high_cut_slope.value(),
        }
        .sanitized(sample_rate)
    }

    /// Clamps frequencies into `[20 Hz, min(20 kHz, Nyquist))` and keeps the
    /// quality positive. The coefficient factory relies on this.
    pub fn sanitized(mut self, sample_rate: f32) -> Self {
        let max_freq = DISPLAY_MAX_HZ
            .min(0.5 * sample_rate * NYQUIST_GUARD)
            .max(DISPLAY_MIN_HZ);
        let clamp_freq = |f: f32| {
            if f.is_finite() {
                f.clamp(DISPLAY_MIN_HZ, max_freq)
            } else {
                DISPLAY_MIN_HZ
            }
        };

        self.peak_freq = clamp_freq(self.peak_freq);
        self.low_cut_freq = clamp_freq(self.low_cut_freq);
        self.high_cut_freq = clamp_freq(self.high_cut_freq);
        self.peak_gain_db = if self.peak_gain_db.is_finite() {
            self.peak_gain_db
        } else {
            0.0
        };
        self.peak_quality = if self.peak_quality.is_finite() {
            self.peak_quality.max(MIN_PEAK_QUALITY)
        } else {
            1.0
        };
        self
    }
}

impl DistortionSettings {
    pub fn from_params(params: &EqParams) -> Self {
        Self {
            mode: params.dist_mode.value(),
            threshold: params.threshold.value(),
            mix: params.mix.value(),
        }
    }
}

impl Default for DistortionSettings {
    fn default() -> Self {
        Self {
            mode: DistortionMode::HardClip,
            threshold: 0.0,
            mix: 0.0,
        }
    }
}
