use nih_plug::prelude::Enum;

/// Waveshaper applied ahead of the filter chain. The numeric ids match the
/// editor's mode selector (1, 2, 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
#[repr(usize)]
pub enum DistortionMode {
    #[name = "Hard Clip"]
    HardClip,
    #[name = "Soft Clip"]
    SoftClip,
    #[name = "Half-Wave Rect"]
    HalfWaveRectify,
}

impl DistortionMode {
    /// Maps the discrete selector id onto a mode.
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(DistortionMode::HardClip),
            2 => Some(DistortionMode::SoftClip),
            3 => Some(DistortionMode::HalfWaveRectify),
            _ => None,
        }
    }

    pub fn id(&self) -> i32 {
        *self as i32 + 1
    }
}

/// Distortion controls, read once per block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionSettings {
    pub mode: DistortionMode,
    pub threshold: f32,
    pub mix: f32,
}

impl DistortionSettings {
    /// Shapes one sample and blends it with the dry input.
    #[inline]
    pub fn process_sample(&self, input: f32) -> f32 {
        let shaped = shape(self.mode, self.threshold, input);
        (1.0 - self.mix) * input + self.mix * shaped
    }

    /// In-place over one channel.
    #[inline]
    pub fn process(&self, samples: &mut [f32]) {
        if self.mix == 0.0 {
            return;
        }
        for s in samples.iter_mut() {
            *s = self.process_sample(*s);
        }
    }
}

#[inline]
fn shape(mode: DistortionMode, threshold: f32, x: f32) -> f32 {
    match mode {
        // Not `f32::clamp`, which panics on a NaN or negative threshold
        DistortionMode::HardClip => {
            if x > threshold {
                threshold
            } else if x < -threshold {
                -threshold
            } else {
                x
            }
        }
        DistortionMode::SoftClip => {
            if x > threshold {
                1.0 - (-x).exp()
            } else {
                -1.0 + x.exp()
            }
        }
        DistortionMode::HalfWaveRectify => {
            if x > threshold {
                x
            } else {
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wet(mode: DistortionMode, threshold: f32) -> DistortionSettings {
        DistortionSettings {
            mode,
            threshold,
            mix: 1.0,
        }
    }

    #[test]
    fn test_hard_clip_limits_to_threshold() {
        let d = wet(DistortionMode::HardClip, 0.5);
        assert!((d.process_sample(0.8) - 0.5).abs() < 1e-6);
        assert!((d.process_sample(-0.8) + 0.5).abs() < 1e-6);
        assert!((d.process_sample(0.2) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_half_wave_zeroes_below_threshold() {
        let d = wet(DistortionMode::HalfWaveRectify, 0.0);
        assert_eq!(d.process_sample(-0.3), 0.0);
        assert!((d.process_sample(0.3) - 0.3).abs() < 1e-6);
        assert_eq!(d.process_sample(0.0), 0.0);
    }

    #[test]
    fn test_soft_clip_curves() {
        let d = wet(DistortionMode::SoftClip, 0.0);
        assert!((d.process_sample(0.5) - (1.0 - (-0.5f32).exp())).abs() < 1e-6);
        assert!((d.process_sample(-0.5) - (-1.0 + (-0.5f32).exp())).abs() < 1e-6);
        // Output stays inside (-1, 1)
        assert!(d.process_sample(10.0) < 1.0);
        assert!(d.process_sample(-10.0) > -1.0);
    }

    #[test]
    fn test_soft_clip_switches_curve_at_threshold() {
        let d = wet(DistortionMode::SoftClip, 0.5);
        // At or below the threshold the rising curve applies, even for x > 0
        assert!((d.process_sample(0.3) - (-1.0 + 0.3f32.exp())).abs() < 1e-6);
        assert!((d.process_sample(0.5) - (-1.0 + 0.5f32.exp())).abs() < 1e-6);
        // Above it the saturating curve takes over
        assert!((d.process_sample(0.8) - (1.0 - (-0.8f32).exp())).abs() < 1e-6);
        assert!((d.process_sample(0.3) - 0.349_859).abs() < 1e-5);
        assert!((d.process_sample(0.8) - 0.550_671).abs() < 1e-5);
    }

    #[test]
    fn test_mix_blends_dry_and_wet() {
        let dry = DistortionSettings {
            mix: 0.0,
            ..wet(DistortionMode::HardClip, 0.1)
        };
        assert_eq!(dry.process_sample(0.8), 0.8);

        let half = DistortionSettings {
            mix: 0.5,
            ..wet(DistortionMode::HardClip, 0.2)
        };
        assert!((half.process_sample(0.8) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_selector_ids() {
        assert_eq!(DistortionMode::from_id(1), Some(DistortionMode::HardClip));
        assert_eq!(DistortionMode::from_id(2), Some(DistortionMode::SoftClip));
        assert_eq!(DistortionMode::from_id(3), Some(DistortionMode::HalfWaveRectify));
        assert_eq!(DistortionMode::from_id(0), None);
        assert_eq!(DistortionMode::HalfWaveRectify.id(), 3);
    }
}
