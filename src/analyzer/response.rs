//! Display-side driver for the analyzer and the EQ response curve.
//!
//! An editor calls [`ResponseCurve::timer_callback`] at [`REFRESH_RATE_HZ`]
//! and then draws `left_path`, `right_path` and `response_path`. The display
//! keeps its own [`MonoChain`], designed from the same coefficient factory as
//! the audio chains, so it never reads audio-thread state.

use crate::analyzer::path::{AnalyzerPath, Point, Rect};
use crate::analyzer::path_producer::PathProducer;
use crate::dsp::chain::MonoChain;
use crate::dsp::filter_design::ChainCoefficients;
use crate::dsp::utils::{map_range, map_to_log10, DISPLAY_MAX_HZ, DISPLAY_MIN_HZ};
use crate::link::DisplayLink;
use crate::notify::Subscription;
use crate::settings::ChainSettings;
use crate::EqParams;
use std::sync::Arc;

pub const REFRESH_RATE_HZ: u32 = 60;

/// Vertical range of the response curve.
const RESPONSE_RANGE_DB: f64 = 24.0;
/// Floor for the magnitude -> dB conversion of the response.
const RESPONSE_FLOOR_DB: f64 = -100.0;

const RENDER_TRIM_TOP: f32 = 12.0;
const RENDER_TRIM_SIDES: f32 = 20.0;
const ANALYSIS_TRIM_TOP: f32 = 4.0;
const ANALYSIS_EXTEND_BOTTOM: f32 = 3.0;

/// Area inside the component used for grid and curves.
pub fn render_area(bounds: Rect) -> Rect {
    bounds
        .with_trimmed_top(RENDER_TRIM_TOP)
        .reduced_horizontally(RENDER_TRIM_SIDES)
}

/// Area the analyzer paths are mapped into.
pub fn analysis_area(bounds: Rect) -> Rect {
    let area = render_area(bounds).with_trimmed_top(ANALYSIS_TRIM_TOP);
    area.with_trimmed_bottom(-ANALYSIS_EXTEND_BOTTOM)
}

fn magnitude_to_db(mag: f64) -> f64 {
    if mag > 0.0 {
        (20.0 * mag.log10()).max(RESPONSE_FLOOR_DB)
    } else {
        RESPONSE_FLOOR_DB
    }
}

pub struct ResponseCurve {
    params: Arc<EqParams>,
    link: Arc<DisplayLink>,
    changes: Subscription,
    chain: MonoChain,
    left: Option<PathProducer>,
    right: Option<PathProducer>,
    empty: AnalyzerPath,
    magnitudes: Vec<f64>,
}

impl ResponseCurve {
    pub fn new(params: Arc<EqParams>, link: Arc<DisplayLink>) -> Self {
        let changes = link.changes().subscribe();
        Self {
            params,
            link,
            changes,
            chain: MonoChain::new(),
            left: None,
            right: None,
            empty: AnalyzerPath::new(),
            magnitudes: Vec::new(),
        }
    }

    /// One display refresh for a component occupying `bounds`.
    pub fn timer_callback(&mut self, bounds: Rect) {
        if let Some(taps) = self.link.take_taps() {
            log::debug!(
                "response curve: attaching analyzer taps ({} sample blocks)",
                taps.block_size
            );
            self.left = Some(PathProducer::new(taps.left, taps.block_size, &taps.config));
            self.right = Some(PathProducer::new(taps.right, taps.block_size, &taps.config));
        }

        let fft_bounds = analysis_area(bounds);
        let sample_rate = self.link.get_sample_rate();
        for producer in [self.left.as_mut(), self.right.as_mut()].into_iter().flatten() {
            producer.process(fft_bounds, sample_rate);
        }

        if self.changes.take_pending() {
            self.update_chain();
        }

        self.magnitudes = self.magnitudes_db(bounds.width.max(0.0) as usize);
    }

    /// Redesigns the display chain from the current parameter values.
    pub fn update_chain(&mut self) {
        let sample_rate = self.link.get_sample_rate();
        let settings = ChainSettings::from_params(&self.params, sample_rate);
        self.chain
            .update(&ChainCoefficients::design(&settings, sample_rate));
    }

    /// Response in dB for `width` pixel columns spread log-evenly over
    /// 20 Hz..20 kHz.
    pub fn magnitudes_db(&self, width: usize) -> Vec<f64> {
        let sample_rate = self.link.get_sample_rate() as f64;
        (0..width)
            .map(|i| {
                let freq = map_to_log10(
                    i as f64 / width as f64,
                    DISPLAY_MIN_HZ as f64,
                    DISPLAY_MAX_HZ as f64,
                );
                magnitude_to_db(self.chain.magnitude_for_frequency(freq, sample_rate))
            })
            .collect()
    }

    /// Magnitudes from the last tick, one per column.
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    /// Response curve inside `area`, -24 dB on the bottom edge and +24 dB on
    /// the top.
    pub fn response_path(&self, area: Rect) -> AnalyzerPath {
        let mags = self.magnitudes_db(area.width.max(0.0) as usize);
        let mut path = AnalyzerPath::with_capacity(mags.len());
        let map = |db: f64| {
            map_range(
                db as f32,
                -RESPONSE_RANGE_DB as f32,
                RESPONSE_RANGE_DB as f32,
                area.bottom(),
                area.y,
            )
        };

        let mut iter = mags.iter().enumerate();
        if let Some((_, &first)) = iter.next() {
            path.start_new_sub_path(Point::new(area.x, map(first)));
        }
        for (i, &db) in iter {
            path.line_to(Point::new(area.x + i as f32, map(db)));
        }
        path
    }

    pub fn left_path(&self, area: Rect) -> AnalyzerPath {
        Self::channel_path(self.left.as_ref(), &self.empty, area)
    }

    pub fn right_path(&self, area: Rect) -> AnalyzerPath {
        Self::channel_path(self.right.as_ref(), &self.empty, area)
    }

    fn channel_path(producer: Option<&PathProducer>, empty: &AnalyzerPath, area: Rect) -> AnalyzerPath {
        producer
            .map(|p| p.get_path())
            .unwrap_or(empty)
            .translated(area.x, area.y)
    }

    pub fn chain(&self) -> &MonoChain {
        &self.chain
    }

    pub fn is_attached(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::collector::SampleCollector;
    use crate::analyzer::fft_data::AnalyzerConfig;
    use crate::analyzer::path::PathElement;
    use crate::link::AnalyzerTaps;
    use nih_plug::prelude::{FloatParam, FloatRange};

    const SR: f32 = 48000.0;

    fn bounds() -> Rect {
        Rect::new(0.0, 0.0, 440.0, 200.0)
    }

    fn boosted_params() -> Arc<EqParams> {
        Arc::new(EqParams {
            peak_gain: FloatParam::new(
                "Peak Gain",
                12.0,
                FloatRange::Linear {
                    min: -24.0,
                    max: 24.0,
                },
            ),
            ..EqParams::default()
        })
    }

    #[test]
    fn test_areas() {
        let r = render_area(bounds());
        assert_eq!(r, Rect::new(20.0, 12.0, 400.0, 188.0));
        let a = analysis_area(bounds());
        assert_eq!(a, Rect::new(20.0, 16.0, 400.0, 187.0));
    }

    #[test]
    fn test_first_tick_designs_chain() {
        let link = Arc::new(DisplayLink::new(SR));
        let mut curve = ResponseCurve::new(boosted_params(), link.clone());
        assert_eq!(link.changes().subscriber_count(), 1);

        curve.timer_callback(bounds());
        assert_eq!(curve.magnitudes().len(), 440);

        let at_peak = magnitude_to_db(curve.chain().magnitude_for_frequency(750.0, SR as f64));
        assert!((at_peak - 12.0).abs() < 0.1);

        // Flat defaults elsewhere: mid-band between the cuts is near 0 dB
        let far = magnitude_to_db(curve.chain().magnitude_for_frequency(8000.0, SR as f64));
        assert!(far.abs() < 0.5);

        drop(curve);
        assert_eq!(link.changes().subscriber_count(), 0);
    }

    #[test]
    fn test_response_path_spans_area() {
        let link = Arc::new(DisplayLink::new(SR));
        let mut curve = ResponseCurve::new(boosted_params(), link);
        curve.timer_callback(bounds());

        let area = Rect::new(10.0, 0.0, 100.0, 96.0);
        let path = curve.response_path(area);
        assert_eq!(path.len(), 100);
        assert!(matches!(path.elements()[0], PathElement::MoveTo(p) if p.x == 10.0));
        match path.elements()[99] {
            PathElement::LineTo(p) => assert_eq!(p.x, 109.0),
            other => panic!("unexpected element {:?}", other),
        }
        // Everything stays inside the +-24 dB window for these settings
        for e in path.elements() {
            let (PathElement::MoveTo(p) | PathElement::LineTo(p)) = *e;
            assert!(p.y >= 0.0 && p.y <= 96.0);
        }
    }

    #[test]
    fn test_paths_empty_until_taps_attached() {
        let link = Arc::new(DisplayLink::new(SR));
        let mut curve = ResponseCurve::new(Arc::new(EqParams::default()), link.clone());
        curve.timer_callback(bounds());
        assert!(!curve.is_attached());
        assert!(curve.left_path(bounds()).is_empty());

        let mut left = SampleCollector::new();
        let mut right = SampleCollector::new();
        link.publish_taps(AnalyzerTaps {
            left: left.prepare(512, 30),
            right: right.prepare(512, 30),
            block_size: 512,
            config: AnalyzerConfig::default(),
        });

        let tone: Vec<f32> = (0..2048)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / SR).sin())
            .collect();
        left.ingest(&tone);
        right.ingest(&tone);

        curve.timer_callback(bounds());
        assert!(curve.is_attached());

        let area = render_area(bounds());
        let path = curve.left_path(area);
        assert!(!path.is_empty());
        // Translated by the area origin
        match path.elements()[0] {
            PathElement::MoveTo(p) => assert_eq!(p.x, area.x),
            other => panic!("unexpected element {:?}", other),
        }
        assert_eq!(curve.right_path(area).len(), path.len());
    }

    #[test]
    fn test_redesign_only_on_change() {
        let link = Arc::new(DisplayLink::new(SR));
        let mut curve = ResponseCurve::new(boosted_params(), link.clone());
        curve.timer_callback(bounds());

        // Pending change already consumed by the first tick
        assert!(!curve.changes.take_pending());

        link.changes().notify();
        assert!(curve.changes.take_pending());
        assert!(!curve.changes.take_pending());
    }
}
