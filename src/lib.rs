pub mod analyzer;
pub mod dsp;
pub mod fifo;
pub mod link;
pub mod notify;
pub mod settings;

use crate::analyzer::AnalyzerConfig;
use crate::dsp::{ChainCoefficients, ChannelProcessor, DistortionMode, DistortionSettings};
use crate::link::{AnalyzerTaps, DisplayLink};
use crate::notify::ChangeNotifier;
use crate::settings::{ChainSettings, Slope};
use assert_no_alloc::permit_alloc;
use log::{error, info};
use nih_plug::prelude::*;
use std::sync::{Arc, RwLock};

const DEFAULT_SAMPLE_RATE: f32 = 44100.0;
const DEFAULT_BLOCK_SIZE: usize = 512;

// -----------------------------------------------------------------------------
// PARAMETERS
// -----------------------------------------------------------------------------
#[derive(Params)]
pub struct EqParams {
    #[id = "lowcut_freq"]
    pub low_cut_freq: FloatParam,

    #[id = "highcut_freq"]
    pub high_cut_freq: FloatParam,

    #[id = "peak_freq"]
    pub peak_freq: FloatParam,

    #[id = "peak_gain"]
    pub peak_gain: FloatParam,

    #[id = "peak_quality"]
    pub peak_quality: FloatParam,

    #[id = "lowcut_slope"]
    pub low_cut_slope: EnumParam<Slope>,

    #[id = "highcut_slope"]
    pub high_cut_slope: EnumParam<Slope>,

    #[id = "dist_mode"]
    pub dist_mode: EnumParam<DistortionMode>,

    #[id = "threshold"]
    pub threshold: FloatParam,

    #[id = "mix"]
    pub mix: FloatParam,

    /// Analyzer tunables, restored with the plugin state and applied on the
    /// next `initialize`.
    #[persist = "analyzer"]
    pub analyzer: Arc<RwLock<AnalyzerConfig>>,
}

// Helper to format frequencies
fn format_hz(v: f32) -> String {
    if v >= 1000.0 {
        format!("{:.2} kHz", v / 1000.0)
    } else {
        format!("{:.0} Hz", v)
    }
}

fn format_percent(v: f32) -> String {
    format!("{:.0}%", v * 100.0)
}

// Bumps `changes` whenever the parameter moves, from whichever thread set it
fn notify_on_change<T: 'static>(changes: &Arc<ChangeNotifier>) -> Arc<dyn Fn(T) + Send + Sync> {
    let changes = changes.clone();
    Arc::new(move |_: T| changes.notify())
}

fn frequency_param(name: &str, default: f32) -> FloatParam {
    FloatParam::new(
        name,
        default,
        FloatRange::Skewed {
            min: 20.0,
            max: 20000.0,
            factor: 0.25,
        },
    )
    .with_step_size(1.0)
    .with_value_to_string(Arc::new(format_hz))
}

impl Default for EqParams {
    fn default() -> Self {
        Self::new(Arc::new(ChangeNotifier::new()))
    }
}

impl EqParams {
    /// Filter parameters report every change to `changes`, so the display
    /// follows edits even while the host is not processing.
    pub fn new(changes: Arc<ChangeNotifier>) -> Self {
        Self {
            low_cut_freq: frequency_param("LowCut Freq", 20.0)
                .with_callback(notify_on_change(&changes)),
            high_cut_freq: frequency_param("HighCut Freq", 20000.0)
                .with_callback(notify_on_change(&changes)),
            peak_freq: frequency_param("Peak Freq", 750.0)
                .with_callback(notify_on_change(&changes)),

            peak_gain: FloatParam::new(
                "Peak Gain",
                0.0,
                FloatRange::Linear {
                    min: -24.0,
                    max: 24.0,
                },
            )
            .with_step_size(0.5)
            .with_unit(" dB")
            .with_callback(notify_on_change(&changes)),

            peak_quality: FloatParam::new(
                "Peak Quality",
                1.0,
                FloatRange::Linear {
                    min: 0.1,
                    max: 10.0,
                },
            )
            .with_step_size(0.05)
            .with_callback(notify_on_change(&changes)),

            low_cut_slope: EnumParam::new("LowCut Slope", Slope::Slope12)
                .with_callback(notify_on_change(&changes)),
            high_cut_slope: EnumParam::new("HighCut Slope", Slope::Slope12)
                .with_callback(notify_on_change(&changes)),

            dist_mode: EnumParam::new("Distortion", DistortionMode::HardClip),

            threshold: FloatParam::new("Threshold", 0.0, FloatRange::Linear { min: 0.0, max: 1.0 }),

            mix: FloatParam::new("Mix", 0.0, FloatRange::Linear { min: 0.0, max: 1.0 })
                .with_value_to_string(Arc::new(format_percent)),

            analyzer: Arc::new(RwLock::new(AnalyzerConfig::default())),
        }
    }

    /// Current analyzer config. A poisoned lock still yields the last value.
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        match self.analyzer.read() {
            Ok(config) => *config,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

// -----------------------------------------------------------------------------
// PLUGIN STRUCT
// -----------------------------------------------------------------------------
pub struct LautEq {
    params: Arc<EqParams>,
    link: Arc<DisplayLink>,
    process_l: ChannelProcessor,
    process_r: ChannelProcessor,
    sample_rate: f32,
    max_supported_block_size: usize,
    // Snapshot the current coefficients were designed from
    last_settings: Option<ChainSettings>,
}

impl Default for LautEq {
    fn default() -> Self {
        let link = Arc::new(DisplayLink::new(DEFAULT_SAMPLE_RATE));
        Self {
            params: Arc::new(EqParams::new(link.changes().clone())),
            link,
            process_l: ChannelProcessor::new(),
            process_r: ChannelProcessor::new(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_supported_block_size: DEFAULT_BLOCK_SIZE,
            last_settings: None,
        }
    }
}

impl LautEq {
    /// Shared state for an editor: analyzer taps, sample rate and change
    /// notifications.
    pub fn display_link(&self) -> Arc<DisplayLink> {
        self.link.clone()
    }

    pub fn eq_params(&self) -> Arc<EqParams> {
        self.params.clone()
    }

    /// Prepares both channels for `sample_rate` and hands the new analyzer
    /// taps to the display. Returns `false` on an invalid analyzer config.
    fn prepare(&mut self, sample_rate: f32, max_block_size: usize) -> bool {
        let config = self.params.analyzer_config();
        if let Err(e) = config.validate() {
            error!("LautEq: invalid analyzer configuration: {:#}", e);
            return false;
        }

        self.sample_rate = sample_rate;
        self.max_supported_block_size = max_block_size.max(1);

        let block_size = self.max_supported_block_size;
        let capacity = config.fifo_capacity;
        let (left, right) = permit_alloc(|| {
            (
                self.process_l.prepare(block_size, capacity),
                self.process_r.prepare(block_size, capacity),
            )
        });

        self.link.set_sample_rate(sample_rate);
        permit_alloc(|| {
            self.link.publish_taps(AnalyzerTaps {
                left,
                right,
                block_size,
                config,
            })
        });

        // Redesign on the next block and tell the display to follow
        self.last_settings = None;
        self.link.changes().notify();

        info!(
            "LautEq: prepared at {} Hz, {} sample blocks, {}-point analyzer",
            sample_rate,
            block_size,
            config.fft_order.fft_size()
        );
        true
    }

    /// Redesigns and applies coefficients when `settings` differ from the
    /// set currently loaded. Audio-thread safe.
    fn update_filters(&mut self, settings: ChainSettings) {
        if self.last_settings == Some(settings) {
            return;
        }

        let coeffs = ChainCoefficients::design(&settings, self.sample_rate);
        self.process_l.chain.update(&coeffs);
        self.process_r.chain.update(&coeffs);
        self.last_settings = Some(settings);
        self.link.changes().notify();
    }

    fn process_channels(&mut self, channels: &mut [&mut [f32]]) {
        let settings = ChainSettings::from_params(&self.params, self.sample_rate);
        self.update_filters(settings);
        let distortion = DistortionSettings::from_params(&self.params);

        let mut iter = channels.iter_mut();
        if let Some(left) = iter.next() {
            self.process_l.process(left, &distortion);
        }
        if let Some(right) = iter.next() {
            self.process_r.process(right, &distortion);
        }

        self.link
            .set_dropped_blocks_l(self.process_l.collector.dropped_blocks());
        self.link
            .set_dropped_blocks_r(self.process_r.collector.dropped_blocks());
    }
}

impl Plugin for LautEq {
    const NAME: &'static str = "LautEQ";
    const VENDOR: &'static str = "LautEQ";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            ..AudioIOLayout::const_default()
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            ..AudioIOLayout::const_default()
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.prepare(
                buffer_config.sample_rate,
                buffer_config.max_buffer_size as usize,
            )
        }))
        .unwrap_or(false)
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.process_channels(buffer.as_slice());
        }))
        .unwrap_or(());
        ProcessStatus::Normal
    }

    fn reset(&mut self) {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.process_l.reset();
            self.process_r.reset();
        }))
        .unwrap_or(());
    }
}

impl ClapPlugin for LautEq {
    const CLAP_ID: &'static str = "com.lauteq.lauteq";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Three-band EQ with distortion and spectrum analyzer");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Equalizer,
        ClapFeature::Distortion,
        ClapFeature::Stereo,
        ClapFeature::Mono,
    ];
}

impl Vst3Plugin for LautEq {
    const VST3_CLASS_ID: [u8; 16] = *b"LautEQ_Analyzer1";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] = &[
        Vst3SubCategory::Fx,
        Vst3SubCategory::Eq,
        Vst3SubCategory::Distortion,
    ];
}

nih_export_clap!(LautEq);
nih_export_vst3!(LautEq);
