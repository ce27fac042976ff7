//! Spectral analyzer: window -> FFT -> magnitude -> dB.
//!
//! Runs on the display thread. Each call analyzes the newest `fft_size`
//! samples of a mono buffer and pushes one dB spectrum (`fft_size / 2` bins)
//! into the generator's own [`Fifo`].

use crate::dsp::utils::gain_to_db;
use crate::fifo::{Fifo, FifoConsumer, FifoProducer, DEFAULT_FIFO_CAPACITY};
use anyhow::{bail, ensure};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::sync::Arc;

/// Level every silent or invalid bin is pinned to.
pub const DEFAULT_FLOOR_DB: f32 = -48.0;
/// Every n-th bin ends up in the path.
pub const DEFAULT_PATH_RESOLUTION: usize = 2;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Supported transform sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FftOrder {
    Order1024,
    Order2048,
    Order4096,
    Order8192,
}

impl Default for FftOrder {
    fn default() -> Self {
        FftOrder::Order2048
    }
}

impl FftOrder {
    pub fn fft_size(&self) -> usize {
        match self {
            FftOrder::Order1024 => 1024,
            FftOrder::Order2048 => 2048,
            FftOrder::Order4096 => 4096,
            FftOrder::Order8192 => 8192,
        }
    }

    pub fn from_size(size: usize) -> anyhow::Result<Self> {
        Ok(match size {
            1024 => FftOrder::Order1024,
            2048 => FftOrder::Order2048,
            4096 => FftOrder::Order4096,
            8192 => FftOrder::Order8192,
            _ => bail!("unsupported FFT size {} (expected 1024, 2048, 4096 or 8192)", size),
        })
    }
}

/// Analysis window applied before the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowKind {
    BlackmanHarris,
    Hamming,
}

impl Default for WindowKind {
    fn default() -> Self {
        WindowKind::BlackmanHarris
    }
}

impl WindowKind {
    /// Window of `size` points, scaled so its mean is 1.
    pub fn build(&self, size: usize) -> Vec<f32> {
        let denom = (size.max(2) - 1) as f32;
        let mut window: Vec<f32> = (0..size)
            .map(|i| {
                let phase = 2.0 * PI * i as f32 / denom;
                match self {
                    WindowKind::BlackmanHarris => {
                        0.35875 - 0.48829 * phase.cos() + 0.14128 * (2.0 * phase).cos()
                            - 0.01168 * (3.0 * phase).cos()
                    }
                    WindowKind::Hamming => 0.54 - 0.46 * phase.cos(),
                }
            })
            .collect();

        let sum: f32 = window.iter().sum();
        if sum > 0.0 {
            let norm = size as f32 / sum;
            for w in window.iter_mut() {
                *w *= norm;
            }
        }
        window
    }
}

/// Tunables for the analyzer pipeline. Fixed for the lifetime of a prepare.
/// Saved with the plugin state, so a missing field falls back to its default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub fft_order: FftOrder,
    /// Slots in every analyzer FIFO (blocks, spectra, paths).
    pub fifo_capacity: usize,
    pub path_resolution: usize,
    pub floor_db: f32,
    pub window: WindowKind,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_order: FftOrder::default(),
            fifo_capacity: DEFAULT_FIFO_CAPACITY,
            path_resolution: DEFAULT_PATH_RESOLUTION,
            floor_db: DEFAULT_FLOOR_DB,
            window: WindowKind::default(),
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.fifo_capacity > 0, "analyzer fifo capacity must be > 0");
        ensure!(self.path_resolution >= 1, "path resolution must be >= 1");
        ensure!(
            self.floor_db.is_finite() && self.floor_db < 0.0,
            "analyzer floor must be a finite negative dB value, got {}",
            self.floor_db
        );
        Ok(())
    }
}

// =============================================================================
// GENERATOR
// =============================================================================

/// Produces dB magnitude spectra from mono audio.
pub struct FftDataGenerator {
    order: FftOrder,
    window_kind: WindowKind,
    fifo_capacity: usize,

    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    fft_scratch: Vec<Complex<f32>>,
    fft_data: Vec<f32>,

    producer: FifoProducer<Vec<f32>>,
    consumer: FifoConsumer<Vec<f32>>,
}

impl FftDataGenerator {
    pub fn new(config: &AnalyzerConfig) -> Self {
        let (producer, consumer) = spectrum_fifo(config.fifo_capacity, config.fft_order);
        let mut generator = Self {
            order: config.fft_order,
            window_kind: config.window,
            fifo_capacity: config.fifo_capacity,
            fft: FftPlanner::<f32>::new().plan_fft_forward(config.fft_order.fft_size()),
            window: Vec::new(),
            buffer: Vec::new(),
            fft_scratch: Vec::new(),
            fft_data: Vec::new(),
            producer,
            consumer,
        };
        generator.change_order(config.fft_order);
        generator
    }

    /// Replans the transform and rebuilds every buffer. Pending spectra are
    /// discarded. Allocates; not for the audio thread.
    pub fn change_order(&mut self, order: FftOrder) {
        let size = order.fft_size();
        log::debug!("analyzer: FFT order set to {} points", size);

        self.order = order;
        self.fft = FftPlanner::<f32>::new().plan_fft_forward(size);
        self.window = self.window_kind.build(size);
        self.buffer = vec![Complex::new(0.0, 0.0); size];
        self.fft_scratch = vec![Complex::new(0.0, 0.0); self.fft.get_inplace_scratch_len()];
        self.fft_data = vec![0.0; size / 2];

        let (producer, consumer) = spectrum_fifo(self.fifo_capacity, order);
        self.producer = producer;
        self.consumer = consumer;
    }

    pub fn order(&self) -> FftOrder {
        self.order
    }

    pub fn fft_size(&self) -> usize {
        self.order.fft_size()
    }

    pub fn num_bins(&self) -> usize {
        self.fft_size() / 2
    }

    /// Width of one bin in Hz. Bin `k` sits at `k * bin_width`.
    pub fn bin_width(&self, sample_rate: f32) -> f32 {
        sample_rate / self.fft_size() as f32
    }

    /// Analyzes the newest `fft_size` samples of `mono` and queues the
    /// spectrum. Shorter input is zero-padded at the front. If the queue is
    /// full the spectrum is dropped.
    pub fn produce_fft_data_for_rendering(&mut self, mono: &[f32], floor_db: f32) -> bool {
        let size = self.fft_size();
        let num_bins = self.num_bins();

        let recent = &mono[mono.len().saturating_sub(size)..];
        let pad = size - recent.len();
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let x = if i < pad { 0.0 } else { recent[i - pad] };
            *slot = Complex::new(x * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.fft_scratch);

        let inv_bins = 1.0 / num_bins as f32;
        for (out, bin) in self.fft_data.iter_mut().zip(self.buffer.iter()) {
            let mag = bin.norm();
            let mag = if mag.is_finite() { mag * inv_bins } else { 0.0 };
            *out = gain_to_db(mag, floor_db);
        }

        self.producer.push(&self.fft_data)
    }

    pub fn num_available_fft_data_blocks(&self) -> usize {
        self.consumer.available_for_reading()
    }

    /// Pulls the oldest queued spectrum into `out`.
    pub fn get_fft_data(&mut self, out: &mut Vec<f32>) -> bool {
        self.consumer.pull(out)
    }
}

fn spectrum_fifo(
    capacity: usize,
    order: FftOrder,
) -> (FifoProducer<Vec<f32>>, FifoConsumer<Vec<f32>>) {
    Fifo::new(capacity, vec![0.0f32; order.fft_size() / 2]).split()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sr: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sr).sin())
            .collect()
    }

    #[test]
    fn test_bin_width_at_44k1() {
        let gen = FftDataGenerator::new(&AnalyzerConfig::default());
        let width = gen.bin_width(44100.0);
        assert!((width - 21.533).abs() < 1e-3);
        assert_eq!(0.0 * width, 0.0);
        assert!((1024.0 * width - 22050.0).abs() < 1e-2);
        assert_eq!(gen.num_bins(), 1024);
    }

    #[test]
    fn test_order_from_size() {
        assert_eq!(FftOrder::from_size(4096).unwrap(), FftOrder::Order4096);
        assert!(FftOrder::from_size(1000).is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(AnalyzerConfig::default().validate().is_ok());
        let bad = [
            AnalyzerConfig {
                fifo_capacity: 0,
                ..AnalyzerConfig::default()
            },
            AnalyzerConfig {
                path_resolution: 0,
                ..AnalyzerConfig::default()
            },
            AnalyzerConfig {
                floor_db: f32::NAN,
                ..AnalyzerConfig::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_window_mean_is_one() {
        for kind in [WindowKind::BlackmanHarris, WindowKind::Hamming] {
            let w = kind.build(2048);
            let mean = w.iter().sum::<f32>() / w.len() as f32;
            assert!((mean - 1.0).abs() < 1e-4);
            // Symmetric with the peak in the middle
            assert!((w[0] - w[2047]).abs() < 1e-4);
            assert!(w[1024] > w[0]);
        }
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let sr = 44100.0;
        let mut gen = FftDataGenerator::new(&AnalyzerConfig::default());
        // Exactly on bin 93
        let freq = 93.0 * gen.bin_width(sr);
        assert!(gen.produce_fft_data_for_rendering(&sine(freq, sr, 2048), -48.0));

        let mut spectrum = Vec::new();
        assert!(gen.get_fft_data(&mut spectrum));
        assert_eq!(spectrum.len(), 1024);

        let (peak_bin, peak_db) = spectrum
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });
        assert_eq!(peak_bin, 93);
        // Unit sine, mean-1 window, /num_bins scaling: about 0 dB
        assert!(peak_db > -1.0 && peak_db < 1.0);
        // Far bins sit on the floor
        assert_eq!(spectrum[600], -48.0);
    }

    #[test]
    fn test_silence_and_garbage_hit_the_floor() {
        let mut gen = FftDataGenerator::new(&AnalyzerConfig::default());
        let mut spectrum = Vec::new();

        gen.produce_fft_data_for_rendering(&vec![0.0; 2048], -60.0);
        assert!(gen.get_fft_data(&mut spectrum));
        assert!(spectrum.iter().all(|&v| v == -60.0));

        let mut garbage = vec![0.0; 2048];
        garbage[100] = f32::NAN;
        gen.produce_fft_data_for_rendering(&garbage, -60.0);
        assert!(gen.get_fft_data(&mut spectrum));
        assert!(spectrum.iter().all(|v| v.is_finite() && *v >= -60.0));
    }

    #[test]
    fn test_short_input_is_front_padded() {
        let mut gen = FftDataGenerator::new(&AnalyzerConfig::default());
        assert!(gen.produce_fft_data_for_rendering(&[0.0; 16], -48.0));
        assert_eq!(gen.num_available_fft_data_blocks(), 1);
    }

    #[test]
    fn test_change_order_rebuilds_queue() {
        let mut gen = FftDataGenerator::new(&AnalyzerConfig::default());
        gen.produce_fft_data_for_rendering(&sine(1000.0, 48000.0, 2048), -48.0);

        gen.change_order(FftOrder::Order4096);
        assert_eq!(gen.num_available_fft_data_blocks(), 0);
        gen.produce_fft_data_for_rendering(&sine(1000.0, 48000.0, 4096), -48.0);

        let mut spectrum = Vec::new();
        assert!(gen.get_fft_data(&mut spectrum));
        assert_eq!(spectrum.len(), 2048);
    }
}
