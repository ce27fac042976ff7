//! Per-channel analyzer driver: collector blocks -> spectra -> paths.

use crate::analyzer::fft_data::{AnalyzerConfig, FftDataGenerator};
use crate::analyzer::path::{AnalyzerPath, AnalyzerPathGenerator, Rect};
use crate::fifo::FifoConsumer;

/// Drops the oldest `block.len()` samples of `mono`, shifts the rest left and
/// appends `block` at the end. A block longer than `mono` keeps only its tail.
pub fn shift_and_append(mono: &mut [f32], block: &[f32]) {
    let len = mono.len();
    if block.len() >= len {
        mono.copy_from_slice(&block[block.len() - len..]);
        return;
    }
    let keep = len - block.len();
    mono.copy_within(block.len().., 0);
    mono[keep..].copy_from_slice(block);
}

/// Owns one channel's display pipeline. Runs on the display thread.
pub struct PathProducer {
    blocks: FifoConsumer<Vec<f32>>,
    block: Vec<f32>,
    mono: Vec<f32>,
    fft: FftDataGenerator,
    spectrum: Vec<f32>,
    paths: AnalyzerPathGenerator,
    path: AnalyzerPath,
    floor_db: f32,
}

impl PathProducer {
    pub fn new(blocks: FifoConsumer<Vec<f32>>, block_size: usize, config: &AnalyzerConfig) -> Self {
        let fft = FftDataGenerator::new(config);
        let fft_size = fft.fft_size();
        Self {
            blocks,
            block: vec![0.0; block_size],
            mono: vec![0.0; fft_size],
            spectrum: vec![0.0; fft_size / 2],
            fft,
            paths: AnalyzerPathGenerator::new(config.path_resolution, config.fifo_capacity),
            path: AnalyzerPath::new(),
            floor_db: config.floor_db,
        }
    }

    /// Drains all pending work. Every complete block is folded into the mono
    /// buffer and analyzed, every spectrum becomes a path, and only the newest
    /// path is kept.
    pub fn process(&mut self, fft_bounds: Rect, sample_rate: f32) {
        while self.blocks.pull(&mut self.block) {
            shift_and_append(&mut self.mono, &self.block);
            self.fft
                .produce_fft_data_for_rendering(&self.mono, self.floor_db);
        }

        let fft_size = self.fft.fft_size();
        let bin_width = self.fft.bin_width(sample_rate);
        while self.fft.get_fft_data(&mut self.spectrum) {
            self.paths.generate_path(
                &self.spectrum,
                fft_bounds,
                fft_size,
                bin_width,
                self.floor_db,
            );
        }

        // Each pull overwrites the previous one; the last wins
        while self.paths.get_path(&mut self.path) {}
    }

    /// Newest path, empty until the first one has been produced.
    pub fn get_path(&self) -> &AnalyzerPath {
        &self.path
    }

    pub fn mono_buffer(&self) -> &[f32] {
        &self.mono
    }
}
