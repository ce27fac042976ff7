pub mod biquad;
pub mod chain;
pub mod distortion;
pub mod filter_design;
pub mod utils;

pub use biquad::{Biquad, BiquadCoefficients};
pub use chain::{CutFilter, FilterStage, MonoChain, Stage};
pub use distortion::{DistortionMode, DistortionSettings};
pub use filter_design::{
    design_high_cut, design_low_cut, design_peak, ChainCoefficients, CutCoefficients,
    MAX_CUT_STAGES,
};

use crate::analyzer::SampleCollector;
use crate::fifo::FifoConsumer;

/// Channel processor containing the full signal path for one audio channel
pub struct ChannelProcessor {
    pub chain: MonoChain,
    pub collector: SampleCollector,
}

impl Default for ChannelProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelProcessor {
    pub fn new() -> Self {
        Self {
            chain: MonoChain::new(),
            collector: SampleCollector::new(),
        }
    }

    /// Clears filter history and rebuilds the analyzer tap. Not real-time safe.
    pub fn prepare(&mut self, block_size: usize, fifo_capacity: usize) -> FifoConsumer<Vec<f32>> {
        self.chain.reset();
        self.collector.prepare(block_size, fifo_capacity)
    }

    /// Distortion -> filter chain -> analyzer tap, in place.
    #[inline]
    pub fn process(&mut self, samples: &mut [f32], distortion: &DistortionSettings) {
        distortion.process(samples);
        self.chain.process(samples);
        self.collector.ingest(samples);
    }

    pub fn reset(&mut self) {
        self.chain.reset();
    }
}
