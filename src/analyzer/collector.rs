//! Turns the audio callback's sample stream into fixed-size blocks for the
//! analyzer.
//!
//! `ingest` runs on the audio thread: it only copies samples into a
//! preallocated accumulator and pushes full blocks into a [`Fifo`]. A full
//! ring drops the block and counts it; audio is never held up by the display.

use crate::fifo::{Fifo, FifoConsumer, FifoProducer};

/// Per-channel block accumulator feeding the analyzer.
pub struct SampleCollector {
    block: Vec<f32>,
    fill_index: usize,
    producer: Option<FifoProducer<Vec<f32>>>,
    dropped_blocks: u64,
}

impl Default for SampleCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleCollector {
    /// Unprepared collector. Ignores input until [`prepare`](Self::prepare).
    pub fn new() -> Self {
        Self {
            block: Vec::new(),
            fill_index: 0,
            producer: None,
            dropped_blocks: 0,
        }
    }

    /// Resets all state and builds a fresh ring of `capacity` blocks of
    /// `block_size` samples. Returns the reading half for the display side.
    ///
    /// Allocates; call outside the audio callback only.
    pub fn prepare(&mut self, block_size: usize, capacity: usize) -> FifoConsumer<Vec<f32>> {
        assert!(block_size > 0, "collector block size must be > 0");

        self.block.clear();
        self.block.resize(block_size, 0.0);
        self.fill_index = 0;
        self.dropped_blocks = 0;

        let (producer, consumer) = Fifo::new(capacity, vec![0.0f32; block_size]).split();
        self.producer = Some(producer);
        consumer
    }

    pub fn is_prepared(&self) -> bool {
        self.producer.is_some()
    }

    pub fn block_size(&self) -> usize {
        self.block.len()
    }

    /// Blocks lost because the display side fell behind.
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped_blocks
    }

    /// Appends one callback's worth of samples. Audio-thread safe.
    #[inline]
    pub fn ingest(&mut self, samples: &[f32]) {
        let producer = match self.producer.as_mut() {
            Some(p) => p,
            None => return,
        };

        let block_size = self.block.len();
        let mut rest = samples;
        while !rest.is_empty() {
            let take = (block_size - self.fill_index).min(rest.len());
            self.block[self.fill_index..self.fill_index + take].copy_from_slice(&rest[..take]);
            self.fill_index += take;
            rest = &rest[take..];

            if self.fill_index == block_size {
                if !producer.push(&self.block) {
                    self.dropped_blocks += 1;
                }
                self.fill_index = 0;
            }
        }
    }
}
