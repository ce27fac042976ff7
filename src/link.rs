//! Shared state between the plugin and whatever draws the analyzer.
//!
//! Scalars cross threads as atomics (floats stored as their bit patterns).
//! The collector taps change hands through a mutex that the audio thread
//! never touches: `initialize` publishes them and the display tick picks
//! them up with `try_lock`.

use crate::analyzer::AnalyzerConfig;
use crate::fifo::FifoConsumer;
use crate::notify::ChangeNotifier;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Reading halves of both channel collectors from one prepare, with the
/// analyzer config they were sized for.
pub struct AnalyzerTaps {
    pub left: FifoConsumer<Vec<f32>>,
    pub right: FifoConsumer<Vec<f32>>,
    pub block_size: usize,
    pub config: AnalyzerConfig,
}

pub struct DisplayLink {
    sample_rate: AtomicU32,
    taps: Mutex<Option<AnalyzerTaps>>,
    changes: Arc<ChangeNotifier>,
    dropped_blocks_l: AtomicU64,
    dropped_blocks_r: AtomicU64,
}

impl DisplayLink {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate: AtomicU32::new(sample_rate.to_bits()),
            taps: Mutex::new(None),
            changes: Arc::new(ChangeNotifier::new()),
            dropped_blocks_l: AtomicU64::new(0),
            dropped_blocks_r: AtomicU64::new(0),
        }
    }

    pub fn set_sample_rate(&self, val: f32) {
        self.sample_rate.store(val.to_bits(), Ordering::Relaxed);
    }

    pub fn get_sample_rate(&self) -> f32 {
        f32::from_bits(self.sample_rate.load(Ordering::Relaxed))
    }

    pub fn changes(&self) -> &Arc<ChangeNotifier> {
        &self.changes
    }

    /// Hands fresh taps to the display, replacing any it has not picked up.
    /// Not for the audio thread.
    pub fn publish_taps(&self, taps: AnalyzerTaps) {
        match self.taps.lock() {
            Ok(mut slot) => *slot = Some(taps),
            Err(poisoned) => *poisoned.into_inner() = Some(taps),
        }
    }

    /// Takes the newest published taps, if any. Never blocks.
    pub fn take_taps(&self) -> Option<AnalyzerTaps> {
        self.taps.try_lock().ok().and_then(|mut slot| slot.take())
    }

    pub fn set_dropped_blocks_l(&self, val: u64) {
        self.dropped_blocks_l.store(val, Ordering::Relaxed);
    }

    pub fn set_dropped_blocks_r(&self, val: u64) {
        self.dropped_blocks_r.store(val, Ordering::Relaxed);
    }

    pub fn get_dropped_blocks_l(&self) -> u64 {
        self.dropped_blocks_l.load(Ordering::Relaxed)
    }

    pub fn get_dropped_blocks_r(&self) -> u64 {
        self.dropped_blocks_r.load(Ordering::Relaxed)
    }
}
