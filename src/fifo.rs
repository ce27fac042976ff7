//! Bounded single-producer/single-consumer FIFO.
//!
//! Every slot is allocated up front from a prototype value. Items are copied
//! into a free slot on push and copied out on pull, so neither side allocates
//! once the queue is built (as long as pushed items have the prototype's
//! shape). Drained slots travel back to the producer through a second queue.
//!
//! # Design Notes
//! - Never blocks and never overwrites unread data: a full queue rejects the
//!   push, an empty queue rejects the pull
//! - Exactly one producer and one consumer; the halves are owned and need
//!   `&mut` so the type system enforces it

use ringbuf::{Consumer, Producer, RingBuffer};

/// Default number of slots used for audio blocks, spectra and paths.
pub const DEFAULT_FIFO_CAPACITY: usize = 30;

/// Unsplit FIFO holding its preallocated slots.
pub struct Fifo<T> {
    capacity: usize,
    filled: RingBuffer<T>,
    spare: RingBuffer<T>,
    prototype: T,
}

impl<T: Clone + Send> Fifo<T> {
    /// Builds a FIFO that holds at most `capacity` unread items.
    ///
    /// Panics if `capacity` is zero. This runs outside the audio thread.
    pub fn new(capacity: usize, prototype: T) -> Self {
        assert!(capacity > 0, "fifo capacity must be > 0");
        Self {
            capacity,
            filled: RingBuffer::new(capacity),
            spare: RingBuffer::new(capacity),
            prototype,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Splits into the producer and consumer halves, preloading every slot.
    pub fn split(self) -> (FifoProducer<T>, FifoConsumer<T>) {
        let (filled_prod, filled_cons) = self.filled.split();
        let (mut spare_prod, spare_cons) = self.spare.split();

        for _ in 0..self.capacity {
            let _ = spare_prod.push(self.prototype.clone());
        }

        (
            FifoProducer {
                filled: filled_prod,
                spare: spare_cons,
            },
            FifoConsumer {
                filled: filled_cons,
                spare: spare_prod,
            },
        )
    }
}

/// Writing half. Lives on the thread that produces items.
pub struct FifoProducer<T> {
    filled: Producer<T>,
    spare: Consumer<T>,
}

impl<T: Clone> FifoProducer<T> {
    /// Copies `item` into a free slot. Returns `false` when every slot holds
    /// unread data; the item is then dropped by the caller's policy.
    #[inline]
    pub fn push(&mut self, item: &T) -> bool {
        let mut slot = match self.spare.pop() {
            Some(slot) => slot,
            None => return false,
        };
        slot.clone_from(item);

        // Slots are conserved between the two queues, so `filled` always has
        // room for a slot that came out of `spare`.
        let pushed = self.filled.push(slot).is_ok();
        debug_assert!(pushed, "fifo slot accounting broken");
        pushed
    }

    /// Number of pushes that would currently succeed.
    pub fn free_slots(&self) -> usize {
        self.spare.len()
    }
}

/// Reading half. Lives on the thread that consumes items.
pub struct FifoConsumer<T> {
    filled: Consumer<T>,
    spare: Producer<T>,
}

impl<T: Clone> FifoConsumer<T> {
    /// Copies the oldest unread item into `out`. Returns `false` when nothing
    /// is waiting, leaving `out` untouched.
    #[inline]
    pub fn pull(&mut self, out: &mut T) -> bool {
        let slot = match self.filled.pop() {
            Some(slot) => slot,
            None => return false,
        };
        out.clone_from(&slot);
        let _ = self.spare.push(slot);
        true
    }

    pub fn available_for_reading(&self) -> usize {
        self.filled.len()
    }
}
