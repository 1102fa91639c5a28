//! Interrupt-safe circular buffer
//!
//! A fixed-capacity queue shared between exactly one producer context and
//! one consumer context (typically an interrupt handler and mainline code).
//! Every slot and index is an atomic, so both sides work through `&self`
//! and a buffer can live in a `static` next to its driver.
//!
//! The write and read positions are free-running counters taken modulo a
//! large multiple of the capacity; the slot is the position modulo the
//! capacity and the element count is their difference. The write position
//! belongs to the producer. The read position is advanced by the consumer,
//! and by a forced push into a full buffer, both with a compare-exchange.
//! A position only repeats after `WRAP` advances, so a pop whose slot was
//! overwritten underneath it always loses the exchange and retries.

use core::sync::atomic::Ordering;

use portable_atomic::{AtomicU16, AtomicU32, AtomicU8, AtomicUsize};

/// Element type storable in a [`RingBuffer`]
///
/// Each element lives in its own atomic cell of matching width.
pub trait Item: Copy {
    /// Atomic cell holding one element
    type Cell;

    /// Value returned by [`RingBuffer::peek`] on an empty buffer
    const ZERO: Self;

    /// Cell initialiser for `const` construction
    #[allow(clippy::declare_interior_mutable_const)]
    const EMPTY: Self::Cell;

    fn load(cell: &Self::Cell) -> Self;

    fn store(cell: &Self::Cell, value: Self);
}

macro_rules! impl_item {
    ($t:ty, $cell:ty) => {
        impl Item for $t {
            type Cell = $cell;

            const ZERO: Self = 0;

            #[allow(clippy::declare_interior_mutable_const)]
            const EMPTY: Self::Cell = <$cell>::new(0);

            #[inline]
            fn load(cell: &Self::Cell) -> Self {
                cell.load(Ordering::Acquire)
            }

            #[inline]
            fn store(cell: &Self::Cell, value: Self) {
                cell.store(value, Ordering::Release)
            }
        }
    };
}

impl_item!(u8, AtomicU8);
impl_item!(u16, AtomicU16);
impl_item!(u32, AtomicU32);

/// Fixed-capacity single-producer/single-consumer queue
pub struct RingBuffer<T: Item, const N: usize> {
    storage: [T::Cell; N],
    /// Write position, owned by the producer
    head: AtomicUsize,
    /// Read position
    tail: AtomicUsize,
    /// Overwritten elements, only maintained when `track_overruns` is set
    overruns: AtomicU32,
    track_overruns: bool,
}

impl<T: Item, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Item, const N: usize> RingBuffer<T, N> {
    /// Positions run modulo this; a multiple of `N` so slots stay aligned
    /// across the wrap, and at most half the address space so sums of two
    /// positions cannot overflow.
    const WRAP: usize = N * (usize::MAX / 2 / N);

    /// Create an empty buffer without an overrun counter
    pub const fn new() -> Self {
        Self::with_overrun_tracking(false)
    }

    /// Create an empty buffer, optionally counting overwritten elements
    pub const fn with_overrun_tracking(track_overruns: bool) -> Self {
        const { assert!(N > 0, "ring buffer capacity must be non-zero") };

        Self {
            storage: [const { T::EMPTY }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            overruns: AtomicU32::new(0),
            track_overruns,
        }
    }

    #[inline]
    const fn forward(position: usize, steps: usize) -> usize {
        (position + steps % Self::WRAP) % Self::WRAP
    }

    /// Elements between a read and a write position
    #[inline]
    const fn distance(tail: usize, head: usize) -> usize {
        (head + Self::WRAP - tail) % Self::WRAP
    }

    #[inline]
    fn cell(&self, position: usize) -> &T::Cell {
        &self.storage[position % N]
    }

    /// Maximum number of elements
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of queued elements
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        // A bulk overrun publishes the write position before it moves the
        // read position up.
        Self::distance(tail, head).min(N)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    /// Free space left for the producer
    pub fn available_for_write(&self) -> usize {
        N - self.len()
    }

    /// Append an element
    ///
    /// Returns `false` and leaves the buffer unchanged when it is full.
    pub fn push(&self, item: T) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        if Self::distance(self.tail.load(Ordering::Acquire), head) >= N {
            return false;
        }
        self.store_at(head, item);
        true
    }

    /// Append an element, overwriting the oldest one if the buffer is full
    ///
    /// Always stores `item`. Returns `true` when an older element was
    /// dropped to make room (an overrun).
    pub fn force_push(&self, item: T) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let mut overran = false;

        // Losing the exchange means the consumer just freed the slot.
        if Self::distance(tail, head) >= N
            && self
                .tail
                .compare_exchange(tail, Self::forward(tail, 1), Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            overran = true;
            self.record_overruns(1);
        }

        self.store_at(head, item);
        overran
    }

    fn store_at(&self, head: usize, item: T) {
        T::store(self.cell(head), item);
        self.head.store(Self::forward(head, 1), Ordering::Release);
    }

    /// Remove the oldest element
    pub fn pop(&self) -> Option<T> {
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            let queued = Self::distance(tail, self.head.load(Ordering::Acquire));
            if queued == 0 {
                return None;
            }
            if queued > N {
                // Bulk overrun in flight; the producer is moving the read
                // position up.
                core::hint::spin_loop();
                continue;
            }

            let item = T::load(self.cell(tail));

            // Losing the exchange means a forced push dropped this element
            // underneath us; retry with the new oldest one.
            if self
                .tail
                .compare_exchange(tail, Self::forward(tail, 1), Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(item);
            }
        }
    }

    /// Read the oldest element without removing it
    ///
    /// Returns `T::ZERO` when the buffer is empty.
    pub fn peek(&self) -> T {
        let tail = self.tail.load(Ordering::Acquire);
        if Self::distance(tail, self.head.load(Ordering::Acquire)) == 0 {
            return T::ZERO;
        }
        T::load(self.cell(tail))
    }

    /// Drop all elements
    ///
    /// Must not race with either side; callers quiesce the producer first.
    pub fn clear(&self) {
        self.head.store(0, Ordering::Relaxed);
        self.tail.store(0, Ordering::Release);
    }

    /// Account for `n` elements written directly into [`storage`](Self::storage)
    /// starting at [`write_index`](Self::write_index), e.g. by a DMA block
    /// transfer
    ///
    /// Returns `true` when this overran the buffer. The read index is moved
    /// to the oldest surviving element, the same outcome as `n` forced
    /// pushes.
    pub fn advance_write_index(&self, n: usize) -> bool {
        if n == 0 {
            return false;
        }

        let head = Self::forward(self.head.load(Ordering::Relaxed), n);
        let before = Self::distance(self.tail.load(Ordering::Acquire), self.head.load(Ordering::Relaxed));
        self.head.store(head, Ordering::Release);

        if before + n <= N {
            return false;
        }

        let oldest = Self::forward(head, Self::WRAP - N);
        let mut dropped = 0;
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            let queued = Self::distance(tail, head);
            if queued <= N {
                break;
            }
            if self
                .tail
                .compare_exchange(tail, oldest, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                dropped = queued - N;
                break;
            }
        }
        self.record_overruns(dropped);
        true
    }

    fn record_overruns(&self, dropped: usize) {
        if self.track_overruns && dropped > 0 {
            self.overruns.fetch_add(dropped as u32, Ordering::Relaxed);
        }
    }

    /// Elements dropped by overruns since construction
    ///
    /// Always zero for buffers built without overrun tracking.
    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// Next slot the producer will write
    pub fn write_index(&self) -> usize {
        self.head.load(Ordering::Acquire) % N
    }

    /// Slot holding the oldest element
    pub fn read_index(&self) -> usize {
        self.tail.load(Ordering::Acquire) % N
    }

    /// Backing storage, for out-of-band writers
    pub fn storage(&self) -> &[T::Cell; N] {
        &self.storage
    }
}
