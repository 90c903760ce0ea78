//! Reordering buffer for out-of-order job completion.
//!
//! Jobs of an [`OrderedStage`](crate::concurrency::OrderedStage) finish in whatever
//! order the workers happen to run them. Each result is inserted here under its
//! sequence number and only released once every earlier sequence number has been
//! released.
//!
//! # Example
//!
//! ```
//! use transcoda_lib::reorder_buffer::ReorderBuffer;
//!
//! let mut buffer: ReorderBuffer<&str> = ReorderBuffer::new();
//!
//! buffer.insert(2, "third");
//! buffer.insert(0, "first");
//!
//! assert_eq!(buffer.try_pop_next(), Some("first"));
//! assert_eq!(buffer.try_pop_next(), None); // waiting for 1
//!
//! buffer.insert(1, "second");
//! let rest: Vec<_> = buffer.drain_ready().collect();
//! assert_eq!(rest, vec!["second", "third"]);
//! ```

use std::collections::VecDeque;

/// A buffer that releases items in sequential order.
///
/// Backed by a sparse `VecDeque` whose slot `i` holds sequence number
/// `next_seq + i`, so memory is bounded by the window between the oldest
/// unreleased item and the newest inserted one.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    slots: VecDeque<Option<T>>,
    /// Sequence number held by `slots[0]`; also the next one to release.
    next_seq: u64,
    /// Number of occupied slots.
    count: usize,
}

impl<T> ReorderBuffer<T> {
    /// Create an empty buffer expecting sequence number 0 first.
    #[must_use]
    pub fn new() -> Self {
        Self { slots: VecDeque::new(), next_seq: 0, count: 0 }
    }

    /// Store `item` under `seq`.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `seq` was already released or is already buffered.
    #[allow(clippy::cast_possible_truncation)]
    pub fn insert(&mut self, seq: u64, item: T) {
        debug_assert!(seq >= self.next_seq, "Sequence number {seq} already released");

        let index = (seq - self.next_seq) as usize;
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }

        debug_assert!(self.slots[index].is_none(), "Duplicate sequence number: {seq}");
        self.slots[index] = Some(item);
        self.count += 1;
    }

    /// Pop the item for `next_seq` if it has arrived.
    #[must_use]
    pub fn try_pop_next(&mut self) -> Option<T> {
        if !self.can_pop() {
            return None;
        }
        let item = self.slots.pop_front().flatten();
        self.next_seq += 1;
        self.count -= 1;
        item
    }

    /// Drain all consecutive ready items, stopping at the first gap.
    pub fn drain_ready(&mut self) -> DrainReady<'_, T> {
        DrainReady { buffer: self }
    }

    /// True if the item for `next_seq` is buffered.
    #[must_use]
    pub fn can_pop(&self) -> bool {
        self.slots.front().is_some_and(Option::is_some)
    }

    /// The next sequence number to be released.
    #[must_use]
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Number of buffered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator that drains consecutive ready items from a [`ReorderBuffer`].
pub struct DrainReady<'a, T> {
    buffer: &'a mut ReorderBuffer<T>,
}

impl<T> Iterator for DrainReady<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.try_pop_next()
    }
}
