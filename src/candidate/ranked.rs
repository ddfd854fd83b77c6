//! Max-priority queue keyed by an `f32` score.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

struct Entry<T> {
    score: f32,
    seq: usize,
    item: T,
}

impl<T> Entry<T> {
    // Higher score first; among equal scores the earlier insertion wins.
    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.rank_cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank_cmp(other)
    }
}

/// Binary-heap priority queue that pops the highest score first.
///
/// Ties between equal scores are broken by insertion order, so pushing items
/// in a fixed scan order makes every drain deterministic.
pub struct RankedQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    next_seq: usize,
}

impl<T> RankedQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Inserts `item` with priority `score`.
    pub fn push(&mut self, score: f32, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { score, seq, item });
    }

    /// Removes and returns the highest-ranked item with its score.
    pub fn pop(&mut self) -> Option<(f32, T)> {
        self.heap.pop().map(|entry| (entry.score, entry.item))
    }

    /// Returns the number of queued items.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drains every item in descending rank order.
    pub fn drain_desc(self) -> DrainDesc<T> {
        DrainDesc { queue: self }
    }
}

impl<T> Default for RankedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`RankedQueue::drain_desc`].
pub struct DrainDesc<T> {
    queue: RankedQueue<T>,
}

impl<T> Iterator for DrainDesc<T> {
    type Item = (f32, T);

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.queue.len();
        (len, Some(len))
    }
}

impl<T> ExactSizeIterator for DrainDesc<T> {}
