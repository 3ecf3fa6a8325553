//! Bounded best-K selection.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::index::PointId;

/// A single nearest-neighbour result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour {
    /// Insertion index of the point.
    pub id: PointId,
    /// Distance from the query (lower is closer).
    pub distance: f32,
}

impl Neighbour {
    pub fn new(id: PointId, distance: f32) -> Self {
        Self { id, distance }
    }
}

// Heap entries order by (distance, id). Every NaN, whatever its sign bit,
// ranks after every number including +inf, so a NaN candidate is always the
// first to be evicted.
#[derive(Debug, Clone, Copy)]
struct Entry(Neighbour);

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.0.distance, other.0.distance);
        a.is_nan()
            .cmp(&b.is_nan())
            .then_with(|| a.total_cmp(&b))
            .then_with(|| self.0.id.cmp(&other.0.id))
    }
}

/// Fixed-capacity max-heap keeping the `capacity` closest candidates seen.
///
/// The heap root is always the worst retained candidate, so deciding whether
/// a new candidate belongs costs one comparison and replacing the worst costs
/// O(log k). Candidates with equal distance are ranked by ascending id, which
/// makes the retained set independent of the order candidates are offered in.
#[derive(Debug, Clone)]
pub struct BoundedTopK {
    heap: BinaryHeap<Entry>,
    capacity: usize,
}

impl BoundedTopK {
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// The worst candidate currently retained.
    pub fn worst(&self) -> Option<Neighbour> {
        self.heap.peek().map(|e| e.0)
    }

    /// Offer a candidate. Returns `true` if it was retained.
    ///
    /// Below capacity the candidate is always kept. At capacity it replaces
    /// the current worst only if it ranks strictly better.
    pub fn push(&mut self, id: PointId, distance: f32) -> bool {
        let entry = Entry(Neighbour { id, distance });
        if self.heap.len() < self.capacity {
            self.heap.push(entry);
            return true;
        }
        match self.heap.peek_mut() {
            Some(mut worst) if entry < *worst => {
                *worst = entry;
                true
            }
            _ => false,
        }
    }

    /// Consume the heap, returning retained candidates by ascending distance.
    pub fn into_sorted_vec(self) -> Vec<Neighbour> {
        self.heap.into_sorted_vec().into_iter().map(|e| e.0).collect()
    }
}
