use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::hash::{HashCode, HashFunction};
use crate::index::PointId;

/// Point ids sharing one hash code within one table.
///
/// Append-only; small buckets stay inline and never touch the heap.
pub type Bucket = SmallVec<[PointId; 4]>;

/// One hash function plus the buckets it produced.
///
/// A point id appears in at most one bucket per table: the bucket of the
/// code its object hashed to at insertion time.
#[derive(Debug, Clone)]
pub struct Table<H> {
    function: H,
    buckets: HashMap<HashCode, Bucket>,
    len: usize,
}

impl<H> Table<H> {
    pub fn new(function: H) -> Self {
        Self {
            function,
            buckets: HashMap::new(),
            len: 0,
        }
    }

    pub fn function(&self) -> &H {
        &self.function
    }

    /// Total number of point ids stored across all buckets.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Iterate over `(hash code, bucket contents)` pairs in arbitrary order.
    pub fn buckets(&self) -> impl Iterator<Item = (HashCode, &[PointId])> + '_ {
        self.buckets.iter().map(|(&code, bucket)| (code, bucket.as_slice()))
    }

    /// Bucket contents for a precomputed code.
    pub fn bucket(&self, code: HashCode) -> Option<&[PointId]> {
        self.buckets.get(&code).map(|b| b.as_slice())
    }

    /// Append `id` to the bucket for an already computed code.
    pub(crate) fn insert_hashed(&mut self, code: HashCode, id: PointId) {
        self.buckets.entry(code).or_default().push(id);
        self.len += 1;
    }
}

impl<H> Table<H> {
    /// Hash `point` and append `id` to its bucket, creating the bucket if absent.
    pub fn insert<T: ?Sized>(&mut self, point: &T, id: PointId)
    where
        H: HashFunction<T>,
    {
        let code = self.function.compute_hash(point);
        self.insert_hashed(code, id);
    }

    /// Ids sharing `query`'s bucket, or `None` when no point hashed there.
    pub fn lookup<T: ?Sized>(&self, query: &T) -> Option<&[PointId]>
    where
        H: HashFunction<T>,
    {
        self.bucket(self.function.compute_hash(query))
    }

    /// The raw code `point` hashes to in this table.
    pub fn bucket_id<T: ?Sized>(&self, point: &T) -> HashCode
    where
        H: HashFunction<T>,
    {
        self.function.compute_hash(point)
    }
}
