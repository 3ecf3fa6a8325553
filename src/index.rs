use std::sync::Arc;

use hashbrown::HashSet;
use tracing::{debug, trace};

use crate::distance::DistanceComparator;
use crate::error::{LshError, Result};
use crate::hash::{HashCode, HashFunction, HashFunctionFactory};
use crate::metrics::{MetricsCollector, MetricsSnapshot, QueryTimer};
use crate::table::Table;
use crate::topk::{BoundedTopK, Neighbour};

/// Identity of a stored point: its insertion index in the object store.
pub type PointId = usize;

/// Id written into unused slots of fixed-size k-NN output buffers.
pub const SENTINEL_ID: i64 = -1;

/// Distance written into unused slots of fixed-size k-NN output buffers.
pub const SENTINEL_DISTANCE: f32 = f32::INFINITY;

/// Aggregate statistics about the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStats {
    pub num_points: usize,
    pub num_tables: usize,
    pub total_buckets: usize,
    pub avg_bucket_size: f64,
    pub max_bucket_size: usize,
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LshIndex {{ points: {}, tables: {}, buckets: {}, avg_bucket: {:.1}, max_bucket: {} }}",
            self.num_points,
            self.num_tables,
            self.total_buckets,
            self.avg_bucket_size,
            self.max_bucket_size,
        )
    }
}

// ---------------------------------------------------------------------------
// LshIndex
// ---------------------------------------------------------------------------

/// Incremental locality-sensitive hashing index with exact re-ranking.
///
/// Objects are appended to an in-memory store and their ids filed into one
/// bucket per table. A query unions the buckets it hashes to across all
/// tables and computes exact distances over that candidate set only.
///
/// # Concurrency
///
/// The index does no internal locking. `add`/`add_all` take `&mut self` and
/// every query takes `&self`, so a bulk load followed by concurrent read-only
/// querying needs no synchronisation, and interleaving writes with reads
/// requires the caller to serialise access (see
/// [`SharedLshIndex`](crate::shared::SharedLshIndex) for a single-writer lock).
///
/// The object store only grows; there is no deletion or eviction.
pub struct LshIndex<T, H, D> {
    objects: Vec<T>,
    tables: Vec<Table<H>>,
    distance: D,
    metrics: Option<Arc<MetricsCollector>>,
}

impl<T, H, D> std::fmt::Debug for LshIndex<T, H, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LshIndex")
            .field("num_points", &self.objects.len())
            .field("num_tables", &self.tables.len())
            .field("has_metrics", &self.metrics.is_some())
            .finish()
    }
}

impl<T, H, D> LshIndex<T, H, D>
where
    H: HashFunction<T>,
    D: DistanceComparator<T>,
{
    /// Build one table per hash function. The functions may differ freely.
    pub fn new(hash_functions: Vec<H>, distance: D) -> Result<Self> {
        if hash_functions.is_empty() {
            return Err(LshError::NoTables);
        }
        let tables: Vec<Table<H>> = hash_functions.into_iter().map(Table::new).collect();
        debug!(num_tables = tables.len(), "created lsh index");
        Ok(Self {
            objects: Vec::new(),
            tables,
            distance,
            metrics: None,
        })
    }

    /// Build `num_tables` tables, invoking `factory` once per table.
    pub fn from_factory<F>(mut factory: F, num_tables: usize, distance: D) -> Result<Self>
    where
        F: HashFunctionFactory<T, Function = H>,
    {
        if num_tables == 0 {
            return Err(LshError::NoTables);
        }
        let functions = (0..num_tables).map(|_| factory.create()).collect();
        Self::new(functions, distance)
    }

    /// Attach a metrics collector to this index.
    pub fn with_metrics(mut self) -> Self {
        self.metrics = Some(Arc::new(MetricsCollector::new()));
        self
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Append `point` to the store and file it into every table.
    ///
    /// Returns the assigned id, which equals the store size before the call.
    pub fn add(&mut self, point: T) -> PointId {
        let id = self.objects.len();
        for table in &mut self.tables {
            table.insert(&point, id);
        }
        self.objects.push(point);

        if let Some(ref m) = self.metrics {
            m.record_insert();
        }

        id
    }

    /// Add every point in input order, returning the assigned ids.
    ///
    /// Ids are consecutive, starting at the store size before the call.
    pub fn add_all<I>(&mut self, points: I) -> Vec<PointId>
    where
        I: IntoIterator<Item = T>,
    {
        let points = points.into_iter();
        let (lower, _) = points.size_hint();
        self.objects.reserve(lower);

        let ids: Vec<PointId> = points.map(|p| self.add(p)).collect();
        debug!(added = ids.len(), size = self.objects.len(), "bulk insert");
        ids
    }

    // ------------------------------------------------------------------
    // Candidate retrieval
    // ------------------------------------------------------------------

    /// Distinct ids sharing a bucket with `query` in at least one table,
    /// in first-seen order.
    fn candidates(&self, query: &T) -> Vec<PointId> {
        let mut seen: HashSet<PointId> = HashSet::new();
        let mut ids = Vec::new();

        for table in &self.tables {
            match table.lookup(query) {
                Some(bucket) => {
                    if let Some(ref m) = self.metrics {
                        m.record_bucket_hit();
                    }
                    for &id in bucket {
                        if seen.insert(id) {
                            ids.push(id);
                        }
                    }
                }
                None => {
                    if let Some(ref m) = self.metrics {
                        m.record_bucket_miss();
                    }
                }
            }
        }

        ids
    }

    /// The deduplicated union of the buckets `query` hashes to across all tables.
    pub fn search(&self, query: &T) -> HashSet<PointId> {
        let mut set = HashSet::new();
        for table in &self.tables {
            if let Some(bucket) = table.lookup(query) {
                set.extend(bucket.iter().copied());
            }
        }
        set
    }

    /// [`search`](Self::search) applied to each query independently.
    pub fn search_batch(&self, queries: &[T]) -> Vec<HashSet<PointId>> {
        queries.iter().map(|q| self.search(q)).collect()
    }

    /// The raw hash code of `point` in each table, in table order.
    pub fn get_bucket_id(&self, point: &T) -> Vec<HashCode> {
        self.tables.iter().map(|t| t.bucket_id(point)).collect()
    }

    /// [`get_bucket_id`](Self::get_bucket_id) for each point.
    pub fn get_bucket_ids(&self, points: &[T]) -> Vec<Vec<HashCode>> {
        points.iter().map(|p| self.get_bucket_id(p)).collect()
    }

    // ------------------------------------------------------------------
    // k-NN
    // ------------------------------------------------------------------

    /// Up to `k` candidates closest to `query`, sorted by ascending distance.
    ///
    /// Only points sharing a bucket with the query are considered, so the
    /// result holds `min(k, candidates)` entries. Equal distances are ranked
    /// by ascending id.
    pub fn search_knn(&self, query: &T, k: usize) -> Vec<Neighbour> {
        let timer = self.metrics.as_ref().map(|_| QueryTimer::new());
        let candidates = self.candidates(query);
        let num_candidates = candidates.len();
        let actual_k = k.min(num_candidates);

        let results = if actual_k == 0 {
            Vec::new()
        } else {
            let mut topk = BoundedTopK::new(actual_k);
            for id in candidates {
                let dist = self.distance.distance(query, &self.objects[id]);
                topk.push(id, dist);
            }
            topk.into_sorted_vec()
        };

        trace!(k, actual_k, candidates = num_candidates, "knn query");

        if let (Some(m), Some(t)) = (self.metrics.as_ref(), timer) {
            m.record_query(num_candidates as u64, t.elapsed_ns());
        }

        results
    }

    /// The single closest candidate, or `None` when no table matched.
    pub fn search_nn(&self, query: &T) -> Option<Neighbour> {
        self.search_knn(query, 1).into_iter().next()
    }

    /// [`search_knn`](Self::search_knn) applied to each query independently.
    pub fn search_knn_batch(&self, queries: &[T], k: usize) -> Vec<Vec<Neighbour>> {
        queries.iter().map(|q| self.search_knn(q, k)).collect()
    }

    /// [`search_nn`](Self::search_nn) applied to each query independently.
    pub fn search_nn_batch(&self, queries: &[T]) -> Vec<Option<Neighbour>> {
        queries.iter().map(|q| self.search_nn(q)).collect()
    }

    /// Fixed-size k-NN: `k` is the buffer length.
    ///
    /// Slot `i` receives the `i`-th closest id and distance. When fewer than
    /// `k` candidates were found, the remaining slots hold [`SENTINEL_ID`] and
    /// [`SENTINEL_DISTANCE`]. Returns the number of real results written.
    pub fn search_knn_into(
        &self,
        query: &T,
        argmins: &mut [i64],
        mins: &mut [f32],
    ) -> Result<usize> {
        if argmins.len() != mins.len() {
            return Err(LshError::LengthMismatch {
                expected: argmins.len(),
                got: mins.len(),
            });
        }

        let results = self.search_knn(query, argmins.len());
        let found = results.len();
        argmins[found..].fill(SENTINEL_ID);
        mins[found..].fill(SENTINEL_DISTANCE);
        for (slot, n) in results.into_iter().enumerate() {
            argmins[slot] = n.id as i64;
            mins[slot] = n.distance;
        }
        Ok(found)
    }

    /// Exactly `k` `(id, distance)` pairs, sentinel-padded past the real results.
    pub fn search_knn_padded(&self, query: &T, k: usize) -> Vec<(i64, f32)> {
        let mut padded: Vec<(i64, f32)> = self
            .search_knn(query, k)
            .into_iter()
            .map(|n| (n.id as i64, n.distance))
            .collect();
        padded.resize(k, (SENTINEL_ID, SENTINEL_DISTANCE));
        padded
    }

    /// [`search_knn_padded`](Self::search_knn_padded) applied to each query independently.
    pub fn search_knn_padded_batch(&self, queries: &[T], k: usize) -> Vec<Vec<(i64, f32)>> {
        queries
            .iter()
            .map(|q| self.search_knn_padded(q, k))
            .collect()
    }

    /// Nearest neighbour of every query, written into one slot per query.
    ///
    /// Queries with no candidate get [`SENTINEL_ID`] and
    /// [`SENTINEL_DISTANCE`]. Returns the number of queries that found a
    /// neighbour.
    pub fn search_nn_batch_into(
        &self,
        queries: &[T],
        argmins: &mut [i64],
        mins: &mut [f32],
    ) -> Result<usize> {
        for got in [argmins.len(), mins.len()] {
            if got != queries.len() {
                return Err(LshError::LengthMismatch {
                    expected: queries.len(),
                    got,
                });
            }
        }

        let mut found = 0;
        for ((query, id_slot), dist_slot) in queries.iter().zip(argmins).zip(mins) {
            match self.search_nn(query) {
                Some(n) => {
                    *id_slot = n.id as i64;
                    *dist_slot = n.distance;
                    found += 1;
                }
                None => {
                    *id_slot = SENTINEL_ID;
                    *dist_slot = SENTINEL_DISTANCE;
                }
            }
        }
        Ok(found)
    }
}

impl<T, H, D> LshIndex<T, H, D> {
    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when the index holds no points.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of hash tables, fixed at construction.
    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    /// The object stored under `id`.
    ///
    /// # Panics
    ///
    /// If `id` was not returned by a previous `add` on this index.
    pub fn get(&self, id: PointId) -> &T {
        match self.objects.get(id) {
            Some(obj) => obj,
            None => panic!(
                "point id {id} out of range for index of size {}",
                self.objects.len()
            ),
        }
    }

    /// The object stored under `id`, or `None` if no such point was added.
    pub fn try_get(&self, id: PointId) -> Option<&T> {
        self.objects.get(id)
    }

    /// Read-only view of the object store, indexed by point id.
    pub fn data(&self) -> &[T] {
        &self.objects
    }

    /// The tables in construction order, one per hash function.
    pub fn tables(&self) -> &[Table<H>] {
        &self.tables
    }

    /// The comparator used to re-rank candidates.
    pub fn distance_comparator(&self) -> &D {
        &self.distance
    }

    /// Compute aggregate statistics about the index.
    pub fn stats(&self) -> IndexStats {
        let total_buckets: usize = self.tables.iter().map(|t| t.num_buckets()).sum();
        let total_entries: usize = self.tables.iter().map(|t| t.len()).sum();
        let max_bucket_size = self
            .tables
            .iter()
            .flat_map(|t| t.buckets())
            .map(|(_, ids)| ids.len())
            .max()
            .unwrap_or(0);

        let avg_bucket_size = if total_buckets > 0 {
            total_entries as f64 / total_buckets as f64
        } else {
            0.0
        };

        IndexStats {
            num_points: self.objects.len(),
            num_tables: self.tables.len(),
            total_buckets,
            avg_bucket_size,
            max_bucket_size,
        }
    }

    /// Snapshot of runtime metrics (`None` if metrics were not enabled).
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.metrics.as_ref().map(|m| m.snapshot())
    }

    /// Reset metrics counters.
    pub fn reset_metrics(&self) {
        if let Some(ref m) = self.metrics {
            m.reset();
        }
    }

    #[cfg(feature = "parallel")]
    pub(crate) fn parts_mut(&mut self) -> (&mut Vec<T>, &mut [Table<H>], Option<&MetricsCollector>) {
        (&mut self.objects, &mut self.tables, self.metrics.as_deref())
    }
}
