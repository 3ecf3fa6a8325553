//! Rayon-backed batch operations on an explicitly supplied thread pool.
//!
//! Requires the `parallel` feature flag.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::distance::DistanceComparator;
use crate::error::{LshError, Result};
use crate::hash::{HashCode, HashFunction};
use crate::index::{LshIndex, PointId};
use crate::topk::Neighbour;

/// Build a dedicated pool with `num_threads` workers.
pub fn build_thread_pool(num_threads: usize) -> Result<ThreadPool> {
    if num_threads == 0 {
        return Err(LshError::InvalidConfig("num_threads must be > 0".into()));
    }
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| LshError::ThreadPool(e.to_string()))
}

impl<T, H, D> LshIndex<T, H, D>
where
    T: Send + Sync,
    H: HashFunction<T> + Sync,
    D: DistanceComparator<T> + Sync,
{
    /// Run [`search_knn`](Self::search_knn) for every query on `pool`.
    ///
    /// Queries are independent; output order matches input order.
    pub fn par_search_knn_batch(
        &self,
        queries: &[T],
        k: usize,
        pool: &ThreadPool,
    ) -> Vec<Vec<Neighbour>> {
        pool.install(|| queries.par_iter().map(|q| self.search_knn(q, k)).collect())
    }

    /// Add `points` in input order, hashing them on `pool` first.
    ///
    /// Per-table codes are computed in parallel; ids are then assigned and
    /// buckets filled sequentially, so the result equals
    /// [`add_all`](Self::add_all) on the same input.
    pub fn par_add_all(&mut self, points: Vec<T>, pool: &ThreadPool) -> Vec<PointId> {
        let codes: Vec<Vec<HashCode>> =
            pool.install(|| points.par_iter().map(|p| self.get_bucket_id(p)).collect());

        let (objects, tables, metrics) = self.parts_mut();
        let first = objects.len();
        objects.reserve(points.len());
        for (point, point_codes) in points.into_iter().zip(codes) {
            let id = objects.len();
            for (table, code) in tables.iter_mut().zip(point_codes) {
                table.insert_hashed(code, id);
            }
            objects.push(point);
        }
        let added = objects.len() - first;
        if let Some(m) = metrics {
            m.record_inserts(added as u64);
        }

        debug!(added, size = first + added, "parallel bulk insert");
        (first..first + added).collect()
    }
}
