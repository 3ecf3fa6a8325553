use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Lock-free counters describing how the index is being used.
///
/// Updated through `&self`, so a collector can be shared by concurrent readers.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    inserts: AtomicU64,
    queries: AtomicU64,
    empty_queries: AtomicU64,
    candidates: AtomicU64,
    query_time_ns: AtomicU64,
    bucket_hits: AtomicU64,
    bucket_misses: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inserts(&self, n: u64) {
        self.inserts.fetch_add(n, Ordering::Relaxed);
    }

    /// One k-NN query that ranked `candidates` points.
    pub fn record_query(&self, candidates: u64, duration_ns: u64) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if candidates == 0 {
            self.empty_queries.fetch_add(1, Ordering::Relaxed);
        }
        self.candidates.fetch_add(candidates, Ordering::Relaxed);
        self.query_time_ns.fetch_add(duration_ns, Ordering::Relaxed);
    }

    /// A table lookup found a bucket for the query.
    pub fn record_bucket_hit(&self) {
        self.bucket_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// A table lookup found no bucket for the query.
    pub fn record_bucket_miss(&self) {
        self.bucket_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let queries = self.queries.load(Ordering::Relaxed);
        let hits = self.bucket_hits.load(Ordering::Relaxed);
        let lookups = hits + self.bucket_misses.load(Ordering::Relaxed);
        let per_query = |total: u64| {
            if queries > 0 {
                total as f64 / queries as f64
            } else {
                0.0
            }
        };

        MetricsSnapshot {
            insert_count: self.inserts.load(Ordering::Relaxed),
            query_count: queries,
            empty_query_count: self.empty_queries.load(Ordering::Relaxed),
            avg_candidates_per_query: per_query(self.candidates.load(Ordering::Relaxed)),
            avg_query_time_us: per_query(self.query_time_ns.load(Ordering::Relaxed)) / 1000.0,
            hit_rate: if lookups > 0 {
                hits as f64 / lookups as f64
            } else {
                0.0
            },
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.inserts,
            &self.queries,
            &self.empty_queries,
            &self.candidates,
            &self.query_time_ns,
            &self.bucket_hits,
            &self.bucket_misses,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// A point-in-time snapshot of index metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub insert_count: u64,
    pub query_count: u64,
    /// k-NN queries whose candidate set was empty.
    pub empty_query_count: u64,
    pub avg_candidates_per_query: f64,
    pub avg_query_time_us: f64,
    /// Fraction of table lookups that found a bucket.
    pub hit_rate: f64,
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Inserts: {}, Queries: {} ({} empty), Avg candidates: {:.1}, Avg query: {:.2}us, Hit rate: {:.1}%",
            self.insert_count,
            self.query_count,
            self.empty_query_count,
            self.avg_candidates_per_query,
            self.avg_query_time_us,
            self.hit_rate * 100.0,
        )
    }
}

/// Wall-clock timer for one query.
pub(crate) struct QueryTimer {
    start: Instant,
}

impl QueryTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ns(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
}
