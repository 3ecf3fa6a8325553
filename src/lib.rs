//! # lsh_knn
//!
//! An incremental, in-memory approximate nearest-neighbour index built on
//! Locality-Sensitive Hashing with exact re-ranking.
//!
//! Every inserted object is filed into one bucket per hash table. A query
//! gathers the union of the buckets it hashes to, then computes exact
//! distances over that candidate set only, never over the whole collection.
//!
//! Hash functions and the distance are pluggable: any type implementing
//! [`HashFunction`] and [`DistanceComparator`] for the stored object type
//! works, including closures wrapped with [`hash_fn`] and [`distance_fn`].
//!
//! ## Quick start
//!
//! ```rust
//! use lsh_knn::{DistanceMetric, VectorLshIndex};
//!
//! let mut index = VectorLshIndex::builder()
//!     .dim(128)
//!     .num_hashes(12)
//!     .num_tables(8)
//!     .distance_metric(DistanceMetric::Cosine)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! let v = vec![0.1_f32; 128];
//! let id = index.add(v.clone());
//!
//! let results = index.search_knn(&v, 5);
//! assert_eq!(results[0].id, id);
//! ```
//!
//! ## Custom objects
//!
//! ```rust
//! use lsh_knn::{distance_fn, hash_fn, HashCode, LshIndex};
//!
//! // Three tables, each an identity hash on a 1-D integer feature.
//! let tables: Vec<_> = (0..3).map(|_| hash_fn(|x: &i64| *x as HashCode)).collect();
//! let distance = distance_fn(|a: &i64, b: &i64| (a - b).abs() as f32);
//!
//! let mut index = LshIndex::new(tables, distance).unwrap();
//! assert_eq!(index.add_all(vec![10, 20, 10]), vec![0, 1, 2]);
//!
//! let nn = index.search_nn(&10).unwrap();
//! assert_eq!(nn.distance, 0.0);
//! ```
//!
//! ## Feature flags
//!
//! | Flag       | Effect                                                   |
//! |------------|----------------------------------------------------------|
//! | `parallel` | Batch query / bulk insert on a caller-supplied rayon pool |
//! | `full`     | Enables `parallel`                                       |

pub mod config;
pub mod distance;
pub mod error;
pub mod hash;
pub mod index;
pub mod metrics;
pub mod shared;
pub mod table;
pub mod topk;

#[cfg(feature = "parallel")]
pub mod parallel;

// Re-exports for convenience.
pub use config::{HashFamily, IndexConfig, LshIndexBuilder, VectorHasher, VectorLshIndex};
pub use distance::{distance_fn, DistanceComparator, DistanceMetric, FnDistance};
pub use error::{LshError, Result};
pub use hash::{
    hash_fn, DynHashFunction, FnHash, HashCode, HashFunction, HashFunctionFactory,
    PStableFactory, PStableHasher, RandomProjectionFactory, RandomProjectionHasher,
};
pub use index::{IndexStats, LshIndex, PointId, SENTINEL_DISTANCE, SENTINEL_ID};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use shared::SharedLshIndex;
pub use table::{Bucket, Table};
pub use topk::{BoundedTopK, Neighbour};

#[cfg(feature = "parallel")]
pub use parallel::build_thread_pool;
