//! Configuration and builder for dense-vector indexes.

use hashbrown::HashSet;

use crate::distance::DistanceMetric;
use crate::error::{LshError, Result};
use crate::hash::{
    HashCode, HashFunction, HashFunctionFactory, PStableFactory, PStableHasher,
    RandomProjectionFactory, RandomProjectionHasher,
};
use crate::index::{LshIndex, PointId};
use crate::topk::Neighbour;

/// Which bundled hash family a vector index draws its tables from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HashFamily {
    /// Sign-of-random-projection; pairs naturally with cosine distance.
    RandomProjection,
    /// Gaussian p-stable projections; pairs naturally with Euclidean distance.
    PStable { bucket_width: f32 },
}

/// Configuration for a [`VectorLshIndex`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    /// Dimensionality of vectors.
    pub dim: usize,
    /// Number of projections per table (1..=64).
    pub num_hashes: usize,
    /// Number of independent hash tables.
    pub num_tables: usize,
    /// Distance metric for ranking candidates.
    pub distance_metric: DistanceMetric,
    pub family: HashFamily,
    /// Optional RNG seed for reproducible hash functions.
    pub seed: Option<u64>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dim: 768,
            num_hashes: 8,
            num_tables: 16,
            distance_metric: DistanceMetric::Cosine,
            family: HashFamily::RandomProjection,
            seed: None,
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(LshError::ZeroDimension);
        }
        if self.num_hashes == 0 || self.num_hashes > 64 {
            return Err(LshError::InvalidNumHashes(self.num_hashes));
        }
        if self.num_tables == 0 {
            return Err(LshError::NoTables);
        }
        if let HashFamily::PStable { bucket_width } = self.family {
            if !(bucket_width.is_finite() && bucket_width > 0.0) {
                return Err(LshError::InvalidConfig(format!(
                    "bucket_width must be finite and > 0, got {bucket_width}"
                )));
            }
        }
        Ok(())
    }
}

/// A hash function from one of the bundled vector families.
#[derive(Debug, Clone)]
pub enum VectorHasher {
    Projection(RandomProjectionHasher),
    PStable(PStableHasher),
}

impl<T: ?Sized> HashFunction<T> for VectorHasher
where
    RandomProjectionHasher: HashFunction<T>,
    PStableHasher: HashFunction<T>,
{
    fn compute_hash(&self, point: &T) -> HashCode {
        match self {
            VectorHasher::Projection(h) => h.compute_hash(point),
            VectorHasher::PStable(h) => h.compute_hash(point),
        }
    }
}

/// Dense `f32` vector index built from an [`IndexConfig`].
///
/// # Panics
///
/// The unchecked operations (`add`, `add_all`, `search`, `search_knn`, ...)
/// panic when given a vector whose length differs from [`dim`](LshIndex::dim).
/// The `try_*` operations return [`LshError::DimensionMismatch`] instead.
pub type VectorLshIndex = LshIndex<Vec<f32>, VectorHasher, DistanceMetric>;

impl LshIndex<Vec<f32>, VectorHasher, DistanceMetric> {
    /// Start building a vector index with the builder pattern.
    pub fn builder() -> LshIndexBuilder {
        LshIndexBuilder::new()
    }

    /// Create a vector index directly from an [`IndexConfig`].
    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        match config.family {
            HashFamily::RandomProjection => {
                let mut factory =
                    RandomProjectionFactory::new(config.dim, config.num_hashes, config.seed)?;
                Self::from_factory(
                    move || {
                        VectorHasher::Projection(HashFunctionFactory::<Vec<f32>>::create(
                            &mut factory,
                        ))
                    },
                    config.num_tables,
                    config.distance_metric,
                )
            }
            HashFamily::PStable { bucket_width } => {
                let mut factory = PStableFactory::new(
                    config.dim,
                    config.num_hashes,
                    bucket_width,
                    config.seed,
                )?;
                Self::from_factory(
                    move || {
                        VectorHasher::PStable(HashFunctionFactory::<Vec<f32>>::create(&mut factory))
                    },
                    config.num_tables,
                    config.distance_metric,
                )
            }
        }
    }

    /// Vector dimensionality the hash functions were drawn for.
    pub fn dim(&self) -> usize {
        match self.tables()[0].function() {
            VectorHasher::Projection(h) => h.dim(),
            VectorHasher::PStable(h) => h.dim(),
        }
    }

    fn check_dim(&self, vector: &[f32]) -> Result<()> {
        let expected = self.dim();
        if vector.len() != expected {
            return Err(LshError::DimensionMismatch {
                expected,
                got: vector.len(),
            });
        }
        Ok(())
    }

    /// [`add`](LshIndex::add) after checking the vector's dimension.
    pub fn try_add(&mut self, vector: Vec<f32>) -> Result<PointId> {
        self.check_dim(&vector)?;
        Ok(self.add(vector))
    }

    /// [`add_all`](LshIndex::add_all) after checking every vector's dimension.
    ///
    /// Nothing is inserted unless every vector matches.
    pub fn try_add_all(&mut self, vectors: Vec<Vec<f32>>) -> Result<Vec<PointId>> {
        for v in &vectors {
            self.check_dim(v)?;
        }
        Ok(self.add_all(vectors))
    }

    #[allow(clippy::ptr_arg)]
    pub fn try_search(&self, query: &Vec<f32>) -> Result<HashSet<PointId>> {
        self.check_dim(query)?;
        Ok(self.search(query))
    }

    #[allow(clippy::ptr_arg)]
    pub fn try_search_knn(&self, query: &Vec<f32>, k: usize) -> Result<Vec<Neighbour>> {
        self.check_dim(query)?;
        Ok(self.search_knn(query, k))
    }

    #[allow(clippy::ptr_arg)]
    pub fn try_search_nn(&self, query: &Vec<f32>) -> Result<Option<Neighbour>> {
        self.check_dim(query)?;
        Ok(self.search_nn(query))
    }
}

/// Fluent builder for [`VectorLshIndex`].
#[derive(Debug, Default)]
pub struct LshIndexBuilder {
    config: IndexConfig,
    enable_metrics: bool,
}

impl LshIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dim(mut self, dim: usize) -> Self {
        self.config.dim = dim;
        self
    }

    pub fn num_hashes(mut self, n: usize) -> Self {
        self.config.num_hashes = n;
        self
    }

    pub fn num_tables(mut self, n: usize) -> Self {
        self.config.num_tables = n;
        self
    }

    pub fn distance_metric(mut self, m: DistanceMetric) -> Self {
        self.config.distance_metric = m;
        self
    }

    /// Use sign-of-random-projection hash functions (the default).
    pub fn random_projection(mut self) -> Self {
        self.config.family = HashFamily::RandomProjection;
        self
    }

    /// Use p-stable Euclidean hash functions with bucket width `w`.
    pub fn p_stable(mut self, bucket_width: f32) -> Self {
        self.config.family = HashFamily::PStable { bucket_width };
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn enable_metrics(mut self) -> Self {
        self.enable_metrics = true;
        self
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Build the index, returning an error on invalid configuration.
    pub fn build(self) -> Result<VectorLshIndex> {
        let index = VectorLshIndex::from_config(&self.config)?;
        Ok(if self.enable_metrics {
            index.with_metrics()
        } else {
            index
        })
    }
}
