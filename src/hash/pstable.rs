use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::projection::{check_dim, gaussian_vectors, validate};
use super::{HashCode, HashFunction, HashFunctionFactory};
use crate::error::{LshError, Result};

// FNV-1a 64-bit parameters, used to fold the per-projection slots into one code.
const FOLD_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FOLD_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Gaussian p-stable hash for Euclidean distance (Datar et al.).
///
/// Each projection contributes `floor((a · v + b) / w)`, with `a` drawn from a
/// standard normal and `b` uniform in `[0, w)`. The slot indices are folded
/// into a single [`HashCode`]; points within roughly `w` of each other tend to
/// share every slot.
///
/// # Panics
///
/// Hashing a vector whose length differs from `dim`.
#[derive(Debug, Clone)]
pub struct PStableHasher {
    projections: Vec<Array1<f32>>,
    offsets: Vec<f32>,
    bucket_width: f32,
    dim: usize,
}

impl PStableHasher {
    pub fn new(dim: usize, num_hashes: usize, bucket_width: f32, rng: &mut impl Rng) -> Result<Self> {
        validate(dim, num_hashes)?;
        validate_width(bucket_width)?;
        Ok(Self::draw(dim, num_hashes, bucket_width, rng))
    }

    fn draw(dim: usize, num_hashes: usize, bucket_width: f32, rng: &mut impl Rng) -> Self {
        let projections = gaussian_vectors(dim, num_hashes, rng);
        let offsets = (0..num_hashes)
            .map(|_| rng.gen_range(0.0..bucket_width))
            .collect();
        Self {
            projections,
            offsets,
            bucket_width,
            dim,
        }
    }

    fn slot(&self, i: usize, vector: &ArrayView1<f32>) -> i64 {
        ((vector.dot(&self.projections[i]) + self.offsets[i]) / self.bucket_width).floor() as i64
    }

    /// Per-projection slot indices before folding.
    pub fn slots(&self, vector: &ArrayView1<f32>) -> Vec<i64> {
        check_dim(self.dim, vector.len());
        (0..self.projections.len())
            .map(|i| self.slot(i, vector))
            .collect()
    }

    pub fn hash_view(&self, vector: &ArrayView1<f32>) -> HashCode {
        check_dim(self.dim, vector.len());
        let mut hash = FOLD_OFFSET;
        for i in 0..self.projections.len() {
            for byte in self.slot(i, vector).to_le_bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(FOLD_PRIME);
            }
        }
        hash
    }

    pub fn bucket_width(&self) -> f32 {
        self.bucket_width
    }

    pub fn num_hashes(&self) -> usize {
        self.projections.len()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

fn validate_width(bucket_width: f32) -> Result<()> {
    if !(bucket_width.is_finite() && bucket_width > 0.0) {
        return Err(LshError::InvalidConfig(format!(
            "bucket_width must be finite and > 0, got {bucket_width}"
        )));
    }
    Ok(())
}

impl HashFunction<[f32]> for PStableHasher {
    fn compute_hash(&self, point: &[f32]) -> HashCode {
        self.hash_view(&ArrayView1::from(point))
    }
}

impl HashFunction<Vec<f32>> for PStableHasher {
    fn compute_hash(&self, point: &Vec<f32>) -> HashCode {
        self.hash_view(&ArrayView1::from(point.as_slice()))
    }
}

impl HashFunction<Array1<f32>> for PStableHasher {
    fn compute_hash(&self, point: &Array1<f32>) -> HashCode {
        self.hash_view(&point.view())
    }
}

/// Produces independent [`PStableHasher`]s sharing one bucket width.
#[derive(Debug, Clone)]
pub struct PStableFactory {
    dim: usize,
    num_hashes: usize,
    bucket_width: f32,
    rng: StdRng,
}

impl PStableFactory {
    pub fn new(dim: usize, num_hashes: usize, bucket_width: f32, seed: Option<u64>) -> Result<Self> {
        validate(dim, num_hashes)?;
        validate_width(bucket_width)?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            dim,
            num_hashes,
            bucket_width,
            rng,
        })
    }
}

impl<T: ?Sized> HashFunctionFactory<T> for PStableFactory
where
    PStableHasher: HashFunction<T>,
{
    type Function = PStableHasher;

    fn create(&mut self) -> PStableHasher {
        PStableHasher::draw(self.dim, self.num_hashes, self.bucket_width, &mut self.rng)
    }
}
