use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::{HashCode, HashFunction, HashFunctionFactory};
use crate::error::{LshError, Result};

/// Sign-of-random-projection hash (SimHash / hyperplane LSH).
///
/// Each bit of the code is the sign of the dot product with one random
/// Gaussian vector, so vectors separated by a small angle agree on most bits.
///
/// # Panics
///
/// Hashing a vector whose length differs from `dim`.
#[derive(Debug, Clone)]
pub struct RandomProjectionHasher {
    projections: Vec<Array1<f32>>,
    dim: usize,
}

impl RandomProjectionHasher {
    /// Draw `num_hashes` random hyperplanes of dimension `dim`.
    pub fn new(dim: usize, num_hashes: usize, rng: &mut impl Rng) -> Result<Self> {
        validate(dim, num_hashes)?;
        Ok(Self {
            projections: gaussian_vectors(dim, num_hashes, rng),
            dim,
        })
    }

    /// Hash a vector view into its bit signature.
    pub fn hash_view(&self, vector: &ArrayView1<f32>) -> HashCode {
        check_dim(self.dim, vector.len());
        let mut hash: HashCode = 0;
        for (i, proj) in self.projections.iter().enumerate() {
            if vector.dot(proj) >= 0.0 {
                hash |= 1 << i;
            }
        }
        hash
    }

    /// Number of bits in the signature.
    pub fn num_hashes(&self) -> usize {
        self.projections.len()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

/// `count` vectors of dimension `dim` with i.i.d. standard normal entries.
pub(super) fn gaussian_vectors(dim: usize, count: usize, rng: &mut impl Rng) -> Vec<Array1<f32>> {
    (0..count)
        .map(|_| {
            let v: Vec<f32> = (0..dim).map(|_| rng.sample(StandardNormal)).collect();
            Array1::from_vec(v)
        })
        .collect()
}

pub(super) fn check_dim(expected: usize, got: usize) {
    assert_eq!(
        got, expected,
        "vector dimension {got} does not match hasher dimension {expected}"
    );
}

pub(super) fn validate(dim: usize, num_hashes: usize) -> Result<()> {
    if dim == 0 {
        return Err(LshError::ZeroDimension);
    }
    if num_hashes == 0 || num_hashes > 64 {
        return Err(LshError::InvalidNumHashes(num_hashes));
    }
    Ok(())
}

impl HashFunction<[f32]> for RandomProjectionHasher {
    fn compute_hash(&self, point: &[f32]) -> HashCode {
        self.hash_view(&ArrayView1::from(point))
    }
}

impl HashFunction<Vec<f32>> for RandomProjectionHasher {
    fn compute_hash(&self, point: &Vec<f32>) -> HashCode {
        self.hash_view(&ArrayView1::from(point.as_slice()))
    }
}

impl HashFunction<Array1<f32>> for RandomProjectionHasher {
    fn compute_hash(&self, point: &Array1<f32>) -> HashCode {
        self.hash_view(&point.view())
    }
}

/// Produces independent [`RandomProjectionHasher`]s from one seeded stream.
#[derive(Debug, Clone)]
pub struct RandomProjectionFactory {
    dim: usize,
    num_hashes: usize,
    rng: StdRng,
}

impl RandomProjectionFactory {
    /// `seed = None` draws the projection stream from OS entropy.
    pub fn new(dim: usize, num_hashes: usize, seed: Option<u64>) -> Result<Self> {
        validate(dim, num_hashes)?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            dim,
            num_hashes,
            rng,
        })
    }
}

impl<T: ?Sized> HashFunctionFactory<T> for RandomProjectionFactory
where
    RandomProjectionHasher: HashFunction<T>,
{
    type Function = RandomProjectionHasher;

    fn create(&mut self) -> RandomProjectionHasher {
        RandomProjectionHasher {
            projections: gaussian_vectors(self.dim, self.num_hashes, &mut self.rng),
            dim: self.dim,
        }
    }
}
