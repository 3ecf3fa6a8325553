//! Hash function capabilities consumed by the index.
//!
//! A [`HashFunction`] maps an object to a bucket code; each table of the
//! index owns exactly one. A [`HashFunctionFactory`] produces independent
//! instances drawn from the same family, one per table.
//!
//! Two vector families ship with the crate:
//!
//! - [`RandomProjectionHasher`]: sign-of-random-projection (angular / cosine).
//! - [`PStableHasher`]: Gaussian p-stable projections quantised into buckets (Euclidean).

mod projection;
mod pstable;

use std::sync::Arc;

pub use projection::{RandomProjectionFactory, RandomProjectionHasher};
pub use pstable::{PStableFactory, PStableHasher};

/// Raw bucket code produced by a hash function.
pub type HashCode = u64;

/// A deterministic, pure mapping from an object to a bucket code.
///
/// Every object in the function's domain maps to some code, and the same
/// object always maps to the same code. Functions with a narrower domain than
/// their input type (the bundled vector families only accept vectors of the
/// dimension they were drawn for) panic outside it.
pub trait HashFunction<T: ?Sized> {
    fn compute_hash(&self, point: &T) -> HashCode;
}

impl<T: ?Sized, H: HashFunction<T> + ?Sized> HashFunction<T> for &H {
    fn compute_hash(&self, point: &T) -> HashCode {
        (**self).compute_hash(point)
    }
}

impl<T: ?Sized, H: HashFunction<T> + ?Sized> HashFunction<T> for Box<H> {
    fn compute_hash(&self, point: &T) -> HashCode {
        (**self).compute_hash(point)
    }
}

impl<T: ?Sized, H: HashFunction<T> + ?Sized> HashFunction<T> for Arc<H> {
    fn compute_hash(&self, point: &T) -> HashCode {
        (**self).compute_hash(point)
    }
}

/// Boxed hash function, for indexes whose tables use heterogeneous functions.
pub type DynHashFunction<T> = Box<dyn HashFunction<T> + Send + Sync>;

/// Adapter turning a closure into a [`HashFunction`].
#[derive(Clone, Copy)]
pub struct FnHash<F>(pub F);

impl<T: ?Sized, F> HashFunction<T> for FnHash<F>
where
    F: Fn(&T) -> HashCode,
{
    fn compute_hash(&self, point: &T) -> HashCode {
        (self.0)(point)
    }
}

impl<F> std::fmt::Debug for FnHash<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnHash(..)")
    }
}

/// Wrap a closure as a hash function.
pub fn hash_fn<T: ?Sized, F>(f: F) -> FnHash<F>
where
    F: Fn(&T) -> HashCode,
{
    FnHash(f)
}

/// Builds independent hash functions from one family, one per table.
///
/// Each call to [`create`](Self::create) should yield a fresh instance (for
/// randomised families, new random parameters), not a copy of the previous one.
pub trait HashFunctionFactory<T: ?Sized> {
    type Function: HashFunction<T>;

    fn create(&mut self) -> Self::Function;
}

impl<T: ?Sized, H, F> HashFunctionFactory<T> for F
where
    F: FnMut() -> H,
    H: HashFunction<T>,
{
    type Function = H;

    fn create(&mut self) -> H {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_hash() {
        let h = hash_fn(|x: &i64| *x as HashCode);
        assert_eq!(h.compute_hash(&10i64), 10);
        assert_eq!(h.compute_hash(&10i64), h.compute_hash(&10i64));
    }

    #[test]
    fn test_boxed_heterogeneous_functions() {
        let functions: Vec<DynHashFunction<i64>> = vec![
            Box::new(hash_fn(|x: &i64| *x as HashCode)),
            Box::new(hash_fn(|x: &i64| (*x / 10) as HashCode)),
        ];
        let codes: Vec<HashCode> = functions.iter().map(|f| f.compute_hash(&25i64)).collect();
        assert_eq!(codes, vec![25, 2]);
    }

    #[test]
    fn test_closure_factory_creates_fresh_instances() {
        let mut counter = 0u64;
        let mut factory = || {
            counter += 1;
            let salt = counter;
            hash_fn(move |x: &u64| x ^ salt)
        };
        let a = HashFunctionFactory::<u64>::create(&mut factory);
        let b = HashFunctionFactory::<u64>::create(&mut factory);
        assert_ne!(a.compute_hash(&0), b.compute_hash(&0));
    }
}
