//! Single-writer, many-reader access to an index from several threads.

use hashbrown::HashSet;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::distance::DistanceComparator;
use crate::hash::HashFunction;
use crate::index::{LshIndex, PointId};
use crate::topk::Neighbour;

/// An [`LshIndex`] behind a `parking_lot::RwLock`.
///
/// Queries take the read lock and proceed in parallel; insertions take the
/// write lock. Each call is atomic with respect to the others, so ids handed
/// out by concurrent `add` calls never collide and a query observes either
/// all or none of a concurrent `add_all`.
#[derive(Debug)]
pub struct SharedLshIndex<T, H, D> {
    inner: RwLock<LshIndex<T, H, D>>,
}

impl<T, H, D> SharedLshIndex<T, H, D>
where
    H: HashFunction<T>,
    D: DistanceComparator<T>,
{
    pub fn new(index: LshIndex<T, H, D>) -> Self {
        Self {
            inner: RwLock::new(index),
        }
    }

    pub fn add(&self, point: T) -> PointId {
        self.inner.write().add(point)
    }

    pub fn add_all<I>(&self, points: I) -> Vec<PointId>
    where
        I: IntoIterator<Item = T>,
    {
        self.inner.write().add_all(points)
    }

    pub fn search(&self, query: &T) -> HashSet<PointId> {
        self.inner.read().search(query)
    }

    pub fn search_knn(&self, query: &T, k: usize) -> Vec<Neighbour> {
        self.inner.read().search_knn(query, k)
    }

    pub fn search_nn(&self, query: &T) -> Option<Neighbour> {
        self.inner.read().search_nn(query)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Clone of the object stored under `id`; `None` if out of range.
    pub fn get_cloned(&self, id: PointId) -> Option<T>
    where
        T: Clone,
    {
        self.inner.read().try_get(id).cloned()
    }

    /// Hold the read lock across several operations.
    pub fn read(&self) -> RwLockReadGuard<'_, LshIndex<T, H, D>> {
        self.inner.read()
    }

    /// Hold the write lock across several operations.
    pub fn write(&self) -> RwLockWriteGuard<'_, LshIndex<T, H, D>> {
        self.inner.write()
    }

    pub fn into_inner(self) -> LshIndex<T, H, D> {
        self.inner.into_inner()
    }
}

impl<T, H, D> From<LshIndex<T, H, D>> for SharedLshIndex<T, H, D>
where
    H: HashFunction<T>,
    D: DistanceComparator<T>,
{
    fn from(index: LshIndex<T, H, D>) -> Self {
        Self::new(index)
    }
}
