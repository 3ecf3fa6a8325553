use ndarray::{Array1, ArrayView1};

/// Exact distance between two objects, used only to re-rank candidates.
///
/// Smaller values mean closer. The index never uses it to place points into
/// buckets.
pub trait DistanceComparator<T: ?Sized> {
    fn distance(&self, a: &T, b: &T) -> f32;
}

impl<T: ?Sized, D: DistanceComparator<T> + ?Sized> DistanceComparator<T> for &D {
    fn distance(&self, a: &T, b: &T) -> f32 {
        (**self).distance(a, b)
    }
}

impl<T: ?Sized, D: DistanceComparator<T> + ?Sized> DistanceComparator<T> for Box<D> {
    fn distance(&self, a: &T, b: &T) -> f32 {
        (**self).distance(a, b)
    }
}

/// Adapter turning a closure into a [`DistanceComparator`].
#[derive(Clone, Copy)]
pub struct FnDistance<F>(pub F);

impl<T: ?Sized, F> DistanceComparator<T> for FnDistance<F>
where
    F: Fn(&T, &T) -> f32,
{
    fn distance(&self, a: &T, b: &T) -> f32 {
        (self.0)(a, b)
    }
}

impl<F> std::fmt::Debug for FnDistance<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnDistance(..)")
    }
}

/// Wrap a closure as a distance comparator.
pub fn distance_fn<T: ?Sized, F>(f: F) -> FnDistance<F>
where
    F: Fn(&T, &T) -> f32,
{
    FnDistance(f)
}

/// Built-in metrics over dense `f32` vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Cosine distance: 1 - cos(a, b). Range [0, 2]. 0 = identical direction.
    Cosine,
    /// Euclidean (L2) distance. Range [0, inf).
    Euclidean,
    /// Manhattan (L1) distance. Range [0, inf).
    Manhattan,
    /// Negative dot product (so smaller = more similar). Range (-inf, inf).
    DotProduct,
}

impl DistanceMetric {
    /// Compute the distance between two vectors using this metric.
    pub fn compute(&self, a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
        match self {
            DistanceMetric::Cosine => cosine_distance(a, b),
            DistanceMetric::Euclidean => euclidean_distance(a, b),
            DistanceMetric::Manhattan => manhattan_distance(a, b),
            DistanceMetric::DotProduct => -dot_product(a, b),
        }
    }
}

impl DistanceComparator<[f32]> for DistanceMetric {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        self.compute(&ArrayView1::from(a), &ArrayView1::from(b))
    }
}

impl DistanceComparator<Vec<f32>> for DistanceMetric {
    fn distance(&self, a: &Vec<f32>, b: &Vec<f32>) -> f32 {
        self.compute(&ArrayView1::from(a.as_slice()), &ArrayView1::from(b.as_slice()))
    }
}

impl DistanceComparator<Array1<f32>> for DistanceMetric {
    fn distance(&self, a: &Array1<f32>, b: &Array1<f32>) -> f32 {
        self.compute(&a.view(), &b.view())
    }
}

/// Cosine distance: 1 - cos(a, b).
///
/// The result is never negative. A vector compared with itself may come out
/// a few ulps above zero rather than exactly zero.
pub fn cosine_distance(a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
    let dot = a.dot(b);
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    let denom = norm_a * norm_b;
    if denom < f32::EPSILON {
        return 1.0;
    }
    // Rounding can push a self-comparison slightly below zero.
    (1.0 - (dot / denom)).max(0.0)
}

/// Euclidean (L2) distance between two vectors.
pub fn euclidean_distance(a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Manhattan (L1) distance between two vectors.
pub fn manhattan_distance(a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

/// Dot product of two vectors.
pub fn dot_product(a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
    a.dot(b)
}
