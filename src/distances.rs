use crate::memory::*;

/// Euclidean distance between **a** and **b**, computed over all but the last dimension.
///
/// The last column of every sample is a label column and never contributes to the distance. It is still
/// carried through the centroid means. With a single dimension, all distances are zero.
#[inline(always)]
pub fn feature_distance<T: Primitive>(a: &[T], b: &[T]) -> T {
    let feature_dims = a.len().saturating_sub(1);
    a.iter().zip(b.iter()).take(feature_dims)
        .map(|(av, bv)| *av - *bv)      // <sample> - <centroid>
        .map(|v| v * v)                 // <vec_components> ^2
        .sum::<T>()                     // sum(<vec_components>^2)
        .sqrt()
}
