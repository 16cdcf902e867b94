use crate::{KMeans, KMeansConfig, KMeansError, KMeansState, Result, memory::*};

#[inline(always)]
pub fn calculate<T: Primitive>(
    kmean: &KMeans<T>, state: &mut KMeansState<T>, _config: &KMeansConfig<'_, T>, computed: Vec<T>,
) -> Result<()> {
    if computed.len() != state.k * kmean.sample_dims {
        return Err(KMeansError::InvalidConfiguration(format!(
            "precomputed centroids hold {} values, expected {} centroids * {} dimensions",
            computed.len(), state.k, kmean.sample_dims)));
    }
    computed.chunks_exact(kmean.sample_dims).enumerate().for_each(|(ci, c)| {
        state.set_centroid_from_iter(ci, c.iter().cloned());
    });
    Ok(())
}
