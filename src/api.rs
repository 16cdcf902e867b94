use crate::{distances, memory::*, KMeansError, Result};
use std::cell::RefCell;
use rayon::prelude::*;
use rand::prelude::*;

pub type InitDoneCallbackFn<'a, T> = &'a dyn Fn(&KMeansState<T>);
pub type IterationDoneCallbackFn<'a, T> = &'a dyn Fn(&KMeansState<T>, usize);

/// This is a structure holding various configuration options for a k-means calculation, such as
/// the random number generator to use, or a couple of callbacks, that can be set to get status information from
/// a running k-means calculation.
///
/// For a more detailed information about all possible options, have a look at [`KMeansConfigBuilder`].
pub struct KMeansConfig<'a, T: Primitive> {
    /// Callback that is called, when the initialization phase finished
    /// ## Arguments
    /// - **state**: Current [`KMeansState`] after the initialization
    pub(crate) init_done: InitDoneCallbackFn<'a, T>,
    /// Callback that is called after each iteration
    /// ## Arguments
    /// - **state**: Current [`KMeansState`] after the iteration
    /// - **iteration_id**: Number of the current iteration (starting at 1)
    pub(crate) iteration_done: IterationDoneCallbackFn<'a, T>,
    /// Random number generator used for the initial seeding, as well as for reseeding empty clusters
    pub(crate) rnd: Box<RefCell<dyn RngCore>>,
}
impl<'a, T: Primitive> Default for KMeansConfig<'a, T> {
    fn default() -> Self {
        Self {
            init_done: &|_| {},
            iteration_done: &|_,_| {},
            rnd: Box::new(RefCell::new(rand::thread_rng())),
        }
    }
}
impl<'a, T: Primitive> KMeansConfig<'a, T> {
    /// Use the [`KMeansConfigBuilder`] to build a [`KMeansConfig`] instance.
    pub fn build() -> KMeansConfigBuilder<'a, T> {
        KMeansConfigBuilder { config: KMeansConfig::default() }
    }
}
impl<'a, T: Primitive> std::fmt::Debug for KMeansConfig<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KMeansConfig").finish_non_exhaustive()
    }
}

pub struct KMeansConfigBuilder<'a, T: Primitive> {
    config: KMeansConfig<'a, T>
}
impl<'a, T: Primitive> KMeansConfigBuilder<'a, T> {
    /// Set the callback that should be called after the centroid initialization, before the iteration starts.
    pub fn init_done(mut self, init_done: InitDoneCallbackFn<'a, T>) -> Self {
        self.config.init_done = init_done; self
    }
    /// Set the callback that should be called after each iteration during a running k-means calculation.
    pub fn iteration_done(mut self, iteration_done: IterationDoneCallbackFn<'a, T>) -> Self {
        self.config.iteration_done = iteration_done; self
    }
    /// Set the random number generator that should be used in the k-means calculation.
    /// Use a seeded generator for deterministically repeatable results.
    pub fn random_generator<R: RngCore + 'static>(mut self, rnd: R) -> Self {
        self.config.rnd = Box::new(RefCell::new(rnd)); self
    }
    /// Return the internally built configuration structure.
    pub fn build(self) -> KMeansConfig<'a, T> { self.config }
}


/// This is the data-structure storing the current state during calculation, as
/// well as the final result, as returned by the API.
/// All mutations are done in this structure, making [`KMeans`] immutable.
///
/// ## Generics
/// - **T**: Underlying primitive type that was used for the calculation
///
/// ## Fields
/// - **k**: The amount of clusters that were requested when calculating this k-means result
/// - **iterations**: Amount of completed assignment/update passes
/// - **centroids**: Calculated cluster centers [row-major] = [<centroid0>,<centroid1>,<centroid2>,...]
/// - **centroid_frequency**: Amount of samples in each centroid (as of the last update)
/// - **assignments**: Vector mapping each sample to its respective nearest cluster
/// - **centroid_distances**: Vector containing each sample's distance to its centroid (as of the last assignment)
#[derive(Clone, Debug)]
pub struct KMeansState<T: Primitive> {
    pub k: usize,
    pub iterations: usize,
    pub centroids: Vec<T>,
    pub centroid_frequency: Vec<usize>,
    pub assignments: Vec<usize>,
    pub centroid_distances: Vec<T>,

    pub(crate) sample_dims: usize
}
impl<T: Primitive> KMeansState<T> {
    pub(crate) fn new(sample_cnt: usize, sample_dims: usize, k: usize) -> Self {
        Self {
            k,
            iterations: 0,
            centroids: vec![T::zero();sample_dims * k],
            centroid_frequency: vec![0usize;k],
            assignments: vec![0usize;sample_cnt],
            centroid_distances: vec![T::infinity();sample_cnt],
            sample_dims
        }
    }
    pub(crate) fn set_centroid_from_iter(&mut self, idx: usize, src: impl Iterator<Item = T>) {
        self.centroids.iter_mut().skip(self.sample_dims * idx).take(self.sample_dims)
                .zip(src)
                .for_each(|(c,s)| *c = s);
    }

    /// Amount of dimensions of each centroid.
    pub fn sample_dims(&self) -> usize { self.sample_dims }

    /// The centroid of cluster **idx**.
    pub fn centroid(&self, idx: usize) -> &[T] {
        &self.centroids[idx * self.sample_dims..(idx + 1) * self.sample_dims]
    }

    /// Iterate over all centroids, in cluster order.
    pub fn iter_centroids(&self) -> impl Iterator<Item = &[T]> {
        (0..self.k).map(move |idx| self.centroid(idx))
    }
}




/// Entrypoint of this crate's API-Surface.
///
/// Create an instance of this struct, giving the samples you want to operate on. The primitive type
/// of the passed samples array will be the type used internaly for all calculations, as well as the result
/// as stored in the returned [`KMeansState`] structure.
///
/// The full calculation is available as [`KMeans::kmeans_lloyd`]. Its individual steps
/// ([`KMeans::initialize`], [`KMeans::assign_clusters`], [`KMeans::update_centroids`] and
/// [`KMeans::has_converged`]) are public as well, for callers that want to drive the iteration themselves.
///
/// ## Supported initialization methods
/// - Random-Sample [`KMeans::init_random_sample`]
/// - Precomputed [`KMeans::init_precomputed`]
#[derive(Clone, Debug)]
pub struct KMeans<T: Primitive> {
    pub(crate) sample_cnt: usize,
    pub(crate) sample_dims: usize,
    pub(crate) samples: Vec<T>
}
impl<T: Primitive> KMeans<T> {
    /// Create a new instance of the [`KMeans`] structure.
    ///
    /// ## Arguments
    /// - **samples**: Vector of samples [row-major] = [<sample0>,<sample1>,<sample2>,...]
    /// - **sample_cnt**: Amount of samples, contained in the passed **samples** vector
    /// - **sample_dims**: Amount of dimensions each sample from the **sample** vector has
    ///
    /// ## Errors
    /// [`KMeansError::InvalidConfiguration`] if the length of **samples** is not `sample_cnt * sample_dims`,
    /// or if samples without any dimension are given.
    pub fn new(samples: Vec<T>, sample_cnt: usize, sample_dims: usize) -> Result<Self> {
        if samples.len() != sample_cnt * sample_dims {
            return Err(KMeansError::InvalidConfiguration(format!(
                "sample buffer holds {} values, expected {} samples * {} dimensions",
                samples.len(), sample_cnt, sample_dims)));
        }
        if sample_cnt > 0 && sample_dims == 0 {
            return Err(KMeansError::InvalidConfiguration("samples need at least one dimension".into()));
        }
        Ok(Self { sample_cnt, sample_dims, samples })
    }

    /// Amount of samples.
    pub fn sample_cnt(&self) -> usize { self.sample_cnt }

    /// Amount of dimensions of each sample.
    pub fn sample_dims(&self) -> usize { self.sample_dims }

    /// The sample at index **idx**.
    pub fn sample(&self, idx: usize) -> &[T] {
        &self.samples[idx * self.sample_dims..(idx + 1) * self.sample_dims]
    }


    /// Create a new [`KMeansState`] with **k** centroids, seeded by the given initialization method.
    ///
    /// ## Errors
    /// [`KMeansError::InvalidConfiguration`] if `k == 0` or if **k** exceeds the amount of samples. This is
    /// checked before the initialization method runs.
    pub fn initialize<'a, F>(&self, k: usize, init: F, config: &KMeansConfig<'a, T>) -> Result<KMeansState<T>>
                where for<'c> F: FnOnce(&KMeans<T>, &mut KMeansState<T>, &KMeansConfig<'c, T>) -> Result<()> {
        if k == 0 {
            return Err(KMeansError::InvalidConfiguration("number of clusters must be at least 1".into()));
        }
        if k > self.sample_cnt {
            return Err(KMeansError::InvalidConfiguration(format!(
                "number of clusters ({}) cannot exceed number of data points ({})", k, self.sample_cnt)));
        }
        let mut state = KMeansState::new(self.sample_cnt, self.sample_dims, k);
        init(self, &mut state, config)?;
        Ok(state)
    }

    /// Assign every sample to its nearest centroid, replacing `state.assignments` and
    /// `state.centroid_distances`.
    ///
    /// Distances are euclidean over all but the last dimension (see [`distances::feature_distance`]).
    /// When several centroids are equally near, the one with the lowest index wins.
    pub fn assign_clusters(&self, state: &mut KMeansState<T>) {
        let centroids = &state.centroids;
        let sample_dims = self.sample_dims;

        self.samples.par_chunks_exact(sample_dims)
            .zip(state.assignments.par_iter_mut())
            .zip(state.centroid_distances.par_iter_mut())
            .for_each(|((s, assignment), centroid_dist)| {
                let (best_idx, best_dist) = centroids.chunks_exact(sample_dims)
                    .map(|c| distances::feature_distance(s, c))
                    .enumerate()
                    .fold((0, T::max_value()), |(best_idx, best_dist), (idx, dist)| {
                        if dist < best_dist { (idx, dist) } else { (best_idx, best_dist) }
                    });
                *assignment = best_idx;
                *centroid_dist = best_dist;
            });
    }

    /// Count the amount of samples assigned to each centroid. Returns the amount of centroids with at least
    /// one sample.
    pub(crate) fn update_cluster_frequencies(&self, assignments: &[usize], centroid_frequency: &mut[usize]) -> usize {
        centroid_frequency.iter_mut().for_each(|v| *v = 0);
        let mut used_centroids_cnt = 0;
        assignments.iter().cloned()
            .for_each(|centroid_id| {
                if centroid_frequency[centroid_id] == 0 {
                    used_centroids_cnt += 1; // Count the amount of centroids with more than 0 samples
                }
                centroid_frequency[centroid_id] += 1;
            });
        used_centroids_cnt
    }

    /// Replace every centroid by the mean of the samples currently assigned to it. Centroids without any
    /// assigned sample are reseeded with a copy of a random sample, drawn from the configured random generator.
    pub fn update_centroids(&self, state: &mut KMeansState<T>, config: &KMeansConfig<'_, T>) {
        crate::variants::Lloyd::update_centroids(self, state, config);
    }

    /// Exact convergence test between two centroid sets: `true` only if every coordinate of every centroid
    /// has the identical bit pattern in **previous** and **current**. All NaNs count as one value.
    pub fn has_converged(previous: &[T], current: &[T]) -> bool {
        previous.len() == current.len()
            && previous.iter().zip(current.iter())
                .all(|(p, c)| (p.is_nan() && c.is_nan()) || p.integer_decode() == c.integer_decode())
    }



    /// Lloyd's k-Means algorithm, iterating until the centroids stop changing.
    ///
    /// ## Arguments
    /// - **k**: Amount of clusters to search for
    /// - **max_iter**: Upper bound on the amount of iterations; reaching it without convergence is an error
    /// - **init**: Initialization-Method to use for the initialization of the **k** centroids
    /// - **config**: [`KMeansConfig`] instance, containing several configuration options for the calculation.
    ///
    /// ## Returns
    /// Instance of [`KMeansState`], containing the final (converged) state.
    ///
    /// ## Errors
    /// - [`KMeansError::InvalidConfiguration`] for `k == 0`, `k > sample_cnt` or `max_iter == 0`
    /// - [`KMeansError::MaxIterationsExceeded`] if the centroids still changed in iteration **max_iter**;
    ///   the error holds the centroids and assignments of that last iteration
    ///
    /// ## Example
    /// ```rust
    /// use lloydkm::*;
    /// use rand::prelude::*;
    ///
    /// let samples = vec![1.0f64, 1.0, 0.0, 1.5, 2.0, 0.0, 8.0, 8.0, 1.0, 9.0, 8.5, 1.0];
    /// let kmean = KMeans::new(samples, 4, 3).unwrap();
    /// let conf = KMeansConfig::build().random_generator(StdRng::seed_from_u64(7)).build();
    /// let result = kmean.kmeans_lloyd(2, 100, KMeans::init_random_sample, &conf).unwrap();
    ///
    /// println!("Centroids: {:?}", result.centroids);
    /// println!("Cluster-Assignments: {:?}", result.assignments);
    /// println!("Iterations: {}", result.iterations);
    /// ```
    pub fn kmeans_lloyd<'a, F>(&self, k: usize, max_iter: usize, init: F, config: &KMeansConfig<'a, T>) -> Result<KMeansState<T>>
                where for<'c> F: FnOnce(&KMeans<T>, &mut KMeansState<T>, &KMeansConfig<'c, T>) -> Result<()> {
        crate::variants::Lloyd::calculate(self, k, max_iter, init, config)
    }

    /// Random sample initialization method (a.k.a. Forgy)
    ///
    /// ## Description
    /// This initialization method randomly selects k distinct samples as initial centroids. Indices are drawn
    /// uniformly and rejected if they were drawn before.
    ///
    /// ## Note
    /// This method is not meant for direct invocation. Pass a reference to it, to an instance-method of [`KMeans`].
    pub fn init_random_sample<'a>(kmean: &KMeans<T>, state: &mut KMeansState<T>, config: &KMeansConfig<'a, T>) -> Result<()> {
        crate::inits::randomsample::calculate(kmean, state, config)
    }

    /// Precomputed initialization method
    ///
    /// ## Description
    /// Uses the given centroids [row-major] as initial centroids. Fails with
    /// [`KMeansError::InvalidConfiguration`] if they do not hold exactly `k * sample_dims` values.
    pub fn init_precomputed(centroids: Vec<T>) -> impl FnOnce(&KMeans<T>, &mut KMeansState<T>, &KMeansConfig<'_, T>) -> Result<()> {
        move |kmean: &KMeans<T>, state: &mut KMeansState<T>, config: &KMeansConfig<'_, T>| {
            crate::inits::precomputed::calculate(kmean, state, config, centroids)
        }
    }
}
