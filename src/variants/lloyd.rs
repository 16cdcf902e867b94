use crate::{KMeans, KMeansState, KMeansConfig, KMeansError, Result, memory::*};
use rand::prelude::*;

pub(crate) struct Lloyd<T: Primitive> {
	_p: std::marker::PhantomData<T>
}
impl<T: Primitive> Lloyd<T> {
    pub(crate) fn update_centroids(data: &KMeans<T>, state: &mut KMeansState<T>, config: &KMeansConfig<'_, T>) {
        let sample_dims = data.sample_dims;
        // Sum all samples in a cluster together into new_centroids
        // Count non-empty clusters
        let mut used_centroids_cnt = 0;
        let mut new_centroids = vec![T::zero(); state.centroids.len()];

        let (centroid_frequency, assignments) = (&mut state.centroid_frequency, &state.assignments);
        rayon::scope(|s| {
            s.spawn(|_| {
                used_centroids_cnt = data.update_cluster_frequencies(assignments, centroid_frequency);
            });
            s.spawn(|_| {
                // Accumulated in ascending sample order, so every run sums in the same order
                data.samples.chunks_exact(sample_dims)
                    .zip(assignments.iter().cloned())
                    .for_each(|(s, centroid_id)| {
                        new_centroids[centroid_id * sample_dims..(centroid_id + 1) * sample_dims].iter_mut()
                            .zip(s.iter())
                            .for_each(|(c, s)| *c += s);
                    });
            });
        });

        // Use used_centroids_cnt variable to check, whether there are empty clusters
        // When there are, reseed them with a randomly drawn sample
        if used_centroids_cnt != state.k {
            let mut rnd = config.rnd.borrow_mut();
            for i in 0..state.k {
                if state.centroid_frequency[i] == 0 {
                    let sample_id = rnd.gen_range(0..data.sample_cnt);
                    tracing::warn!(cluster = i, sample = sample_id, "cluster is empty, reseeding with a random sample");
                    new_centroids[i * sample_dims..(i + 1) * sample_dims].copy_from_slice(data.sample(sample_id));
                }
            }
        }
        // Divide sums by the amount of samples (reseeded centroids are already final)
        new_centroids.chunks_exact_mut(sample_dims)
            .zip(state.centroid_frequency.iter().cloned())
            .filter(|(_, cfreq)| *cfreq > 0)
            .for_each(|(c, cfreq)| {
                let cfreq = T::from(cfreq).unwrap();
                c.iter_mut().for_each(|v| *v = *v / cfreq);
            });
        state.centroids = new_centroids;
    }

    #[inline(always)] pub fn calculate<'a, F>(data: &KMeans<T>, k: usize, max_iter: usize, init: F, config: &KMeansConfig<'a, T>) -> Result<KMeansState<T>>
                where for<'c> F: FnOnce(&KMeans<T>, &mut KMeansState<T>, &KMeansConfig<'c, T>) -> Result<()> {
        if max_iter == 0 {
            return Err(KMeansError::InvalidConfiguration("max_iter must be at least 1".into()));
        }

        // Initialize clusters and notify subscriber
        let mut state = data.initialize(k, init, config)?;
        (config.init_done)(&state);
        tracing::debug!(k, sample_cnt = data.sample_cnt, sample_dims = data.sample_dims, "centroids initialized");

        for i in 1..=max_iter {
            let previous_centroids = state.centroids.clone();
            data.assign_clusters(&mut state);
            Self::update_centroids(data, &mut state, config);
            state.iterations = i;

            // Notify subscriber about finished iteration
            (config.iteration_done)(&state, i);
            if KMeans::has_converged(&previous_centroids, &state.centroids) {
                tracing::info!(iterations = i, k, "centroids converged");
                return Ok(state);
            }
            tracing::debug!(iteration = i, "centroids moved");
        }

        tracing::warn!(max_iter, "centroids did not converge");
        Err(KMeansError::MaxIterationsExceeded {
            max_iter,
            centroids: state.centroids.iter().map(|v| num::ToPrimitive::to_f64(v).unwrap_or(f64::NAN)).collect(),
            assignments: state.assignments,
        })
    }
}




#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::testing::assert_consistent_result;
    use std::cell::Cell;

    fn seeded_config<'a, T: Primitive>(seed: u64) -> KMeansConfig<'a, T> {
        KMeansConfig::build().random_generator(StdRng::seed_from_u64(seed)).build()
    }

    fn iris<T: Primitive>() -> KMeans<T> {
        let samples: Vec<T> = vec![1.4f64, 0.2, 1.4, 0.2, 1.3, 0.2, 1.5, 0.2, 1.4, 0.2, 1.7, 0.4, 1.4, 0.3, 1.5, 0.2, 1.4, 0.2, 1.5, 0.1, 1.5, 0.2, 1.6, 0.2, 1.4, 0.1, 1.1, 0.1, 1.2, 0.2, 1.5, 0.4, 1.3, 0.4, 1.4, 0.3, 1.7, 0.3, 1.5, 0.3, 1.7, 0.2, 1.5, 0.4, 1.0, 0.2, 1.7, 0.5, 1.9, 0.2, 1.6, 0.2, 1.6, 0.4, 1.5, 0.2, 1.4, 0.2, 1.6, 0.2, 1.6, 0.2, 1.5, 0.4, 1.5, 0.1, 1.4, 0.2, 1.5, 0.2, 1.2, 0.2, 1.3, 0.2, 1.4, 0.1, 1.3, 0.2, 1.5, 0.2, 1.3, 0.3, 1.3, 0.3, 1.3, 0.2, 1.6, 0.6, 1.9, 0.4, 1.4, 0.3, 1.6, 0.2, 1.4, 0.2, 1.5, 0.2, 1.4, 0.2, 4.7, 1.4, 4.5, 1.5, 4.9, 1.5, 4.0, 1.3, 4.6, 1.5, 4.5, 1.3, 4.7, 1.6, 3.3, 1.0, 4.6, 1.3, 3.9, 1.4, 3.5, 1.0, 4.2, 1.5, 4.0, 1.0, 4.7, 1.4, 3.6, 1.3, 4.4, 1.4, 4.5, 1.5, 4.1, 1.0, 4.5, 1.5, 3.9, 1.1, 4.8, 1.8, 4.0, 1.3, 4.9, 1.5, 4.7, 1.2, 4.3, 1.3, 4.4, 1.4, 4.8, 1.4, 5.0, 1.7, 4.5, 1.5, 3.5, 1.0, 3.8, 1.1, 3.7, 1.0, 3.9, 1.2, 5.1, 1.6, 4.5, 1.5, 4.5, 1.6, 4.7, 1.5, 4.4, 1.3, 4.1, 1.3, 4.0, 1.3, 4.4, 1.2, 4.6, 1.4, 4.0, 1.2, 3.3, 1.0, 4.2, 1.3, 4.2, 1.2, 4.2, 1.3, 4.3, 1.3, 3.0, 1.1, 4.1, 1.3, 6.0, 2.5, 5.1, 1.9, 5.9, 2.1, 5.6, 1.8, 5.8, 2.2, 6.6, 2.1, 4.5, 1.7, 6.3, 1.8, 5.8, 1.8, 6.1, 2.5, 5.1, 2.0, 5.3, 1.9, 5.5, 2.1, 5.0, 2.0, 5.1, 2.4, 5.3, 2.3, 5.5, 1.8, 6.7, 2.2, 6.9, 2.3, 5.0, 1.5, 5.7, 2.3, 4.9, 2.0, 6.7, 2.0, 4.9, 1.8, 5.7, 2.1, 6.0, 1.8, 4.8, 1.8, 4.9, 1.8, 5.6, 2.1, 5.8, 1.6, 6.1, 1.9, 6.4, 2.0, 5.6, 2.2, 5.1, 1.5, 5.6, 1.4, 6.1, 2.3, 5.6, 2.4, 5.5, 1.8, 4.8, 1.8, 5.4, 2.1, 5.6, 2.4, 5.1, 2.3, 5.1, 1.9, 5.9, 2.3, 5.7, 2.5, 5.2, 2.3, 5.0, 1.9, 5.2, 2.0, 5.4, 2.3, 5.1, 1.8].into_iter().map(|v: f64| T::from(v).unwrap()).collect();
        KMeans::new(samples, 150, 2).unwrap()
    }

    #[test]
    fn iris_dataset_f64() {
        let kmean = iris::<f64>();
        let res = kmean.kmeans_lloyd(3, 100, KMeans::init_random_sample, &seeded_config(1)).unwrap();

        assert_eq!(res.k, 3);
        assert!(res.iterations >= 1);
        assert_eq!(res.centroid_frequency.iter().sum::<usize>(), 150);
        assert_consistent_result(&kmean, &res, 1e-12);
    }

    #[test]
    fn iris_dataset_f32() {
        let kmean = iris::<f32>();
        let res = kmean.kmeans_lloyd(3, 100, KMeans::init_random_sample, &seeded_config(1)).unwrap();

        assert_eq!(res.centroid_frequency.iter().sum::<usize>(), 150);
        assert_consistent_result(&kmean, &res, 1e-5);
    }

    #[test]
    fn same_seed_gives_same_result() {
        let kmean = iris::<f64>();
        let a = kmean.kmeans_lloyd(4, 100, KMeans::init_random_sample, &seeded_config(1337)).unwrap();
        let b = kmean.kmeans_lloyd(4, 100, KMeans::init_random_sample, &seeded_config(1337)).unwrap();
        assert_eq!(a.centroids, b.centroids);
        assert_eq!(a.assignments, b.assignments);
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn single_cluster_converges_to_global_mean() {
        let kmean = KMeans::new(vec![1.0f64, 0.5, 2.0, 1.5, 4.0, 4.0], 3, 2).unwrap();
        let res = kmean.kmeans_lloyd(1, 100, KMeans::init_random_sample, &seeded_config(3)).unwrap();

        // first update moves the seed onto the mean, the second one reproduces it
        assert_eq!(res.iterations, 2);
        assert_eq!(res.centroids, vec![(1.0 + 2.0 + 4.0) / 3.0, (0.5 + 1.5 + 4.0) / 3.0]);
        assert_eq!(res.assignments, vec![0, 0, 0]);
        assert_eq!(res.centroid_frequency, vec![3]);
    }

    #[test]
    fn every_sample_its_own_cluster() {
        let samples = vec![0.0f64, 0.0, 1.0, 5.0, 5.0, 2.0, 10.0, 0.0, 3.0];
        let kmean = KMeans::new(samples, 3, 3).unwrap();
        for seed in 0..16 {
            let res = kmean.kmeans_lloyd(3, 100, KMeans::init_random_sample, &seeded_config(seed)).unwrap();
            assert_eq!(res.iterations, 1);
            assert_eq!(res.centroid_frequency, vec![1, 1, 1]);
            for sid in 0..3 {
                assert_eq!(res.centroid(res.assignments[sid]), kmean.sample(sid));
                assert_eq!(res.centroid_distances[sid], 0.0);
            }
        }
    }

    #[test]
    fn too_many_clusters_fail_before_assignment() {
        let kmean = KMeans::new(vec![1.0f64, 2.0, 3.0, 4.0], 2, 2).unwrap();
        let (init_calls, iteration_calls) = (Cell::new(0), Cell::new(0));
        let on_init = |_: &KMeansState<f64>| init_calls.set(init_calls.get() + 1);
        let on_iteration = |_: &KMeansState<f64>, _: usize| iteration_calls.set(iteration_calls.get() + 1);
        let conf = KMeansConfig::build()
            .init_done(&on_init)
            .iteration_done(&on_iteration)
            .build();

        let res = kmean.kmeans_lloyd(3, 100, KMeans::init_random_sample, &conf);
        assert!(matches!(res, Err(KMeansError::InvalidConfiguration(_))));
        assert_eq!(init_calls.get(), 0);
        assert_eq!(iteration_calls.get(), 0);
    }

    #[test]
    fn callbacks_follow_iterations() {
        let kmean = iris::<f64>();
        let (init_calls, last_iteration) = (Cell::new(0), Cell::new(0));
        let on_init = |s: &KMeansState<f64>| {
            assert_eq!(s.iterations, 0);
            init_calls.set(init_calls.get() + 1);
        };
        let on_iteration = |s: &KMeansState<f64>, nr: usize| {
            assert_eq!(s.iterations, nr);
            assert_eq!(last_iteration.get() + 1, nr);
            last_iteration.set(nr);
        };
        let conf = KMeansConfig::build()
            .random_generator(StdRng::seed_from_u64(5))
            .init_done(&on_init)
            .iteration_done(&on_iteration)
            .build();

        let res = kmean.kmeans_lloyd(3, 100, KMeans::init_random_sample, &conf).unwrap();
        assert_eq!(init_calls.get(), 1);
        assert_eq!(last_iteration.get(), res.iterations);
    }

    #[test]
    fn iteration_cap_is_reported() {
        // needs two iterations: the first one moves both centroids
        let samples = vec![0.0f64, 0.0, 1.0, 0.0, 2.0, 0.0, 20.0, 0.0, 21.0, 0.0, 22.0, 0.0];
        let kmean = KMeans::new(samples, 6, 2).unwrap();
        let conf = seeded_config(1);

        let res = kmean.kmeans_lloyd(2, 1, KMeans::init_precomputed(vec![0.0, 0.0, 22.0, 0.0]), &conf);
        match res {
            Err(KMeansError::MaxIterationsExceeded { max_iter, centroids, assignments }) => {
                assert_eq!(max_iter, 1);
                assert_eq!(centroids, vec![1.0, 0.0, 21.0, 0.0]);
                assert_eq!(assignments, vec![0, 0, 0, 1, 1, 1]);
            },
            other => panic!("expected iteration cap, got {:?}", other.map(|s| s.centroids)),
        }

        let res = kmean.kmeans_lloyd(2, 2, KMeans::init_precomputed(vec![0.0, 0.0, 22.0, 0.0]), &conf).unwrap();
        assert_eq!(res.iterations, 2);

        let res = kmean.kmeans_lloyd(2, 0, KMeans::init_random_sample, &conf);
        assert!(matches!(res, Err(KMeansError::InvalidConfiguration(_))));
    }

    #[test]
    fn centroids_are_means_of_their_samples() {
        let samples = vec![1.0f64, 10.0, 2.0, 20.0, 3.0, 30.0, 100.0, 1.0, 104.0, 3.0];
        let kmean = KMeans::new(samples, 5, 2).unwrap();
        let conf = seeded_config(9);
        let mut state = kmean.initialize(2, KMeans::init_precomputed(vec![0.0, 0.0, 90.0, 0.0]), &conf).unwrap();

        kmean.assign_clusters(&mut state);
        assert_eq!(state.assignments, vec![0, 0, 0, 1, 1]);
        kmean.update_centroids(&mut state, &conf);

        assert_eq!(state.centroids, vec![2.0, 20.0, 102.0, 2.0]);
        assert_eq!(state.centroid_frequency, vec![3, 2]);
    }

    #[test]
    fn empty_cluster_handling() {
        let samples = vec![1.0, 0.0, 2.0, 0.0, 3.0, 0.0];
        let kmean = KMeans::new(samples, 3, 2).unwrap();
        let conf = seeded_config(1);
        let mut state = kmean.initialize(2, KMeans::init_precomputed(vec![2.0, 0.0, 1337.0, 0.0]), &conf).unwrap();

        kmean.assign_clusters(&mut state);
        assert_eq!(state.assignments, vec![0, 0, 0]);
        kmean.update_centroids(&mut state, &conf);

        assert_eq!(state.centroid_frequency, vec![3, 0]);
        assert_eq!(state.centroid(0), &[2.0, 0.0]);
        assert!((0..3).any(|sid| kmean.sample(sid) == state.centroid(1)));
    }
}
