//! # lloydkm - API documentation
//!
//! lloydkm is a small rust library for k-means clustering with Lloyd's algorithm, iterating until
//! the centroids reach an exact fixed point.
//!
//! ## Design target
//! The calculation is meant to be reproducible: given a seeded random generator, the same input always
//! yields the same centroids, bit for bit. Convergence is therefore tested by exact equality of two consecutive
//! centroid sets (no epsilon), and an iteration cap guards against inputs that never settle.
//! Samples are given using a raw row-major vector, instead of any high-level matrix crate.
//!
//! ## Distances
//! The last column of every sample is treated as a label: it is carried through the centroid means, but is
//! excluded from the euclidean distance used to assign samples to clusters.
//!
//! ## Supported primitive types
//! - [`f32`]
//! - [`f64`]
//!
//! ## Example
//! ```rust
//! use lloydkm::*;
//! use rand::prelude::*;
//!
//! fn main() {
//!     let (sample_cnt, sample_dims, k, max_iter) = (2000, 8, 4, 1000);
//!
//!     // Generate some random data
//!     let mut samples = vec![0.0f64;sample_cnt * sample_dims];
//!     samples.iter_mut().for_each(|v| *v = rand::random());
//!
//!     // Seeded generator -> reproducible result
//!     let conf = KMeansConfig::build()
//!         .random_generator(StdRng::seed_from_u64(42))
//!         .iteration_done(&|s, nr| println!("Iteration {} - {} samples in cluster 0", nr, s.centroid_frequency[0]))
//!         .build();
//!
//!     let kmean = KMeans::new(samples, sample_cnt, sample_dims).unwrap();
//!     match kmean.kmeans_lloyd(k, max_iter, KMeans::init_random_sample, &conf) {
//!         Ok(result) => {
//!             println!("Centroids: {:?}", result.centroids);
//!             println!("Cluster-Assignments: {:?}", result.assignments);
//!             println!("Iterations: {}", result.iterations);
//!         },
//!         Err(err) => eprintln!("k-means failed: {}", err),
//!     }
//! }
//! ```
//!
//! ## Short API-Overview / Description
//! Entry-point of the library is the [`KMeans`] struct. It takes over the sample data into its ownership and is
//! never mutated afterwards. All state of a calculation (centroids, assignments, iteration count) lives in a
//! [`KMeansState`], which is returned as result.
//!
//! [`KMeans::kmeans_lloyd`] runs the full algorithm. The steps it is built from are public too:
//! [`KMeans::initialize`], [`KMeans::assign_clusters`], [`KMeans::update_centroids`] and [`KMeans::has_converged`].
//!
//! Samples can be read from delimited text files with the [`DataLoader`], and results formatted with [`Report`].

#[macro_use] mod helpers;
mod memory;
mod error;
mod api;
mod variants;
mod inits;
pub mod distances;
pub mod loader;
pub mod report;

pub use api::{KMeansState, KMeansConfig, KMeansConfigBuilder, KMeans};
pub use error::{KMeansError, RecordError, Result};
pub use loader::{DataLoader, LoadedSamples, SkippedRecord};
pub use memory::Primitive;
pub use report::Report;
