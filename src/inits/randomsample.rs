use crate::{KMeans, KMeansState, KMeansConfig, Result, memory::*};
use rand::prelude::*;
use std::collections::HashSet;

#[inline(always)] pub fn calculate<'a, T: Primitive>(kmean: &KMeans<T>, state: &mut KMeansState<T>, config: &KMeansConfig<'a, T>) -> Result<()> {
	debug_assert!(state.k <= kmean.sample_cnt);
	let mut rnd = config.rnd.borrow_mut();
	let mut chosen = HashSet::with_capacity(state.k);
	for ci in 0..state.k {
		// Rejection sampling: redraw until an index comes up that was not used yet
		let sample_id = loop {
			let candidate = rnd.gen_range(0..kmean.sample_cnt);
			if chosen.insert(candidate) {
				break candidate;
			}
		};
		state.set_centroid_from_iter(ci, kmean.sample(sample_id).iter().cloned());
	}
	Ok(())
}
