use crate::{KMeansState, memory::*};
use std::{fmt, time::Duration};

/// Human readable summary of a finished run.
///
/// ```text
/// Centroid 1: [1.5, 2, 0]
/// Centroid 2: [10, 10, 1]
/// Iterations: 3
/// Loaded 120 data points, skipped 2 lines
/// Execution time: 14 milliseconds
/// ```
#[derive(Clone, Debug)]
pub struct Report<'s, T: Primitive> {
    state: &'s KMeansState<T>,
    loaded: Option<usize>,
    skipped: usize,
    elapsed: Option<Duration>,
}
impl<'s, T: Primitive> Report<'s, T> {
    pub fn new(state: &'s KMeansState<T>) -> Self {
        Self { state, loaded: None, skipped: 0, elapsed: None }
    }
    /// Amount of samples the run was calculated on.
    pub fn loaded(mut self, loaded: usize) -> Self {
        self.loaded = Some(loaded); self
    }
    /// Amount of input lines that were skipped while loading.
    pub fn skipped(mut self, skipped: usize) -> Self {
        self.skipped = skipped; self
    }
    /// Wall-clock time of the whole run.
    pub fn elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed); self
    }
}
impl<'s, T: Primitive> fmt::Display for Report<'s, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, centroid) in self.state.iter_centroids().enumerate() {
            write!(f, "Centroid {}: [", idx + 1)?;
            for (d, v) in centroid.iter().enumerate() {
                if d > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", v)?;
            }
            writeln!(f, "]")?;
        }
        writeln!(f, "Iterations: {}", self.state.iterations)?;
        if let Some(loaded) = self.loaded {
            writeln!(f, "Loaded {} data points, skipped {} lines", loaded, self.skipped)?;
        }
        if let Some(elapsed) = self.elapsed {
            writeln!(f, "Execution time: {} milliseconds", elapsed.as_millis())?;
        }
        Ok(())
    }
}
