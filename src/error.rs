use thiserror::Error;

/// Errors that abort a load or a clustering run.
#[derive(Debug, Error)]
pub enum KMeansError {
    /// The requested run cannot be satisfied with the given samples / parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The centroids kept moving for `max_iter` iterations. Carries where the run stopped: the centroids
    /// [row-major, widened to f64] and sample assignments after the last iteration.
    #[error("no convergence after {max_iter} iterations")]
    MaxIterationsExceeded { max_iter: usize, centroids: Vec<f64>, assignments: Vec<usize> },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, KMeansError>;

/// Reason a single input record was rejected. These never abort a load; the
/// loader counts and reports them instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("field {field} is not a number: {value:?}")]
    InvalidNumber { field: usize, value: String },
    #[error("expected {expected} fields, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("unreadable record: {0}")]
    Unreadable(String),
    #[error("empty record")]
    Empty,
}
