use std::time::Duration;

use thiserror::Error;

/// Failures of a load simulation run.
///
/// Set operations themselves never fail; these describe the driver around
/// them.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// Workers were still running when the deadline expired. Either the
    /// backend deadlocked or the run was sized too large for the deadline.
    #[error("workers did not finish within {0:?}")]
    Deadline(Duration),

    #[error("worker thread {0} panicked")]
    WorkerPanicked(usize),

    /// The drained item count disagrees with the workers' successful adds
    /// minus successful removes.
    #[error("expected {expected} remaining items but drained {drained}")]
    Discrepancy { expected: i64, drained: usize },
}
