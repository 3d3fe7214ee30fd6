//! Randomized load driver for [`ConcurrentSet`](crate::ConcurrentSet)
//! backends.
//!
//! A run spawns worker threads that hammer one shared set with a random mix
//! of `add`, `remove` and `contains` over a small pool of items, then drains
//! the set and checks nothing was lost. A deadline on the workers doubles
//! as a deadlock probe.

mod config;
mod driver;
mod error;

pub use config::{
    DEADLINE_MS_VAR, MUTATION_PERCENT_VAR, OPERATIONS_VAR, POOL_SIZE_VAR, SEED_VAR,
    SimulationConfig, THREADS_VAR,
};
pub use driver::{OperationCounts, SimulationReport, ThreadReport, run_simulation};
pub use error::SimulationError;
