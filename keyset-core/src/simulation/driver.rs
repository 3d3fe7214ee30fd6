use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{SimulationConfig, SimulationError};
use crate::data_structures::ConcurrentSet;
use crate::preemptive_synchronization::{CountdownEvent, SignalOnDrop};

/// Attempts and successes of one kind of operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OperationCounts {
    pub attempted: usize,
    pub succeeded: usize,
}

impl OperationCounts {
    fn record(&mut self, succeeded: bool) {
        self.attempted += 1;
        if succeeded {
            self.succeeded += 1;
        }
    }
}

/// What one worker did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThreadReport {
    pub thread: usize,
    pub adds: OperationCounts,
    pub removes: OperationCounts,
    pub contains: OperationCounts,
}

#[derive(Clone, Debug)]
pub struct SimulationReport {
    /// Type name of the set under test.
    pub backend: &'static str,
    pub threads: Vec<ThreadReport>,
    /// Items removed while draining the set after all workers joined.
    pub drained: usize,
    /// Time the workers took, excluding the drain.
    pub elapsed: Duration,
}

impl SimulationReport {
    pub fn successful_adds(&self) -> usize {
        self.threads.iter().map(|t| t.adds.succeeded).sum()
    }

    pub fn successful_removes(&self) -> usize {
        self.threads.iter().map(|t| t.removes.succeeded).sum()
    }

    /// Items that should be left in the set after the workers are done.
    pub fn expected_remaining(&self) -> i64 {
        self.successful_adds() as i64 - self.successful_removes() as i64
    }
}

/// Run one randomized load simulation against `set`.
///
/// The set should start empty; it is empty again when this returns `Ok`.
///
/// # Errors
///
/// - [`SimulationError::InvalidConfig`] if `config` fails validation
/// - [`SimulationError::Deadline`] if the workers are still running at
///   `config.deadline`; they are left detached
/// - [`SimulationError::WorkerPanicked`] if a set operation panicked, for
///   example on a poisoned lock
/// - [`SimulationError::Discrepancy`] if draining finds a different number of
///   items than the workers' successful adds minus removes
///
pub fn run_simulation<S>(
    set: Arc<S>,
    config: &SimulationConfig,
) -> Result<SimulationReport, SimulationError>
where
    S: ConcurrentSet<u64> + Send + Sync + 'static,
{
    config.validate()?;

    let backend = std::any::type_name::<S>();
    let done = Arc::new(CountdownEvent::new(config.threads));
    let start = Instant::now();

    let mut handles = Vec::with_capacity(config.threads);
    for id in 0..config.threads {
        let set = Arc::clone(&set);
        let done = Arc::clone(&done);
        let config = config.clone();

        let handle = thread::Builder::new()
            .name(format!("keyset-sim-{id}"))
            .spawn(move || {
                let _signal = SignalOnDrop(&done);
                run_worker(id, set.as_ref(), &config)
            })?;
        handles.push(handle);
    }

    if !done.wait_timeout(config.deadline) {
        log::warn!(
            "{backend}: workers still running after {:?}, possible deadlock",
            config.deadline
        );
        return Err(SimulationError::Deadline(config.deadline));
    }

    let mut threads = Vec::with_capacity(config.threads);
    for (id, handle) in handles.into_iter().enumerate() {
        let report = handle
            .join()
            .map_err(|_| SimulationError::WorkerPanicked(id))?;
        threads.push(report);
    }
    let elapsed = start.elapsed();

    for report in &threads {
        log::info!(
            "thread {}: {} insertions, {} successful; {} retrievals, {} successful; {} searches, {} found",
            report.thread,
            report.adds.attempted,
            report.adds.succeeded,
            report.removes.attempted,
            report.removes.succeeded,
            report.contains.attempted,
            report.contains.succeeded,
        );
    }

    let drained = (0..config.pool_size as u64)
        .filter(|item| set.remove(item))
        .count();

    let report = SimulationReport {
        backend,
        threads,
        drained,
        elapsed,
    };

    log::info!(
        "{backend}: {} threads x {} operations in {:?}, drained {} items",
        config.threads,
        config.operations_per_thread,
        elapsed,
        drained
    );

    let expected = report.expected_remaining();
    if drained as i64 != expected {
        log::warn!("{backend}: expected {expected} remaining items, drained {drained}");
        return Err(SimulationError::Discrepancy { expected, drained });
    }

    Ok(report)
}

fn run_worker<S>(id: usize, set: &S, config: &SimulationConfig) -> ThreadReport
where
    S: ConcurrentSet<u64>,
{
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(id as u64));
    let mut report = ThreadReport {
        thread: id,
        ..ThreadReport::default()
    };

    for _ in 0..config.operations_per_thread {
        let item = rng.gen_range(0..config.pool_size as u64);

        if rng.gen_range(0..100) < config.mutation_percent {
            if rng.gen_bool(0.5) {
                report.adds.record(set.add(item));
            } else {
                report.removes.record(set.remove(&item));
            }
        } else {
            report.contains.record(set.contains(&item));
        }
    }

    report
}
