use std::str::FromStr;
use std::time::Duration;

use super::SimulationError;

pub const THREADS_VAR: &str = "KEYSET_SIM_THREADS";
pub const OPERATIONS_VAR: &str = "KEYSET_SIM_OPERATIONS";
pub const MUTATION_PERCENT_VAR: &str = "KEYSET_SIM_MUTATION_PERCENT";
pub const POOL_SIZE_VAR: &str = "KEYSET_SIM_POOL_SIZE";
pub const SEED_VAR: &str = "KEYSET_SIM_SEED";
pub const DEADLINE_MS_VAR: &str = "KEYSET_SIM_DEADLINE_MS";

/// Shape of one randomized load run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Number of worker threads.
    pub threads: usize,
    /// Operations each worker performs.
    pub operations_per_thread: usize,
    /// Share of operations, in percent, that are `add` or `remove`. The rest
    /// are `contains`.
    pub mutation_percent: u32,
    /// Number of distinct items the workers draw from.
    pub pool_size: usize,
    /// Base seed; worker `i` uses `seed + i`.
    pub seed: u64,
    /// Upper bound on the workers' running time.
    pub deadline: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            threads: 4,
            operations_per_thread: 10_000,
            mutation_percent: 50,
            pool_size: 64,
            seed: 42,
            deadline: Duration::from_secs(30),
        }
    }
}

impl SimulationConfig {
    /// Defaults overridden by any `KEYSET_SIM_*` environment variables.
    pub fn from_env() -> Result<Self, SimulationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    /// name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SimulationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(threads) = parse_var(&lookup, THREADS_VAR)? {
            config.threads = threads;
        }
        if let Some(operations) = parse_var(&lookup, OPERATIONS_VAR)? {
            config.operations_per_thread = operations;
        }
        if let Some(percent) = parse_var(&lookup, MUTATION_PERCENT_VAR)? {
            config.mutation_percent = percent;
        }
        if let Some(pool_size) = parse_var(&lookup, POOL_SIZE_VAR)? {
            config.pool_size = pool_size;
        }
        if let Some(seed) = parse_var(&lookup, SEED_VAR)? {
            config.seed = seed;
        }
        if let Some(millis) = parse_var(&lookup, DEADLINE_MS_VAR)? {
            config.deadline = Duration::from_millis(millis);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.threads == 0 {
            return Err(SimulationError::InvalidConfig(
                "threads must be at least 1".to_string(),
            ));
        }
        if self.pool_size == 0 {
            return Err(SimulationError::InvalidConfig(
                "pool_size must be at least 1".to_string(),
            ));
        }
        if self.mutation_percent > 100 {
            return Err(SimulationError::InvalidConfig(format!(
                "mutation_percent must be at most 100, got {}",
                self.mutation_percent
            )));
        }
        Ok(())
    }
}

fn parse_var<F, V>(lookup: &F, name: &str) -> Result<Option<V>, SimulationError>
where
    F: Fn(&str) -> Option<String>,
    V: FromStr,
    V::Err: std::fmt::Display,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };

    raw.trim()
        .parse()
        .map(Some)
        .map_err(|err| SimulationError::InvalidConfig(format!("{name}={raw:?}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_no_overrides_gives_defaults() {
        let config = SimulationConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = SimulationConfig::from_lookup(lookup_from(&[
            (THREADS_VAR, "8"),
            (OPERATIONS_VAR, " 500 "),
            (MUTATION_PERCENT_VAR, "100"),
            (POOL_SIZE_VAR, "16"),
            (SEED_VAR, "7"),
            (DEADLINE_MS_VAR, "1500"),
        ]))
        .unwrap();

        assert_eq!(config.threads, 8);
        assert_eq!(config.operations_per_thread, 500);
        assert_eq!(config.mutation_percent, 100);
        assert_eq!(config.pool_size, 16);
        assert_eq!(config.seed, 7);
        assert_eq!(config.deadline, Duration::from_millis(1500));
    }

    #[test]
    fn test_unparsable_value_names_the_variable() {
        let err = SimulationConfig::from_lookup(lookup_from(&[(THREADS_VAR, "many")]))
            .unwrap_err();
        assert!(matches!(&err, SimulationError::InvalidConfig(msg) if msg.contains(THREADS_VAR)));
    }

    #[test]
    fn test_validate_rejects_degenerate_configs() {
        let base = SimulationConfig::default();

        let zero_threads = SimulationConfig { threads: 0, ..base.clone() };
        assert!(zero_threads.validate().is_err());

        let empty_pool = SimulationConfig { pool_size: 0, ..base.clone() };
        assert!(empty_pool.validate().is_err());

        let over_100 = SimulationConfig { mutation_percent: 101, ..base.clone() };
        assert!(over_100.validate().is_err());

        let read_only = SimulationConfig { mutation_percent: 0, ..base };
        assert!(read_only.validate().is_ok());
    }
}
