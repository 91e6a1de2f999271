//! Environment variable configuration
//!
//! Provides environment variable overrides for the recognized options:
//! `TESTPOOL_MP` toggles the worker pool, `TESTPOOL_WORKERS` sets the
//! pool size (`"auto"` or a non-negative integer).

use std::env;

use super::{MpConfig, WorkerCount};
use crate::error::Result;

/// Environment variable prefix
const ENV_PREFIX: &str = "TESTPOOL";

/// Overrides sourced from environment variables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// Pool toggle from TESTPOOL_MP
    pub use_concurrency: Option<bool>,
    /// Pool size from TESTPOOL_WORKERS
    pub worker_count: Option<WorkerCount>,
}

impl EnvOverrides {
    /// Read overrides from the environment. A malformed worker count is a
    /// configuration error.
    pub fn load() -> Result<Self> {
        Ok(Self {
            use_concurrency: get_env_bool("MP"),
            worker_count: match get_env("WORKERS") {
                Some(raw) => Some(WorkerCount::parse(&raw)?),
                None => None,
            },
        })
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.use_concurrency.is_some() || self.worker_count.is_some()
    }

    /// Apply the overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut MpConfig) {
        if let Some(use_concurrency) = self.use_concurrency {
            config.use_concurrency = use_concurrency;
        }
        if let Some(worker_count) = self.worker_count {
            config.worker_count = worker_count;
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}"))
        .ok()
        .filter(|v| !v.is_empty())
}

fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
