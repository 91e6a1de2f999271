//! Run configuration
//!
//! Handles loading and resolving concurrency settings.

mod env;

pub use env::EnvOverrides;

use anyhow::{Context, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;

use crate::error::Error;

/// Worker pool sizing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerCount {
    /// Resolve to the host CPU count.
    Auto,
    /// Exact pool size; 0 disables pooling entirely.
    Fixed(usize),
}

impl WorkerCount {
    /// Parse `"auto"` or a non-negative integer.
    pub fn parse(raw: &str) -> crate::error::Result<Self> {
        match raw.trim() {
            "auto" => Ok(WorkerCount::Auto),
            other => other
                .parse::<usize>()
                .map(WorkerCount::Fixed)
                .map_err(|_| Error::InvalidWorkerCount(raw.to_string())),
        }
    }

    /// Resolve to a concrete pool size.
    pub fn resolve(&self) -> usize {
        match self {
            WorkerCount::Auto => num_cpus::get(),
            WorkerCount::Fixed(n) => *n,
        }
    }
}

impl fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerCount::Auto => write!(f, "auto"),
            WorkerCount::Fixed(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for WorkerCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WorkerCount::Auto => serializer.serialize_str("auto"),
            WorkerCount::Fixed(n) => serializer.serialize_u64(*n as u64),
        }
    }
}

impl<'de> Deserialize<'de> for WorkerCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WorkerCountVisitor;

        impl Visitor<'_> for WorkerCountVisitor {
            type Value = WorkerCount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or \"auto\"")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<WorkerCount, E> {
                Ok(WorkerCount::Fixed(value as usize))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<WorkerCount, E> {
                if value < 0 {
                    return Err(E::custom("worker count cannot be negative"));
                }
                Ok(WorkerCount::Fixed(value as usize))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<WorkerCount, E> {
                WorkerCount::parse(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(WorkerCountVisitor)
    }
}

/// Concurrency configuration for a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpConfig {
    /// Distribute test groups across a worker pool.
    #[serde(default)]
    pub use_concurrency: bool,

    /// Worker pool size. `"auto"` resolves to the host CPU count; 0 forces
    /// sequential in-process execution even when concurrency is requested.
    #[serde(default = "default_worker_count")]
    pub worker_count: WorkerCount,
}

fn default_worker_count() -> WorkerCount {
    WorkerCount::Auto
}

impl Default for MpConfig {
    fn default() -> Self {
        Self {
            use_concurrency: false,
            worker_count: WorkerCount::Auto,
        }
    }
}

impl MpConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Self = if is_yaml(path.as_ref()) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Load configuration and apply environment variable overrides
    pub fn load_with_env(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::load(path)?;
        EnvOverrides::load()
            .context("Invalid environment override")?
            .apply(&mut config);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = if is_yaml(path.as_ref()) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Effective worker pool size: 0 means every batch runs sequentially in
    /// the current process and no worker is ever spawned.
    pub fn effective_workers(&self) -> usize {
        if !self.use_concurrency {
            return 0;
        }
        self.worker_count.resolve()
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
