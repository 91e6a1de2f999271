//! Error types for the dispatch core
//!
//! Configuration problems are detected before any worker is spawned and
//! abort the run; interruption is raised from the point of detection.

use thiserror::Error;

use crate::models::Strategy;

/// Dispatch core errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Group {group} already has specified strategy {existing}, cannot assign {requested}")]
    GroupStrategyConflict {
        group: String,
        existing: Strategy,
        requested: Strategy,
    },

    #[error("Detected too many group values for {0}")]
    GroupOverspecified(String),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Worker count must be an integer or \"auto\", got {0:?}")]
    InvalidWorkerCount(String),

    #[error("Run interrupted: {0}")]
    Interrupted(String),
}

impl Error {
    /// True for errors detected at classification/configuration time.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Error::Interrupted(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
