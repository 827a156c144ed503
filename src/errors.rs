// src/errors.rs

//! Crate-wide error taxonomy.
//!
//! Structural errors (duplicate task, unknown task, cycle, bad config) are
//! fatal and surface at registration or load time. Stage and task errors are
//! non-fatal to a run as a whole: they end their own branch and are collected
//! into the run report.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SluiceError {
    #[error("task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("unknown task: '{0}'")]
    UnknownTask(String),

    #[error("cycle detected in task graph involving task '{0}'")]
    CyclicDependency(String),

    #[error("stage '{stage}' failed on {file:?}: {source}")]
    StageProcessing {
        stage: String,
        file: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("task '{task}' failed: {source}")]
    TaskExecution {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SluiceError>;
