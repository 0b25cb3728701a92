#![forbid(unsafe_code)]

//! Showcase error types.

use std::io;
use std::path::PathBuf;

use simfx_core::error::ConfigError;
use thiserror::Error;

use crate::cli::CliError;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error(transparent)]
    Cli(#[from] CliError),

    #[error("failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config '{path}': {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to open log file '{path}': {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}
