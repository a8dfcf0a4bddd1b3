// fusion_sim/src/error.rs

use std::io;
use std::path::PathBuf;

use fusion_core::error::FilterError;
use fusion_core::metrics::MetricsError;
use thiserror::Error;

use crate::log_reader::LogParseError;

/// Every failure the application layer can surface to `main`.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config file not found: {0:?}")]
    MissingConfig(PathBuf),

    #[error("failed to load configuration: {0}")]
    Config(#[from] figment::Error),

    #[error("failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("invalid noise distribution: {0}")]
    Noise(#[from] rand_distr::NormalError),

    #[error("no sensor logs found under {0:?}")]
    NoInput(PathBuf),

    #[error("{path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: LogParseError,
    },

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

impl SimError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SimError::Io {
            path: path.into(),
            source,
        }
    }
}
