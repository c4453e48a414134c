// src/error.rs

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A scorer asked the pool for a scope nobody computed. This is a cache
    /// population ordering bug and aborts the current instance.
    #[error("no factor in pool for scope {0}")]
    MissingFactor(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed weight line {line} in {path}: {reason}")]
    MalformedWeights {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("name {0:?} cannot be used in the weight file format")]
    InvalidName(String),
    #[error("weight {value} of feature {feature:?} in template {template:?} is not finite")]
    NonFiniteWeight {
        template: String,
        feature: String,
        value: f64,
    },
    #[error("unknown template {0:?}")]
    UnknownTemplate(String),
    #[error("template {0:?} is already registered")]
    DuplicateTemplate(String),
    #[error("strategy reads objective scores but no gold annotation was given")]
    GoldRequired,
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the cache consistency failure that aborts a single instance.
    pub fn is_missing_factor(&self) -> bool {
        matches!(self, Error::MissingFactor(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
