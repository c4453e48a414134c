// src/config.rs

//! Configuration structures for training and inference runs.
//!
//! Every section deserializes with `#[serde(default)]`, so a configuration
//! file only has to name the values it changes. Files are JSON.
//!
//! A process-wide [`CONFIG`] is loaded lazily from the path in the
//! `SAMPLERANK_CONFIG` environment variable. When the variable is unset, or
//! the file cannot be read, defaults are used.

use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::learning::optimizer::{Adam, Optimizer, Sgd};
use crate::learning::regularizer::{Regularizer, L1, L2};

/// Environment variable naming the JSON file [`CONFIG`] is loaded from.
pub const CONFIG_ENV_VAR: &str = "SAMPLERANK_CONFIG";

pub static CONFIG: Lazy<Config> = Lazy::new(|| match std::env::var_os(CONFIG_ENV_VAR) {
    Some(path) => Config::load(Path::new(&path)).unwrap_or_else(|e| {
        warn!("{e:#}; using default configuration");
        Config::default()
    }),
    None => Config::default(),
});

// --- Top-Level Configuration Structure ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub executor: ExecutorConfig,
    pub sampler: SamplerConfig,
    pub learner: LearnerConfig,
    pub optimizer: OptimizerConfig,
    /// No regularization when absent.
    pub regularizer: Option<RegularizerConfig>,
    pub trainer: TrainerConfig,
}

impl Config {
    /// Reads a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid configuration JSON")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

// --- Executor ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Run scope generation, factor computation and scoring on a worker
    /// pool instead of the calling thread.
    pub parallel: bool,
    /// Worker count for the pool. `0` uses one worker per logical CPU.
    pub workers: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            parallel: true,
            workers: 0,
        }
    }
}

// --- Sampler ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplerConfig {
    /// Sampling steps per chain. Each step runs every explorer once.
    pub steps: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig { steps: 10 }
    }
}

// --- Learner ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LearnerConfig {
    /// Required separation between preferred and dispreferred states.
    pub margin: f64,
    /// Constant factor applied to every gradient.
    pub sample_weight: f64,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        LearnerConfig {
            margin: 1.0,
            sample_weight: 1.0,
        }
    }
}

// --- Optimizer ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizerConfig {
    Sgd {
        learning_rate: f64,
        #[serde(default)]
        momentum: f64,
        #[serde(default)]
        decay: f64,
        #[serde(default)]
        nesterov: bool,
    },
    Adam {
        learning_rate: f64,
        #[serde(default = "default_beta1")]
        beta1: f64,
        #[serde(default = "default_beta2")]
        beta2: f64,
        #[serde(default = "default_epsilon")]
        epsilon: f64,
    },
}

fn default_beta1() -> f64 {
    0.9
}

fn default_beta2() -> f64 {
    0.999
}

fn default_epsilon() -> f64 {
    1e-8
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Adam {
            learning_rate: 0.001,
            beta1: default_beta1(),
            beta2: default_beta2(),
            epsilon: default_epsilon(),
        }
    }
}

impl OptimizerConfig {
    pub fn build(&self) -> Box<dyn Optimizer> {
        match *self {
            OptimizerConfig::Sgd {
                learning_rate,
                momentum,
                decay,
                nesterov,
            } => Box::new(Sgd::with_momentum(learning_rate, momentum, decay, nesterov)),
            OptimizerConfig::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => Box::new(Adam::with_params(learning_rate, beta1, beta2, epsilon)),
        }
    }
}

// --- Regularizer ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegularizerConfig {
    L1 { lambda: f64 },
    L2 { lambda: f64 },
}

impl RegularizerConfig {
    pub fn build(&self) -> Box<dyn Regularizer> {
        match *self {
            RegularizerConfig::L1 { lambda } => Box::new(L1::new(lambda)),
            RegularizerConfig::L2 { lambda } => Box::new(L2::new(lambda)),
        }
    }
}

// --- Trainer ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainerConfig {
    pub epochs: usize,
    /// Shuffle the training instances at the start of every epoch.
    pub shuffle: bool,
    /// Seed for shuffling.
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            epochs: 10,
            shuffle: true,
            seed: 42,
        }
    }
}
