// src/lib.rs

//! Sampling-based structured prediction with SampleRank training.
//!
//! A domain provides an [`Assignment`] type, [`Template`]s that describe
//! which variables interact and what features those interactions have,
//! [`search::Explorer`]s that propose neighboring assignments, and an
//! [`ObjectiveFunction`] that compares an assignment with gold. The
//! [`Model`] scores states through a per-instance [`FactorPool`] cache, the
//! [`Sampler`] runs Markov chains over states, and the [`SampleRankLearner`]
//! updates weights from pairs of states the objective can tell apart.

pub mod arena;
pub mod config;
pub mod error;
pub mod executor;
pub mod factor;
pub mod graph;
pub mod learning;
pub mod model;
pub mod objective;
pub mod pool;
pub mod search;
pub mod state;
pub mod template;
pub mod trainer;
pub mod vector;

pub use arena::{VarId, VariableArena};
pub use config::{Config, CONFIG};
pub use error::{Error, Result};
pub use executor::Executor;
pub use factor::{Factor, FactorScope, ScopeKey};
pub use graph::FactorGraph;
pub use learning::{Learner, SampleRankLearner};
pub use model::Model;
pub use objective::{Measure, ObjectiveFunction, SetObjective};
pub use pool::FactorPool;
pub use search::{Chain, Explorer, Initializer, Sampler, SearchPolicy};
pub use state::{Assignment, LabeledInstance, State, StateId};
pub use template::Template;
pub use trainer::{EpochSummary, Trainer, TrainingObserver};
pub use vector::Vector;
