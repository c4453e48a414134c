// src/learning/mod.rs

//! Weight learning from pairs of neighboring states.
//!
//! A [`Learner`] sees the current state and the candidate the sampling
//! strategy picked, both already scored by the model and the objective. It
//! may change the model's weights; the sampler rescores both states when it
//! does.

pub mod optimizer;
pub mod regularizer;
pub mod sample_rank;

pub use optimizer::{Adam, Optimizer, Sgd};
pub use regularizer::{Regularizer, L1, L2};
pub use sample_rank::SampleRankLearner;

use crate::error::Result;
use crate::model::Model;
use crate::pool::FactorPool;
use crate::state::{Assignment, State};

pub trait Learner<A: Assignment> {
    /// Compares `current` and `candidate` and updates `model` if they are
    /// misranked. Returns whether any weight changed.
    fn update(
        &mut self,
        model: &mut Model<A>,
        pool: &FactorPool<A::Key>,
        current: &State<A>,
        candidate: &State<A>,
    ) -> Result<bool>;
}
