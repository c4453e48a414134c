// src/executor.rs

//! Bulk fan-out/fan-in execution.
//!
//! Scope generation, factor computation and state scoring run as bulk
//! operations through an [`Executor`]. A sequential executor runs them on
//! the calling thread in order; a parallel one runs them on its own rayon
//! pool. Either way the call returns only when every item is done, and
//! results keep the input order.

use std::fmt;

use log::debug;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::{ExecutorConfig, CONFIG};
use crate::error::Result;

pub struct Executor {
    pool: Option<ThreadPool>,
}

impl Executor {
    /// Runs everything on the calling thread.
    pub fn sequential() -> Self {
        Self { pool: None }
    }

    /// Runs bulk operations on a dedicated pool of `workers` threads.
    /// `0` lets rayon pick the number of logical CPUs.
    pub fn parallel(workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("samplerank-worker-{i}"))
            .build()?;
        debug!("Executor started with {} workers", pool.current_num_threads());
        Ok(Self { pool: Some(pool) })
    }

    pub fn from_config(config: &ExecutorConfig) -> Result<Self> {
        if config.parallel {
            Self::parallel(config.workers)
        } else {
            Ok(Self::sequential())
        }
    }

    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    pub fn workers(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(1, ThreadPool::current_num_threads)
    }

    /// `f` applied to every item, results in input order.
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| items.par_iter().map(&f).collect()),
            None => items.iter().map(f).collect(),
        }
    }

    /// `f` applied to every item in place.
    pub fn for_each_mut<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| items.par_iter_mut().for_each(&f)),
            None => items.iter_mut().for_each(f),
        }
    }

    /// Like [`Executor::map`] over mutable items; the first error wins.
    pub fn try_for_each_mut<T, F>(&self, items: &mut [T], f: F) -> Result<()>
    where
        T: Send,
        F: Fn(&mut T) -> Result<()> + Sync + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| items.par_iter_mut().try_for_each(&f)),
            None => items.iter_mut().try_for_each(f),
        }
    }
}

impl Default for Executor {
    /// Built from the process-wide [`CONFIG`]. Falls back to sequential
    /// execution when the configured pool cannot be created.
    fn default() -> Self {
        Self::from_config(&CONFIG.executor).unwrap_or_else(|e| {
            log::warn!("{e}; falling back to sequential execution");
            Self::sequential()
        })
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("parallel", &self.is_parallel())
            .field("workers", &self.workers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn map_preserves_order_in_both_modes() {
        let items: Vec<u64> = (0..1000).collect();
        let sequential = Executor::sequential().map(&items, |x| x * x);
        let parallel = Executor::parallel(4).unwrap().map(&items, |x| x * x);
        assert_eq!(sequential, parallel);
        assert_eq!(sequential[31], 961);
    }

    #[test_log::test]
    fn try_for_each_mut_propagates_errors() {
        let mut items = vec![1, 2, 3];
        let executor = Executor::parallel(2).unwrap();
        let result = executor.try_for_each_mut(&mut items, |x| {
            if *x == 2 {
                Err(crate::error::Error::GoldRequired)
            } else {
                *x += 10;
                Ok(())
            }
        });
        assert!(matches!(result, Err(crate::error::Error::GoldRequired)));
    }

    #[test_log::test]
    fn sequential_reports_single_worker() {
        let executor = Executor::sequential();
        assert!(!executor.is_parallel());
        assert_eq!(executor.workers(), 1);
    }
}
