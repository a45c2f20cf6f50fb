//! # Run Budget
//!
//! The finite allowance bounding a search run: a number of oracle
//! evaluations and, optionally, a wall-clock allowance. Only the search
//! controller mutates a budget.

use std::time::Duration;

/// Remaining evaluation count and optional wall-clock allowance for a run.
///
/// The evaluation count is the durable budget: it survives snapshot and
/// resume. The wall-clock allowance applies to each `run()` invocation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunBudget {
    evaluations: usize,
    wall_clock: Option<Duration>,
}

impl RunBudget {
    /// A budget of `evaluations` oracle calls with no wall-clock bound.
    pub fn evaluations(evaluations: usize) -> Self {
        Self {
            evaluations,
            wall_clock: None,
        }
    }

    /// Adds a wall-clock allowance.
    pub fn with_wall_clock(mut self, allowance: Duration) -> Self {
        self.wall_clock = Some(allowance);
        self
    }

    pub fn remaining_evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn wall_clock(&self) -> Option<Duration> {
        self.wall_clock
    }

    /// Records `count` spent evaluations.
    pub(crate) fn consume(&mut self, count: usize) {
        self.evaluations = self.evaluations.saturating_sub(count);
    }

    pub fn is_exhausted(&self) -> bool {
        self.evaluations == 0
    }
}
