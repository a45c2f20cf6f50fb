//! # Selection Strategies
//!
//! Selection decides which scored candidates survive into the next
//! generation. Strategies only ever see successfully scored members — a
//! FAILED or TIMED_OUT score excludes its candidate before selection runs —
//! and break equal fitness values toward the earlier lineage id, biasing the
//! search toward proven regions of design space.

pub mod elitist_fill;
pub mod top_k;

use std::cmp::Ordering;
use std::fmt::Debug;

use crate::candidate::CandidatePayload;
use crate::error::Result;
use crate::rng::RandomNumberGenerator;
use crate::search::population::Member;

pub use elitist_fill::ElitistFillSelection;
pub use top_k::TopKSelection;

/// Direction of the fitness scale.
///
/// Docking-style oracles typically minimize a binding energy; other
/// evaluators maximize. The engine takes no default — the direction is
/// required configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Objective {
    Minimize,
    Maximize,
}

impl Objective {
    /// Whether `candidate` is strictly better than `incumbent`.
    pub fn is_improvement(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Objective::Minimize => candidate < incumbent,
            Objective::Maximize => candidate > incumbent,
        }
    }
}

/// Total order over members for ranking: better fitness sorts first, equal
/// fitness resolves toward the earlier lineage id, and unscored members sink
/// to the end.
pub(crate) fn compare_members<P: CandidatePayload>(
    objective: Objective,
    a: &Member<P>,
    b: &Member<P>,
) -> Ordering {
    match (a.score.fitness(), b.score.fitness()) {
        (Some(fa), Some(fb)) => {
            let by_fitness = match objective {
                Objective::Minimize => fa.partial_cmp(&fb),
                Objective::Maximize => fb.partial_cmp(&fa),
            }
            .unwrap_or(Ordering::Equal);
            by_fitness.then_with(|| a.candidate.lineage().cmp(&b.candidate.lineage()))
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.candidate.lineage().cmp(&b.candidate.lineage()),
    }
}

/// Trait for selection policies.
///
/// A strategy receives the merged pool of the previous population and the
/// generation's newly scored candidates (key-deduplicated, successes only)
/// and returns at most `capacity` survivors.
pub trait SelectionStrategy<P>: Debug + Send + Sync
where
    P: CandidatePayload,
{
    /// Selects up to `capacity` members from `pool`.
    ///
    /// # Arguments
    ///
    /// * `pool` - The merged candidate pool for this generation.
    /// * `capacity` - The maximum number of survivors.
    /// * `objective` - The fitness direction for this run.
    /// * `rng` - A random number generator for strategies that use
    ///   randomness. A strategy that requires randomness returns
    ///   [`SearchError::Selection`](crate::error::SearchError::Selection)
    ///   when `rng` is `None`.
    fn select(
        &self,
        pool: &[Member<P>],
        capacity: usize,
        objective: Objective,
        rng: Option<&mut RandomNumberGenerator>,
    ) -> Result<Vec<Member<P>>>;
}
