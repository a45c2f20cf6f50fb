//! # Run Snapshots
//!
//! A snapshot captures exactly the state a resumed run needs: the retained
//! population, the score cache's completed entries, the remaining budget and
//! the random seed state. The serialization format is the caller's concern;
//! with the `serde` feature these types derive `Serialize`/`Deserialize`.

use crate::candidate::{CandidatePayload, CanonicalKey};
use crate::oracle::Score;
use crate::search::budget::RunBudget;
use crate::search::population::Member;

/// The deterministic random state of a run.
///
/// Each generation's randomness is derived as `base_seed + generation`, so
/// the pair below reproduces the remaining random sequence exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeedState {
    pub base_seed: u64,
    pub next_generation: u32,
}

/// Everything a resumed run restores: population, cache, budget, seed state.
///
/// Convergence and failure counters deliberately reset on resume; they
/// describe the observing run, not the search state.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "P: serde::Serialize",
        deserialize = "P: serde::de::DeserializeOwned"
    ))
)]
pub struct RunSnapshot<P: CandidatePayload> {
    pub population: Vec<Member<P>>,
    pub cache: Vec<(CanonicalKey, Score)>,
    pub budget: RunBudget,
    pub seed: SeedState,
}
