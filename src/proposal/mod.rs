//! # Proposal Strategies
//!
//! A proposal strategy generates the next batch of candidate payloads from
//! the current population — by mutation, recombination, an external
//! generative model, or any hybrid. The search controller is agnostic to the
//! variant behind the trait.
//!
//! Strategies must be deterministic given the caller-supplied random number
//! generator: the controller derives a fresh seeded generator per generation,
//! which is what makes whole runs reproducible and resumable.

pub mod mutation;
pub mod recombination;

use std::fmt::Debug;

use crate::candidate::CandidatePayload;
use crate::error::Result;
use crate::rng::RandomNumberGenerator;
use crate::search::population::Population;

pub use mutation::PointMutationStrategy;
pub use recombination::RecombinationStrategy;

/// Trait for strategies that propose new candidate payloads.
pub trait ProposalStrategy<P>: Debug + Send + Sync
where
    P: CandidatePayload,
{
    /// Proposes up to `count` new payloads derived from `population`.
    ///
    /// The returned batch is deduplicated internally by canonical key and may
    /// be smaller than `count` — or empty, which the controller treats as the
    /// strategy having exhausted its reachable design space.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::EmptyPopulation`](crate::error::SearchError::EmptyPopulation)
    /// when called with an empty population, or
    /// [`SearchError::Proposal`](crate::error::SearchError::Proposal) when
    /// generation itself fails.
    fn propose(
        &self,
        population: &Population<P>,
        count: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<P>>;
}
