//! Elitist retention with stochastic fill.

use crate::candidate::CandidatePayload;
use crate::error::{Result, SearchError};
use crate::rng::RandomNumberGenerator;
use crate::search::population::Member;
use crate::selection::{compare_members, Objective, SelectionStrategy};

/// Keeps the top `elite_count` members deterministically and fills the
/// remaining capacity with a uniform random draw from the rest of the pool.
///
/// The stochastic fill keeps diversity in the population that pure
/// truncation would discard. Draws come from the caller-supplied seeded
/// generator, so runs remain reproducible.
#[derive(Debug, Clone)]
pub struct ElitistFillSelection {
    elite_count: usize,
}

impl ElitistFillSelection {
    pub fn new(elite_count: usize) -> Self {
        Self { elite_count }
    }

    pub fn elite_count(&self) -> usize {
        self.elite_count
    }
}

impl Default for ElitistFillSelection {
    /// Two elites, matching the smallest population the engine defaults to.
    fn default() -> Self {
        Self { elite_count: 2 }
    }
}

impl<P> SelectionStrategy<P> for ElitistFillSelection
where
    P: CandidatePayload,
{
    fn select(
        &self,
        pool: &[Member<P>],
        capacity: usize,
        objective: Objective,
        rng: Option<&mut RandomNumberGenerator>,
    ) -> Result<Vec<Member<P>>> {
        if pool.is_empty() {
            return Err(SearchError::EmptyPopulation);
        }

        let mut ranked: Vec<&Member<P>> = pool
            .iter()
            .filter(|member| member.score.is_success())
            .collect();
        ranked.sort_by(|a, b| compare_members(objective, a, b));

        let elite_take = self.elite_count.min(capacity).min(ranked.len());
        let mut selected: Vec<Member<P>> = ranked[..elite_take].iter().map(|m| (*m).clone()).collect();

        let mut rest: Vec<&Member<P>> = ranked[elite_take..].to_vec();
        if selected.len() < capacity && !rest.is_empty() {
            let rng = rng.ok_or_else(|| {
                SearchError::Selection(
                    "elitist fill selection requires a random number generator".to_string(),
                )
            })?;
            while selected.len() < capacity && !rest.is_empty() {
                let pick = rng.fetch_index(rest.len());
                selected.push(rest.swap_remove(pick).clone());
            }
        }

        Ok(selected)
    }
}
