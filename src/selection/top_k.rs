//! Deterministic truncation selection.

use crate::candidate::CandidatePayload;
use crate::error::{Result, SearchError};
use crate::rng::RandomNumberGenerator;
use crate::search::population::Member;
use crate::selection::{compare_members, Objective, SelectionStrategy};

/// Selects the best `capacity` members by fitness.
///
/// Fully deterministic: the pool is ranked by fitness under the run's
/// objective, with equal fitness resolved toward the earlier lineage id
/// (older candidates win, biasing exploitation of proven designs).
///
/// # Examples
///
/// ```
/// use molsearch::candidate::{Candidate, LineageId, SequenceDesign};
/// use molsearch::oracle::Score;
/// use molsearch::search::population::Member;
/// use molsearch::selection::{Objective, SelectionStrategy, TopKSelection};
///
/// let pool = vec![
///     Member {
///         candidate: Candidate::new(SequenceDesign::new("AC"), LineageId::new(0, 0)).unwrap(),
///         score: Score::success(-4.0),
///     },
///     Member {
///         candidate: Candidate::new(SequenceDesign::new("CD"), LineageId::new(0, 1)).unwrap(),
///         score: Score::success(-9.0),
///     },
/// ];
///
/// let selected = TopKSelection::default()
///     .select(&pool, 1, Objective::Minimize, None)
///     .unwrap();
/// assert_eq!(selected[0].candidate.key().as_str(), "CD");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TopKSelection;

impl TopKSelection {
    pub fn new() -> Self {
        Self
    }
}

impl<P> SelectionStrategy<P> for TopKSelection
where
    P: CandidatePayload,
{
    fn select(
        &self,
        pool: &[Member<P>],
        capacity: usize,
        objective: Objective,
        _rng: Option<&mut RandomNumberGenerator>,
    ) -> Result<Vec<Member<P>>> {
        if pool.is_empty() {
            return Err(SearchError::EmptyPopulation);
        }

        let mut ranked: Vec<&Member<P>> = pool
            .iter()
            .filter(|member| member.score.is_success())
            .collect();
        ranked.sort_by(|a, b| compare_members(objective, a, b));

        Ok(ranked
            .into_iter()
            .take(capacity)
            .cloned()
            .collect())
    }
}
