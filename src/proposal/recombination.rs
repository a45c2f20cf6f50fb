//! Single-point crossover proposals.

use std::collections::HashSet;

use crate::candidate::SequenceDesign;
use crate::error::{Result, SearchError};
use crate::proposal::mutation::substitute_residue;
use crate::proposal::ProposalStrategy;
use crate::rng::RandomNumberGenerator;
use crate::search::population::Population;

const ATTEMPTS_PER_PROPOSAL: usize = 8;

/// Proposes offspring by recombining two parent sequences at a random cut
/// point, optionally followed by a point mutation.
///
/// With fewer than two distinct parents — or parents too short to cut — the
/// strategy degrades to pure point mutation, so a collapsed population still
/// produces proposals.
#[derive(Debug, Clone)]
pub struct RecombinationStrategy {
    mutation_rate: f64,
}

impl RecombinationStrategy {
    /// # Errors
    ///
    /// Returns [`SearchError::Configuration`] when `mutation_rate` is outside
    /// `[0.0, 1.0]`.
    pub fn new(mutation_rate: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&mutation_rate) {
            return Err(SearchError::Configuration(format!(
                "mutation rate must be within [0.0, 1.0], got {}",
                mutation_rate
            )));
        }
        Ok(Self { mutation_rate })
    }

    pub fn mutation_rate(&self) -> f64 {
        self.mutation_rate
    }
}

impl Default for RecombinationStrategy {
    fn default() -> Self {
        Self { mutation_rate: 0.3 }
    }
}

impl ProposalStrategy<SequenceDesign> for RecombinationStrategy {
    fn propose(
        &self,
        population: &Population<SequenceDesign>,
        count: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<SequenceDesign>> {
        let parents = population.members();
        if parents.is_empty() {
            return Err(SearchError::EmptyPopulation);
        }

        let mut proposed_keys: HashSet<String> = HashSet::with_capacity(count);
        let mut proposals = Vec::with_capacity(count);
        let max_attempts = count.saturating_mul(ATTEMPTS_PER_PROPOSAL);

        for _ in 0..max_attempts {
            if proposals.len() >= count {
                break;
            }

            let first = rng.fetch_index(parents.len());
            let second = if parents.len() > 1 {
                // Draw a distinct co-parent.
                let offset = 1 + rng.fetch_index(parents.len() - 1);
                (first + offset) % parents.len()
            } else {
                first
            };

            let a = parents[first].candidate.key().as_str();
            let b = parents[second].candidate.key().as_str();
            let cut_limit = a.len().min(b.len());

            let mut residues: Vec<char> = if first != second && cut_limit >= 2 {
                let cut = 1 + rng.fetch_index(cut_limit - 1);
                a.chars().take(cut).chain(b.chars().skip(cut)).collect()
            } else {
                a.chars().collect()
            };

            // A crossover of identical prefixes can reproduce a parent;
            // mutation is what guarantees motion through design space.
            if first == second || rng.fetch_bool(self.mutation_rate) {
                substitute_residue(&mut residues, rng);
            }

            let sequence: String = residues.into_iter().collect();
            if proposed_keys.insert(sequence.clone()) {
                proposals.push(SequenceDesign::new(sequence));
            }
        }

        Ok(proposals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{Candidate, CandidatePayload, LineageId};
    use crate::oracle::Score;
    use crate::search::population::Member;

    fn population_of(sequences: &[&str]) -> Population<SequenceDesign> {
        let members = sequences
            .iter()
            .enumerate()
            .map(|(ordinal, sequence)| Member {
                candidate: Candidate::new(
                    SequenceDesign::new(*sequence),
                    LineageId::new(0, ordinal as u32),
                )
                .unwrap(),
                score: Score::success(0.0),
            })
            .collect();
        Population::from_members(members, 16).unwrap()
    }

    #[test]
    fn test_invalid_mutation_rate_is_rejected() {
        assert!(RecombinationStrategy::new(1.5).is_err());
        assert!(RecombinationStrategy::new(-0.1).is_err());
        assert!(RecombinationStrategy::new(0.5).is_ok());
    }

    #[test]
    fn test_offspring_are_valid_designs() {
        let population = population_of(&["MKVLATGR", "WYHNDEQS"]);
        let mut rng = RandomNumberGenerator::from_seed(17);

        let proposals = RecombinationStrategy::default()
            .propose(&population, 8, &mut rng)
            .unwrap();

        assert!(!proposals.is_empty());
        for proposal in &proposals {
            assert!(proposal.canonical_key().is_ok());
            assert_eq!(proposal.len(), 8);
        }
    }

    #[test]
    fn test_single_parent_degrades_to_mutation() {
        let population = population_of(&["MKVLAT"]);
        let mut rng = RandomNumberGenerator::from_seed(29);

        let proposals = RecombinationStrategy::default()
            .propose(&population, 4, &mut rng)
            .unwrap();

        assert!(!proposals.is_empty());
        for proposal in &proposals {
            assert_ne!(proposal.canonical_key().unwrap().as_str(), "MKVLAT");
        }
    }

    #[test]
    fn test_deterministic_under_seed() {
        let population = population_of(&["MKVLATGR", "WYHNDEQS", "AAAAAAAA"]);
        let strategy = RecombinationStrategy::default();

        let mut rng_a = RandomNumberGenerator::from_seed(101);
        let mut rng_b = RandomNumberGenerator::from_seed(101);

        assert_eq!(
            strategy.propose(&population, 10, &mut rng_a).unwrap(),
            strategy.propose(&population, 10, &mut rng_b).unwrap()
        );
    }
}
