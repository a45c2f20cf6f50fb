//! Single-residue substitution proposals.

use std::collections::HashSet;

use crate::candidate::{SequenceDesign, AMINO_ACID_ALPHABET};
use crate::error::{Result, SearchError};
use crate::proposal::ProposalStrategy;
use crate::rng::RandomNumberGenerator;
use crate::search::population::Population;

/// How many draws a strategy spends per requested proposal before giving up
/// on filling the batch. Small parent sets saturate quickly; the controller
/// treats a short batch as normal.
const ATTEMPTS_PER_PROPOSAL: usize = 8;

/// Proposes offspring by substituting one residue of a parent sequence.
///
/// Parents are taken round-robin from the population so every retained
/// design contributes offspring. The replacement residue is drawn uniformly
/// from the amino-acid alphabet excluding the current residue, so a proposal
/// always differs from its parent in exactly one position.
#[derive(Debug, Clone, Default)]
pub struct PointMutationStrategy;

impl PointMutationStrategy {
    pub fn new() -> Self {
        Self
    }
}

/// Substitutes one random residue of `sequence` in place.
pub(crate) fn substitute_residue(sequence: &mut Vec<char>, rng: &mut RandomNumberGenerator) {
    let position = rng.fetch_index(sequence.len());
    let current = sequence[position];
    loop {
        let replacement = AMINO_ACID_ALPHABET[rng.fetch_index(AMINO_ACID_ALPHABET.len())] as char;
        if replacement != current {
            sequence[position] = replacement;
            return;
        }
    }
}

impl ProposalStrategy<SequenceDesign> for PointMutationStrategy {
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

        for attempt in 0..max_attempts {
            if proposals.len() >= count {
                break;
            }
            let parent = &parents[attempt % parents.len()];
            let mut residues: Vec<char> = parent.candidate.key().as_str().chars().collect();
            substitute_residue(&mut residues, rng);
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
    fn test_proposals_differ_from_parent_in_one_position() {
        let population = population_of(&["MKVLAT"]);
        let mut rng = RandomNumberGenerator::from_seed(5);

        let proposals = PointMutationStrategy::new()
            .propose(&population, 4, &mut rng)
            .unwrap();

        assert!(!proposals.is_empty());
        for proposal in &proposals {
            let key = proposal.canonical_key().unwrap();
            let differing = key
                .as_str()
                .chars()
                .zip("MKVLAT".chars())
                .filter(|(a, b)| a != b)
                .count();
            assert_eq!(differing, 1);
        }
    }

    #[test]
    fn test_batch_is_deduplicated() {
        let population = population_of(&["AC"]);
        let mut rng = RandomNumberGenerator::from_seed(11);

        let proposals = PointMutationStrategy::new()
            .propose(&population, 32, &mut rng)
            .unwrap();

        let mut keys = HashSet::new();
        for proposal in &proposals {
            assert!(keys.insert(proposal.canonical_key().unwrap()));
        }
    }

    #[test]
    fn test_deterministic_under_seed() {
        let population = population_of(&["MKVLAT", "MKVLAW"]);
        let strategy = PointMutationStrategy::new();

        let mut rng_a = RandomNumberGenerator::from_seed(21);
        let mut rng_b = RandomNumberGenerator::from_seed(21);

        let a = strategy.propose(&population, 6, &mut rng_a).unwrap();
        let b = strategy.propose(&population, 6, &mut rng_b).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_population_is_an_error() {
        let population = Population::new(4).unwrap();
        let mut rng = RandomNumberGenerator::from_seed(3);

        let result = PointMutationStrategy::new().propose(&population, 4, &mut rng);

        assert!(matches!(result, Err(SearchError::EmptyPopulation)));
    }
}
