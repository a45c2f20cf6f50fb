//! # Population
//!
//! The retained set of scored candidates carried between generations. A
//! population is bounded by a configured capacity and never holds two members
//! with the same canonical key.

use std::collections::HashSet;

use crate::candidate::{Candidate, CandidatePayload};
use crate::error::{Result, SearchError};
use crate::oracle::Score;
use crate::selection::{compare_members, Objective};

/// One scored candidate retained in a population.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "P: serde::Serialize",
        deserialize = "P: serde::de::DeserializeOwned"
    ))
)]
pub struct Member<P: CandidatePayload> {
    pub candidate: Candidate<P>,
    pub score: Score,
}

/// An ordered, capacity-bounded, key-unique collection of scored candidates.
#[derive(Debug, Clone)]
pub struct Population<P: CandidatePayload> {
    members: Vec<Member<P>>,
    capacity: usize,
}

impl<P: CandidatePayload> Population<P> {
    /// Creates an empty population with the given capacity.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Configuration`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SearchError::Configuration(
                "population capacity cannot be zero".to_string(),
            ));
        }
        Ok(Self {
            members: Vec::new(),
            capacity,
        })
    }

    /// Rebuilds a population from previously retained members, e.g. when
    /// restoring a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Configuration`] when the members exceed
    /// `capacity` or contain duplicate canonical keys.
    pub fn from_members(members: Vec<Member<P>>, capacity: usize) -> Result<Self> {
        let mut population = Self::new(capacity)?;
        population.replace(members)?;
        Ok(population)
    }

    /// Replaces the member set wholesale, enforcing the population
    /// invariants.
    pub fn replace(&mut self, members: Vec<Member<P>>) -> Result<()> {
        if members.len() > self.capacity {
            return Err(SearchError::Configuration(format!(
                "{} members exceed population capacity {}",
                members.len(),
                self.capacity
            )));
        }
        let mut keys = HashSet::with_capacity(members.len());
        for member in &members {
            if !keys.insert(member.candidate.key().clone()) {
                return Err(SearchError::Configuration(format!(
                    "duplicate canonical key '{}' in population",
                    member.candidate.key()
                )));
            }
        }
        self.members = members;
        Ok(())
    }

    pub fn members(&self) -> &[Member<P>] {
        &self.members
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains_key(&self, candidate: &Candidate<P>) -> bool {
        self.members
            .iter()
            .any(|member| member.candidate.key() == candidate.key())
    }

    /// The best successfully scored member under the given objective, ties
    /// broken toward the earlier lineage.
    pub fn best(&self, objective: Objective) -> Option<&Member<P>> {
        self.members
            .iter()
            .filter(|member| member.score.is_success())
            .min_by(|a, b| compare_members(objective, a, b))
    }
}
