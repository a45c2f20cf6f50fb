//! # Candidate Representation
//!
//! A candidate is one proposed molecular design under evaluation. Every
//! candidate carries a *canonical key* derived deterministically from its
//! payload content; two candidates with equal keys are the same design for
//! deduplication and caching purposes, regardless of how or when they were
//! constructed.
//!
//! The payload itself is opaque to the engine. Implement [`CandidatePayload`]
//! for your design type to plug it in; [`SequenceDesign`] is the built-in
//! implementation for residue sequences.

use std::fmt::{self, Debug, Display};

use crate::error::{Result, SearchError};

/// The one-letter codes of the 20 standard amino acids.
pub const AMINO_ACID_ALPHABET: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

/// A deterministic, content-derived identifier for a candidate design.
///
/// Keys are produced by [`CandidatePayload::canonical_key`] and are the unit
/// of identity for the score cache and all deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Wraps an already-normalized content string.
    pub fn new(normalized: impl Into<String>) -> Self {
        Self(normalized.into())
    }

    /// Returns the normalized content string backing this key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for design payloads that can enter the search loop.
///
/// Implementations must make `canonical_key` pure and deterministic: equal
/// payload content (under the domain's equivalence, e.g. a case-normalized
/// sequence string) must yield equal keys on every call. Payloads that
/// violate their representation constraints fail with
/// [`SearchError::InvalidCandidate`].
///
/// Types implementing this trait must also implement `Clone`, `Debug`,
/// `Send`, and `Sync` to enable parallel scoring.
pub trait CandidatePayload: Clone + Debug + Send + Sync {
    /// Derives the canonical key for this payload.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidCandidate`] when the payload content is
    /// malformed, e.g. contains a symbol outside the design alphabet.
    fn canonical_key(&self) -> Result<CanonicalKey>;
}

/// Identifies which generation produced a candidate and its position within
/// that generation's batch.
///
/// Lineage ids are totally ordered; an earlier id means an older candidate.
/// Selection uses this order to break fitness ties toward proven designs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineageId {
    /// The generation in which the candidate was admitted.
    pub generation: u32,
    /// The candidate's position within its generation batch.
    pub ordinal: u32,
}

impl LineageId {
    pub fn new(generation: u32, ordinal: u32) -> Self {
        Self {
            generation,
            ordinal,
        }
    }
}

impl Display for LineageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}.{}", self.generation, self.ordinal)
    }
}

/// An immutable design point: payload, canonical key and lineage.
///
/// The key is computed once at construction, so every `Candidate` in the
/// system is known-valid; malformed payloads are rejected before they can
/// reach the cache or the oracle.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "P: serde::Serialize",
        deserialize = "P: serde::de::DeserializeOwned"
    ))
)]
pub struct Candidate<P: CandidatePayload> {
    payload: P,
    key: CanonicalKey,
    lineage: LineageId,
}

impl<P: CandidatePayload> Candidate<P> {
    /// Validates the payload and builds a candidate with the given lineage.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidCandidate`] when the payload fails
    /// canonicalization.
    pub fn new(payload: P, lineage: LineageId) -> Result<Self> {
        let key = payload.canonical_key()?;
        Ok(Self {
            payload,
            key,
            lineage,
        })
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn key(&self) -> &CanonicalKey {
        &self.key
    }

    pub fn lineage(&self) -> LineageId {
        self.lineage
    }
}

/// A residue sequence design over the standard amino-acid alphabet.
///
/// Canonicalization uppercases the sequence, so `"acde"` and `"ACDE"` are the
/// same design. Symbols outside [`AMINO_ACID_ALPHABET`] are representation
/// violations.
///
/// # Examples
///
/// ```rust
/// use molsearch::candidate::{CandidatePayload, SequenceDesign};
///
/// let design = SequenceDesign::new("acdefg");
/// let key = design.canonical_key().unwrap();
/// assert_eq!(key.as_str(), "ACDEFG");
///
/// let bad = SequenceDesign::new("ACDX1");
/// assert!(bad.canonical_key().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceDesign {
    sequence: String,
}

impl SequenceDesign {
    pub fn new(sequence: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
        }
    }

    /// Returns the raw sequence as provided at construction.
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Returns the number of residues in the sequence.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

impl CandidatePayload for SequenceDesign {
    fn canonical_key(&self) -> Result<CanonicalKey> {
        if self.sequence.is_empty() {
            return Err(SearchError::InvalidCandidate(
                "sequence must contain at least one residue".to_string(),
            ));
        }

        let mut normalized = String::with_capacity(self.sequence.len());
        for symbol in self.sequence.chars() {
            let upper = symbol.to_ascii_uppercase();
            if !AMINO_ACID_ALPHABET.contains(&(upper as u8)) {
                return Err(SearchError::InvalidCandidate(format!(
                    "illegal residue symbol '{}' in sequence",
                    symbol
                )));
            }
            normalized.push(upper);
        }

        Ok(CanonicalKey::new(normalized))
    }
}
