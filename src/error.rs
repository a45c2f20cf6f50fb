//! # Error Types
//!
//! This module defines the error types used across the search engine. The
//! taxonomy follows the run lifecycle: representation violations and cache
//! consistency violations are hard failures that abort a run, while oracle
//! failures and timeouts are absorbed into candidate scores and never
//! propagate as errors.
//!
//! ## Examples
//!
//! Using the `Result` type:
//!
//! ```rust
//! use molsearch::error::{Result, SearchError};
//!
//! fn parse_design(sequence: &str) -> Result<()> {
//!     if sequence.is_empty() {
//!         return Err(SearchError::InvalidCandidate(
//!             "empty sequence".to_string(),
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Represents errors that can occur while configuring or driving a search run.
///
/// Candidate-level scoring failures (oracle faults, timeouts) are *not*
/// errors; they are recorded as non-success [`Score`](crate::oracle::Score)
/// values and excluded from selection. Only violations that make the run
/// itself unsound surface through this enum.
#[derive(Error, Debug)]
pub enum SearchError {
    /// A candidate payload violates its representation constraints, e.g. an
    /// illegal symbol in a sequence. Never retried.
    #[error("invalid candidate: {0}")]
    InvalidCandidate(String),

    /// The cache observed two different SUCCESS scores for the same canonical
    /// key. Scoring must be deterministic within a run, so this is fatal.
    #[error("cache consistency violation for key '{key}': cached fitness {cached}, offered {offered}")]
    CacheConsistency {
        key: String,
        cached: f64,
        offered: f64,
    },

    /// An invalid configuration was provided.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An operation was attempted on an empty population.
    #[error("empty population error: cannot operate on an empty population")]
    EmptyPopulation,

    /// A proposal strategy failed to produce candidates.
    #[error("proposal error: {0}")]
    Proposal(String),

    /// A selection strategy failed, e.g. it required randomness but none was
    /// supplied.
    #[error("selection error: {0}")]
    Selection(String),
}

/// A specialized Result type for search engine operations.
///
/// This type is a convenience wrapper around `std::result::Result` with the
/// error type fixed to `SearchError`.
pub type Result<T> = std::result::Result<T, SearchError>;
