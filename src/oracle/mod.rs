//! # Scoring Oracle Boundary
//!
//! The oracle is the external, expensive scoring function — a docking engine,
//! an embedding service, or any black-box evaluator. This module defines the
//! boundary: the [`Oracle`] trait an evaluator implements, the
//! [`Evaluation`]/[`OracleFault`] types it speaks, and the [`Score`] the rest
//! of the engine consumes.
//!
//! The engine never calls an oracle directly; all invocations go through the
//! [`OracleAdapter`](adapter::OracleAdapter), which owns timeout, retry and
//! failure classification.

pub mod adapter;

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

pub use adapter::{OracleAdapter, RetryPolicy};

/// A successful oracle evaluation: a fitness value plus whatever diagnostic
/// payload the oracle wants to attach (pose data, energy terms, ...). The
/// diagnostics are opaque to the engine.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub fitness: f64,
    pub diagnostics: Option<String>,
}

impl Evaluation {
    pub fn new(fitness: f64) -> Self {
        Self {
            fitness,
            diagnostics: None,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: impl Into<String>) -> Self {
        self.diagnostics = Some(diagnostics.into());
        self
    }
}

/// Faults an oracle invocation can raise.
///
/// The adapter retries `Transient` faults with backoff; `Rejected` means the
/// oracle refused the candidate itself, which is never retried.
#[derive(Debug, Error)]
pub enum OracleFault {
    /// The evaluator hit a recoverable condition: a crashed subprocess,
    /// resource contention, a dropped connection.
    #[error("transient oracle fault: {0}")]
    Transient(String),

    /// The evaluator rejected the candidate as unscorable.
    #[error("candidate rejected by oracle: {0}")]
    Rejected(String),
}

/// The external scoring function.
///
/// Implementations may block; the adapter runs each invocation on its own
/// thread and bounds it with a timeout. An implementation must be safe to
/// call from multiple threads at once up to the engine's configured
/// concurrency limit.
pub trait Oracle<P>: Send + Sync {
    /// Evaluates one candidate payload.
    fn invoke(&self, payload: &P) -> std::result::Result<Evaluation, OracleFault>;
}

/// Terminal status of a scoring attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScoreStatus {
    Success,
    Failed,
    TimedOut,
}

/// The result of evaluating a candidate against the oracle.
///
/// Invariant: a score whose status is not [`ScoreStatus::Success`] never
/// exposes a fitness value, so failed candidates cannot leak into selection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Score {
    status: ScoreStatus,
    fitness: Option<f64>,
    diagnostics: Option<String>,
}

impl Score {
    /// A successful evaluation with the given fitness.
    pub fn success(fitness: f64) -> Self {
        Self {
            status: ScoreStatus::Success,
            fitness: Some(fitness),
            diagnostics: None,
        }
    }

    /// A successful evaluation carrying the oracle's diagnostic payload.
    pub fn success_with_diagnostics(fitness: f64, diagnostics: impl Into<String>) -> Self {
        Self {
            status: ScoreStatus::Success,
            fitness: Some(fitness),
            diagnostics: Some(diagnostics.into()),
        }
    }

    /// A failed evaluation. The diagnostic records why.
    pub fn failed(diagnostics: impl Into<String>) -> Self {
        Self {
            status: ScoreStatus::Failed,
            fitness: None,
            diagnostics: Some(diagnostics.into()),
        }
    }

    /// An evaluation abandoned because it exceeded the configured timeout.
    pub fn timed_out() -> Self {
        Self {
            status: ScoreStatus::TimedOut,
            fitness: None,
            diagnostics: None,
        }
    }

    pub fn status(&self) -> ScoreStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == ScoreStatus::Success
    }

    /// The fitness value, present only for successful evaluations.
    pub fn fitness(&self) -> Option<f64> {
        match self.status {
            ScoreStatus::Success => self.fitness,
            _ => None,
        }
    }

    pub fn diagnostics(&self) -> Option<&str> {
        self.diagnostics.as_deref()
    }

    /// Whether two scores are interchangeable for cache idempotence checks.
    ///
    /// Compares status and exact fitness bits; diagnostics are advisory and
    /// do not participate.
    pub(crate) fn agrees_with(&self, other: &Score) -> bool {
        self.status == other.status
            && self.fitness.map(f64::to_bits) == other.fitness.map(f64::to_bits)
    }
}

/// A clonable run-level cancellation flag.
///
/// Cancelling flips a shared atomic; the adapter checks it between retries
/// and while waiting on an in-flight call, and the controller checks it at
/// generation boundaries. Already-cached scores stay valid after a cancel.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals every holder of this token to stop as soon as practical.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_score_exposes_no_fitness() {
        let score = Score::failed("docking engine refused ligand");

        assert_eq!(score.status(), ScoreStatus::Failed);
        assert_eq!(score.fitness(), None);
        assert_eq!(
            score.diagnostics(),
            Some("docking engine refused ligand")
        );
    }

    #[test]
    fn test_timed_out_score_exposes_no_fitness() {
        let score = Score::timed_out();

        assert_eq!(score.status(), ScoreStatus::TimedOut);
        assert_eq!(score.fitness(), None);
    }

    #[test]
    fn test_success_score_exposes_fitness() {
        let score = Score::success(-7.25);

        assert!(score.is_success());
        assert_eq!(score.fitness(), Some(-7.25));
    }

    #[test]
    fn test_agreement_ignores_diagnostics() {
        let plain = Score::success(-7.25);
        let annotated = Score::success_with_diagnostics(-7.25, "pose 3 of 9");

        assert!(plain.agrees_with(&annotated));
        assert!(!plain.agrees_with(&Score::success(-7.3)));
        assert!(!plain.agrees_with(&Score::timed_out()));
    }

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();

        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
