//! # Scoring Oracle Adapter
//!
//! Wraps one external oracle call with a timeout, transient-fault retries and
//! failure classification. The adapter is the only component in the engine
//! permitted to perform blocking external work, and it never raises: every
//! outcome — success, rejection, exhausted retries, timeout, cancellation —
//! comes back as a [`Score`], so oracle instability cannot unwind the search
//! loop.

use std::marker::PhantomData;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::candidate::CandidatePayload;
use crate::oracle::{CancellationToken, Evaluation, Oracle, OracleFault, Score};

/// Granularity of cancellation checks while blocked on an in-flight call or
/// a backoff sleep.
const WAIT_SLICE: Duration = Duration::from_millis(25);

/// Retry behavior for transient oracle faults.
///
/// The delay before retry `n` is `initial_backoff * 2^n`. Rejections and
/// timeouts are never retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
        }
    }

    /// No retries: every transient fault becomes a FAILED score immediately.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn backoff(&self, attempt: u32) -> Duration {
        // Saturate the shift rather than overflow on absurd attempt counts.
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

enum Outcome {
    Done(std::result::Result<Evaluation, OracleFault>),
    TimedOut,
    Cancelled,
}

/// Bounds and classifies calls to an [`Oracle`].
///
/// Each invocation runs on its own worker thread so the caller can abandon it
/// at the timeout; an abandoned call's eventual result is discarded. The
/// adapter is `Sync` and is shared across the engine's concurrent scoring
/// workers.
pub struct OracleAdapter<P, O>
where
    P: CandidatePayload,
    O: Oracle<P>,
{
    oracle: Arc<O>,
    timeout: Duration,
    retry: RetryPolicy,
    _marker: PhantomData<fn(P)>,
}

impl<P, O> OracleAdapter<P, O>
where
    P: CandidatePayload + 'static,
    O: Oracle<P> + 'static,
{
    pub fn new(oracle: O, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            oracle: Arc::new(oracle),
            timeout,
            retry,
            _marker: PhantomData,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Scores one candidate payload, absorbing every failure mode.
    ///
    /// - Transient faults are retried up to the policy's limit with
    ///   exponential backoff, then reported as FAILED.
    /// - A call still outstanding at the timeout is abandoned and reported as
    ///   TIMED_OUT.
    /// - A rejection by the oracle is reported as FAILED carrying the
    ///   oracle's message.
    /// - A non-finite fitness is reported as FAILED; NaN must not reach
    ///   selection.
    /// - Cancellation observed at any wait point stops immediately with a
    ///   FAILED score; the in-flight call is abandoned.
    pub fn score(&self, payload: &P, token: &CancellationToken) -> Score {
        let mut attempt: u32 = 0;

        loop {
            if token.is_cancelled() {
                return Score::failed("scoring cancelled before invocation");
            }

            match self.invoke_bounded(payload, token) {
                Outcome::Done(Ok(evaluation)) => {
                    if !evaluation.fitness.is_finite() {
                        return Score::failed(format!(
                            "oracle returned non-finite fitness: {}",
                            evaluation.fitness
                        ));
                    }
                    return match evaluation.diagnostics {
                        Some(diagnostics) => {
                            Score::success_with_diagnostics(evaluation.fitness, diagnostics)
                        }
                        None => Score::success(evaluation.fitness),
                    };
                }
                Outcome::Done(Err(OracleFault::Rejected(message))) => {
                    debug!(%message, "oracle rejected candidate");
                    return Score::failed(message);
                }
                Outcome::Done(Err(OracleFault::Transient(message))) => {
                    if attempt >= self.retry.max_retries() {
                        warn!(
                            attempts = attempt + 1,
                            %message,
                            "oracle retries exhausted"
                        );
                        return Score::failed(format!(
                            "transient fault persisted after {} attempts: {}",
                            attempt + 1,
                            message
                        ));
                    }
                    let delay = self.retry.backoff(attempt);
                    debug!(attempt, delay_ms = delay.as_millis() as u64, %message, "retrying oracle call");
                    if !wait_cancellable(delay, token) {
                        return Score::failed("scoring cancelled during retry backoff");
                    }
                    attempt += 1;
                }
                Outcome::TimedOut => {
                    warn!(timeout_ms = self.timeout.as_millis() as u64, "oracle call timed out");
                    return Score::timed_out();
                }
                Outcome::Cancelled => {
                    return Score::failed("scoring cancelled while waiting on oracle");
                }
            }
        }
    }

    /// Runs one oracle invocation on a worker thread, bounded by the
    /// configured timeout and the cancellation token.
    fn invoke_bounded(&self, payload: &P, token: &CancellationToken) -> Outcome {
        let (tx, rx) = mpsc::channel();
        let oracle = Arc::clone(&self.oracle);
        let payload = payload.clone();

        // Detached on purpose: a timed-out or cancelled call keeps running on
        // this thread until the oracle returns, and the send below fails into
        // the void once the receiver is gone.
        thread::spawn(move || {
            let result = oracle.invoke(&payload);
            let _ = tx.send(result);
        });

        let deadline = Instant::now() + self.timeout;
        loop {
            if token.is_cancelled() {
                return Outcome::Cancelled;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Outcome::TimedOut;
            }
            match rx.recv_timeout(remaining.min(WAIT_SLICE)) {
                Ok(result) => return Outcome::Done(result),
                Err(RecvTimeoutError::Timeout) => continue,
                // The worker panicked mid-evaluation; classify like any
                // crashed evaluator process.
                Err(RecvTimeoutError::Disconnected) => {
                    return Outcome::Done(Err(OracleFault::Transient(
                        "oracle worker terminated without a result".to_string(),
                    )))
                }
            }
        }
    }
}

/// Sleeps for `delay` in slices, returning `false` if cancellation arrives
/// before the delay elapses.
fn wait_cancellable(delay: Duration, token: &CancellationToken) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        if token.is_cancelled() {
            return false;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return true;
        }
        thread::sleep(remaining.min(WAIT_SLICE));
    }
}
