//! # Reporting Boundary
//!
//! Per-generation summaries for external consumers — a CLI, telemetry, a
//! notebook. The engine computes the numbers and hands them over; it never
//! formats them for presentation.

/// Counters and best fitness for one completed generation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationSummary {
    pub generation: u32,
    /// Oracle evaluations actually performed this generation.
    pub evaluations: usize,
    /// Candidates served from the score cache instead of the oracle.
    pub cache_hits: usize,
    /// Evaluations that came back FAILED.
    pub failures: usize,
    /// Evaluations that came back TIMED_OUT.
    pub timeouts: usize,
    /// Best fitness in the population after selection, if any member
    /// scored successfully.
    pub best_fitness: Option<f64>,
    /// Population size after selection.
    pub population_size: usize,
}

/// Receives each generation's summary as the run progresses.
pub trait Reporter: Send {
    fn on_generation(&mut self, summary: &GenerationSummary);
}

impl<F> Reporter for F
where
    F: FnMut(&GenerationSummary) + Send,
{
    fn on_generation(&mut self, summary: &GenerationSummary) {
        self(summary)
    }
}
