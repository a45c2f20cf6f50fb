//! # Search Controller
//!
//! The optimization loop. Each generation the controller asks the proposal
//! strategy for a batch of candidates, deduplicates them against the batch
//! and the score cache, scores only the truly novel keys through the oracle
//! adapter on a bounded worker pool, merges survivors with the population
//! under the selection policy, and evaluates termination.
//!
//! All run state — population, cache, budget, seed state — lives in one
//! controller instance; there are no process-wide singletons, and a snapshot
//! of that state is sufficient to resume the run elsewhere.

use std::collections::HashSet;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::caching::{Claim, ScoreCache};
use crate::candidate::{Candidate, CandidatePayload, CanonicalKey, LineageId};
use crate::error::{Result, SearchError};
use crate::oracle::{CancellationToken, Oracle, OracleAdapter, Score, ScoreStatus};
use crate::proposal::ProposalStrategy;
use crate::rng::RandomNumberGenerator;
use crate::search::budget::RunBudget;
use crate::search::options::SearchOptions;
use crate::search::population::{Member, Population};
use crate::search::report::{GenerationSummary, Reporter};
use crate::search::snapshot::{RunSnapshot, SeedState};
use crate::selection::SelectionStrategy;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    /// The search stopped making progress: the best fitness stalled past the
    /// configured patience, or the proposal strategy ran dry.
    Converged,
    /// The evaluation or wall-clock budget ran out.
    BudgetExhausted,
    /// The run became unviable: the population fell below its minimum size,
    /// or every oracle call failed for too many consecutive generations.
    Failed,
    /// The run was cancelled externally; outstanding oracle work was
    /// abandoned.
    Cancelled,
}

/// The report a terminated run hands back: how it ended, the best candidate
/// found, and the per-generation accounting.
#[derive(Debug)]
pub struct SearchOutcome<P: CandidatePayload> {
    pub state: TerminalState,
    pub best: Option<Member<P>>,
    pub generations: Vec<GenerationSummary>,
}

/// Drives one search run to a terminal state.
///
/// Construct through [`SearchControllerBuilder`]; one controller owns one
/// run's state from start to termination.
pub struct SearchController<P, S, K, O>
where
    P: CandidatePayload + 'static,
    S: ProposalStrategy<P>,
    K: SelectionStrategy<P>,
    O: Oracle<P> + 'static,
{
    strategy: S,
    selection: K,
    adapter: OracleAdapter<P, O>,
    options: SearchOptions,
    cache: ScoreCache,
    population: Population<P>,
    budget: RunBudget,
    base_seed: u64,
    next_generation: u32,
    seeds: Vec<P>,
    token: CancellationToken,
    reporter: Option<Box<dyn Reporter>>,
    summaries: Vec<GenerationSummary>,
    best_so_far: Option<f64>,
    stalled_generations: u32,
    failed_generations: u32,
    terminal: Option<TerminalState>,
}

impl<P, S, K, O> SearchController<P, S, K, O>
where
    P: CandidatePayload + 'static,
    S: ProposalStrategy<P>,
    K: SelectionStrategy<P>,
    O: Oracle<P> + 'static,
{
    /// A clone of the run's cancellation token, for handing to another
    /// thread or a signal handler.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn population(&self) -> &Population<P> {
        &self.population
    }

    pub fn cache(&self) -> &ScoreCache {
        &self.cache
    }

    pub fn budget(&self) -> &RunBudget {
        &self.budget
    }

    /// Captures {population, cache, budget, seed state} for external
    /// persistence. Valid at any generation boundary, including after
    /// termination.
    pub fn snapshot(&self) -> RunSnapshot<P> {
        RunSnapshot {
            population: self.population.members().to_vec(),
            cache: self.cache.entries(),
            budget: self.budget.clone(),
            seed: SeedState {
                base_seed: self.base_seed,
                next_generation: self.next_generation,
            },
        }
    }

    /// Runs generations until a terminal state is reached.
    ///
    /// # Errors
    ///
    /// Hard failures only: representation violations from a proposal
    /// strategy, cache consistency violations (a non-deterministic oracle),
    /// or a controller misuse such as running twice. Oracle failures and
    /// timeouts never surface here; they are absorbed into candidate scores.
    pub fn run(&mut self) -> Result<SearchOutcome<P>> {
        if let Some(state) = self.terminal {
            return Err(SearchError::Configuration(format!(
                "run already terminated as {:?}",
                state
            )));
        }

        let scoring_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.max_concurrency())
            .build()
            .map_err(|e| {
                SearchError::Configuration(format!("failed to build scoring pool: {}", e))
            })?;

        let deadline = self
            .budget
            .wall_clock()
            .map(|allowance| Instant::now() + allowance);

        info!(
            seed = self.base_seed,
            generation = self.next_generation,
            budget = self.budget.remaining_evaluations(),
            "starting search run"
        );

        loop {
            if self.token.is_cancelled() {
                return Ok(self.finish(TerminalState::Cancelled));
            }
            if self.budget.is_exhausted() {
                return Ok(self.finish(TerminalState::BudgetExhausted));
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Ok(self.finish(TerminalState::BudgetExhausted));
                }
            }

            let generation = self.next_generation;
            let mut rng =
                RandomNumberGenerator::from_seed(self.base_seed.wrapping_add(generation as u64));

            // Step 1: propose. The seed designs are generation zero's batch.
            let payloads = if generation == 0 && !self.seeds.is_empty() {
                std::mem::take(&mut self.seeds)
            } else {
                self.strategy
                    .propose(&self.population, self.options.batch_size(), &mut rng)?
            };
            if payloads.is_empty() {
                debug!(generation, "proposal strategy returned no candidates");
                return Ok(self.finish(TerminalState::Converged));
            }

            // Step 2: canonicalize and deduplicate within the batch.
            let mut batch: Vec<Candidate<P>> = Vec::with_capacity(payloads.len());
            let mut batch_keys: HashSet<CanonicalKey> = HashSet::with_capacity(payloads.len());
            for payload in payloads {
                let candidate =
                    Candidate::new(payload, LineageId::new(generation, batch.len() as u32))?;
                if batch_keys.insert(candidate.key().clone()) {
                    batch.push(candidate);
                }
            }

            // Step 3: consult the cache; only truly novel keys may reach the
            // oracle.
            let mut hits: Vec<(Candidate<P>, Score)> = Vec::new();
            let mut novel = Vec::new();
            for candidate in batch {
                match self.cache.claim(candidate.key()) {
                    Claim::Cached(score) => hits.push((candidate, score)),
                    Claim::Miss(guard) => novel.push((candidate, guard)),
                }
            }
            let cache_hits = hits.len();

            // Novel keys beyond the remaining budget are not scored this
            // run; dropping their guards releases the reservations.
            let allowance = self.budget.remaining_evaluations().min(novel.len());
            let spilled = novel.split_off(allowance);
            if !spilled.is_empty() {
                debug!(
                    generation,
                    spilled = spilled.len(),
                    "evaluation budget truncated the novel batch"
                );
            }
            drop(spilled);

            // Step 4: score novel candidates concurrently, bounded by the
            // scoring pool. Selection waits on the whole batch; the run
            // never advances with partially scored candidates.
            let adapter = &self.adapter;
            let token = &self.token;
            let outcomes: Result<Vec<Option<(Candidate<P>, Score)>>> = scoring_pool.install(|| {
                novel
                    .into_par_iter()
                    .map(|(candidate, guard)| {
                        if token.is_cancelled() {
                            return Ok(None);
                        }
                        let score = adapter.score(candidate.payload(), token);
                        if token.is_cancelled() {
                            // Results arriving after cancellation are
                            // discarded, not cached.
                            return Ok(None);
                        }
                        guard.complete(score.clone())?;
                        Ok(Some((candidate, score)))
                    })
                    .collect()
            });
            let evaluated: Vec<(Candidate<P>, Score)> =
                outcomes?.into_iter().flatten().collect();

            let evaluations = evaluated.len();
            self.budget.consume(evaluations);

            if self.token.is_cancelled() {
                return Ok(self.finish(TerminalState::Cancelled));
            }

            let failures = evaluated
                .iter()
                .filter(|(_, score)| score.status() == ScoreStatus::Failed)
                .count();
            let timeouts = evaluated
                .iter()
                .filter(|(_, score)| score.status() == ScoreStatus::TimedOut)
                .count();

            // Step 5: merge survivors with the population and select. On a
            // key collision the earliest admission wins, so retained members
            // outrank regenerated copies of themselves.
            let mut merged: Vec<Member<P>> = Vec::new();
            let mut merged_keys: HashSet<CanonicalKey> = HashSet::new();
            let incoming = hits.into_iter().chain(evaluated);
            for member in self
                .population
                .members()
                .iter()
                .cloned()
                .chain(incoming.map(|(candidate, score)| Member { candidate, score }))
            {
                if !member.score.is_success() {
                    continue;
                }
                if merged_keys.insert(member.candidate.key().clone()) {
                    merged.push(member);
                }
            }

            let survivors = if merged.is_empty() {
                Vec::new()
            } else {
                self.selection.select(
                    &merged,
                    self.options.population_capacity(),
                    self.options.objective(),
                    Some(&mut rng),
                )?
            };
            self.population.replace(survivors)?;

            // Step 6: account and report.
            let best_fitness = self
                .population
                .best(self.options.objective())
                .and_then(|member| member.score.fitness());
            let summary = GenerationSummary {
                generation,
                evaluations,
                cache_hits,
                failures,
                timeouts,
                best_fitness,
                population_size: self.population.len(),
            };
            info!(
                generation,
                evaluations,
                cache_hits,
                failures,
                timeouts,
                best = ?best_fitness,
                "generation complete"
            );
            if let Some(reporter) = self.reporter.as_mut() {
                reporter.on_generation(&summary);
            }
            self.summaries.push(summary);
            self.next_generation += 1;

            // Step 7: progress tracking.
            match (best_fitness, self.best_so_far) {
                (Some(current), Some(incumbent))
                    if self.options.objective().is_improvement(current, incumbent) =>
                {
                    self.best_so_far = Some(current);
                    self.stalled_generations = 0;
                }
                (Some(current), None) => {
                    self.best_so_far = Some(current);
                    self.stalled_generations = 0;
                }
                _ => self.stalled_generations += 1,
            }

            if evaluations > 0 {
                if failures + timeouts == evaluations {
                    self.failed_generations += 1;
                } else {
                    self.failed_generations = 0;
                }
            }

            // Step 8: termination. Budget outranks failure outranks
            // convergence.
            if self.budget.is_exhausted() {
                return Ok(self.finish(TerminalState::BudgetExhausted));
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Ok(self.finish(TerminalState::BudgetExhausted));
                }
            }
            if self.population.len() < self.options.min_population() {
                warn!(
                    generation,
                    population = self.population.len(),
                    minimum = self.options.min_population(),
                    "population fell below its minimum viable size"
                );
                return Ok(self.finish(TerminalState::Failed));
            }
            if self.failed_generations >= self.options.failure_patience() {
                warn!(
                    generation,
                    consecutive = self.failed_generations,
                    "every oracle call failed for too many consecutive generations"
                );
                return Ok(self.finish(TerminalState::Failed));
            }
            if self.stalled_generations >= self.options.stall_patience() {
                return Ok(self.finish(TerminalState::Converged));
            }
        }
    }

    fn finish(&mut self, state: TerminalState) -> SearchOutcome<P> {
        info!(
            ?state,
            generations = self.summaries.len(),
            cached = self.cache.len(),
            "search run terminated"
        );
        self.terminal = Some(state);
        SearchOutcome {
            state,
            best: self.population.best(self.options.objective()).cloned(),
            generations: self.summaries.clone(),
        }
    }
}

/// Builder for [`SearchController`].
///
/// A fresh run needs a strategy, a selection policy, an adapter, options, a
/// budget, an RNG seed and at least one seed design. A resumed run replaces
/// the budget/seed/seed-designs triple with a [`RunSnapshot`].
pub struct SearchControllerBuilder<P, S, K, O>
where
    P: CandidatePayload + 'static,
    S: ProposalStrategy<P>,
    K: SelectionStrategy<P>,
    O: Oracle<P> + 'static,
{
    strategy: Option<S>,
    selection: Option<K>,
    adapter: Option<OracleAdapter<P, O>>,
    options: Option<SearchOptions>,
    budget: Option<RunBudget>,
    seeds: Vec<P>,
    rng_seed: u64,
    token: Option<CancellationToken>,
    reporter: Option<Box<dyn Reporter>>,
    snapshot: Option<RunSnapshot<P>>,
}

impl<P, S, K, O> SearchControllerBuilder<P, S, K, O>
where
    P: CandidatePayload + 'static,
    S: ProposalStrategy<P>,
    K: SelectionStrategy<P>,
    O: Oracle<P> + 'static,
{
    pub fn new() -> Self {
        Self {
            strategy: None,
            selection: None,
            adapter: None,
            options: None,
            budget: None,
            seeds: Vec::new(),
            rng_seed: 0,
            token: None,
            reporter: None,
            snapshot: None,
        }
    }

    pub fn with_strategy(mut self, strategy: S) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_selection(mut self, selection: K) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn with_adapter(mut self, adapter: OracleAdapter<P, O>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_budget(mut self, budget: RunBudget) -> Self {
        self.budget = Some(budget);
        self
    }

    /// The initial designs scored in generation zero.
    pub fn with_seeds(mut self, seeds: Vec<P>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Resumes from a previously captured snapshot instead of starting
    /// fresh. Mutually exclusive with seeds and an explicit budget.
    pub fn restore(mut self, snapshot: RunSnapshot<P>) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn build(self) -> Result<SearchController<P, S, K, O>> {
        let strategy = self.strategy.ok_or_else(|| {
            SearchError::Configuration("proposal strategy not specified".to_string())
        })?;
        let selection = self.selection.ok_or_else(|| {
            SearchError::Configuration("selection strategy not specified".to_string())
        })?;
        let adapter = self.adapter.ok_or_else(|| {
            SearchError::Configuration("oracle adapter not specified".to_string())
        })?;
        let options = self
            .options
            .ok_or_else(|| SearchError::Configuration("options not specified".to_string()))?;
        options.validate()?;

        let (population, cache, budget, base_seed, next_generation, seeds) =
            match self.snapshot {
                Some(snapshot) => {
                    if !self.seeds.is_empty() {
                        return Err(SearchError::Configuration(
                            "seed designs cannot be combined with a snapshot restore".to_string(),
                        ));
                    }
                    if self.budget.is_some() {
                        return Err(SearchError::Configuration(
                            "an explicit budget cannot be combined with a snapshot restore"
                                .to_string(),
                        ));
                    }
                    (
                        Population::from_members(
                            snapshot.population,
                            options.population_capacity(),
                        )?,
                        ScoreCache::from_entries(snapshot.cache),
                        snapshot.budget,
                        snapshot.seed.base_seed,
                        snapshot.seed.next_generation,
                        Vec::new(),
                    )
                }
                None => {
                    if self.seeds.is_empty() {
                        return Err(SearchError::Configuration(
                            "at least one seed design is required".to_string(),
                        ));
                    }
                    let budget = self.budget.ok_or_else(|| {
                        SearchError::Configuration("run budget not specified".to_string())
                    })?;
                    (
                        Population::new(options.population_capacity())?,
                        ScoreCache::new(),
                        budget,
                        self.rng_seed,
                        0,
                        self.seeds,
                    )
                }
            };

        Ok(SearchController {
            strategy,
            selection,
            adapter,
            options,
            cache,
            population,
            budget,
            base_seed,
            next_generation,
            seeds,
            token: self.token.unwrap_or_default(),
            reporter: self.reporter,
            summaries: Vec::new(),
            best_so_far: None,
            stalled_generations: 0,
            failed_generations: 0,
            terminal: None,
        })
    }
}

impl<P, S, K, O> Default for SearchControllerBuilder<P, S, K, O>
where
    P: CandidatePayload + 'static,
    S: ProposalStrategy<P>,
    K: SelectionStrategy<P>,
    O: Oracle<P> + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::SequenceDesign;
    use crate::oracle::{Evaluation, OracleFault, RetryPolicy};
    use crate::proposal::PointMutationStrategy;
    use crate::selection::{Objective, TopKSelection};
    use std::time::Duration;

    struct LengthOracle;

    impl Oracle<SequenceDesign> for LengthOracle {
        fn invoke(
            &self,
            payload: &SequenceDesign,
        ) -> std::result::Result<Evaluation, OracleFault> {
            Ok(Evaluation::new(payload.len() as f64))
        }
    }

    fn builder() -> SearchControllerBuilder<
        SequenceDesign,
        PointMutationStrategy,
        TopKSelection,
        LengthOracle,
    > {
        SearchControllerBuilder::new()
            .with_strategy(PointMutationStrategy::new())
            .with_selection(TopKSelection::new())
            .with_adapter(OracleAdapter::new(
                LengthOracle,
                Duration::from_secs(1),
                RetryPolicy::none(),
            ))
            .with_options(
                SearchOptions::builder()
                    .objective(Objective::Minimize)
                    .batch_size(4)
                    .population_capacity(4)
                    .build()
                    .unwrap(),
            )
    }

    #[test]
    fn test_build_requires_seeds() {
        let result = builder().with_budget(RunBudget::evaluations(10)).build();

        assert!(matches!(result, Err(SearchError::Configuration(_))));
    }

    #[test]
    fn test_build_requires_budget() {
        let result = builder()
            .with_seeds(vec![SequenceDesign::new("MKVLA")])
            .build();

        assert!(matches!(result, Err(SearchError::Configuration(_))));
    }

    #[test]
    fn test_run_twice_is_rejected() {
        let mut controller = builder()
            .with_seeds(vec![SequenceDesign::new("MKVLA")])
            .with_budget(RunBudget::evaluations(5))
            .build()
            .unwrap();

        controller.run().unwrap();
        assert!(controller.run().is_err());
    }

    #[test]
    fn test_snapshot_captures_budget_and_seed_state() {
        let mut controller = builder()
            .with_seeds(vec![SequenceDesign::new("MKVLA")])
            .with_budget(RunBudget::evaluations(3))
            .with_rng_seed(42)
            .build()
            .unwrap();

        let outcome = controller.run().unwrap();
        assert_eq!(outcome.state, TerminalState::BudgetExhausted);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.seed.base_seed, 42);
        assert!(snapshot.seed.next_generation > 0);
        assert_eq!(snapshot.budget.remaining_evaluations(), 0);
        assert_eq!(snapshot.cache.len(), 3);
    }
}
