use molsearch::candidate::SequenceDesign;
use molsearch::oracle::{Evaluation, Oracle, OracleAdapter, OracleFault, RetryPolicy};
use molsearch::proposal::PointMutationStrategy;
use molsearch::search::{
    RunBudget, RunSnapshot, SearchControllerBuilder, SearchOptions, SearchOutcome, TerminalState,
};
use molsearch::selection::{Objective, TopKSelection};
use std::time::Duration;

struct DistanceOracle {
    target: &'static str,
}

impl Oracle<SequenceDesign> for DistanceOracle {
    fn invoke(&self, payload: &SequenceDesign) -> std::result::Result<Evaluation, OracleFault> {
        let distance = payload
            .sequence()
            .to_ascii_uppercase()
            .chars()
            .zip(self.target.chars())
            .filter(|(a, b)| a != b)
            .count();
        Ok(Evaluation::new(distance as f64))
    }
}

type Controller = molsearch::search::SearchController<
    SequenceDesign,
    PointMutationStrategy,
    TopKSelection,
    DistanceOracle,
>;

fn builder() -> SearchControllerBuilder<
    SequenceDesign,
    PointMutationStrategy,
    TopKSelection,
    DistanceOracle,
> {
    SearchControllerBuilder::new()
        .with_strategy(PointMutationStrategy::new())
        .with_selection(TopKSelection::new())
        .with_adapter(OracleAdapter::new(
            DistanceOracle { target: "MKVLAT" },
            Duration::from_secs(5),
            RetryPolicy::none(),
        ))
        .with_options(
            SearchOptions::builder()
                .objective(Objective::Minimize)
                .batch_size(4)
                .population_capacity(4)
                .stall_patience(20)
                .build()
                .unwrap(),
        )
        .with_rng_seed(7)
}

fn fresh_controller(budget: usize) -> Controller {
    builder()
        .with_budget(RunBudget::evaluations(budget))
        .with_seeds(vec![SequenceDesign::new("AAAAAA")])
        .build()
        .unwrap()
}

fn best_key(outcome: &SearchOutcome<SequenceDesign>) -> String {
    outcome
        .best
        .as_ref()
        .expect("run retains a best member")
        .candidate
        .key()
        .as_str()
        .to_string()
}

#[test]
fn test_identical_seeds_reproduce_identical_runs() {
    let mut first = fresh_controller(20);
    let mut second = fresh_controller(20);

    let outcome_a = first.run().unwrap();
    let outcome_b = second.run().unwrap();

    assert_eq!(outcome_a.state, outcome_b.state);
    assert_eq!(outcome_a.generations, outcome_b.generations);
    assert_eq!(best_key(&outcome_a), best_key(&outcome_b));
}

#[test]
fn test_restored_runs_reproduce_identical_generations() {
    // Drive a run to budget exhaustion, then snapshot it.
    let mut original = fresh_controller(12);
    let outcome = original.run().unwrap();
    assert_eq!(outcome.state, TerminalState::BudgetExhausted);

    let mut snapshot = original.snapshot();
    assert_eq!(snapshot.seed.base_seed, 7);
    assert_eq!(snapshot.budget.remaining_evaluations(), 0);

    // Grant the resumed run a fresh allowance and restore it twice.
    snapshot.budget = RunBudget::evaluations(12);

    let run_resumed = |snapshot: RunSnapshot<SequenceDesign>| {
        let mut controller = builder().restore(snapshot).build().unwrap();
        controller.run().unwrap()
    };

    let resumed_a = run_resumed(snapshot.clone());
    let resumed_b = run_resumed(snapshot.clone());

    // Byte-identical subsequent generations: same summaries, same best.
    assert_eq!(resumed_a.generations, resumed_b.generations);
    assert_eq!(best_key(&resumed_a), best_key(&resumed_b));

    // Generation numbering continues where the original run stopped.
    assert_eq!(
        resumed_a.generations.first().unwrap().generation,
        snapshot.seed.next_generation
    );

    // The restored cache already covers everything the original scored, so
    // a regenerated ancestor never costs a second oracle call.
    let already_scored = snapshot.cache.len();
    assert!(already_scored > 0);
}

#[test]
fn test_restore_rejects_conflicting_inputs() {
    let mut original = fresh_controller(6);
    original.run().unwrap();
    let snapshot = original.snapshot();

    let with_seeds = builder()
        .restore(snapshot.clone())
        .with_seeds(vec![SequenceDesign::new("CCCCCC")])
        .build();
    assert!(with_seeds.is_err());

    let with_budget = builder()
        .restore(snapshot)
        .with_budget(RunBudget::evaluations(5))
        .build();
    assert!(with_budget.is_err());
}

#[cfg(feature = "serde")]
#[test]
fn test_snapshot_serializes_round_trip() {
    let mut original = fresh_controller(8);
    original.run().unwrap();
    let snapshot = original.snapshot();

    let encoded = serde_json::to_string(&snapshot).unwrap();
    let decoded: RunSnapshot<SequenceDesign> = serde_json::from_str(&encoded).unwrap();

    assert_eq!(decoded.seed, snapshot.seed);
    assert_eq!(
        decoded.budget.remaining_evaluations(),
        snapshot.budget.remaining_evaluations()
    );
    assert_eq!(decoded.cache.len(), snapshot.cache.len());
    assert_eq!(decoded.population.len(), snapshot.population.len());
    for (restored, original) in decoded.population.iter().zip(snapshot.population.iter()) {
        assert_eq!(restored.candidate.key(), original.candidate.key());
        assert_eq!(restored.score, original.score);
    }
}
