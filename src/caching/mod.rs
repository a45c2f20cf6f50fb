//! # Score Cache
//!
//! Memoizes oracle results keyed by canonical candidate key. Docking-style
//! evaluation dominates the cost of a run, and mutation-based search
//! regenerates ancestors constantly, so a scored key must never be paid for
//! twice.
//!
//! The cache enforces that invariant even under concurrent scoring through a
//! single-flight claim protocol: the first claimant of an unscored key
//! receives a [`FlightGuard`] and performs the evaluation; any concurrent
//! claimant of the same key blocks until the guard publishes and then
//! receives the same score. Entries are append-only for the life of a run —
//! a SUCCESS score can never be replaced by a different value — unless
//! explicitly removed with [`ScoreCache::invalidate`].

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

use crate::candidate::CanonicalKey;
use crate::error::{Result, SearchError};
use crate::oracle::Score;

#[derive(Debug)]
struct Flight {
    result: Mutex<Option<Score>>,
    ready: Condvar,
}

impl Flight {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn publish(&self, score: Score) {
        let mut result = self.result.lock().unwrap();
        if result.is_none() {
            *result = Some(score);
        }
        self.ready.notify_all();
    }

    fn wait(&self) -> Score {
        let mut result = self.result.lock().unwrap();
        loop {
            if let Some(score) = result.as_ref() {
                return score.clone();
            }
            result = self.ready.wait(result).unwrap();
        }
    }
}

#[derive(Debug)]
enum Slot {
    /// An evaluation is in flight; waiters park on the flight's condvar.
    Pending(Arc<Flight>),
    Ready(Score),
}

type SlotMap = Arc<Mutex<HashMap<CanonicalKey, Slot>>>;

/// The outcome of [`ScoreCache::claim`].
#[derive(Debug)]
pub enum Claim {
    /// The key is already scored (or another claimant just scored it); no
    /// oracle call is needed.
    Cached(Score),
    /// The key is novel and this claimant owns the evaluation. Exactly one
    /// `Miss` is handed out per unscored key at a time.
    Miss(FlightGuard),
}

/// Exclusive permission to evaluate one canonical key.
///
/// Call [`complete`](FlightGuard::complete) with the oracle's score to
/// publish it to the cache and to every waiter. Dropping the guard without
/// completing releases the reservation and wakes waiters with a FAILED
/// score, so an abandoned evaluation never deadlocks the run.
#[derive(Debug)]
pub struct FlightGuard {
    slots: SlotMap,
    flight: Arc<Flight>,
    key: CanonicalKey,
    completed: bool,
}

impl FlightGuard {
    pub fn key(&self) -> &CanonicalKey {
        &self.key
    }

    /// Publishes the score for this key.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::CacheConsistency`] if the key somehow already
    /// holds a SUCCESS score that disagrees with `score`.
    pub fn complete(mut self, score: Score) -> Result<()> {
        store(&self.slots, &self.key, score.clone())?;
        self.flight.publish(score);
        self.completed = true;
        Ok(())
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        // Release the reservation so the key can be claimed again later,
        // then unblock anyone parked on this flight.
        let mut slots = self.slots.lock().unwrap();
        let owns_reservation = matches!(
            slots.get(&self.key),
            Some(Slot::Pending(flight)) if Arc::ptr_eq(flight, &self.flight)
        );
        if owns_reservation {
            slots.remove(&self.key);
        }
        drop(slots);
        self.flight.publish(Score::failed("scoring abandoned"));
    }
}

fn store(slots: &SlotMap, key: &CanonicalKey, score: Score) -> Result<()> {
    let mut slots = slots.lock().unwrap();
    let pending = match slots.get(key) {
        Some(Slot::Ready(previous)) if previous.is_success() => {
            if previous.agrees_with(&score) {
                return Ok(());
            }
            return Err(SearchError::CacheConsistency {
                key: key.to_string(),
                cached: previous.fitness().unwrap_or(f64::NAN),
                offered: score.fitness().unwrap_or(f64::NAN),
            });
        }
        Some(Slot::Pending(flight)) => Some(Arc::clone(flight)),
        _ => None,
    };
    slots.insert(key.clone(), Slot::Ready(score.clone()));
    drop(slots);
    if let Some(flight) = pending {
        flight.publish(score);
    }
    Ok(())
}

/// Shared, mutex-guarded map from canonical key to [`Score`].
///
/// Clones share the same underlying map, so one cache handle can be consulted
/// by every scoring worker in a generation.
#[derive(Debug, Clone, Default)]
pub struct ScoreCache {
    slots: SlotMap,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache pre-populated with previously scored entries, e.g.
    /// when restoring a run from a snapshot.
    pub fn from_entries(entries: impl IntoIterator<Item = (CanonicalKey, Score)>) -> Self {
        let slots = entries
            .into_iter()
            .map(|(key, score)| (key, Slot::Ready(score)))
            .collect();
        Self {
            slots: Arc::new(Mutex::new(slots)),
        }
    }

    /// Looks up the score for `key` without side effects.
    pub fn get(&self, key: &CanonicalKey) -> Option<Score> {
        match self.slots.lock().unwrap().get(key) {
            Some(Slot::Ready(score)) => Some(score.clone()),
            _ => None,
        }
    }

    /// Whether `key` holds a completed score.
    pub fn contains(&self, key: &CanonicalKey) -> bool {
        matches!(self.slots.lock().unwrap().get(key), Some(Slot::Ready(_)))
    }

    /// Inserts a score for `key`.
    ///
    /// Re-putting an identical SUCCESS score is a no-op. Non-SUCCESS entries
    /// may be overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::CacheConsistency`] when `key` already holds a
    /// SUCCESS score that disagrees with `score`; a scoring oracle must be
    /// deterministic within a run.
    pub fn put(&self, key: &CanonicalKey, score: Score) -> Result<()> {
        store(&self.slots, key, score)
    }

    /// Claims `key` for evaluation.
    ///
    /// Returns [`Claim::Cached`] when the key is scored or once a concurrent
    /// claimant finishes scoring it; returns [`Claim::Miss`] with the
    /// exclusive [`FlightGuard`] when this caller must perform the
    /// evaluation.
    pub fn claim(&self, key: &CanonicalKey) -> Claim {
        let flight = {
            let mut slots = self.slots.lock().unwrap();
            match slots.entry(key.clone()) {
                Entry::Occupied(entry) => match entry.get() {
                    Slot::Ready(score) => return Claim::Cached(score.clone()),
                    Slot::Pending(flight) => Arc::clone(flight),
                },
                Entry::Vacant(entry) => {
                    let flight = Arc::new(Flight::new());
                    entry.insert(Slot::Pending(Arc::clone(&flight)));
                    return Claim::Miss(FlightGuard {
                        slots: Arc::clone(&self.slots),
                        flight,
                        key: key.clone(),
                        completed: false,
                    });
                }
            }
        };
        // Another claimant owns the evaluation; park until it publishes.
        Claim::Cached(flight.wait())
    }

    /// Removes a completed entry, allowing the key to be rescored. This is
    /// the only sanctioned way to re-evaluate a key within a run.
    pub fn invalidate(&self, key: &CanonicalKey) -> bool {
        let mut slots = self.slots.lock().unwrap();
        if matches!(slots.get(key), Some(Slot::Ready(_))) {
            slots.remove(key);
            true
        } else {
            false
        }
    }

    /// Number of completed entries.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exports all completed entries, e.g. for a run snapshot.
    pub fn entries(&self) -> Vec<(CanonicalKey, Score)> {
        self.slots
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Ready(score) => Some((key.clone(), score.clone())),
                Slot::Pending(_) => None,
            })
            .collect()
    }
}
