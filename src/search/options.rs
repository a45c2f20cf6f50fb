//! # SearchOptions
//!
//! Configuration for a search run: batch and population sizing, the fitness
//! direction, convergence and failure patience, and the scoring concurrency
//! limit.
//!
//! ## Example
//!
//! ```rust
//! use molsearch::search::options::SearchOptions;
//! use molsearch::selection::Objective;
//!
//! let options = SearchOptions::builder()
//!     .objective(Objective::Minimize)
//!     .batch_size(8)
//!     .population_capacity(16)
//!     .max_concurrency(4)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::{Result, SearchError};
use crate::selection::Objective;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    objective: Objective,
    batch_size: usize,
    population_capacity: usize,
    min_population: usize,
    stall_patience: u32,
    failure_patience: u32,
    max_concurrency: usize,
}

impl SearchOptions {
    /// Options with the given objective and defaults for everything else.
    ///
    /// The objective has no default: whether fitness is minimized or
    /// maximized depends entirely on the oracle, and guessing silently
    /// inverts a search.
    pub fn new(objective: Objective) -> Self {
        Self {
            objective,
            batch_size: 16,
            population_capacity: 32,
            min_population: 1,
            stall_patience: 5,
            failure_patience: 3,
            max_concurrency: 4,
        }
    }

    pub fn builder() -> SearchOptionsBuilder {
        SearchOptionsBuilder::default()
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Maximum number of new candidates requested per generation.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn population_capacity(&self) -> usize {
        self.population_capacity
    }

    /// The minimum viable population; dropping below it fails the run.
    pub fn min_population(&self) -> usize {
        self.min_population
    }

    /// Generations without best-fitness improvement before the run is
    /// declared converged.
    pub fn stall_patience(&self) -> u32 {
        self.stall_patience
    }

    /// Consecutive generations in which every oracle call failed before the
    /// run is declared failed.
    pub fn failure_patience(&self) -> u32 {
        self.failure_patience
    }

    /// Upper bound on concurrent oracle invocations, reflecting the
    /// evaluator's real resource limits (e.g. docking engine instances).
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(SearchError::Configuration(
                "batch size cannot be zero".to_string(),
            ));
        }
        if self.population_capacity == 0 {
            return Err(SearchError::Configuration(
                "population capacity cannot be zero".to_string(),
            ));
        }
        if self.min_population == 0 || self.min_population > self.population_capacity {
            return Err(SearchError::Configuration(format!(
                "minimum population must be within 1..={}, got {}",
                self.population_capacity, self.min_population
            )));
        }
        if self.stall_patience == 0 {
            return Err(SearchError::Configuration(
                "stall patience cannot be zero".to_string(),
            ));
        }
        if self.failure_patience == 0 {
            return Err(SearchError::Configuration(
                "failure patience cannot be zero".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(SearchError::Configuration(
                "max concurrency cannot be zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`SearchOptions`].
///
/// Provides a fluent interface for constructing option sets. The objective
/// is the only required field.
#[derive(Debug, Clone, Default)]
pub struct SearchOptionsBuilder {
    objective: Option<Objective>,
    batch_size: Option<usize>,
    population_capacity: Option<usize>,
    min_population: Option<usize>,
    stall_patience: Option<u32>,
    failure_patience: Option<u32>,
    max_concurrency: Option<usize>,
}

impl SearchOptionsBuilder {
    pub fn objective(mut self, value: Objective) -> Self {
        self.objective = Some(value);
        self
    }

    pub fn batch_size(mut self, value: usize) -> Self {
        self.batch_size = Some(value);
        self
    }

    pub fn population_capacity(mut self, value: usize) -> Self {
        self.population_capacity = Some(value);
        self
    }

    pub fn min_population(mut self, value: usize) -> Self {
        self.min_population = Some(value);
        self
    }

    pub fn stall_patience(mut self, value: u32) -> Self {
        self.stall_patience = Some(value);
        self
    }

    pub fn failure_patience(mut self, value: u32) -> Self {
        self.failure_patience = Some(value);
        self
    }

    pub fn max_concurrency(mut self, value: usize) -> Self {
        self.max_concurrency = Some(value);
        self
    }

    /// Builds and validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Configuration`] when the objective is missing
    /// or any value is out of range.
    pub fn build(self) -> Result<SearchOptions> {
        let objective = self.objective.ok_or_else(|| {
            SearchError::Configuration("objective not specified".to_string())
        })?;

        let mut options = SearchOptions::new(objective);
        if let Some(value) = self.batch_size {
            options.batch_size = value;
        }
        if let Some(value) = self.population_capacity {
            options.population_capacity = value;
        }
        if let Some(value) = self.min_population {
            options.min_population = value;
        }
        if let Some(value) = self.stall_patience {
            options.stall_patience = value;
        }
        if let Some(value) = self.failure_patience {
            options.failure_patience = value;
        }
        if let Some(value) = self.max_concurrency {
            options.max_concurrency = value;
        }

        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objective_is_required() {
        let result = SearchOptions::builder().batch_size(8).build();

        assert!(matches!(result, Err(SearchError::Configuration(_))));
    }

    #[test]
    fn test_defaults_are_valid() {
        let options = SearchOptions::new(Objective::Minimize);

        assert!(options.validate().is_ok());
        assert_eq!(options.batch_size(), 16);
        assert_eq!(options.population_capacity(), 32);
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let result = SearchOptions::builder()
            .objective(Objective::Minimize)
            .batch_size(0)
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_min_population_must_fit_capacity() {
        let result = SearchOptions::builder()
            .objective(Objective::Minimize)
            .population_capacity(4)
            .min_population(5)
            .build();

        assert!(result.is_err());
    }
}
