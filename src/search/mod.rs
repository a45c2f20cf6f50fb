pub mod budget;
pub mod controller;
pub mod options;
pub mod population;
pub mod report;
pub mod snapshot;

pub use budget::RunBudget;
pub use controller::{SearchController, SearchControllerBuilder, SearchOutcome, TerminalState};
pub use options::{SearchOptions, SearchOptionsBuilder};
pub use population::{Member, Population};
pub use report::{GenerationSummary, Reporter};
pub use snapshot::{RunSnapshot, SeedState};
