//! Acceptance search engine for nondeterministic pushdown automata.

pub mod automaton;
pub mod batch;
pub mod configuration;
pub mod engine;
pub mod store;

pub use automaton::{compile, Automaton, Transition};
pub use batch::{batch_items, run_batch, BatchReport, BatchRow, Expectation};
pub use configuration::{Configuration, Stack};
pub use engine::{RunOutcome, SearchConfig, SearchStats, Searcher};
pub use store::ConfigStore;
