//! Batch evaluation of expected-accept and expected-reject string lists.

use crate::automaton::Automaton;
use crate::engine::{SearchConfig, SearchStats, Searcher};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Whether a batch string is expected to be accepted or rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Expectation {
    Accept,
    Reject,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Accept => write!(f, "accept"),
            Expectation::Reject => write!(f, "reject"),
        }
    }
}

/// Result row for one input string.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRow {
    /// The input string as read from the batch file.
    pub input: String,
    /// What the batch file claims about this string.
    pub expected: Expectation,
    /// Outcome label: `accepted`, `rejected`, or a truncation label.
    pub outcome: String,
    /// Boolean verdict of the search.
    pub accepted: bool,
    /// False when the search hit a resource ceiling instead of finishing.
    pub conclusive: bool,
    /// Whether the verdict matches the expectation.
    pub pass: bool,
    pub stats: SearchStats,
}

/// Report over both batch lists.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub rows: Vec<BatchRow>,
    pub passed: usize,
    pub failed: usize,
    /// Rows whose search hit a resource ceiling.
    pub truncated: usize,
}

impl BatchReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Pair accept-expected and reject-expected string lists into batch items.
pub fn batch_items(accept: &[String], reject: &[String]) -> Vec<(String, Expectation)> {
    accept
        .iter()
        .map(|s| (s.clone(), Expectation::Accept))
        .chain(reject.iter().map(|s| (s.clone(), Expectation::Reject)))
        .collect()
}

/// Run one search per item over a shared automaton.
///
/// Every search gets fresh per-run state, so items are independent; with
/// `parallel` they are distributed across the rayon pool, and verdicts are
/// identical either way.
pub fn run_batch(
    automaton: &Automaton,
    items: &[(String, Expectation)],
    config: &SearchConfig,
    parallel: bool,
) -> BatchReport {
    let searcher = Searcher::new(automaton, config.clone());
    let eval = |(input, expected): &(String, Expectation)| -> BatchRow {
        let outcome = searcher.run(input);
        let accepted = outcome.accepted();
        BatchRow {
            input: input.clone(),
            expected: *expected,
            outcome: outcome.label().to_string(),
            accepted,
            conclusive: outcome.conclusive(),
            pass: accepted == (*expected == Expectation::Accept),
            stats: *outcome.stats(),
        }
    };

    let rows: Vec<BatchRow> = if parallel {
        items.par_iter().map(eval).collect()
    } else {
        items.iter().map(eval).collect()
    };

    let passed = rows.iter().filter(|row| row.pass).count();
    let truncated = rows.iter().filter(|row| !row.conclusive).count();
    let report = BatchReport {
        failed: rows.len() - passed,
        passed,
        truncated,
        rows,
    };
    info!(
        passed = report.passed,
        failed = report.failed,
        truncated = report.truncated,
        "batch complete"
    );
    report
}
