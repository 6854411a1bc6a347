//! Depth-first acceptance search over the configuration graph.

use crate::automaton::Automaton;
use crate::configuration::Configuration;
use crate::store::ConfigStore;
use memory_stats::memory_stats;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Returns current process memory usage in MB, or None if unavailable.
fn current_memory_mb() -> Option<usize> {
    memory_stats().map(|stats| stats.physical_mem / (1024 * 1024))
}

/// How often (in expanded configurations) the deadline and memory probes run.
const LIMIT_CHECK_INTERVAL: usize = 1024;

/// Resource ceilings for one search. Zero means unlimited, and the default
/// is unlimited everywhere.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Maximum number of distinct configurations to expand.
    pub max_configs: usize,
    /// Maximum path depth to expand beyond.
    pub max_depth: usize,
    /// Wall-clock budget in seconds.
    pub max_time_secs: u64,
    /// Process physical-memory ceiling in MB.
    pub memory_limit_mb: usize,
}

/// Counters from one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Distinct configurations expanded.
    pub configs_explored: usize,
    /// Deepest path expanded.
    pub max_depth: usize,
}

/// Result of one acceptance search.
///
/// The boolean answer is `accepted()`; everything except `Accepted` answers
/// false. The truncated variants answer false without having exhausted the
/// reachable space, so they are reported distinctly from `Rejected`.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// A witness was found: the input is accepted.
    Accepted {
        /// Configurations from the start to the accepting one.
        trace: Vec<Configuration>,
        stats: SearchStats,
    },
    /// Every reachable configuration was expanded and none accepted.
    Rejected { stats: SearchStats },
    /// Stopped at the configuration ceiling.
    ConfigLimitReached { stats: SearchStats },
    /// Exhausted the depth-clipped region without a witness; deeper
    /// configurations were never examined.
    DepthLimitReached { stats: SearchStats },
    /// Stopped at the wall-clock deadline.
    TimeLimitReached { stats: SearchStats },
    /// Stopped at the memory ceiling.
    MemoryLimitReached { stats: SearchStats, memory_mb: usize },
}

impl RunOutcome {
    /// Whether a witness was found.
    pub fn accepted(&self) -> bool {
        matches!(self, RunOutcome::Accepted { .. })
    }

    /// Whether the verdict is final: a witness, or a rejection with the
    /// whole reachable space exhausted. Truncated outcomes are not
    /// conclusive.
    pub fn conclusive(&self) -> bool {
        matches!(self, RunOutcome::Accepted { .. } | RunOutcome::Rejected { .. })
    }

    /// Search counters.
    pub fn stats(&self) -> &SearchStats {
        match self {
            RunOutcome::Accepted { stats, .. }
            | RunOutcome::Rejected { stats }
            | RunOutcome::ConfigLimitReached { stats }
            | RunOutcome::DepthLimitReached { stats }
            | RunOutcome::TimeLimitReached { stats }
            | RunOutcome::MemoryLimitReached { stats, .. } => stats,
        }
    }

    /// Short label for tables and logs.
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Accepted { .. } => "accepted",
            RunOutcome::Rejected { .. } => "rejected",
            RunOutcome::ConfigLimitReached { .. } => "config limit",
            RunOutcome::DepthLimitReached { .. } => "depth limit",
            RunOutcome::TimeLimitReached { .. } => "time limit",
            RunOutcome::MemoryLimitReached { .. } => "memory limit",
        }
    }
}

/// Worklist entry: a configuration awaiting expansion.
struct WorkItem {
    config: Configuration,
    parent: Option<usize>,
    depth: usize,
}

/// Acceptance searcher over a shared automaton.
///
/// Every run gets fresh per-run state (store, worklist); nothing carries
/// over between inputs, and the automaton is only ever borrowed.
pub struct Searcher<'a> {
    automaton: &'a Automaton,
    config: SearchConfig,
}

impl<'a> Searcher<'a> {
    pub fn new(automaton: &'a Automaton, config: SearchConfig) -> Self {
        Self { automaton, config }
    }

    /// Boolean view of [`run`](Self::run).
    pub fn accepts(&self, input: &str) -> bool {
        self.run(input).accepted()
    }

    /// Decide acceptance of `input`, with witness and statistics.
    pub fn run(&self, input: &str) -> RunOutcome {
        let symbols: Vec<char> = input.chars().collect();
        self.run_symbols(&symbols)
    }

    /// As [`run`](Self::run), over an already decoded symbol sequence.
    ///
    /// Depth-first: the worklist is a heap-allocated stack, and successors
    /// are pushed in reverse table order so the first-listed transition is
    /// expanded first, matching the recursive formulation. The first
    /// accepting configuration ends the whole search.
    pub fn run_symbols(&self, input: &[char]) -> RunOutcome {
        let deadline = (self.config.max_time_secs > 0)
            .then(|| Instant::now() + Duration::from_secs(self.config.max_time_secs));
        debug!(symbols = input.len(), "starting acceptance search");

        let mut store = ConfigStore::new();
        let mut worklist = vec![WorkItem {
            config: self.automaton.start_config(),
            parent: None,
            depth: 0,
        }];
        let mut max_depth = 0usize;
        let mut depth_clipped = false;

        while let Some(item) = worklist.pop() {
            let depth = item.depth;
            // Revisits are implicit dead ends. The store is the sole
            // termination guarantee on cyclic configuration graphs.
            let Some(id) = store.insert(item.config, item.parent) else {
                continue;
            };
            max_depth = max_depth.max(depth);

            let current = store.get(id);
            if self.automaton.is_accepting(current, input) {
                let stats = SearchStats {
                    configs_explored: store.len(),
                    max_depth,
                };
                debug!(configs = stats.configs_explored, depth, "witness found");
                return RunOutcome::Accepted {
                    trace: store.trace_to(id),
                    stats,
                };
            }

            if self.config.max_configs > 0 && store.len() >= self.config.max_configs {
                info!(configs = store.len(), "reached configuration limit");
                return RunOutcome::ConfigLimitReached {
                    stats: SearchStats {
                        configs_explored: store.len(),
                        max_depth,
                    },
                };
            }

            // Deadline and memory probes are amortized over many expansions.
            if store.len() % LIMIT_CHECK_INTERVAL == 0 {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    info!(configs = store.len(), "reached time limit");
                    return RunOutcome::TimeLimitReached {
                        stats: SearchStats {
                            configs_explored: store.len(),
                            max_depth,
                        },
                    };
                }
                if self.config.memory_limit_mb > 0 {
                    if let Some(memory_mb) = current_memory_mb() {
                        if memory_mb >= self.config.memory_limit_mb {
                            info!(
                                memory_mb,
                                limit_mb = self.config.memory_limit_mb,
                                "reached memory limit"
                            );
                            return RunOutcome::MemoryLimitReached {
                                stats: SearchStats {
                                    configs_explored: store.len(),
                                    max_depth,
                                },
                                memory_mb,
                            };
                        }
                    }
                }
            }

            let successors = self.automaton.successors(current, input);
            if successors.is_empty() {
                // Dead end, a normal outcome.
                continue;
            }
            if self.config.max_depth > 0 && depth >= self.config.max_depth {
                // Live successors exist beyond the ceiling, so a later
                // rejection cannot claim the space was exhausted.
                depth_clipped = true;
                continue;
            }
            for successor in successors.into_iter().rev() {
                worklist.push(WorkItem {
                    config: successor,
                    parent: Some(id),
                    depth: depth + 1,
                });
            }
        }

        let stats = SearchStats {
            configs_explored: store.len(),
            max_depth,
        };
        if depth_clipped {
            debug!(
                configs = stats.configs_explored,
                "search exhausted below the depth ceiling, no witness"
            );
            RunOutcome::DepthLimitReached { stats }
        } else {
            debug!(configs = stats.configs_explored, "search exhausted, no witness");
            RunOutcome::Rejected { stats }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::compile;

    // Replace the start symbol on `a`, pop it on `b`, accept by empty stack.
    const PUSH_POP: &str = "q0\na b\nZ A\nq0\nZ\n\nE\nq0 a Z q0 A\nq0 b A q0 e\n";

    // a^n b^n by empty stack: push in q0, switch to q1 on the first pop.
    const ANBN: &str = "q0 q1\na b\nZ A\nq0\nZ\n\nE\n\
                        q0 a Z q0 AZ\n\
                        q0 a A q0 AA\n\
                        q0 e Z q0 e\n\
                        q0 b A q1 e\n\
                        q1 b A q1 e\n\
                        q1 e Z q1 e\n";

    // Balanced a/b sequences (Dyck words) by empty stack.
    const DYCK: &str = "q0\na b\nZ A\nq0\nZ\n\nE\n\
                        q0 a Z q0 AZ\n\
                        q0 a A q0 AA\n\
                        q0 b A q0 e\n\
                        q0 e Z q0 e\n";

    fn automaton(src: &str) -> Automaton {
        compile(&npda_syntax::parse(src).unwrap())
    }

    fn run(src: &str, input: &str) -> RunOutcome {
        Searcher::new(&automaton(src), SearchConfig::default()).run(input)
    }

    fn assert_valid_witness(automaton: &Automaton, input: &str, trace: &[Configuration]) {
        let symbols: Vec<char> = input.chars().collect();
        assert_eq!(trace.first(), Some(&automaton.start_config()));
        let last = trace.last().unwrap();
        assert!(automaton.is_accepting(last, &symbols));
        assert_eq!(last.offset, symbols.len());
        for pair in trace.windows(2) {
            let succs = automaton.successors(&pair[0], &symbols);
            assert!(
                succs.contains(&pair[1]),
                "trace step {:?} -> {:?} is not a legal move",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_push_then_pop_to_empty() {
        let outcome = run(PUSH_POP, "ab");
        assert!(outcome.accepted());
        match outcome {
            RunOutcome::Accepted { trace, stats } => {
                assert_eq!(trace.len(), 3);
                assert_eq!(stats.max_depth, 2);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_leftover_stack_rejects() {
        let outcome = run(PUSH_POP, "a");
        assert!(!outcome.accepted());
        assert!(outcome.conclusive());
    }

    #[test]
    fn test_final_state_mode() {
        let src = "q0 q1\na\nZ\nq0\nZ\nq1\nF\nq0 a Z q1 Z\n";
        assert!(run(src, "a").accepted());
        assert!(!run(src, "aa").accepted());
        assert!(!run(src, "").accepted());
    }

    #[test]
    fn test_epsilon_self_loop_terminates() {
        let src = "q0 q1\na\nZ\nq0\nZ\nq1\nF\nq0 e Z q0 Z\nq0 a Z q1 Z\n";
        let outcome = run(src, "a");
        assert!(outcome.accepted());
    }

    #[test]
    fn test_epsilon_only_loop_rejects_in_one_expansion() {
        let src = "q0\na\nZ\nq0\nZ\n\nF\nq0 e Z q0 Z\n";
        let outcome = run(src, "");
        assert!(matches!(outcome, RunOutcome::Rejected { .. }));
        assert_eq!(outcome.stats().configs_explored, 1);
    }

    #[test]
    fn test_empty_input_start_accepting() {
        let src = "q0\na\nZ\nq0\nZ\nq0\nF\nq0 a Z q0 Z\n";
        match run(src, "") {
            RunOutcome::Accepted { trace, stats } => {
                assert_eq!(trace.len(), 1);
                assert_eq!(stats.configs_explored, 1);
                assert_eq!(stats.max_depth, 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_anbn_language() {
        let a = automaton(ANBN);
        let searcher = Searcher::new(&a, SearchConfig::default());
        for accept in ["", "ab", "aabb", "aaabbb"] {
            assert!(searcher.accepts(accept), "expected accept: {accept:?}");
        }
        for reject in ["a", "b", "ba", "abb", "aab", "abab"] {
            assert!(!searcher.accepts(reject), "expected reject: {reject:?}");
        }
    }

    #[test]
    fn test_dyck_language() {
        let a = automaton(DYCK);
        let searcher = Searcher::new(&a, SearchConfig::default());
        for accept in ["", "ab", "abab", "aabb", "aababb"] {
            assert!(searcher.accepts(accept), "expected accept: {accept:?}");
        }
        for reject in ["a", "b", "ba", "abb", "aba"] {
            assert!(!searcher.accepts(reject), "expected reject: {reject:?}");
        }
    }

    #[test]
    fn test_witness_trace_is_valid() {
        let a = automaton(ANBN);
        match Searcher::new(&a, SearchConfig::default()).run("aabb") {
            RunOutcome::Accepted { trace, .. } => assert_valid_witness(&a, "aabb", &trace),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_first_witness_follows_table_order() {
        let first = "q0 q1 q2\na\nZ\nq0\nZ\nq1 q2\nF\nq0 a Z q1 Z\nq0 a Z q2 Z\n";
        let swapped = "q0 q1 q2\na\nZ\nq0\nZ\nq1 q2\nF\nq0 a Z q2 Z\nq0 a Z q1 Z\n";
        for (src, winner) in [(first, "q1"), (swapped, "q2")] {
            let a = automaton(src);
            match Searcher::new(&a, SearchConfig::default()).run("a") {
                RunOutcome::Accepted { trace, .. } => {
                    let last = trace.last().unwrap();
                    assert_eq!(a.state_name(last.state), winner);
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }

    #[test]
    fn test_determinism() {
        let a = automaton(ANBN);
        let searcher = Searcher::new(&a, SearchConfig::default());
        for input in ["aabb", "aab"] {
            let first = searcher.run(input);
            let second = searcher.run(input);
            assert_eq!(first.accepted(), second.accepted());
            assert_eq!(first.stats(), second.stats());
        }
    }

    #[test]
    fn test_config_limit() {
        let a = automaton(PUSH_POP);
        let config = SearchConfig {
            max_configs: 1,
            ..SearchConfig::default()
        };
        let outcome = Searcher::new(&a, config).run("ab");
        match outcome {
            RunOutcome::ConfigLimitReached { stats } => assert_eq!(stats.configs_explored, 1),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!outcome.accepted());
        assert!(!outcome.conclusive());
    }

    #[test]
    fn test_depth_limit_reported_distinctly() {
        let a = automaton(ANBN);
        let config = SearchConfig {
            max_depth: 2,
            ..SearchConfig::default()
        };
        let outcome = Searcher::new(&a, config).run("aabb");
        assert!(matches!(outcome, RunOutcome::DepthLimitReached { .. }));
        assert!(!outcome.conclusive());
    }

    #[test]
    fn test_accept_at_depth_ceiling() {
        // The witness for "ab" sits exactly at depth 3; the node itself is
        // still evaluated, only its successors are clipped.
        let a = automaton(ANBN);
        let config = SearchConfig {
            max_depth: 3,
            ..SearchConfig::default()
        };
        assert!(Searcher::new(&a, config).run("ab").accepted());
    }

    #[test]
    fn test_depth_ceiling_above_need_changes_nothing() {
        let a = automaton(ANBN);
        let config = SearchConfig {
            max_depth: 64,
            ..SearchConfig::default()
        };
        let outcome = Searcher::new(&a, config).run("aabb");
        assert!(outcome.accepted());
    }

    #[test]
    fn test_accepts_matches_run() {
        let a = automaton(ANBN);
        let searcher = Searcher::new(&a, SearchConfig::default());
        for input in ["", "ab", "aab", "ba"] {
            assert_eq!(searcher.accepts(input), searcher.run(input).accepted());
        }
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(
            RunOutcome::Rejected {
                stats: SearchStats::default()
            }
            .label(),
            "rejected"
        );
        assert_eq!(
            RunOutcome::ConfigLimitReached {
                stats: SearchStats::default()
            }
            .label(),
            "config limit"
        );
    }
}
