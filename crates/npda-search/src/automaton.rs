//! Compiled automaton: interned states, transition table, acceptance test.

use crate::configuration::{Configuration, Stack};
use npda_syntax::{AcceptanceMode, AutomatonDef};
use smallvec::SmallVec;
use tracing::warn;

/// One compiled transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Input symbol consumed, or `None` for an epsilon move.
    pub read: Option<char>,
    /// Required stack top, popped on match, or `None` to leave the stack alone.
    pub pop: Option<char>,
    /// Symbols pushed after any pop, top first.
    pub push: SmallVec<[char; 4]>,
    /// Target state id.
    pub target: usize,
}

impl Transition {
    /// Apply this transition to a configuration if its read and pop
    /// preconditions hold. Pure; a mismatch is `None`, never an error.
    pub fn apply(&self, config: &Configuration, input: &[char]) -> Option<Configuration> {
        let offset = match self.read {
            Some(symbol) => {
                if input.get(config.offset) != Some(&symbol) {
                    return None;
                }
                config.offset + 1
            }
            None => config.offset,
        };
        let kept: &[char] = match self.pop {
            Some(symbol) => {
                if config.stack.first() != Some(&symbol) {
                    return None;
                }
                &config.stack[1..]
            }
            None => &config.stack,
        };
        let mut stack = Stack::with_capacity(self.push.len() + kept.len());
        stack.extend_from_slice(&self.push);
        stack.extend_from_slice(kept);
        Some(Configuration {
            state: self.target,
            offset,
            stack,
        })
    }
}

/// A compiled, immutable automaton.
///
/// Built once by [`compile`], then shared read-only by every search; nothing
/// here is ever mutated after construction, so parallel batch runs borrow it
/// without synchronization.
#[derive(Clone, Debug)]
pub struct Automaton {
    state_names: Vec<String>,
    start: usize,
    start_stack: char,
    accepting: Vec<bool>,
    mode: AcceptanceMode,
    /// Per-state transitions, file order preserved within each row.
    table: Vec<Vec<Transition>>,
}

impl Automaton {
    /// Start state id.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Initial stack symbol.
    pub fn start_stack(&self) -> char {
        self.start_stack
    }

    /// Acceptance mode.
    pub fn mode(&self) -> AcceptanceMode {
        self.mode
    }

    /// Number of distinct states appearing in the definition.
    pub fn state_count(&self) -> usize {
        self.state_names.len()
    }

    /// Total number of transitions.
    pub fn transition_count(&self) -> usize {
        self.table.iter().map(Vec::len).sum()
    }

    /// Name of a state id.
    pub fn state_name(&self, id: usize) -> &str {
        &self.state_names[id]
    }

    /// Transitions out of a state, in file order.
    pub fn transitions_from(&self, state: usize) -> &[Transition] {
        &self.table[state]
    }

    /// The run's start configuration: start state, nothing consumed, the
    /// start stack symbol alone on the stack.
    pub fn start_config(&self) -> Configuration {
        let mut stack = Stack::new();
        stack.push(self.start_stack);
        Configuration {
            state: self.start,
            offset: 0,
            stack,
        }
    }

    /// All configurations reachable from `config` in one move, in table
    /// order.
    ///
    /// Inapplicable transitions are skipped, not errors: the move list is
    /// this state's table row filtered through [`Transition::apply`]. Table
    /// order decides which witness a search finds first, never whether one
    /// is found.
    pub fn successors(&self, config: &Configuration, input: &[char]) -> Vec<Configuration> {
        self.table[config.state]
            .iter()
            .filter_map(|t| t.apply(config, input))
            .collect()
    }

    /// Success test: all input consumed, then empty stack or accepting
    /// state depending on the acceptance mode.
    pub fn is_accepting(&self, config: &Configuration, input: &[char]) -> bool {
        if config.offset < input.len() {
            return false;
        }
        match self.mode {
            AcceptanceMode::EmptyStack => config.stack.is_empty(),
            AcceptanceMode::FinalState => self.accepting[config.state],
        }
    }
}

/// Compile a parsed definition into the immutable run form.
///
/// State names are interned to dense ids in order of first appearance
/// (start state, accepting states, then transition endpoints). Table rows
/// preserve file order, which fixes the exploration order.
pub fn compile(def: &AutomatonDef) -> Automaton {
    let mut state_names: Vec<String> = Vec::new();
    let start = intern(&mut state_names, &def.start_state);
    let accepting_ids: Vec<usize> = def
        .accepting
        .iter()
        .map(|name| intern(&mut state_names, name))
        .collect();

    let mut rows = Vec::with_capacity(def.transitions.len());
    for t in &def.transitions {
        let from = intern(&mut state_names, &t.from);
        let target = intern(&mut state_names, &t.to);
        rows.push((
            from,
            Transition {
                read: t.read,
                pop: t.pop,
                push: SmallVec::from_slice(&t.push),
                target,
            },
        ));
    }

    let mut table = vec![Vec::new(); state_names.len()];
    for (from, transition) in rows {
        table[from].push(transition);
    }
    let mut accepting = vec![false; state_names.len()];
    for id in accepting_ids {
        accepting[id] = true;
    }

    if def.mode == AcceptanceMode::FinalState && def.accepting.is_empty() {
        warn!("final-state mode with no accepting states: every input will be rejected");
    }
    if !def.states.is_empty() {
        for name in &state_names {
            if !def.states.iter().any(|declared| declared == name) {
                warn!(state = %name, "state missing from the declared state list");
            }
        }
    }

    Automaton {
        state_names,
        start,
        start_stack: def.start_stack,
        accepting,
        mode: def.mode,
        table,
    }
}

fn intern(names: &mut Vec<String>, name: &str) -> usize {
    if let Some(id) = names.iter().position(|n| n == name) {
        id
    } else {
        names.push(name.to_string());
        names.len() - 1
    }
}
