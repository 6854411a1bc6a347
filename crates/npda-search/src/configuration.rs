//! Search configurations: the nodes of the acceptance search graph.

use crate::automaton::Automaton;
use smallvec::SmallVec;

/// Stack contents, top first. Inline up to 8 symbols before spilling.
pub type Stack = SmallVec<[char; 8]>;

/// A complete snapshot of search progress: control state, consumed-input
/// count, and stack contents.
///
/// Configurations are value types, structurally comparable and hashable.
/// They serve both as search nodes and as visited-set keys. The input
/// string itself is held once per run; `offset` indexes into it, so a
/// configuration never owns a copy of the remaining input.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Configuration {
    /// Control state id (index into the automaton's state table).
    pub state: usize,
    /// Number of input symbols consumed so far.
    pub offset: usize,
    /// Stack contents, top first.
    pub stack: Stack,
}

impl Configuration {
    /// Render as `(state, remaining input, stack)` for traces and logs.
    pub fn render(&self, automaton: &Automaton, input: &[char]) -> String {
        let remaining: String = input
            .get(self.offset..)
            .unwrap_or_default()
            .iter()
            .collect();
        let stack: String = self.stack.iter().collect();
        format!(
            "({}, \"{}\", \"{}\")",
            automaton.state_name(self.state),
            remaining,
            stack
        )
    }
}
