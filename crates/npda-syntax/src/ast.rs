//! Typed surface form of an automaton definition file.

use std::fmt;

/// A span in the source file, tracking byte offsets and line/column.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, in characters not bytes).
    pub column: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Create a dummy span for synthesized definitions.
    pub fn dummy() -> Self {
        Self::default()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// How the automaton accepts an input string.
///
/// Both modes require the input to be fully consumed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcceptanceMode {
    /// Accept when the control state is one of the accepting states.
    FinalState,
    /// Accept when the stack is empty. Accepting states are ignored.
    EmptyStack,
}

impl fmt::Display for AcceptanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptanceMode::FinalState => write!(f, "final state"),
            AcceptanceMode::EmptyStack => write!(f, "empty stack"),
        }
    }
}

/// One transition line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionDef {
    /// Source control state.
    pub from: String,
    /// Input symbol consumed, or `None` for an epsilon move.
    pub read: Option<char>,
    /// Required stack top, popped on match, or `None` to leave the stack alone.
    pub pop: Option<char>,
    /// Target control state.
    pub to: String,
    /// Symbols pushed after any pop, top first. May be empty.
    pub push: Vec<char>,
    /// The transition's line in the source file.
    pub span: Span,
}

/// A parsed automaton definition.
///
/// The declared state and alphabet lists mirror the first three header
/// lines. They are advisory: surfaced in summaries and diagnostics, never
/// enforced against the transitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutomatonDef {
    /// Declared state names (header line 1).
    pub states: Vec<String>,
    /// Declared input alphabet (header line 2).
    pub input_alphabet: Vec<String>,
    /// Declared stack alphabet (header line 3).
    pub stack_alphabet: Vec<String>,
    /// Start state (header line 4).
    pub start_state: String,
    /// Initial stack symbol (header line 5).
    pub start_stack: char,
    /// Accepting states (header line 6); meaningful in final-state mode only.
    pub accepting: Vec<String>,
    /// Acceptance mode (header line 7).
    pub mode: AcceptanceMode,
    /// Transitions in file order.
    pub transitions: Vec<TransitionDef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_len() {
        let s = Span::new(10, 14, 2, 3);
        assert_eq!(s.len(), 4);
        assert!(!s.is_empty());
        assert!(Span::dummy().is_empty());
    }

    #[test]
    fn test_span_display() {
        assert_eq!(Span::new(0, 5, 3, 7).to_string(), "3:7");
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(AcceptanceMode::FinalState.to_string(), "final state");
        assert_eq!(AcceptanceMode::EmptyStack.to_string(), "empty stack");
    }
}
