//! Parser and surface types for pushdown automaton definition files.

pub mod ast;
pub mod parser;

pub use ast::{AcceptanceMode, AutomatonDef, Span, TransitionDef};
pub use parser::{parse, ParseError, ParseResult};
