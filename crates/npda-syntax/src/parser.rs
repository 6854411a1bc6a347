//! Line-oriented parser for automaton definition files.

use crate::ast::{AcceptanceMode, AutomatonDef, Span, TransitionDef};
use thiserror::Error;

/// The literal token denoting epsilon in transition fields.
const EPSILON: &str = "e";

/// Number of positional header lines before the transition region.
const HEADER_LINES: usize = 7;

/// Parse error for an automaton definition file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("definition truncated at {span}: expected 7 header lines, found {found}")]
    TruncatedHeader { found: usize, span: Span },
    #[error(
        "malformed transition at {span}: expected 5 whitespace-separated fields, found {found}"
    )]
    MalformedTransition { found: usize, span: Span },
    #[error("invalid read symbol `{token}` at {span}: expected a single character or `e`")]
    InvalidReadSymbol { token: String, span: Span },
    #[error("invalid pop symbol `{token}` at {span}: expected a single character or `e`")]
    InvalidPopSymbol { token: String, span: Span },
    #[error("invalid start stack symbol `{token}` at {span}: expected a single character")]
    InvalidStartStack { token: String, span: Span },
}

impl ParseError {
    /// Get the source span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            ParseError::TruncatedHeader { span, .. } => *span,
            ParseError::MalformedTransition { span, .. } => *span,
            ParseError::InvalidReadSymbol { span, .. } => *span,
            ParseError::InvalidPopSymbol { span, .. } => *span,
            ParseError::InvalidStartStack { span, .. } => *span,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse an automaton definition from source text.
///
/// The format is positional, one construct per line:
///
/// ```text
/// q0 q1            declared states          (advisory)
/// a b              declared input alphabet  (advisory)
/// Z A              declared stack alphabet  (advisory)
/// q0               start state
/// Z                start stack symbol
/// q1               accepting states
/// E                acceptance mode: `E` = empty stack, else final state
/// q0 a Z q0 AZ     transitions: state read pop next push
/// ```
///
/// In transition fields the token `e` denotes epsilon: read nothing, pop
/// nothing, or push nothing. The push field is a single token whose
/// characters are pushed top first. Blank lines and `#` comments are
/// permitted in the transition region; the header is strictly positional.
pub fn parse(source: &str) -> ParseResult<AutomatonDef> {
    let lines = collect_lines(source);
    if lines.len() < HEADER_LINES {
        let span = lines.last().map(Line::span).unwrap_or_else(Span::dummy);
        return Err(ParseError::TruncatedHeader {
            found: lines.len(),
            span,
        });
    }

    let states = name_list(&lines[0]);
    let input_alphabet = name_list(&lines[1]);
    let stack_alphabet = name_list(&lines[2]);
    let start_state = lines[3].text.trim().to_string();
    let start_stack = start_stack_symbol(&lines[4])?;
    let accepting = name_list(&lines[5]);
    let mode = if lines[6].text.trim() == "E" {
        AcceptanceMode::EmptyStack
    } else {
        AcceptanceMode::FinalState
    };

    let mut transitions = Vec::new();
    for line in &lines[HEADER_LINES..] {
        let trimmed = line.text.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        transitions.push(parse_transition(line)?);
    }

    Ok(AutomatonDef {
        states,
        input_alphabet,
        stack_alphabet,
        start_state,
        start_stack,
        accepting,
        mode,
        transitions,
    })
}

/// One source line with trailing whitespace stripped.
struct Line<'a> {
    text: &'a str,
    offset: usize,
    number: u32,
}

impl Line<'_> {
    fn span(&self) -> Span {
        Span::new(self.offset, self.offset + self.text.len(), self.number, 1)
    }
}

fn collect_lines(source: &str) -> Vec<Line<'_>> {
    if source.is_empty() {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut offset = 0;
    for (i, raw) in source.split('\n').enumerate() {
        let text = raw.strip_suffix('\r').unwrap_or(raw).trim_end();
        lines.push(Line {
            text,
            offset,
            number: i as u32 + 1,
        });
        offset += raw.len() + 1;
    }
    // `split` yields a trailing empty segment when the source ends in a newline.
    if source.ends_with('\n') {
        lines.pop();
    }
    lines
}

/// Split a line into whitespace-separated fields, each with its span.
fn split_fields<'a>(line: &Line<'a>) -> Vec<(&'a str, Span)> {
    let mut fields = Vec::new();
    let mut start = None;
    let mut column = 1u32;
    for (idx, ch) in line.text.char_indices() {
        if ch.is_whitespace() {
            if let Some((s, col)) = start.take() {
                fields.push((
                    &line.text[s..idx],
                    Span::new(line.offset + s, line.offset + idx, line.number, col),
                ));
            }
        } else if start.is_none() {
            start = Some((idx, column));
        }
        column += 1;
    }
    if let Some((s, col)) = start {
        fields.push((
            &line.text[s..],
            Span::new(
                line.offset + s,
                line.offset + line.text.len(),
                line.number,
                col,
            ),
        ));
    }
    fields
}

fn name_list(line: &Line<'_>) -> Vec<String> {
    split_fields(line)
        .into_iter()
        .map(|(token, _)| token.to_string())
        .collect()
}

fn start_stack_symbol(line: &Line<'_>) -> ParseResult<char> {
    let token = line.text.trim();
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ParseError::InvalidStartStack {
            token: token.to_string(),
            span: line.span(),
        }),
    }
}

fn parse_transition(line: &Line<'_>) -> ParseResult<TransitionDef> {
    let fields = split_fields(line);
    // Extra fields beyond the fifth are tolerated and ignored.
    if fields.len() < 5 {
        return Err(ParseError::MalformedTransition {
            found: fields.len(),
            span: line.span(),
        });
    }
    let read = symbol_or_epsilon(fields[1], |token, span| ParseError::InvalidReadSymbol {
        token,
        span,
    })?;
    let pop = symbol_or_epsilon(fields[2], |token, span| ParseError::InvalidPopSymbol {
        token,
        span,
    })?;
    let push = if fields[4].0 == EPSILON {
        Vec::new()
    } else {
        fields[4].0.chars().collect()
    };
    Ok(TransitionDef {
        from: fields[0].0.to_string(),
        read,
        pop,
        to: fields[3].0.to_string(),
        push,
        span: line.span(),
    })
}

fn symbol_or_epsilon(
    field: (&str, Span),
    err: impl FnOnce(String, Span) -> ParseError,
) -> ParseResult<Option<char>> {
    let (token, span) = field;
    if token == EPSILON {
        return Ok(None);
    }
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Some(c)),
        _ => Err(err(token.to_string(), span)),
    }
}
