//! Textual event syntax.
//!
//! Scenario lines are whitespace-separated words, double-quoted strings
//! (`\"` and `\\` escapes) and parenthesised lists, which may nest:
//!
//! ```text
//! Maximillion Deploy 0x5aaf5f0dd3c4cc6e4b1f6a9a0a6a8e3f2f7c1d23
//! PriceOracle Deploy Fixed price:1.5e18
//! Comptroller SetMarkets (oEther oDai) "reason with spaces"
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use crate::command::{Event, Fragment};

/// Errors produced while tokenizing an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The text contained no fragments.
    #[error("event is empty")]
    Empty,

    /// A quoted string was not closed.
    #[error("unterminated string starting at byte {offset}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        offset: usize,
    },

    /// A `)` appeared without a matching `(`.
    #[error("unexpected `)` at byte {offset}")]
    UnexpectedClose {
        /// Byte offset of the stray parenthesis.
        offset: usize,
    },

    /// A `(` was never closed.
    #[error("unclosed `(` at byte {offset}")]
    UnclosedList {
        /// Byte offset of the opening parenthesis.
        offset: usize,
    },
}

/// Whether `c` terminates a bare word.
pub(crate) fn ends_word(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '"')
}

/// Parse one event from its textual form.
pub fn parse_event(text: &str) -> Result<Event, ParseError> {
    let mut chars = text.char_indices().peekable();
    let mut current: Vec<Fragment> = Vec::new();
    let mut open: Vec<(usize, Vec<Fragment>)> = Vec::new();

    while let Some((offset, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => open.push((offset, std::mem::take(&mut current))),
            ')' => {
                let (_, parent) = open.pop().ok_or(ParseError::UnexpectedClose { offset })?;
                let list = std::mem::replace(&mut current, parent);
                current.push(Fragment::List(list));
            }
            '"' => current.push(Fragment::Quoted(read_quoted(&mut chars, offset)?)),
            first => current.push(Fragment::Word(read_word(&mut chars, first))),
        }
    }

    if let Some((offset, _)) = open.last() {
        return Err(ParseError::UnclosedList { offset: *offset });
    }
    if current.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(Event::new(current))
}

fn read_quoted(chars: &mut Peekable<CharIndices<'_>>, offset: usize) -> Result<String, ParseError> {
    let mut value = String::new();
    while let Some((_, c)) = chars.next() {
        match c {
            '"' => return Ok(value),
            '\\' => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            other => value.push(other),
        }
    }
    Err(ParseError::UnterminatedString { offset })
}

fn read_word(chars: &mut Peekable<CharIndices<'_>>, first: char) -> String {
    let mut word = String::from(first);
    while let Some(&(_, next)) = chars.peek() {
        if ends_word(next) {
            break;
        }
        word.push(next);
        chars.next();
    }
    word
}
