//! Expression chaining protocol.
//!
//! A chained expression such as `npc(mara):talk` splits at the first
//! `:` or `(` into a head script and a remainder. The head must
//! evaluate to an [`Accessor`], which is then asked to interpret the
//! remainder. Accessors are transient resolution helpers; they are
//! created per lookup and never serialized.

use crate::engine::errors::EngineError;
use crate::engine::script::Value;
use crate::engine::state::Game;

pub trait Accessor {
    /// Value the accessor collapses to when no further chaining
    /// follows, e.g. a display name.
    fn default(&self, game: &mut Game) -> Result<Value, EngineError>;

    /// Interprets the expression remainder after the chaining marker.
    fn resolve(&self, game: &mut Game, rest: &str) -> Result<Value, EngineError>;
}

/// Shape of one expression string.
#[derive(Debug, PartialEq)]
pub enum ExprShape<'a> {
    /// No chaining marker; the whole string is a script name.
    Plain(&'a str),
    /// `head` is the accessor script, `rest` is handed to it.
    Chained { head: &'a str, rest: &'a str },
}

/// Splits an expression at the first `:` or `(`.
///
/// A `(` only counts as a marker when a depth-matched `)` exists
/// somewhere after it; a malformed parenthesis makes the whole string a
/// plain name, so script names containing a stray `(` stay addressable.
/// For a `(` marker the parenthesis itself stays in `rest` so the
/// accessor can read the argument list.
pub fn split_expr(text: &str) -> ExprShape<'_> {
    for (i, ch) in text.char_indices() {
        match ch {
            ':' => {
                return ExprShape::Chained {
                    head: &text[..i],
                    rest: &text[i + 1..],
                }
            }
            '(' => {
                if matching_paren(text, i).is_some() {
                    return ExprShape::Chained {
                        head: &text[..i],
                        rest: &text[i..],
                    };
                }
                return ExprShape::Plain(text);
            }
            _ => {}
        }
    }
    ExprShape::Plain(text)
}

/// Splits a remainder that starts with a parenthesized argument list
/// into `(args, tail)`, swallowing one `:` between `)` and the tail.
/// Returns `None` when the remainder does not start with `(`.
pub fn split_args(rest: &str) -> Option<(&str, &str)> {
    if !rest.starts_with('(') {
        return None;
    }
    let close = matching_paren(rest, 0)?;
    let args = &rest[1..close];
    let tail = &rest[close + 1..];
    let tail = tail.strip_prefix(':').unwrap_or(tail);
    Some((args, tail))
}

/// Splits a fragment at its first `:`, yielding the head selector and
/// the remaining chain (empty when none).
pub fn split_fragment(rest: &str) -> (&str, &str) {
    match rest.find(':') {
        Some(i) => (&rest[..i], &rest[i + 1..]),
        None => (rest, ""),
    }
}

/// Index of the `)` matching the `(` at `open`, if balanced.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in text[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}
