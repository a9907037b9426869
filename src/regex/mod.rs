//! The regex engine (spec component B) and its textual syntax (component C).

pub mod syntax;

use std::fmt;
use std::rc::Rc;

use crate::char_stream::{Char, CharStream};
use crate::error::{PyshError, PyshErrorKind};
use crate::position::Position;

/// The result of successfully matching a [`Regex`] against a [`CharStream`]:
/// the ordered sequence of chars consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegexMatch {
    chars: Vec<Char>,
}

impl RegexMatch {
    pub fn empty() -> Self {
        RegexMatch { chars: Vec::new() }
    }

    pub fn single(c: Char) -> Self {
        RegexMatch { chars: vec![c] }
    }

    pub fn from_chars(chars: Vec<Char>) -> Self {
        RegexMatch { chars }
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[Char] {
        &self.chars
    }

    /// Position of the first matched char, or the origin if the match is empty.
    pub fn position(&self) -> Position {
        self.chars.first().map(|c| c.position).unwrap_or_default()
    }

    pub fn value(&self) -> String {
        self.chars.iter().map(|c| c.val).collect()
    }

    /// Associative concatenation; the empty match is the identity.
    pub fn concat(mut self, rhs: RegexMatch) -> RegexMatch {
        self.chars.extend(rhs.chars);
        self
    }
}

impl fmt::Display for RegexMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value())
    }
}

pub type RegexResult = Result<(CharStream, RegexMatch), PyshError>;

/// A compiled character pattern (spec §3 "Regex program (variants)").
///
/// Cheaply clonable: recursive children are `Rc`-shared rather than boxed,
/// so the same sub-pattern (e.g. a shared `Whitespace`) can be reused across
/// many lex rules without recompiling it.
#[derive(Debug, Clone)]
pub enum Regex {
    Any,
    Literal(char),
    Range(char, char),
    Whitespace,
    And(Vec<Rc<Regex>>),
    Or(Vec<Rc<Regex>>),
    ZeroOrMore(Rc<Regex>),
    OneOrMore(Rc<Regex>),
    ZeroOrOne(Rc<Regex>),
    UntilEmpty(Rc<Regex>),
    Not(Rc<Regex>),
    Skip(Rc<Regex>),
}

impl Regex {
    pub fn and(children: impl IntoIterator<Item = Regex>) -> Regex {
        Regex::And(children.into_iter().map(Rc::new).collect())
    }

    pub fn or(children: impl IntoIterator<Item = Regex>) -> Regex {
        Regex::Or(children.into_iter().map(Rc::new).collect())
    }

    pub fn zero_or_more(child: Regex) -> Regex {
        Regex::ZeroOrMore(Rc::new(child))
    }

    pub fn one_or_more(child: Regex) -> Regex {
        Regex::OneOrMore(Rc::new(child))
    }

    pub fn zero_or_one(child: Regex) -> Regex {
        Regex::ZeroOrOne(Rc::new(child))
    }

    pub fn until_empty(child: Regex) -> Regex {
        Regex::UntilEmpty(Rc::new(child))
    }

    pub fn not(child: Regex) -> Regex {
        Regex::Not(Rc::new(child))
    }

    pub fn skip(child: Regex) -> Regex {
        Regex::Skip(Rc::new(child))
    }

    /// Builds an `And` of `Literal`s matching `s` exactly, or a bare
    /// `Literal` when `s` is a single char (spec §6's `literal(string)` helper).
    pub fn literal(s: &str) -> Regex {
        let mut chars: Vec<char> = s.chars().collect();
        if chars.len() == 1 {
            return Regex::Literal(chars.remove(0));
        }
        Regex::and(chars.into_iter().map(Regex::Literal))
    }

    fn err(&self, state: &CharStream, msg: impl Into<String>) -> PyshError {
        PyshError::leaf(PyshErrorKind::Regex, state.clone(), msg)
    }

    /// Attempts to match `self` at the front of `state`.
    pub fn eval(&self, state: &CharStream) -> RegexResult {
        log::trace!("regex {self} attempting at {}", state.position());
        match self {
            Regex::Any => {
                let head = state.head().map_err(|_| self.err(state, "expected any char"))?;
                Ok((state.tail()?, RegexMatch::single(head)))
            }
            Regex::Literal(c) => {
                let head = state
                    .head()
                    .map_err(|_| self.err(state, format!("expected {c:?}")))?;
                if head.val != *c {
                    return Err(self.err(state, format!("expected {c:?}, got {:?}", head.val)));
                }
                Ok((state.tail()?, RegexMatch::single(head)))
            }
            Regex::Range(lo, hi) => {
                let head = state
                    .head()
                    .map_err(|_| self.err(state, format!("expected [{lo}-{hi}]")))?;
                if head.val < *lo || head.val > *hi {
                    return Err(self.err(state, format!("expected [{lo}-{hi}], got {:?}", head.val)));
                }
                Ok((state.tail()?, RegexMatch::single(head)))
            }
            Regex::Whitespace => {
                let head = state
                    .head()
                    .map_err(|_| self.err(state, "expected whitespace"))?;
                if !head.val.is_whitespace() {
                    return Err(self.err(state, format!("expected whitespace, got {:?}", head.val)));
                }
                Ok((state.tail()?, RegexMatch::single(head)))
            }
            Regex::And(children) => {
                let mut cur = state.clone();
                let mut result = RegexMatch::empty();
                for (i, child) in children.iter().enumerate() {
                    let (next, m) = child.eval(&cur).map_err(|e| {
                        PyshError::unary(
                            PyshErrorKind::Regex,
                            state.clone(),
                            format!("{self} (child {i})"),
                            e,
                        )
                    })?;
                    cur = next;
                    result = result.concat(m);
                }
                Ok((cur, result))
            }
            Regex::Or(children) => {
                let mut errors = Vec::new();
                for child in children {
                    match child.eval(state) {
                        Ok(ok) => return Ok(ok),
                        Err(e) => errors.push(e),
                    }
                }
                Err(PyshError::nary(
                    PyshErrorKind::Regex,
                    state.clone(),
                    self.to_string(),
                    errors,
                ))
            }
            Regex::ZeroOrMore(child) => {
                let mut cur = state.clone();
                let mut result = RegexMatch::empty();
                while let Ok((next, m)) = child.eval(&cur) {
                    if next.offset() == cur.offset() {
                        // child matched without consuming input; stop to guarantee progress.
                        break;
                    }
                    cur = next;
                    result = result.concat(m);
                }
                Ok((cur, result))
            }
            Regex::OneOrMore(child) => {
                let (next, first) = child.eval(state).map_err(|e| {
                    PyshError::unary(PyshErrorKind::Regex, state.clone(), self.to_string(), e)
                })?;
                let (rest_state, rest) = Regex::ZeroOrMore(child.clone()).eval(&next)?;
                Ok((rest_state, first.concat(rest)))
            }
            Regex::ZeroOrOne(child) => match child.eval(state) {
                Ok(ok) => Ok(ok),
                Err(_) => Ok((state.clone(), RegexMatch::empty())),
            },
            Regex::UntilEmpty(child) => {
                let mut cur = state.clone();
                let mut result = RegexMatch::empty();
                while !cur.is_empty() {
                    let (next, m) = child.eval(&cur).map_err(|e| {
                        PyshError::unary(PyshErrorKind::Regex, cur.clone(), self.to_string(), e)
                    })?;
                    cur = next;
                    result = result.concat(m);
                }
                Ok((cur, result))
            }
            Regex::Not(child) => {
                if child.eval(state).is_ok() {
                    return Err(self.err(state, "negated pattern matched"));
                }
                let head = state
                    .head()
                    .map_err(|_| self.err(state, "expected a char to negate"))?;
                Ok((state.tail()?, RegexMatch::single(head)))
            }
            Regex::Skip(child) => {
                let (next, _) = child.eval(state).map_err(|e| {
                    PyshError::unary(PyshErrorKind::Regex, state.clone(), self.to_string(), e)
                })?;
                Ok((next, RegexMatch::empty()))
            }
        }
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regex::Any => write!(f, "."),
            Regex::Literal(c) => write!(f, "{c}"),
            Regex::Range(lo, hi) => write!(f, "[{lo}-{hi}]"),
            Regex::Whitespace => write!(f, "\\w"),
            Regex::And(children) => {
                for c in children {
                    write!(f, "{c}")?;
                }
                Ok(())
            }
            Regex::Or(children) => {
                let parts: Vec<String> = children.iter().map(|c| c.to_string()).collect();
                write!(f, "({})", parts.join("|"))
            }
            Regex::ZeroOrMore(c) => write!(f, "({c})*"),
            Regex::OneOrMore(c) => write!(f, "({c})+"),
            Regex::ZeroOrOne(c) => write!(f, "({c})?"),
            Regex::UntilEmpty(c) => write!(f, "({c})!"),
            Regex::Not(c) => write!(f, "^({c})"),
            Regex::Skip(c) => write!(f, "~({c})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_matches_exact_char() {
        let s = CharStream::load("ab");
        let (rest, m) = Regex::Literal('a').eval(&s).unwrap();
        assert_eq!(m.value(), "a");
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn range_rejects_out_of_bounds_char() {
        let s = CharStream::load("9");
        assert!(Regex::Range('a', 'z').eval(&s).is_err());
    }

    #[test]
    fn e1_range_a_to_z_on_ab() {
        let s = CharStream::load("ab");
        let (rest, m) = Regex::Range('a', 'z').eval(&s).unwrap();
        assert_eq!(m.value(), "a");
        assert_eq!(rest.as_slice().iter().map(|c| c.val).collect::<String>(), "b");
    }

    #[test]
    fn e2_one_or_more_of_or_on_aabba() {
        let pattern = Regex::one_or_more(Regex::or([Regex::Literal('a'), Regex::Literal('b')]));
        let s = CharStream::load("aabba");
        let (rest, m) = pattern.eval(&s).unwrap();
        assert!(rest.is_empty());
        assert_eq!(m.value(), "aabba");
    }

    #[test]
    fn zero_or_more_never_fails_on_no_match() {
        let s = CharStream::load("bbb");
        let (rest, m) = Regex::zero_or_more(Regex::Literal('a')).eval(&s).unwrap();
        assert!(m.is_empty());
        assert_eq!(rest.len(), 3);
    }

    #[test]
    fn and_short_circuits_and_wraps_first_failure() {
        let pattern = Regex::and([Regex::Literal('a'), Regex::Literal('b')]);
        let s = CharStream::load("ac");
        assert!(pattern.eval(&s).is_err());
    }

    #[test]
    fn or_tries_left_to_right() {
        let pattern = Regex::or([Regex::Literal('a'), Regex::Literal('b')]);
        let s = CharStream::load("b");
        let (_, m) = pattern.eval(&s).unwrap();
        assert_eq!(m.value(), "b");
    }

    #[test]
    fn not_consumes_one_char_when_child_fails() {
        let pattern = Regex::not(Regex::Literal('a'));
        let s = CharStream::load("bc");
        let (rest, m) = pattern.eval(&s).unwrap();
        assert_eq!(m.value(), "b");
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn not_fails_when_child_succeeds() {
        let pattern = Regex::not(Regex::Literal('a'));
        let s = CharStream::load("ac");
        assert!(pattern.eval(&s).is_err());
    }

    #[test]
    fn skip_yields_empty_match_but_advances() {
        let pattern = Regex::skip(Regex::Literal('a'));
        let s = CharStream::load("ab");
        let (rest, m) = pattern.eval(&s).unwrap();
        assert!(m.is_empty());
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn until_empty_succeeds_when_child_consumes_everything() {
        let pattern = Regex::until_empty(Regex::Any);
        let s = CharStream::load("abc");
        let (rest, m) = pattern.eval(&s).unwrap();
        assert!(rest.is_empty());
        assert_eq!(m.value(), "abc");
    }

    #[test]
    fn until_empty_fails_if_child_fails_before_empty() {
        let pattern = Regex::until_empty(Regex::Literal('a'));
        let s = CharStream::load("aab");
        assert!(pattern.eval(&s).is_err());
    }
}
