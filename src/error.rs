//! The uniform error-tree model (spec component H).
//!
//! Every failure in this crate is a value, never an unchecked panic. Two
//! error types exist: [`PyshError`] is the runtime tree produced while
//! matching a regex, tokenizing, or parsing; [`GrammarError`] is raised
//! while *building* a lexer, scope, or combinator graph, before any input
//! is ever seen.

use std::fmt;

use crate::char_stream::CharStream;
use crate::token_stream::TokenStream;

/// Failures that can only occur while constructing a grammar, never while
/// running it against input.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GrammarError {
    #[error("lex rule {name:?} redefined with a different pattern")]
    DuplicateLexRule { name: String },

    #[error("scope entry {name:?} redefined with a different rule")]
    ScopeConflict { name: String },

    #[error("rule {rule} must contain exactly one {expected} child, found {found}")]
    AndArity {
        rule: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("lex rule name must be non-empty")]
    EmptyRuleName,
}

/// A snapshot of whichever stream state a failure occurred against.
#[derive(Debug, Clone)]
pub enum State {
    Chars(CharStream),
    Tokens(TokenStream),
    None,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Chars(s) => write!(f, "at {}", s.position()),
            State::Tokens(s) => match s.peek() {
                Some(t) => write!(f, "at {}", t.position),
                None => write!(f, "at end of input"),
            },
            State::None => Ok(()),
        }
    }
}

impl From<CharStream> for State {
    fn from(s: CharStream) -> Self {
        State::Chars(s)
    }
}

impl From<TokenStream> for State {
    fn from(s: TokenStream) -> Self {
        State::Tokens(s)
    }
}

/// The shape of a single error-tree node, independent of its [`PyshErrorKind`].
#[derive(Debug, Clone)]
pub enum Node {
    Leaf,
    Unary(Box<PyshError>),
    Nary(Vec<PyshError>),
}

/// What kind of operation raised this error (spec §7's error taxonomy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PyshErrorKind {
    Regex,
    Lex,
    TokenStream,
    Rule,
    Parse,
    State,
}

impl fmt::Display for PyshErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PyshErrorKind::Regex => "RegexError",
            PyshErrorKind::Lex => "LexError",
            PyshErrorKind::TokenStream => "TokenStreamError",
            PyshErrorKind::Rule => "RuleError",
            PyshErrorKind::Parse => "ParseError",
            PyshErrorKind::State => "StateError",
        };
        write!(f, "{s}")
    }
}

/// A single node of the error tree (spec component H).
///
/// `msg` is the human-readable complaint at this node; `rule` is the
/// producing rule's identity (e.g. a combinator's debug label), present
/// when the failure is anchored to a named rule rather than a bare state
/// snapshot; `state` is the stream snapshot at the point of failure;
/// `node` carries zero, one, or many child errors.
#[derive(Debug, Clone)]
pub struct PyshError {
    pub kind: PyshErrorKind,
    pub msg: Option<String>,
    pub rule: Option<String>,
    pub state: State,
    pub node: Node,
}

impl PyshError {
    pub fn leaf(kind: PyshErrorKind, state: impl Into<State>, msg: impl Into<String>) -> Self {
        PyshError {
            kind,
            msg: Some(msg.into()),
            rule: None,
            state: state.into(),
            node: Node::Leaf,
        }
    }

    pub fn unary(
        kind: PyshErrorKind,
        state: impl Into<State>,
        rule: impl Into<String>,
        child: PyshError,
    ) -> Self {
        PyshError {
            kind,
            msg: None,
            rule: Some(rule.into()),
            state: state.into(),
            node: Node::Unary(Box::new(child)),
        }
    }

    pub fn nary(
        kind: PyshErrorKind,
        state: impl Into<State>,
        rule: impl Into<String>,
        children: Vec<PyshError>,
    ) -> Self {
        PyshError {
            kind,
            msg: None,
            rule: Some(rule.into()),
            state: state.into(),
            node: Node::Nary(children),
        }
    }

    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    fn repr_line(&self) -> String {
        let rule = self
            .rule
            .as_ref()
            .map(|r| format!(" in {r}"))
            .unwrap_or_default();
        let msg = self
            .msg
            .as_ref()
            .map(|m| format!(": {m}"))
            .unwrap_or_default();
        format!("{}{} {}{}", self.kind, rule, self.state, msg)
    }

    fn repr(&self, indent: usize) -> String {
        let pad = "  ".repeat(indent);
        let mut out = format!("{pad}{}", self.repr_line());
        match &self.node {
            Node::Leaf => {}
            Node::Unary(child) => {
                out.push('\n');
                out.push_str(&child.repr(indent + 1));
            }
            Node::Nary(children) => {
                for child in children {
                    out.push('\n');
                    out.push_str(&child.repr(indent + 1));
                }
            }
        }
        out
    }

    /// The deepest leaf reached by always following the first child — the
    /// "primitive mismatch" the spec's E6 scenario asks callers to be able
    /// to find.
    pub fn deepest(&self) -> &PyshError {
        match &self.node {
            Node::Leaf => self,
            Node::Unary(child) => child.deepest(),
            Node::Nary(children) => children.first().map(|c| c.deepest()).unwrap_or(self),
        }
    }

    /// Render this error tree as an `ariadne` diagnostic report anchored at
    /// the deepest failure, with the full tree as a note.
    pub fn to_report(&self, source_id: &str) -> ariadne::Report<'static, (String, std::ops::Range<usize>)> {
        use ariadne::{Label, Report, ReportKind};

        let offset = match &self.deepest().state {
            State::Chars(s) => s.offset(),
            State::Tokens(s) => s.offset(),
            State::None => 0,
        };
        let span = (source_id.to_string(), offset..offset + 1);
        Report::build(ReportKind::Error, source_id.to_string(), offset)
            .with_message(self.deepest().repr_line())
            .with_label(Label::new(span).with_message("failure originates here"))
            .with_note(self.repr(0))
            .finish()
    }
}

impl fmt::Display for PyshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repr(0))
    }
}

impl std::error::Error for PyshError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_renders_kind_and_message() {
        let e = PyshError::leaf(PyshErrorKind::Regex, State::None, "no match");
        assert!(e.to_string().contains("RegexError"));
        assert!(e.to_string().contains("no match"));
    }

    #[test]
    fn deepest_follows_unary_chain() {
        let leaf = PyshError::leaf(PyshErrorKind::Regex, State::None, "bottom");
        let mid = PyshError::unary(PyshErrorKind::Rule, State::None, "mid", leaf.clone());
        let top = PyshError::unary(PyshErrorKind::Rule, State::None, "top", mid);
        assert_eq!(top.deepest().msg, leaf.msg);
    }

    #[test]
    fn nary_tree_prints_all_children_indented() {
        let a = PyshError::leaf(PyshErrorKind::Regex, State::None, "a failed");
        let b = PyshError::leaf(PyshErrorKind::Regex, State::None, "b failed");
        let top = PyshError::nary(PyshErrorKind::Lex, State::None, "lexer", vec![a, b]);
        let rendered = top.to_string();
        assert!(rendered.contains("a failed"));
        assert!(rendered.contains("b failed"));
    }
}
