//! Repetition combinators over a `SingleResult` child (spec §4.F).

use std::fmt;

use crate::error::{PyshError, PyshErrorKind};
use crate::lexer::Lexer;
use crate::token_stream::TokenStream;

use super::rule::{MultipleResultRule, MultipleRule, OptionalResultRule, OptionalRule, Scope, SingleResultRule, SingleRule};

struct ZeroOrMore<T: Clone + 'static>(SingleRule<T>);

impl<T: Clone + 'static> fmt::Display for ZeroOrMore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})*", self.0)
    }
}

impl<T: Clone + 'static> MultipleResultRule<T> for ZeroOrMore<T> {
    fn eval_multiple(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, Vec<T>), PyshError> {
        let mut cur = input;
        let mut values = Vec::new();
        loop {
            let before = cur.offset();
            match self.0.eval_single(cur.clone(), scope) {
                Ok((next, v)) => {
                    if next.offset() == before {
                        // no progress; stop to guarantee termination (spec §8 property 8).
                        break;
                    }
                    cur = next;
                    values.push(v);
                }
                Err(_) => break,
            }
        }
        Ok((cur, values))
    }
    fn lexer(&self) -> Lexer {
        self.0.lexer()
    }
}

/// `ZeroOrMore(r)`: greedy repetition, never fails.
pub fn zero_or_more<T: Clone + 'static>(r: SingleRule<T>) -> MultipleRule<T> {
    MultipleRule::new(ZeroOrMore(r))
}

struct OneOrMore<T: Clone + 'static>(SingleRule<T>);

impl<T: Clone + 'static> fmt::Display for OneOrMore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})+", self.0)
    }
}

impl<T: Clone + 'static> MultipleResultRule<T> for OneOrMore<T> {
    fn eval_multiple(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, Vec<T>), PyshError> {
        let (next, first) = self.0.eval_single(input, scope).map_err(|e| {
            PyshError::unary(PyshErrorKind::Rule, e.state.clone(), self.to_string(), e)
        })?;
        let (rest, mut more) = ZeroOrMore(self.0.clone()).eval_multiple(next, scope)?;
        let mut values = vec![first];
        values.append(&mut more);
        Ok((rest, values))
    }
    fn lexer(&self) -> Lexer {
        self.0.lexer()
    }
}

/// `OneOrMore(r)`: greedy repetition, fails if the first attempt fails.
pub fn one_or_more<T: Clone + 'static>(r: SingleRule<T>) -> MultipleRule<T> {
    MultipleRule::new(OneOrMore(r))
}

struct ZeroOrOne<T: Clone + 'static>(SingleRule<T>);

impl<T: Clone + 'static> fmt::Display for ZeroOrOne<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})?", self.0)
    }
}

impl<T: Clone + 'static> OptionalResultRule<T> for ZeroOrOne<T> {
    fn eval_optional(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, Option<T>), PyshError> {
        match self.0.eval_single(input.clone(), scope) {
            Ok((next, v)) => Ok((next, Some(v))),
            Err(_) => Ok((input, None)),
        }
    }
    fn lexer(&self) -> Lexer {
        self.0.lexer()
    }
}

/// `ZeroOrOne(r)`: optional match, never fails.
pub fn zero_or_one<T: Clone + 'static>(r: SingleRule<T>) -> OptionalRule<T> {
    OptionalRule::new(ZeroOrOne(r))
}

struct UntilEmpty<T: Clone + 'static>(SingleRule<T>);

impl<T: Clone + 'static> fmt::Display for UntilEmpty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})!", self.0)
    }
}

impl<T: Clone + 'static> MultipleResultRule<T> for UntilEmpty<T> {
    fn eval_multiple(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, Vec<T>), PyshError> {
        let mut cur = input;
        let mut values = Vec::new();
        while !cur.is_empty() {
            let (next, v) = self.0.eval_single(cur.clone(), scope).map_err(|e| {
                PyshError::unary(PyshErrorKind::Rule, e.state.clone(), self.to_string(), e)
            })?;
            cur = next;
            values.push(v);
        }
        Ok((cur, values))
    }
    fn lexer(&self) -> Lexer {
        self.0.lexer()
    }
}

/// `UntilEmpty(r)`: repeats `r` until the stream is empty; any intermediate
/// failure is fatal. An already-empty stream succeeds trivially.
pub fn until_empty<T: Clone + 'static>(r: SingleRule<T>) -> MultipleRule<T> {
    MultipleRule::new(UntilEmpty(r))
}

struct UntilToken<T: Clone + 'static> {
    inner: SingleRule<T>,
    stop_rule: String,
}

impl<T: Clone + 'static> fmt::Display for UntilToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) until {:?}", self.inner, self.stop_rule)
    }
}

impl<T: Clone + 'static> MultipleResultRule<T> for UntilToken<T> {
    fn eval_multiple(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, Vec<T>), PyshError> {
        let mut cur = input;
        let mut values = Vec::new();
        loop {
            match cur.peek() {
                None => break,
                Some(t) if t.rule_name == self.stop_rule => break,
                Some(_) => {
                    let (next, v) = self.inner.eval_single(cur.clone(), scope).map_err(|e| {
                        PyshError::unary(PyshErrorKind::Rule, e.state.clone(), self.to_string(), e)
                    })?;
                    cur = next;
                    values.push(v);
                }
            }
        }
        Ok((cur, values))
    }
    fn lexer(&self) -> Lexer {
        self.inner.lexer()
    }
}

/// `UntilToken(stop_rule)(r)`: like [`until_empty`] but also stops once the
/// head token's rule name equals `stop_rule`. Never fails, even on an
/// already-empty stream.
pub fn until_token<T: Clone + 'static>(r: SingleRule<T>, stop_rule: impl Into<String>) -> MultipleRule<T> {
    MultipleRule::new(UntilToken {
        inner: r,
        stop_rule: stop_rule.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LexRule;
    use crate::parser::literal::Literal;
    use crate::position::Position;
    use crate::regex::Regex;
    use crate::token::Token;

    fn single(name: &str) -> SingleRule<String> {
        let rule = LexRule::new(name, Regex::literal(name)).unwrap();
        SingleRule::new(Literal::new(rule, |t: &Token| t.val.clone()))
    }

    fn tokens(names: &[&str]) -> TokenStream {
        TokenStream::new(
            names
                .iter()
                .map(|n| Token::new(*n, *n, Position::default()))
                .collect(),
        )
    }

    #[test]
    fn zero_or_more_never_fails_on_empty() {
        let scope = Scope::default();
        let rule = zero_or_more(single("a"));
        let (rest, values) = rule.eval_multiple(tokens(&["b"]), &scope).unwrap();
        assert!(values.is_empty());
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn one_or_more_fails_if_first_fails() {
        let scope = Scope::default();
        let rule = one_or_more(single("a"));
        assert!(rule.eval_multiple(tokens(&["b"]), &scope).is_err());
    }

    #[test]
    fn one_or_more_consumes_all_matches() {
        let scope = Scope::default();
        let rule = one_or_more(single("a"));
        let (rest, values) = rule.eval_multiple(tokens(&["a", "a", "b"]), &scope).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn until_token_stops_before_stop_rule() {
        let scope = Scope::default();
        let rule = until_token(single("a"), "stop");
        let (rest, values) = rule
            .eval_multiple(tokens(&["a", "a", "stop"]), &scope)
            .unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn until_token_on_empty_stream_returns_empty() {
        let scope = Scope::default();
        let rule = until_token(single("a"), "stop");
        let (rest, values) = rule.eval_multiple(tokens(&[]), &scope).unwrap();
        assert!(values.is_empty());
        assert!(rest.is_empty());
    }
}
