//! Choice: the `Or` combinator over `SingleResult` children (spec §4.F).

use std::fmt;

use itertools::Itertools;

use crate::error::{PyshError, PyshErrorKind};
use crate::lexer::Lexer;
use crate::token_stream::TokenStream;

use super::rule::{Scope, SingleResultRule, SingleRule};

pub struct Or<T: Clone + 'static> {
    children: Vec<SingleRule<T>>,
    lexer: Lexer,
}

impl<T: Clone + 'static> Or<T> {
    pub fn new(children: Vec<SingleRule<T>>) -> Result<Self, crate::error::GrammarError> {
        let mut lexer = Lexer::empty();
        for child in &children {
            lexer = lexer.try_union(&child.lexer())?;
        }
        Ok(Or { children, lexer })
    }
}

impl<T: Clone + 'static> fmt::Display for Or<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.children.iter().map(|c| c.to_string()).join(" | "))
    }
}

impl<T: Clone + 'static> SingleResultRule<T> for Or<T> {
    fn eval_single(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, T), PyshError> {
        log::trace!("trying {} alternatives for {self}", self.children.len());
        let mut errors = Vec::new();
        for child in &self.children {
            match child.eval_single(input.clone(), scope) {
                Ok(ok) => return Ok(ok),
                Err(e) => errors.push(e),
            }
        }
        Err(PyshError::nary(
            PyshErrorKind::Rule,
            input,
            self.to_string(),
            errors,
        ))
    }
    fn lexer(&self) -> Lexer {
        self.lexer.clone()
    }
}

/// Builds a `SingleRule<T>` trying each alternative left-to-right.
pub fn or<T: Clone + 'static>(
    children: impl IntoIterator<Item = SingleRule<T>>,
) -> Result<SingleRule<T>, crate::error::GrammarError> {
    Ok(SingleRule::new(Or::new(children.into_iter().collect())?))
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

    #[test]
    fn tries_children_left_to_right() {
        let rule = or([single("a"), single("b")]).unwrap();
        let scope = Scope::default();
        let tokens = TokenStream::new(vec![Token::new("b", "b", Position::default())]);
        let (_, v) = rule.eval_single(tokens, &scope).unwrap();
        assert_eq!(v, "b");
    }

    #[test]
    fn property7_choice_is_commutative_on_success() {
        let ab = or([single("a"), single("b")]).unwrap();
        let ba = or([single("b"), single("a")]).unwrap();
        let scope = Scope::default();
        let tok = || TokenStream::new(vec![Token::new("b", "b", Position::default())]);
        let (_, v1) = ab.eval_single(tok(), &scope).unwrap();
        let (_, v2) = ba.eval_single(tok(), &scope).unwrap();
        assert_eq!(v1, v2);
    }

    #[test]
    fn all_fail_aggregates_errors() {
        let rule = or([single("a"), single("b")]).unwrap();
        let scope = Scope::default();
        let tokens = TokenStream::new(vec![Token::new("c", "c", Position::default())]);
        assert!(rule.eval_single(tokens, &scope).is_err());
    }
}
