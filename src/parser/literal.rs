//! Bridging lex rules into the parser layer (spec §4.F "Literals and
//! lex-rule adapters").

use std::fmt;
use std::rc::Rc;

use crate::error::{PyshError, PyshErrorKind};
use crate::lexer::{LexRule, Lexer};
use crate::token::Token;
use crate::token_stream::TokenStream;

use super::rule::{NoResultRule, NoRule, Scope, SingleResultRule, SingleRule};

/// `NoResult`: pops the head token, requiring its rule name match, and
/// discards it. Used for punctuation and keywords that don't appear in the AST.
pub struct LexRuleParser {
    lex_rule: LexRule,
}

impl LexRuleParser {
    pub fn new(lex_rule: LexRule) -> Self {
        LexRuleParser { lex_rule }
    }
}

impl fmt::Display for LexRuleParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.lex_rule.name)
    }
}

impl NoResultRule for LexRuleParser {
    fn eval_no(&self, input: TokenStream) -> Result<TokenStream, PyshError> {
        let (rest, _) = input.pop(Some(&self.lex_rule.name)).map_err(|e| {
            PyshError::unary(PyshErrorKind::Rule, e.state.clone(), self.to_string(), e)
        })?;
        Ok(rest)
    }
    fn lexer(&self) -> Lexer {
        Lexer::new(vec![self.lex_rule.clone()])
    }
}

/// Bare string literals in a sequence are shorthand for
/// `LexRule(name=s, regex=literal(s))`.
impl From<&str> for NoRule {
    fn from(s: &str) -> Self {
        let rule = LexRule::new(s, crate::regex::Regex::literal(s))
            .expect("non-empty literal string");
        NoRule::new(LexRuleParser::new(rule))
    }
}

/// `SingleResult<T>`: pops a head token of the given lex rule and converts
/// it to `T`.
pub struct Literal<T: Clone + 'static> {
    lex_rule: LexRule,
    convert: Rc<dyn Fn(&Token) -> T>,
}

impl<T: Clone + 'static> Literal<T> {
    pub fn new(lex_rule: LexRule, convert: impl Fn(&Token) -> T + 'static) -> Self {
        Literal {
            lex_rule,
            convert: Rc::new(convert),
        }
    }
}

impl<T: Clone + 'static> fmt::Display for Literal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.lex_rule.name)
    }
}

impl<T: Clone + 'static> SingleResultRule<T> for Literal<T> {
    fn eval_single(
        &self,
        input: TokenStream,
        _scope: &Scope<T>,
    ) -> Result<(TokenStream, T), PyshError> {
        let (rest, token) = input.pop(Some(&self.lex_rule.name)).map_err(|e| {
            PyshError::unary(PyshErrorKind::Rule, e.state.clone(), self.to_string(), e)
        })?;
        Ok((rest, (self.convert)(&token)))
    }
    fn lexer(&self) -> Lexer {
        Lexer::new(vec![self.lex_rule.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use crate::regex::Regex;

    #[test]
    fn lex_rule_parser_pops_and_discards() {
        let rule = LexRule::new("a", Regex::literal("a")).unwrap();
        let parser = LexRuleParser::new(rule);
        let tokens = TokenStream::new(vec![Token::new("a", "a", Position::default())]);
        let rest = parser.eval_no(tokens).unwrap();
        assert!(rest.is_empty());
    }

    #[test]
    fn literal_converts_matched_token() {
        let rule = LexRule::new("int", Regex::literal("1")).unwrap();
        let literal = Literal::new(rule, |t: &Token| t.val.parse::<i64>().unwrap());
        let scope: Scope<i64> = Scope::default();
        let tokens = TokenStream::new(vec![Token::new("int", "1", Position::default())]);
        let (rest, v) = literal.eval_single(tokens, &scope).unwrap();
        assert!(rest.is_empty());
        assert_eq!(v, 1);
    }

    #[test]
    fn from_str_builds_discard_rule() {
        let rule: NoRule = "a".into();
        let tokens = TokenStream::new(vec![Token::new("a", "a", Position::default())]);
        assert!(rule.eval_no(tokens).unwrap().is_empty());
    }
}
