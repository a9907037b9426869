//! `Parser<T> = (root_rule_name, Scope<T>)` — the top-level entry point
//! (spec §3, §4.F "Evaluation entry point").

use std::fmt;

use crate::error::{GrammarError, PyshError, PyshErrorKind};
use crate::lexer::Lexer;
use crate::token_stream::TokenStream;

use super::rule::{EvalInput, Scope, SingleResultRule, SingleRule};

#[derive(Clone)]
pub struct Parser<T: Clone + 'static> {
    pub root: String,
    pub scope: Scope<T>,
}

impl<T: Clone + 'static> Parser<T> {
    pub fn new(root: impl Into<String>, scope: Scope<T>) -> Self {
        Parser {
            root: root.into(),
            scope,
        }
    }

    /// The union of every rule's associated lexer in this grammar's scope.
    pub fn lexer(&self) -> Result<Lexer, GrammarError> {
        self.scope.lexer()
    }

    fn root_rule(&self, input: &TokenStream) -> Result<SingleRule<T>, PyshError> {
        self.scope.get(&self.root).ok_or_else(|| {
            PyshError::leaf(
                PyshErrorKind::Parse,
                input.clone(),
                format!("unknown root rule {:?}", self.root),
            )
        })
    }

    /// Evaluates this grammar against `input` (source text or an
    /// already-tokenized stream). Most callers assert the returned
    /// remainder is empty.
    pub fn eval(&self, input: impl Into<EvalInput>) -> Result<(TokenStream, T), PyshError> {
        let tokens = match input.into() {
            EvalInput::Str(s) => {
                let lexer = self.lexer().map_err(|e| {
                    PyshError::leaf(
                        PyshErrorKind::Parse,
                        crate::error::State::None,
                        format!("failed to build grammar lexer: {e}"),
                    )
                })?;
                lexer.tokenize_str(&s)?
            }
            EvalInput::Tokens(t) => t,
        };
        let root = self.root_rule(&tokens)?;
        root.eval_single(tokens, &self.scope)
    }
}

impl<T: Clone + 'static> fmt::Display for Parser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parser({:?})", self.root)
    }
}

/// Adapts this grammar's AST type to `U`, producing a standalone
/// [`SingleRule<U>`] that still tokenizes and parses entirely through this
/// grammar's own `root`/`scope` — the resulting rule can be mounted into a
/// larger `U`-typed grammar via `Ref`/`with_scope` just like any other
/// `SingleRule<U>`. Consumes `self` since a `Parser<T>` owns a complete,
/// self-contained `Scope<T>`; there's no way to adapt in place without
/// erasing that scope's type.
impl<T: Clone + 'static> Parser<T> {
    pub fn convert_type<U, F>(self, f: F) -> SingleRule<U>
    where
        U: Clone + 'static,
        F: Fn(T) -> U + 'static,
    {
        SingleRule::new(ConvertType { parser: self, f })
    }
}

struct ConvertType<T: Clone + 'static, U, F> {
    parser: Parser<T>,
    f: F,
}

impl<T: Clone + 'static, U: Clone + 'static, F: Fn(T) -> U + 'static> fmt::Display
    for ConvertType<T, U, F>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.convert_type()", self.parser)
    }
}

impl<T: Clone + 'static, U: Clone + 'static, F: Fn(T) -> U + 'static> SingleResultRule<U>
    for ConvertType<T, U, F>
{
    fn eval_single(&self, input: TokenStream, _scope: &Scope<U>) -> Result<(TokenStream, U), PyshError> {
        let (rest, v) = self.parser.eval_single(input, &self.parser.scope)?;
        Ok((rest, (self.f)(v)))
    }

    fn lexer(&self) -> Lexer {
        <Parser<T> as SingleResultRule<T>>::lexer(&self.parser)
    }
}

/// A `Parser<T>` acts itself as a `SingleResult<T>`: dispatching through it
/// ignores the caller's scope and evaluates fully within its own.
impl<T: Clone + 'static> SingleResultRule<T> for Parser<T> {
    fn eval_single(
        &self,
        input: TokenStream,
        _scope: &Scope<T>,
    ) -> Result<(TokenStream, T), PyshError> {
        let root = self.root_rule(&input)?;
        root.eval_single(input, &self.scope)
    }

    fn lexer(&self) -> Lexer {
        self.lexer().unwrap_or_else(|_| Lexer::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LexRule;
    use crate::parser::literal::Literal;
    use crate::position::Position;
    use crate::regex::Regex;
    use crate::token::Token;

    #[test]
    fn eval_tokenizes_string_input_and_parses() {
        let rule = LexRule::new("a", Regex::literal("a")).unwrap();
        let root: SingleRule<String> = SingleRule::new(Literal::new(rule, |t: &Token| t.val.clone()));
        let scope = Scope::single("root", root);
        let parser = Parser::new("root", scope);
        let (rest, v) = parser.eval("a").unwrap();
        assert!(rest.is_empty());
        assert_eq!(v, "a");
    }

    #[test]
    fn unknown_root_fails() {
        let scope: Scope<String> = Scope::default();
        let parser = Parser::new("missing", scope);
        assert!(parser.eval(TokenStream::new(vec![])).is_err());
    }

    #[test]
    fn convert_type_adapts_grammar_output_and_lexer() {
        let rule = LexRule::new("a", Regex::literal("a")).unwrap();
        let root: SingleRule<String> = SingleRule::new(Literal::new(rule, |t: &Token| t.val.clone()));
        let scope = Scope::single("root", root);
        let parser = Parser::new("root", scope);

        let adapted: SingleRule<usize> = parser.convert_type(|s| s.len());
        let outer_scope: Scope<usize> = Scope::default();
        let (rest, v) = adapted
            .eval_single(adapted.lexer().tokenize_str("a").unwrap(), &outer_scope)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(v, 1);
    }
}
