//! Named references into a [`Scope`] — how recursive grammars are expressed
//! without cyclic rule values (spec §4.F, §9).

use std::fmt;
use std::marker::PhantomData;

use crate::error::{PyshError, PyshErrorKind};
use crate::lexer::Lexer;
use crate::token_stream::TokenStream;

use super::rule::{Scope, SingleResultRule, SingleRule};

/// A `SingleResult` rule that looks up `name` in the active [`Scope`] at
/// call time and dispatches to it.
///
/// Left-recursive grammars (a rule whose own expansion starts with `Ref`
/// of itself) are not detected here and will recurse until the stack is
/// exhausted — the spec leaves this undefined rather than mandating a
/// productive-prefix check, so this stays a documented hazard, not a
/// runtime guard.
pub struct Ref<T: Clone + 'static> {
    name: String,
    _marker: PhantomData<T>,
}

impl<T: Clone + 'static> Ref<T> {
    pub fn new(name: impl Into<String>) -> SingleRule<T> {
        SingleRule::new(Ref {
            name: name.into(),
            _marker: PhantomData,
        })
    }
}

impl<T: Clone + 'static> fmt::Display for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref({:?})", self.name)
    }
}

impl<T: Clone + 'static> SingleResultRule<T> for Ref<T> {
    fn eval_single(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, T), PyshError> {
        log::trace!("dispatching ref {:?}", self.name);
        let rule = scope.get(&self.name).ok_or_else(|| {
            PyshError::leaf(
                PyshErrorKind::Parse,
                input.clone(),
                format!("unknown rule {:?}", self.name),
            )
        })?;
        rule.eval_single(input, scope).map_err(|e| {
            PyshError::unary(PyshErrorKind::Parse, e.state.clone(), self.to_string(), e)
        })
    }

    fn lexer(&self) -> Lexer {
        // The referenced rule's lexer is only known once it's resolved in
        // a scope; `Parser::lexer` unions every rule's lexer directly
        // instead of asking each `Ref` to report one.
        Lexer::empty()
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
    fn ref_dispatches_to_scope_entry() {
        let rule = LexRule::new("a", Regex::literal("a")).unwrap();
        let target: SingleRule<String> = SingleRule::new(Literal::new(rule, |t: &Token| t.val.clone()));
        let scope = Scope::single("target", target);
        let r: SingleRule<String> = Ref::new("target");
        let tokens = TokenStream::new(vec![Token::new("a", "a", Position::default())]);
        let (_, v) = r.eval_single(tokens, &scope).unwrap();
        assert_eq!(v, "a");
    }

    #[test]
    fn ref_to_unknown_name_fails() {
        let scope: Scope<String> = Scope::default();
        let r: SingleRule<String> = Ref::new("missing");
        let tokens = TokenStream::new(vec![]);
        assert!(r.eval_single(tokens, &scope).is_err());
    }
}
