//! Sequence composition — the "conceptual `&` operator" and its arity
//! algebra (spec §4.F's table).

use std::fmt;

use crate::error::{GrammarError, PyshError, PyshErrorKind};
use crate::lexer::Lexer;
use crate::token_stream::TokenStream;

use super::rule::{
    MultipleResultRule, MultipleRule, NoResultRule, NoRule, OptionalResultRule, OptionalRule,
    Scope, SingleResultRule, SingleRule,
};

/// A `NoResult & NoResult -> NoResult` sequence. Never produces a value;
/// every child is, by construction, itself `NoResult`.
struct NoAnd {
    lhs: NoRule,
    rhs: NoRule,
    lexer: Lexer,
}

impl fmt::Display for NoAnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} & {})", self.lhs, self.rhs)
    }
}

impl NoResultRule for NoAnd {
    fn eval_no(&self, input: TokenStream) -> Result<TokenStream, PyshError> {
        let wrap = |e: PyshError| PyshError::unary(PyshErrorKind::Rule, e.state.clone(), self.to_string(), e);
        let rest = self.lhs.eval_no(input).map_err(wrap)?;
        self.rhs.eval_no(rest).map_err(wrap)
    }
    fn lexer(&self) -> Lexer {
        self.lexer.clone()
    }
}

impl std::ops::BitAnd for NoRule {
    type Output = Result<NoRule, GrammarError>;

    fn bitand(self, rhs: NoRule) -> Self::Output {
        let lexer = self.lexer().try_union(&rhs.lexer())?;
        Ok(NoRule::new(NoAnd {
            lhs: self,
            rhs,
            lexer,
        }))
    }
}

/// Either side of a sequence, adapted to "produces zero or more `T`", so a
/// single generic node can implement `Optional`/`Single`/`Multiple` And by
/// just asking each side for its contribution and checking cardinality.
enum Slot<T: Clone + 'static> {
    No(NoRule),
    Optional(OptionalRule<T>),
    Single(SingleRule<T>),
    Multiple(MultipleRule<T>),
}

impl<T: Clone + 'static> Slot<T> {
    fn lexer(&self) -> Lexer {
        match self {
            Slot::No(r) => r.lexer(),
            Slot::Optional(r) => r.lexer(),
            Slot::Single(r) => r.lexer(),
            Slot::Multiple(r) => r.lexer(),
        }
    }

    fn eval(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, Vec<T>), PyshError> {
        match self {
            Slot::No(r) => Ok((r.eval_no(input)?, Vec::new())),
            Slot::Optional(r) => {
                let (rest, v) = r.eval_optional(input, scope)?;
                Ok((rest, v.into_iter().collect()))
            }
            Slot::Single(r) => {
                let (rest, v) = r.eval_single(input, scope)?;
                Ok((rest, vec![v]))
            }
            Slot::Multiple(r) => r.eval_multiple(input, scope),
        }
    }
}

impl<T: Clone + 'static> fmt::Display for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::No(r) => write!(f, "{r}"),
            Slot::Optional(r) => write!(f, "{r}"),
            Slot::Single(r) => write!(f, "{r}"),
            Slot::Multiple(r) => write!(f, "{r}"),
        }
    }
}

/// The shared evaluation machinery behind `OptionalResultAnd`,
/// `SingleResultAnd`, and `MultipleResultAnd` — which trait it implements
/// (and thus which cardinality it enforces) is chosen at construction by
/// which wrapper (`OptionalRule::new` / `SingleRule::new` / `MultipleRule::new`)
/// takes it.
struct SeqAnd<T: Clone + 'static> {
    lhs: Slot<T>,
    rhs: Slot<T>,
    lexer: Lexer,
}

impl<T: Clone + 'static> SeqAnd<T> {
    fn eval_values(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, Vec<T>), PyshError> {
        let wrap = |e: PyshError| PyshError::unary(PyshErrorKind::Rule, e.state.clone(), self.to_string(), e);
        let (rest, mut lhs_values) = self.lhs.eval(input, scope).map_err(wrap)?;
        let (rest, rhs_values) = self.rhs.eval(rest, scope).map_err(wrap)?;
        lhs_values.extend(rhs_values);
        Ok((rest, lhs_values))
    }
}

impl<T: Clone + 'static> fmt::Display for SeqAnd<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} & {})", self.lhs, self.rhs)
    }
}

impl<T: Clone + 'static> OptionalResultRule<T> for SeqAnd<T> {
    fn eval_optional(
        &self,
        input: TokenStream,
        scope: &Scope<T>,
    ) -> Result<(TokenStream, Option<T>), PyshError> {
        let state = input.clone();
        let (rest, mut values) = self.eval_values(input, scope)?;
        match values.len() {
            0 => Ok((rest, None)),
            1 => Ok((rest, Some(values.remove(0)))),
            n => Err(PyshError::leaf(
                PyshErrorKind::Rule,
                state,
                format!("{self} saw {n} results, expected at most one"),
            )),
        }
    }
    fn lexer(&self) -> Lexer {
        self.lexer.clone()
    }
}

impl<T: Clone + 'static> SingleResultRule<T> for SeqAnd<T> {
    fn eval_single(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, T), PyshError> {
        let state = input.clone();
        let (rest, mut values) = self.eval_values(input, scope)?;
        if values.len() != 1 {
            return Err(PyshError::leaf(
                PyshErrorKind::Rule,
                state,
                format!("{self} saw {} results, expected exactly one", values.len()),
            ));
        }
        Ok((rest, values.remove(0)))
    }
    fn lexer(&self) -> Lexer {
        self.lexer.clone()
    }
}

impl<T: Clone + 'static> MultipleResultRule<T> for SeqAnd<T> {
    fn eval_multiple(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, Vec<T>), PyshError> {
        self.eval_values(input, scope)
    }
    fn lexer(&self) -> Lexer {
        self.lexer.clone()
    }
}

fn seq_lexer(a: &Lexer, b: &Lexer) -> Result<Lexer, GrammarError> {
    a.try_union(b)
}

macro_rules! seq_and {
    ($lhs_ty:ty, $rhs_ty:ty, $out:ty, $out_ctor:ident, $lhs_slot:ident, $rhs_slot:ident) => {
        impl<T: Clone + 'static> std::ops::BitAnd<$rhs_ty> for $lhs_ty {
            type Output = Result<$out, GrammarError>;

            fn bitand(self, rhs: $rhs_ty) -> Self::Output {
                let lexer = seq_lexer(&self.lexer(), &rhs.lexer())?;
                Ok(<$out>::new(SeqAnd {
                    lhs: Slot::$lhs_slot(self),
                    rhs: Slot::$rhs_slot(rhs),
                    lexer,
                }))
            }
        }
    };
}

// row: NoResult
seq_and!(NoRule, OptionalRule<T>, OptionalRule<T>, OptionalRule, No, Optional);
seq_and!(NoRule, SingleRule<T>, SingleRule<T>, SingleRule, No, Single);
seq_and!(NoRule, MultipleRule<T>, MultipleRule<T>, MultipleRule, No, Multiple);

// row: Optional
seq_and!(OptionalRule<T>, NoRule, OptionalRule<T>, OptionalRule, Optional, No);
seq_and!(OptionalRule<T>, OptionalRule<T>, MultipleRule<T>, MultipleRule, Optional, Optional);
seq_and!(OptionalRule<T>, SingleRule<T>, MultipleRule<T>, MultipleRule, Optional, Single);
seq_and!(OptionalRule<T>, MultipleRule<T>, MultipleRule<T>, MultipleRule, Optional, Multiple);

// row: Single
seq_and!(SingleRule<T>, NoRule, SingleRule<T>, SingleRule, Single, No);
seq_and!(SingleRule<T>, OptionalRule<T>, MultipleRule<T>, MultipleRule, Single, Optional);
seq_and!(SingleRule<T>, SingleRule<T>, MultipleRule<T>, MultipleRule, Single, Single);
seq_and!(SingleRule<T>, MultipleRule<T>, MultipleRule<T>, MultipleRule, Single, Multiple);

// row: Multiple
seq_and!(MultipleRule<T>, NoRule, MultipleRule<T>, MultipleRule, Multiple, No);
seq_and!(MultipleRule<T>, OptionalRule<T>, MultipleRule<T>, MultipleRule, Multiple, Optional);
seq_and!(MultipleRule<T>, SingleRule<T>, MultipleRule<T>, MultipleRule, Multiple, Single);
seq_and!(MultipleRule<T>, MultipleRule<T>, MultipleRule<T>, MultipleRule, Multiple, Multiple);
