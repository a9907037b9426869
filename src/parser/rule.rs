//! Arity-classified parser rules (spec component F) and the [`Scope`] used
//! for named references.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::char_stream::CharStream;
use crate::error::{GrammarError, PyshError, PyshErrorKind};
use crate::lexer::Lexer;
use crate::token_stream::TokenStream;

/// A rule that consumes tokens but produces no payload — e.g. popping a
/// fixed keyword or punctuation token and discarding it.
pub trait NoResultRule: fmt::Display {
    fn eval_no(&self, input: TokenStream) -> Result<TokenStream, PyshError>;
    fn lexer(&self) -> Lexer;
}

/// A rule that consumes tokens and produces exactly one `T`.
pub trait SingleResultRule<T: Clone + 'static>: fmt::Display {
    fn eval_single(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, T), PyshError>;
    fn lexer(&self) -> Lexer;
}

/// A rule that consumes tokens and produces zero or one `T`.
pub trait OptionalResultRule<T: Clone + 'static>: fmt::Display {
    fn eval_optional(
        &self,
        input: TokenStream,
        scope: &Scope<T>,
    ) -> Result<(TokenStream, Option<T>), PyshError>;
    fn lexer(&self) -> Lexer;
}

/// A rule that consumes tokens and produces a sequence of `T`.
pub trait MultipleResultRule<T: Clone + 'static>: fmt::Display {
    fn eval_multiple(
        &self,
        input: TokenStream,
        scope: &Scope<T>,
    ) -> Result<(TokenStream, Vec<T>), PyshError>;
    fn lexer(&self) -> Lexer;
}

/// Cheaply-`Clone`able handle to a [`NoResultRule`].
#[derive(Clone)]
pub struct NoRule(pub(crate) Rc<dyn NoResultRule>);

/// Cheaply-`Clone`able handle to a [`SingleResultRule`].
pub struct SingleRule<T: Clone + 'static>(pub(crate) Rc<dyn SingleResultRule<T>>);
impl<T: Clone + 'static> Clone for SingleRule<T> {
    fn clone(&self) -> Self {
        SingleRule(self.0.clone())
    }
}

/// Cheaply-`Clone`able handle to an [`OptionalResultRule`].
pub struct OptionalRule<T: Clone + 'static>(pub(crate) Rc<dyn OptionalResultRule<T>>);
impl<T: Clone + 'static> Clone for OptionalRule<T> {
    fn clone(&self) -> Self {
        OptionalRule(self.0.clone())
    }
}

/// Cheaply-`Clone`able handle to a [`MultipleResultRule`].
pub struct MultipleRule<T: Clone + 'static>(pub(crate) Rc<dyn MultipleResultRule<T>>);
impl<T: Clone + 'static> Clone for MultipleRule<T> {
    fn clone(&self) -> Self {
        MultipleRule(self.0.clone())
    }
}

impl fmt::Display for NoRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl<T: Clone + 'static> fmt::Display for SingleRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl<T: Clone + 'static> fmt::Display for OptionalRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl<T: Clone + 'static> fmt::Display for MultipleRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl NoRule {
    pub fn new(inner: impl NoResultRule + 'static) -> Self {
        NoRule(Rc::new(inner))
    }

    pub fn eval_no(&self, input: TokenStream) -> Result<TokenStream, PyshError> {
        self.0.eval_no(input)
    }

    pub fn lexer(&self) -> Lexer {
        self.0.lexer()
    }

    /// `NoResult -> Optional`: always yields `None`.
    pub fn optional<T: Clone + 'static>(self) -> OptionalRule<T> {
        OptionalRule::new(NoAsOptional {
            inner: self,
            _marker: std::marker::PhantomData,
        })
    }

    /// `NoResult -> Multiple`: always yields the empty sequence.
    pub fn multiple<T: Clone + 'static>(self) -> MultipleRule<T> {
        MultipleRule::new(NoAsMultiple {
            inner: self,
            _marker: std::marker::PhantomData,
        })
    }

    // deliberately no `.single()`: a NoResult child cannot be adapted to
    // Single. There is nothing to construct a value from, so this is a
    // compile-time error rather than a runtime one.
}

impl<T: Clone + 'static> SingleRule<T> {
    pub fn new(inner: impl SingleResultRule<T> + 'static) -> Self {
        SingleRule(Rc::new(inner))
    }

    pub fn eval_single(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, T), PyshError> {
        self.0.eval_single(input, scope)
    }

    pub fn lexer(&self) -> Lexer {
        self.0.lexer()
    }

    fn same_rule(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// `Single -> Optional`: wraps the value in `Some`.
    pub fn optional(self) -> OptionalRule<T> {
        OptionalRule::new(SingleAsOptional(self))
    }

    /// Refines the produced value in place.
    pub fn convert(self, f: impl Fn(T) -> T + 'static) -> SingleRule<T> {
        SingleRule::new(Converted {
            inner: self,
            f: Rc::new(f),
        })
    }

    /// Returns a rule that merges `additional` into the caller's scope
    /// before dispatching to this rule. Used to mount sub-grammars. The
    /// merge itself happens per-call (the caller's scope isn't known until
    /// then), so a name conflict surfaces as a `PyshError` at parse time,
    /// not at construction time.
    pub fn with_scope(self, additional: Scope<T>) -> SingleRule<T> {
        SingleRule::new(WithScope {
            inner: self,
            additional,
        })
    }

    /// Augments this rule's associated lexer without changing its parsing
    /// behavior. Used to attach whitespace/separator rules invisible to the AST.
    pub fn with_lexer(self, additional: Lexer) -> Result<SingleRule<T>, GrammarError> {
        let lexer = self.lexer().try_union(&additional)?;
        Ok(SingleRule::new(WithLexer {
            inner: self,
            lexer,
        }))
    }

    /// `eval(input)`: tokenizes (if `input` is a string) using this rule's
    /// associated lexer, then parses. Most callers assert the remainder is
    /// empty.
    pub fn eval(&self, input: EvalInput, scope: &Scope<T>) -> Result<(TokenStream, T), PyshError> {
        let tokens = match input {
            EvalInput::Str(s) => self.lexer().tokenize_str(&s)?,
            EvalInput::Tokens(t) => t,
        };
        self.eval_single(tokens, scope)
    }
}

impl<T: Clone + 'static> OptionalRule<T> {
    pub fn new(inner: impl OptionalResultRule<T> + 'static) -> Self {
        OptionalRule(Rc::new(inner))
    }

    pub fn eval_optional(
        &self,
        input: TokenStream,
        scope: &Scope<T>,
    ) -> Result<(TokenStream, Option<T>), PyshError> {
        self.0.eval_optional(input, scope)
    }

    pub fn lexer(&self) -> Lexer {
        self.0.lexer()
    }

    /// `Optional -> Single` using `default` when the result is `None`.
    pub fn single_or(self, default: T) -> SingleRule<T> {
        SingleRule::new(OptionalAsSingle {
            inner: self,
            default: Some(default),
        })
    }

    /// `Optional -> Single`, failing at runtime when the result is `None`.
    pub fn single(self) -> SingleRule<T> {
        SingleRule::new(OptionalAsSingle {
            inner: self,
            default: None,
        })
    }

    /// Refines `Option<T> -> T`.
    pub fn convert(self, f: impl Fn(Option<T>) -> T + 'static) -> SingleRule<T> {
        SingleRule::new(OptionalConverted {
            inner: self,
            f: Rc::new(f),
        })
    }
}

impl<T: Clone + 'static> MultipleRule<T> {
    pub fn new(inner: impl MultipleResultRule<T> + 'static) -> Self {
        MultipleRule(Rc::new(inner))
    }

    pub fn eval_multiple(
        &self,
        input: TokenStream,
        scope: &Scope<T>,
    ) -> Result<(TokenStream, Vec<T>), PyshError> {
        self.0.eval_multiple(input, scope)
    }

    pub fn lexer(&self) -> Lexer {
        self.0.lexer()
    }

    /// `Multiple -> Single`: requires exactly one element.
    pub fn single(self) -> SingleRule<T> {
        SingleRule::new(MultipleAsSingle(self))
    }

    /// `Multiple -> Optional`: 0 -> None, 1 -> Some, >=2 -> runtime failure.
    pub fn optional(self) -> OptionalRule<T> {
        OptionalRule::new(MultipleAsOptional(self))
    }

    /// Refines `Vec<T> -> T`.
    pub fn convert(self, f: impl Fn(Vec<T>) -> T + 'static) -> SingleRule<T> {
        SingleRule::new(MultipleConverted {
            inner: self,
            f: Rc::new(f),
        })
    }
}

/// What [`SingleRule::eval`] accepts: raw source text, or an
/// already-tokenized stream.
pub enum EvalInput {
    Str(String),
    Tokens(TokenStream),
}

impl From<&str> for EvalInput {
    fn from(s: &str) -> Self {
        EvalInput::Str(s.to_string())
    }
}

impl From<CharStream> for EvalInput {
    fn from(s: CharStream) -> Self {
        EvalInput::Str(s.as_slice().iter().map(|c| c.val).collect())
    }
}

impl From<TokenStream> for EvalInput {
    fn from(t: TokenStream) -> Self {
        EvalInput::Tokens(t)
    }
}

// ---- adapter plumbing --------------------------------------------------

struct NoAsOptional<T> {
    inner: NoRule,
    _marker: std::marker::PhantomData<T>,
}
impl<T: Clone + 'static> fmt::Display for NoAsOptional<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?", self.inner)
    }
}
impl<T: Clone + 'static> OptionalResultRule<T> for NoAsOptional<T> {
    fn eval_optional(
        &self,
        input: TokenStream,
        _scope: &Scope<T>,
    ) -> Result<(TokenStream, Option<T>), PyshError> {
        Ok((self.inner.eval_no(input)?, None))
    }
    fn lexer(&self) -> Lexer {
        self.inner.lexer()
    }
}

struct NoAsMultiple<T> {
    inner: NoRule,
    _marker: std::marker::PhantomData<T>,
}
impl<T: Clone + 'static> fmt::Display for NoAsMultiple<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*", self.inner)
    }
}
impl<T: Clone + 'static> MultipleResultRule<T> for NoAsMultiple<T> {
    fn eval_multiple(
        &self,
        input: TokenStream,
        _scope: &Scope<T>,
    ) -> Result<(TokenStream, Vec<T>), PyshError> {
        Ok((self.inner.eval_no(input)?, Vec::new()))
    }
    fn lexer(&self) -> Lexer {
        self.inner.lexer()
    }
}

struct SingleAsOptional<T: Clone + 'static>(SingleRule<T>);
impl<T: Clone + 'static> fmt::Display for SingleAsOptional<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?", self.0)
    }
}
impl<T: Clone + 'static> OptionalResultRule<T> for SingleAsOptional<T> {
    fn eval_optional(
        &self,
        input: TokenStream,
        scope: &Scope<T>,
    ) -> Result<(TokenStream, Option<T>), PyshError> {
        let (rest, v) = self.0.eval_single(input, scope)?;
        Ok((rest, Some(v)))
    }
    fn lexer(&self) -> Lexer {
        self.0.lexer()
    }
}

struct OptionalAsSingle<T: Clone + 'static> {
    inner: OptionalRule<T>,
    default: Option<T>,
}
impl<T: Clone + 'static> fmt::Display for OptionalAsSingle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!", self.inner)
    }
}
impl<T: Clone + 'static> SingleResultRule<T> for OptionalAsSingle<T> {
    fn eval_single(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, T), PyshError> {
        let state = input.clone();
        let (rest, v) = self.inner.eval_optional(input, scope)?;
        match v.or_else(|| self.default.clone()) {
            Some(v) => Ok((rest, v)),
            None => Err(PyshError::leaf(
                PyshErrorKind::Rule,
                state,
                format!("{self} got no value and no default"),
            )),
        }
    }
    fn lexer(&self) -> Lexer {
        self.inner.lexer()
    }
}

struct MultipleAsSingle<T: Clone + 'static>(MultipleRule<T>);
impl<T: Clone + 'static> fmt::Display for MultipleAsSingle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.single()", self.0)
    }
}
impl<T: Clone + 'static> SingleResultRule<T> for MultipleAsSingle<T> {
    fn eval_single(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, T), PyshError> {
        let state = input.clone();
        let (rest, mut values) = self.0.eval_multiple(input, scope)?;
        if values.len() != 1 {
            return Err(PyshError::leaf(
                PyshErrorKind::Rule,
                state,
                format!("{self} expected exactly one result, got {}", values.len()),
            ));
        }
        Ok((rest, values.remove(0)))
    }
    fn lexer(&self) -> Lexer {
        self.0.lexer()
    }
}

struct MultipleAsOptional<T: Clone + 'static>(MultipleRule<T>);
impl<T: Clone + 'static> fmt::Display for MultipleAsOptional<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.optional()", self.0)
    }
}
impl<T: Clone + 'static> OptionalResultRule<T> for MultipleAsOptional<T> {
    fn eval_optional(
        &self,
        input: TokenStream,
        scope: &Scope<T>,
    ) -> Result<(TokenStream, Option<T>), PyshError> {
        let state = input.clone();
        let (rest, mut values) = self.0.eval_multiple(input, scope)?;
        let result = match values.len() {
            0 => None,
            1 => Some(values.remove(0)),
            n => {
                return Err(PyshError::leaf(
                    PyshErrorKind::Rule,
                    state,
                    format!("{self} expected at most one result, got {n}"),
                ))
            }
        };
        Ok((rest, result))
    }
    fn lexer(&self) -> Lexer {
        self.0.lexer()
    }
}

struct Converted<T: Clone + 'static> {
    inner: SingleRule<T>,
    f: Rc<dyn Fn(T) -> T>,
}
impl<T: Clone + 'static> fmt::Display for Converted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.convert()", self.inner)
    }
}
impl<T: Clone + 'static> SingleResultRule<T> for Converted<T> {
    fn eval_single(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, T), PyshError> {
        let (rest, v) = self.inner.eval_single(input, scope)?;
        Ok((rest, (self.f)(v)))
    }
    fn lexer(&self) -> Lexer {
        self.inner.lexer()
    }
}

struct OptionalConverted<T: Clone + 'static> {
    inner: OptionalRule<T>,
    f: Rc<dyn Fn(Option<T>) -> T>,
}
impl<T: Clone + 'static> fmt::Display for OptionalConverted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.convert()", self.inner)
    }
}
impl<T: Clone + 'static> SingleResultRule<T> for OptionalConverted<T> {
    fn eval_single(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, T), PyshError> {
        let (rest, v) = self.inner.eval_optional(input, scope)?;
        Ok((rest, (self.f)(v)))
    }
    fn lexer(&self) -> Lexer {
        self.inner.lexer()
    }
}

struct MultipleConverted<T: Clone + 'static> {
    inner: MultipleRule<T>,
    f: Rc<dyn Fn(Vec<T>) -> T>,
}
impl<T: Clone + 'static> fmt::Display for MultipleConverted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.convert()", self.inner)
    }
}
impl<T: Clone + 'static> SingleResultRule<T> for MultipleConverted<T> {
    fn eval_single(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, T), PyshError> {
        let (rest, v) = self.inner.eval_multiple(input, scope)?;
        Ok((rest, (self.f)(v)))
    }
    fn lexer(&self) -> Lexer {
        self.inner.lexer()
    }
}

struct WithScope<T: Clone + 'static> {
    inner: SingleRule<T>,
    additional: Scope<T>,
}
impl<T: Clone + 'static> fmt::Display for WithScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.with_scope()", self.inner)
    }
}
impl<T: Clone + 'static> SingleResultRule<T> for WithScope<T> {
    fn eval_single(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, T), PyshError> {
        let merged = scope.try_merge(&self.additional).map_err(|e| {
            PyshError::leaf(
                PyshErrorKind::Parse,
                input.clone(),
                format!("failed to mount scope: {e}"),
            )
        })?;
        self.inner.eval_single(input, &merged)
    }
    fn lexer(&self) -> Lexer {
        self.inner.lexer()
    }
}

struct WithLexer<T: Clone + 'static> {
    inner: SingleRule<T>,
    lexer: Lexer,
}
impl<T: Clone + 'static> fmt::Display for WithLexer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.with_lexer()", self.inner)
    }
}
impl<T: Clone + 'static> SingleResultRule<T> for WithLexer<T> {
    fn eval_single(&self, input: TokenStream, scope: &Scope<T>) -> Result<(TokenStream, T), PyshError> {
        self.inner.eval_single(input, scope)
    }
    fn lexer(&self) -> Lexer {
        self.lexer.clone()
    }
}

/// Mapping from rule name to [`SingleRule<T>`], used by [`super::reference::Ref`]
/// for named/recursive grammar references.
///
/// Backed by an [`IndexMap`] rather than `std::collections::HashMap`:
/// `lexer()` unions every entry's lexer in map order, and that order must
/// match declaration order for spec §4.E's "priority is pure declaration
/// order" to hold once two named scope entries have overlapping-prefix lex
/// rules (e.g. a keyword rule in one entry, a broader identifier rule in
/// another). A `HashMap`'s randomly-seeded iteration order would make that
/// nondeterministic across runs.
pub struct Scope<T: Clone + 'static> {
    rules: Rc<IndexMap<String, SingleRule<T>>>,
}

impl<T: Clone + 'static> Clone for Scope<T> {
    fn clone(&self) -> Self {
        Scope {
            rules: self.rules.clone(),
        }
    }
}

impl<T: Clone + 'static> Default for Scope<T> {
    fn default() -> Self {
        Scope {
            rules: Rc::new(IndexMap::new()),
        }
    }
}

impl<T: Clone + 'static> Scope<T> {
    pub fn new(rules: IndexMap<String, SingleRule<T>>) -> Self {
        Scope {
            rules: Rc::new(rules),
        }
    }

    pub fn single(name: impl Into<String>, rule: SingleRule<T>) -> Self {
        let mut map = IndexMap::new();
        map.insert(name.into(), rule);
        Scope::new(map)
    }

    pub fn get(&self, name: &str) -> Option<SingleRule<T>> {
        self.rules.get(name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SingleRule<T>)> {
        self.rules.iter()
    }

    /// Merges two scopes, in declaration order (`self`'s entries first,
    /// then any new entries from `other`). Fails if both define the same
    /// name with rules that are not the same underlying rule.
    pub fn try_merge(&self, other: &Scope<T>) -> Result<Scope<T>, GrammarError> {
        let mut merged = (*self.rules).clone();
        for (name, rule) in other.rules.iter() {
            match merged.get(name) {
                Some(existing) if !existing.same_rule(rule) => {
                    return Err(GrammarError::ScopeConflict { name: name.clone() })
                }
                _ => {
                    merged.insert(name.clone(), rule.clone());
                }
            }
        }
        Ok(Scope::new(merged))
    }

    /// The union of every contained rule's associated lexer, in declaration
    /// order.
    pub fn lexer(&self) -> Result<Lexer, GrammarError> {
        let mut lexer = Lexer::empty();
        for rule in self.rules.values() {
            lexer = lexer.try_union(&rule.lexer())?;
        }
        Ok(lexer)
    }
}

impl<T: Clone + 'static> std::ops::BitOr for Scope<T> {
    type Output = Result<Scope<T>, GrammarError>;

    fn bitor(self, rhs: Scope<T>) -> Self::Output {
        self.try_merge(&rhs)
    }
}

impl<T: Clone + 'static> std::ops::BitOr for &Scope<T> {
    type Output = Result<Scope<T>, GrammarError>;

    fn bitor(self, rhs: &Scope<T>) -> Self::Output {
        self.try_merge(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::literal::Literal;
    use crate::position::Position;
    use crate::token::Token;

    fn lit(name: &str) -> SingleRule<String> {
        let rule = crate::lexer::LexRule::new(name, crate::regex::Regex::literal(name)).unwrap();
        SingleRule::new(Literal::new(rule, |t: &Token| t.val.clone()))
    }

    #[test]
    fn single_to_optional_is_some() {
        let scope = Scope::default();
        let rule = lit("a").optional();
        let tokens =
            TokenStream::new(vec![Token::new("a", "a", Position::default())]);
        let (_, v) = rule.eval_optional(tokens, &scope).unwrap();
        assert_eq!(v, Some("a".to_string()));
    }

    #[test]
    fn optional_to_single_without_default_fails_on_none() {
        // `lit("a")` popping against a token named "b" fails inside the
        // inner Literal itself, before the None-vs-default question even
        // arises — eval_optional propagates that failure directly.
        let scope = Scope::default();
        let rule = lit("a").optional().single();
        let tokens = TokenStream::new(vec![Token::new("b", "b", Position::default())]);
        assert!(rule.eval_single(tokens, &scope).is_err());
    }

    #[test]
    fn scope_merge_rejects_conflicting_names() {
        let a = Scope::single("x", lit("a"));
        let b = Scope::single("x", lit("b"));
        assert!(a.try_merge(&b).is_err());
    }

    #[test]
    fn scope_merge_allows_reinserting_same_rule() {
        let rule = lit("a");
        let a = Scope::single("x", rule.clone());
        let b = Scope::single("x", rule);
        assert!(a.try_merge(&b).is_ok());
    }
}
