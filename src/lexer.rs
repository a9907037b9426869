//! Ordered, named regex rules tokenizing a [`CharStream`] (spec component E).

use std::rc::Rc;

use crate::char_stream::CharStream;
use crate::error::{GrammarError, PyshError, PyshErrorKind};
use crate::regex::Regex;
use crate::token::Token;
use crate::token_stream::TokenStream;

/// A named regex program. Invariant: `name` is non-empty.
#[derive(Debug, Clone)]
pub struct LexRule {
    pub name: String,
    pub regex: Rc<Regex>,
}

impl LexRule {
    pub fn new(name: impl Into<String>, regex: Regex) -> Result<Self, GrammarError> {
        let name = name.into();
        if name.is_empty() {
            return Err(GrammarError::EmptyRuleName);
        }
        Ok(LexRule {
            name,
            regex: Rc::new(regex),
        })
    }

    fn same_program(&self, other: &LexRule) -> bool {
        // Rules compare equal when they're the same compiled program or
        // render to the same textual form; string comparison is sufficient
        // here since `Regex` has no semantically-distinct representations
        // that print identically.
        self.regex.to_string() == other.regex.to_string()
    }
}

/// An ordered set of [`LexRule`]s, tried in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    rules: Vec<LexRule>,
}

impl Lexer {
    pub fn new(rules: Vec<LexRule>) -> Self {
        Lexer { rules }
    }

    pub fn empty() -> Self {
        Lexer { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[LexRule] {
        &self.rules
    }

    /// Builds a lexer of single-literal rules, one per string, each rule
    /// named after the literal it matches.
    pub fn literal(words: &[&str]) -> Result<Self, GrammarError> {
        let mut rules = Vec::new();
        for w in words {
            rules.push(LexRule::new(*w, Regex::literal(w))?);
        }
        Ok(Lexer::new(rules))
    }

    /// A single rule, named `"whitespace"`, matching `~(\w+)` — one or more
    /// whitespace chars, consumed and dropped.
    pub fn whitespace() -> Self {
        let rule = LexRule::new(
            "whitespace",
            Regex::skip(Regex::one_or_more(Regex::Whitespace)),
        )
        .expect("non-empty literal name");
        Lexer::new(vec![rule])
    }

    /// Unions two lexers, preserving declaration order (self's rules first).
    /// Fails if both define the same name with differing programs.
    pub fn try_union(&self, other: &Lexer) -> Result<Lexer, GrammarError> {
        let mut rules = self.rules.clone();
        for rule in &other.rules {
            match rules.iter().find(|r| r.name == rule.name) {
                Some(existing) if !existing.same_program(rule) => {
                    return Err(GrammarError::DuplicateLexRule {
                        name: rule.name.clone(),
                    })
                }
                Some(_) => {}
                None => rules.push(rule.clone()),
            }
        }
        Ok(Lexer::new(rules))
    }

    /// Tries each rule in declaration order, returning the advanced state
    /// and the produced token — `None` when the winning rule's match was
    /// empty (a `Skip` rule), meaning no token should be emitted.
    fn apply_any(&self, state: &CharStream) -> Result<(CharStream, Option<Token>), PyshError> {
        let mut errors = Vec::new();
        for rule in &self.rules {
            match rule.regex.eval(state) {
                Ok((next, m)) => {
                    if m.is_empty() {
                        log::trace!("lex rule {:?} matched empty, dropping", rule.name);
                        return Ok((next, None));
                    }
                    let token = Token::load(&rule.name, m.chars())?;
                    log::debug!("lex rule {:?} produced {token}", rule.name);
                    return Ok((next, Some(token)));
                }
                Err(e) => errors.push(e),
            }
        }
        Err(PyshError::nary(
            PyshErrorKind::Lex,
            state.clone(),
            "lexer",
            errors,
        ))
    }

    /// Tokenizes `state` into a [`TokenStream`], dropping tokens produced by
    /// `Skip`-containing rules, per spec §4.E.
    pub fn tokenize(&self, mut state: CharStream) -> Result<TokenStream, PyshError> {
        let mut tokens = Vec::new();
        while !state.is_empty() {
            let (next, token) = self.apply_any(&state)?;
            state = next;
            if let Some(token) = token {
                tokens.push(token);
            }
        }
        Ok(TokenStream::new(tokens))
    }

    pub fn tokenize_str(&self, s: &str) -> Result<TokenStream, PyshError> {
        self.tokenize(CharStream::load(s))
    }
}

impl std::ops::BitOr for Lexer {
    type Output = Result<Lexer, GrammarError>;

    fn bitor(self, rhs: Lexer) -> Self::Output {
        self.try_union(&rhs)
    }
}

impl std::ops::BitOr for &Lexer {
    type Output = Result<Lexer, GrammarError>;

    fn bitor(self, rhs: &Lexer) -> Self::Output {
        self.try_union(rhs)
    }
}
