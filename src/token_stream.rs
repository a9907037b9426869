//! A finite, immutable, shared-storage view over [`Token`]s (spec component D).

use std::fmt;
use std::rc::Rc;

use crate::error::{PyshError, PyshErrorKind};
use crate::token::Token;

#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Rc<[Token]>,
    offset: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        TokenStream {
            tokens: Rc::from(tokens),
            offset: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.tokens.len()
    }

    pub fn len(&self) -> usize {
        self.tokens.len() - self.offset
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.offset)
    }

    pub fn head(&self) -> Result<Token, PyshError> {
        self.peek().cloned().ok_or_else(|| {
            PyshError::leaf(
                PyshErrorKind::TokenStream,
                self.clone(),
                "unexpected end of stream",
            )
        })
    }

    pub fn tail(&self) -> Result<TokenStream, PyshError> {
        if self.is_empty() {
            return Err(PyshError::leaf(
                PyshErrorKind::TokenStream,
                self.clone(),
                "unexpected end of stream",
            ));
        }
        Ok(TokenStream {
            tokens: self.tokens.clone(),
            offset: self.offset + 1,
        })
    }

    /// Pops the head token, optionally requiring its rule name to match.
    pub fn pop(&self, rule_name: Option<&str>) -> Result<(TokenStream, Token), PyshError> {
        let head = self.head()?;
        if let Some(expected) = rule_name {
            if head.rule_name != expected {
                return Err(PyshError::leaf(
                    PyshErrorKind::TokenStream,
                    self.clone(),
                    format!("got {head} expected {expected:?}"),
                ));
            }
        }
        Ok((self.tail()?, head))
    }
}

impl fmt::Display for TokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.tokens[self.offset..]
            .iter()
            .map(|t| t.to_string())
            .collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}
