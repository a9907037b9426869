//! Lexer output (spec component D).

use std::fmt;

use crate::char_stream::Char;
use crate::error::{PyshError, PyshErrorKind};
use crate::position::Position;

/// A named, positioned lexeme produced by the [`crate::lexer::Lexer`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Token {
    pub rule_name: String,
    pub val: String,
    pub position: Position,
}

impl Token {
    pub fn new(rule_name: impl Into<String>, val: impl Into<String>, position: Position) -> Self {
        Token {
            rule_name: rule_name.into(),
            val: val.into(),
            position,
        }
    }

    /// Builds a token from the chars a regex rule matched. Fails if the
    /// match was empty — a lex rule is expected to drop empty matches
    /// (produced by `Skip`) before ever reaching this constructor.
    pub fn load(rule_name: impl Into<String>, chars: &[Char]) -> Result<Token, PyshError> {
        let first = chars.first().ok_or_else(|| {
            PyshError::leaf(
                PyshErrorKind::TokenStream,
                crate::error::State::None,
                "no chars to load token",
            )
        })?;
        let val: String = chars.iter().map(|c| c.val).collect();
        Ok(Token::new(rule_name, val, first.position))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rule_name == self.val {
            write!(f, "{:?}", self.rule_name)
        } else {
            write!(f, "{}({:?})", self.rule_name, self.val)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_first_char_position() {
        let chars = [
            Char::new('a', Position::new(0, 3)),
            Char::new('b', Position::new(0, 4)),
        ];
        let t = Token::load("ident", &chars).unwrap();
        assert_eq!(t.val, "ab");
        assert_eq!(t.position, Position::new(0, 3));
    }

    #[test]
    fn load_from_empty_chars_fails() {
        assert!(Token::load("ident", &[]).is_err());
    }
}
