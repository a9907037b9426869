//! A parser-combinator toolkit: a regex engine, a declarative lexer, and
//! arity-classified parser combinators composed into grammars that turn
//! raw source text into a caller-defined AST.

pub mod char_stream;
pub mod error;
pub mod lexer;
pub mod parsable;
pub mod parser;
pub mod position;
pub mod regex;
pub mod token;
pub mod token_stream;

pub use char_stream::{Char, CharStream};
pub use error::{GrammarError, PyshError, PyshErrorKind};
pub use lexer::{LexRule, Lexer};
pub use parsable::{Parsable, ParsableWithContext};
pub use parser::{
    one_or_more, or, until_empty, until_token, zero_or_more, zero_or_one, LexRuleParser, Literal,
    MultipleResultRule, MultipleRule, NoResultRule, NoRule, OptionalResultRule, OptionalRule,
    Parser, Ref, Scope, SingleResultRule, SingleRule,
};
pub use position::Position;
pub use regex::Regex;
pub use token::Token;
pub use token_stream::TokenStream;
