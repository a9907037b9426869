//! The textual regex syntax (spec component C): a grammar-construction-time
//! compiler from pattern strings to [`Regex`] programs, itself built with
//! the parser-combinator layer (spec §4.F) over a small hand-lexed set of
//! meta-characters — the self-bootstrap spec.md calls out.

use indexmap::IndexMap;
use lazy_static::lazy_static;

use crate::error::{GrammarError, PyshError, PyshErrorKind};
use crate::lexer::LexRule;
use crate::parser::{self, Parser, Ref, Scope, SingleRule};
use crate::token::Token;

use super::Regex;

const META_CHARS: &[char] = &['(', ')', '[', '-', ']', '|', '*', '+', '?', '!', '^', '~', '.', '\\'];

fn special_to_regex(token: &Token) -> Regex {
    let mut chars = token.val.chars();
    chars.next(); // the leading backslash
    match chars.next() {
        Some('w') => Regex::Whitespace,
        Some('d') => Regex::Range('0', '9'),
        Some(c) => Regex::Literal(c),
        None => Regex::Literal('\\'),
    }
}

fn literal_to_regex(token: &Token) -> Regex {
    Regex::Literal(token.val.chars().next().expect("non-empty literal token"))
}

fn literal_char(regex: &Regex) -> char {
    match regex {
        Regex::Literal(c) => *c,
        other => panic!("expected a literal char in a range bound, got {other}"),
    }
}

fn lit_rule(name: &str) -> Result<LexRule, GrammarError> {
    LexRule::new(name, Regex::literal(name))
}

/// A `NoResult` rule that pops and discards the named punctuation token.
fn no(name: &str) -> Result<parser::NoRule, GrammarError> {
    Ok(parser::NoRule::new(parser::LexRuleParser::new(lit_rule(name)?)))
}

/// Which suffix/prefix marker fired, so [`apply_suffix`] can pick the right
/// repetition wrapper without re-inspecting the token text.
#[derive(Clone, Copy)]
enum Suffix {
    Star,
    Plus,
    Question,
    Bang,
}

fn marker_rule(name: &str, tag: Suffix) -> Result<SingleRule<Regex>, GrammarError> {
    let sentinel = match tag {
        Suffix::Star => '*',
        Suffix::Plus => '+',
        Suffix::Question => '?',
        Suffix::Bang => '!',
    };
    Ok(SingleRule::new(parser::Literal::new(lit_rule(name)?, move |_| {
        Regex::Literal(sentinel)
    })))
}

fn apply_suffix(mut values: Vec<Regex>) -> Regex {
    let operand = values.remove(0);
    match values.pop() {
        None => operand,
        Some(Regex::Literal('*')) => Regex::zero_or_more(operand),
        Some(Regex::Literal('+')) => Regex::one_or_more(operand),
        Some(Regex::Literal('?')) => Regex::zero_or_one(operand),
        Some(Regex::Literal('!')) => Regex::until_empty(operand),
        Some(_) => operand,
    }
}

/// Wraps `operand` with the optional `^`/`~` prefix (`Not`/`Skip`).
fn apply_prefix(operand: SingleRule<Regex>) -> Result<SingleRule<Regex>, GrammarError> {
    let not_prefixed = (no("^")? & operand.clone())?.convert(Regex::not);
    let skip_prefixed = (no("~")? & operand.clone())?.convert(Regex::skip);
    parser::or([not_prefixed, skip_prefixed, operand])
}

/// Builds the self-contained `Scope<Regex>` grammar for the textual syntax:
/// `regex := operation+`, `operation := ("^"|"~")? operand ("*"|"+"|"?"|"!")?`,
/// `operand := range | group | special | any | literal`.
fn build_grammar() -> Result<Parser<Regex>, GrammarError> {
    let special_rule: SingleRule<Regex> = SingleRule::new(parser::Literal::new(
        LexRule::new("escape", Regex::and([Regex::Literal('\\'), Regex::Any]))?,
        special_to_regex,
    ));
    let any_rule: SingleRule<Regex> =
        SingleRule::new(parser::Literal::new(lit_rule(".")?, |_| Regex::Any));
    let literal_rule: SingleRule<Regex> = SingleRule::new(parser::Literal::new(
        LexRule::new(
            "literal",
            Regex::not(Regex::or(META_CHARS.iter().copied().map(Regex::Literal))),
        )?,
        literal_to_regex,
    ));

    // range := "[" literal "-" literal "]"
    let range_rule: SingleRule<Regex> = {
        let open = no("[")?;
        let dash = no("-")?;
        let close = no("]")?;
        let seq = (open & literal_rule.clone())?; // Single
        let seq = (seq & dash)?; // Single
        let seq = (seq & literal_rule.clone())?; // Multiple: [lo, hi]
        let seq = (seq & close)?; // Multiple
        seq.convert(|values: Vec<Regex>| {
            Regex::Range(literal_char(&values[0]), literal_char(&values[1]))
        })
    };

    // group := "(" regex ("|" regex)* ")" — one alternative is plain
    // grouping; two or more becomes an Or (spec requires parens for Or).
    let group_rule: SingleRule<Regex> = {
        let open = no("(")?;
        let close = no(")")?;
        let pipe_regex = (no("|")? & Ref::<Regex>::new("regex"))?; // Single
        let rest = parser::zero_or_more(pipe_regex);
        let first = Ref::<Regex>::new("regex");
        let inner = (first & rest)?; // Multiple: [first, ...alternatives]
        let body = inner.convert(|mut values: Vec<Regex>| {
            if values.len() == 1 {
                values.remove(0)
            } else {
                Regex::or(values)
            }
        });
        let seq = (open & body)?;
        (seq & close)?
    };

    let operand_rule: SingleRule<Regex> = parser::or([
        range_rule,
        group_rule,
        special_rule,
        any_rule,
        literal_rule,
    ])?;

    let operand_with_suffix: SingleRule<Regex> = {
        let suffix = parser::zero_or_one(parser::or([
            marker_rule("*", Suffix::Star)?,
            marker_rule("+", Suffix::Plus)?,
            marker_rule("?", Suffix::Question)?,
            marker_rule("!", Suffix::Bang)?,
        ])?);
        (operand_rule & suffix)?.convert(apply_suffix) // Multiple -> Single
    };

    let operation: SingleRule<Regex> = apply_prefix(operand_with_suffix)?;

    // regex := operation+, collapsing a single operation to itself and
    // concatenating two or more into `And` (adjacency = concatenation).
    let regex_rule: SingleRule<Regex> =
        parser::one_or_more(Ref::<Regex>::new("operation")).convert(|mut ops: Vec<Regex>| {
            if ops.len() == 1 {
                ops.remove(0)
            } else {
                Regex::and(ops)
            }
        });

    let mut rules = IndexMap::new();
    rules.insert("root".to_string(), regex_rule.clone());
    rules.insert("regex".to_string(), regex_rule);
    rules.insert("operation".to_string(), operation);
    Ok(Parser::new("root", Scope::new(rules)))
}

lazy_static! {
    static ref GRAMMAR: Parser<Regex> =
        build_grammar().expect("self-bootstrapped regex grammar must build");
}

/// Compiles a textual regex pattern (spec §4.C's surface syntax) into a
/// [`Regex`] program.
pub fn compile(pattern: &str) -> Result<Regex, PyshError> {
    let (rest, regex) = GRAMMAR.eval(pattern)?;
    if !rest.is_empty() {
        return Err(PyshError::leaf(
            PyshErrorKind::Parse,
            rest,
            "trailing input after regex pattern",
        ));
    }
    Ok(regex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::char_stream::CharStream;

    #[test]
    fn e4_range_self_parse() {
        let regex = compile("[a-z]").unwrap();
        match regex {
            Regex::Range('a', 'z') => {}
            other => panic!("expected Range('a','z'), got {other}"),
        }
    }

    #[test]
    fn e4_star_self_parse() {
        let regex = compile("a*").unwrap();
        match regex {
            Regex::ZeroOrMore(inner) => assert!(matches!(*inner, Regex::Literal('a'))),
            other => panic!("expected ZeroOrMore(Literal('a')), got {other}"),
        }
    }

    #[test]
    fn e4_or_self_parse() {
        let regex = compile("(a|b)").unwrap();
        match regex {
            Regex::Or(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(*children[0], Regex::Literal('a')));
                assert!(matches!(*children[1], Regex::Literal('b')));
            }
            other => panic!("expected Or([a,b]), got {other}"),
        }
    }

    #[test]
    fn compiled_range_matches_like_hand_built() {
        let regex = compile("[a-z]").unwrap();
        let s = CharStream::load("ab");
        let (rest, m) = regex.eval(&s).unwrap();
        assert_eq!(m.value(), "a");
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn whitespace_escape_compiles() {
        let regex = compile("\\w").unwrap();
        assert!(matches!(regex, Regex::Whitespace));
    }

    #[test]
    fn not_prefix_compiles() {
        let regex = compile("^a").unwrap();
        assert!(matches!(regex, Regex::Not(_)));
    }

    #[test]
    fn concatenation_of_two_operations_is_and() {
        let regex = compile("ab").unwrap();
        match regex {
            Regex::And(children) => assert_eq!(children.len(), 2),
            other => panic!("expected And([a,b]), got {other}"),
        }
    }
}
