//! The `Parsable`/`ParsableWithContext` convenience (spec component G):
//! lets an AST node type own its grammar wiring instead of a caller hand
//! assembling a `Scope` by hand, grounded on
//! `examples/original_source/pysh/core/parser.py`'s `Parsable`/
//! `ParsableWithContext` classes.

use indexmap::IndexMap;

use crate::parser::{Parser, Ref, Scope, SingleRule};

/// A type that knows how to parse itself, and to register whatever other
/// named rules its grammar depends on (typically one entry per concrete
/// variant of a union type).
pub trait Parsable: Clone + Sized + 'static {
    /// This type's name in a [`Scope`]; `Ref`s elsewhere address it by this.
    fn name() -> &'static str;

    /// This type's own parsing rule.
    fn parse_rule() -> SingleRule<Self>;

    /// Named rules this type's grammar also needs registered alongside its
    /// own — e.g. each concrete variant of a union type. Defaults to none:
    /// most types are self-contained.
    fn variants() -> Vec<(&'static str, SingleRule<Self>)> {
        Vec::new()
    }

    /// A reference to this type by name, for composing into other rules
    /// before the full [`Scope`] exists.
    fn ref_rule() -> SingleRule<Self> {
        Ref::new(Self::name())
    }

    /// Assembles a standalone [`Parser<Self>`]: this type's own rule plus
    /// every named variant, in one `Scope`.
    fn parser() -> Parser<Self> {
        let mut rules = IndexMap::new();
        rules.insert(Self::name().to_string(), Self::parse_rule());
        for (name, rule) in Self::variants() {
            rules.insert(name.to_string(), rule);
        }
        Parser::new(Self::name(), Scope::new(rules))
    }
}

/// As [`Parsable`], but the parsing rule needs an external `Ctx` (e.g. a
/// symbol table or type-checking environment) that isn't itself part of
/// the grammar.
pub trait ParsableWithContext<Ctx>: Clone + Sized + 'static {
    fn name() -> &'static str;

    fn parse_rule(context: &Ctx) -> SingleRule<Self>;

    fn variants(_context: &Ctx) -> Vec<(&'static str, SingleRule<Self>)> {
        Vec::new()
    }

    fn ref_rule() -> SingleRule<Self> {
        Ref::new(Self::name())
    }

    fn parser(context: &Ctx) -> Parser<Self> {
        let mut rules = IndexMap::new();
        rules.insert(Self::name().to_string(), Self::parse_rule(context));
        for (name, rule) in Self::variants(context) {
            rules.insert(name.to_string(), rule);
        }
        Parser::new(Self::name(), Scope::new(rules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LexRule;
    use crate::parser::{or, Literal};
    use crate::regex::Regex;
    use crate::token::Token;

    #[derive(Clone, Debug, PartialEq)]
    enum Digit {
        Zero,
        One,
    }

    impl Parsable for Digit {
        fn name() -> &'static str {
            "Digit"
        }

        fn parse_rule() -> SingleRule<Self> {
            let zero = LexRule::new("0", Regex::literal("0")).unwrap();
            let one = LexRule::new("1", Regex::literal("1")).unwrap();
            let zero_rule = SingleRule::new(Literal::new(zero, |_: &Token| Digit::Zero));
            let one_rule = SingleRule::new(Literal::new(one, |_: &Token| Digit::One));
            or([zero_rule, one_rule]).expect("disjoint digit literals")
        }
    }

    #[test]
    fn parsable_builds_a_working_parser() {
        let parser = Digit::parser();
        let (rest, v) = parser.eval("1").unwrap();
        assert!(rest.is_empty());
        assert_eq!(v, Digit::One);
    }

    #[test]
    fn ref_rule_dispatches_through_assembled_scope() {
        let parser = Digit::parser();
        let (rest, v) = Digit::ref_rule()
            .eval_single(parser.lexer().unwrap().tokenize_str("0").unwrap(), &parser.scope)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(v, Digit::Zero);
    }

    /// The canonical shape spec §4.G describes: a sum type's own rule is an
    /// `Or` over a `Ref` per variant, and each variant owns its rule under
    /// its own name via `variants()` — unlike `Digit` above, which inlines
    /// its alternatives directly and never touches `variants()`.
    #[derive(Clone, Debug, PartialEq)]
    enum Primary {
        Red,
        Green,
        Blue,
    }

    impl Parsable for Primary {
        fn name() -> &'static str {
            "Primary"
        }

        fn parse_rule() -> SingleRule<Self> {
            or([
                Ref::<Self>::new("Red"),
                Ref::<Self>::new("Green"),
                Ref::<Self>::new("Blue"),
            ])
            .expect("disjoint variant refs")
        }

        fn variants() -> Vec<(&'static str, SingleRule<Self>)> {
            let red = LexRule::new("red", Regex::literal("red")).unwrap();
            let green = LexRule::new("green", Regex::literal("green")).unwrap();
            let blue = LexRule::new("blue", Regex::literal("blue")).unwrap();
            vec![
                ("Red", SingleRule::new(Literal::new(red, |_: &Token| Primary::Red))),
                ("Green", SingleRule::new(Literal::new(green, |_: &Token| Primary::Green))),
                ("Blue", SingleRule::new(Literal::new(blue, |_: &Token| Primary::Blue))),
            ]
        }
    }

    #[test]
    fn variants_register_under_their_own_names_and_dispatch_via_or_of_refs() {
        let parser = Primary::parser();
        let (rest, v) = parser.eval("green").unwrap();
        assert!(rest.is_empty());
        assert_eq!(v, Primary::Green);

        let (rest, v) = parser.eval("blue").unwrap();
        assert!(rest.is_empty());
        assert_eq!(v, Primary::Blue);
    }

    #[test]
    fn variants_reject_a_word_that_matches_no_variant() {
        let parser = Primary::parser();
        assert!(parser.eval("purple").is_err());
    }
}
