//! A minimal illustrative slice of the `pype` expression language: integer
//! arithmetic with `+ - * /` and parentheses. `pype` exists only to
//! validate the core toolkit against a grammar with operator precedence
//! and left-associative folding — it carries no runtime semantics here,
//! only parsing into an AST.

use indexmap::IndexMap;
use std::fmt;

use pysh::{
    or, Lexer, LexRule, Literal, NoRule, Parser, PyshError, Ref, Regex, Scope, SingleResultRule,
    SingleRule, Token, TokenStream,
};

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Int(i64),
    BinOp(char, Box<Expr>, Box<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(n) => write!(f, "{n}"),
            Expr::BinOp(op, lhs, rhs) => write!(f, "({lhs} {op} {rhs})"),
        }
    }
}

fn int_to_expr(token: &Token) -> Expr {
    Expr::Int(token.val.parse().expect("lexer only emits digit runs"))
}

/// Left-associative fold: `term (op term)*`, collapsing into a left-leaning
/// `BinOp` tree. Built by hand rather than from the repetition combinators
/// because folding a flat sequence into a tree, rather than collecting it,
/// isn't one of the four arity shapes — this is exactly the kind of
/// grammar-specific construct the combinator traits exist to let callers
/// add (same loop-with-progress shape as `parser::repeat`'s combinators).
struct LeftAssoc {
    term: SingleRule<Expr>,
    ops: Vec<(&'static str, char)>,
    lexer: Lexer,
}

impl LeftAssoc {
    fn new(term: SingleRule<Expr>, ops: Vec<(&'static str, char)>) -> Result<Self, pysh::GrammarError> {
        let op_names: Vec<&str> = ops.iter().map(|(name, _)| *name).collect();
        let lexer = term.lexer().try_union(&Lexer::literal(&op_names)?)?;
        Ok(LeftAssoc { term, ops, lexer })
    }

    fn op_for(&self, stream: &TokenStream) -> Option<char> {
        let head = stream.peek()?;
        self.ops
            .iter()
            .find(|(name, _)| *name == head.rule_name)
            .map(|(_, op)| *op)
    }
}

impl fmt::Display for LeftAssoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})*", self.term, self.ops)
    }
}

impl SingleResultRule<Expr> for LeftAssoc {
    fn eval_single(
        &self,
        input: TokenStream,
        scope: &Scope<Expr>,
    ) -> Result<(TokenStream, Expr), PyshError> {
        let (mut cur, mut acc) = self.term.eval_single(input, scope)?;
        while let Some(op) = self.op_for(&cur) {
            let (next, _) = cur.pop(None)?;
            let (next, rhs) = self.term.eval_single(next, scope)?;
            acc = Expr::BinOp(op, Box::new(acc), Box::new(rhs));
            cur = next;
        }
        Ok((cur, acc))
    }

    fn lexer(&self) -> Lexer {
        self.lexer.clone()
    }
}

fn build_grammar() -> Parser<Expr> {
    let int_rule = LexRule::new("int", Regex::one_or_more(Regex::Range('0', '9'))).unwrap();
    let int_value: SingleRule<Expr> = SingleRule::new(Literal::new(int_rule, int_to_expr));

    let open: NoRule = "(".into();
    let close: NoRule = ")".into();
    let paren_expr: SingleRule<Expr> = (open & Ref::<Expr>::new("Expr")).unwrap();
    let paren_expr: SingleRule<Expr> = (paren_expr & close).unwrap();

    let factor_rule: SingleRule<Expr> = or([int_value, paren_expr]).unwrap();
    let term_rule: SingleRule<Expr> = SingleRule::new(
        LeftAssoc::new(Ref::<Expr>::new("Factor"), vec![("*", '*'), ("/", '/')]).unwrap(),
    );
    let expr_rule: SingleRule<Expr> = SingleRule::new(
        LeftAssoc::new(Ref::<Expr>::new("Term"), vec![("+", '+'), ("-", '-')]).unwrap(),
    );

    let mut rules = IndexMap::new();
    rules.insert("Factor".to_string(), factor_rule);
    rules.insert("Term".to_string(), term_rule);
    rules.insert("Expr".to_string(), expr_rule);
    Parser::new("Expr", Scope::new(rules))
}

fn main() {
    env_logger::init();
    let grammar = build_grammar();

    for input in ["1 + 2 * 3", "(1 + 2) * 3", "10 - 2 - 3"] {
        let (rest, expr) = grammar.eval(input).expect("well-formed input");
        assert!(rest.is_empty());
        println!("{input} => {expr}");
    }
}
