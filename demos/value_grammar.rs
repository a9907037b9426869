//! A toy value language grammar: `Value := Int | Str | List`,
//! `List := "[" (Value ("," Value)*)? "]"`.
//!
//! Demonstrates composing the four arity primitives (`&`, `or`, repetition,
//! `.convert()`) into a small recursive grammar without a custom AST trait.

use indexmap::IndexMap;

use pysh::{
    or, zero_or_more, zero_or_one, LexRule, Lexer, Literal, NoRule, Parser, Ref, Regex, Scope,
    SingleRule, Token,
};

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(i64),
    Str(String),
    List(Vec<Value>),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

fn int_to_value(token: &Token) -> Value {
    Value::Int(token.val.parse().expect("lexer only emits digit runs"))
}

fn str_to_value(token: &Token) -> Value {
    let inner = token.val.trim_matches('"');
    Value::Str(inner.to_string())
}

fn build_grammar() -> Parser<Value> {
    let int_rule = LexRule::new("int", Regex::one_or_more(Regex::Range('0', '9'))).unwrap();
    let str_rule = LexRule::new(
        "str",
        Regex::and([
            Regex::Literal('"'),
            Regex::zero_or_more(Regex::not(Regex::Literal('"'))),
            Regex::Literal('"'),
        ]),
    )
    .unwrap();

    let int_value: SingleRule<Value> = SingleRule::new(Literal::new(int_rule, int_to_value));
    let str_value: SingleRule<Value> = SingleRule::new(Literal::new(str_rule, str_to_value));

    let open: NoRule = "[".into();
    let close: NoRule = "]".into();
    let comma: NoRule = ",".into();

    // items := (Value ("," Value)*)?, folded into one `Multiple<Value>`.
    let first = zero_or_one(Ref::<Value>::new("Value"));
    let comma_value = (comma & Ref::<Value>::new("Value")).unwrap();
    let rest = zero_or_more(comma_value);
    let items = (first & rest).unwrap();

    let list_body = items.convert(Value::List);
    let list_rule: SingleRule<Value> = (open & list_body).unwrap();
    let list_rule: SingleRule<Value> = (list_rule & close).unwrap();
    // Whitespace is invisible to every rule's parsing logic (spec §8
    // property 4); one rule in the scope carries it so the assembled
    // grammar's lexer skips it everywhere.
    let list_rule: SingleRule<Value> = list_rule.with_lexer(Lexer::whitespace()).unwrap();

    let value_rule: SingleRule<Value> =
        or([int_value, str_value, Ref::<Value>::new("List")]).unwrap();

    let mut rules = IndexMap::new();
    rules.insert("Value".to_string(), value_rule);
    rules.insert("List".to_string(), list_rule);
    Parser::new("Value", Scope::new(rules))
}

fn main() {
    env_logger::init();
    let grammar = build_grammar();

    for input in [r#"[1, "a"]"#, "[1,[2,3],4]"] {
        let (rest, value) = grammar.eval(input).expect("well-formed input");
        assert!(rest.is_empty());
        println!("{input} => {value}");
    }

    // Token`s derive `serde::Serialize`; any front-end embedding this
    // toolkit can ship its lexed stream over the wire as JSON.
    let mut tokens = grammar.lexer().unwrap().tokenize_str(r#"[1, "a"]"#).unwrap();
    let mut collected = Vec::new();
    while !tokens.is_empty() {
        let (rest, token) = tokens.pop(None).unwrap();
        collected.push(token);
        tokens = rest;
    }
    println!("\ntokens as JSON:\n{}", serde_json::to_string_pretty(&collected).unwrap());

    match grammar.eval("[1,]") {
        Ok(_) => unreachable!("trailing comma before ']' should not parse"),
        Err(e) => {
            println!("\n[1,] failed to parse, as expected:");
            println!("{e}");
        }
    }
}
