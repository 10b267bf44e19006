use super::lexer::{Lexeme, Lexer};
use super::*;
use crate::compile::compile;
use crate::diagnostic::Severity;
use crate::tree::{Callee, Node, NodeKind};
use crate::value::Value;

fn parse_ok(source: &str) -> SourceTree {
    match parse(source) {
        Ok(parsed) => parsed,
        Err(diags) => panic!(
            "unexpected errors: {:?}",
            diags.iter().map(|d| &d.message).collect::<Vec<_>>()
        ),
    }
}

fn parse_err(source: &str) -> Vec<String> {
    match parse(source) {
        Ok(_) => panic!("expected errors for {:?}", source),
        Err(diags) => diags.into_iter().map(|d| d.message).collect(),
    }
}

fn eval(source: &str) -> Value {
    let parsed = parse_ok(source);
    parsed.tree.eval(parsed.root).expect("evaluates")
}

fn lexemes(source: &str) -> Vec<Lexeme> {
    let (tokens, diags) = Lexer::new(source).tokenize();
    assert!(diags.is_empty(), "lex errors: {:?}", diags);
    tokens.into_iter().map(|t| t.lexeme).collect()
}

// ── Lexer ─────────────────────────────────────────────────────────

#[test]
fn test_lex_statement() {
    assert_eq!(
        lexemes("let x = add(1, -2.5) # trailing\n"),
        vec![
            Lexeme::Let,
            Lexeme::Ident("x".to_string()),
            Lexeme::Eq,
            Lexeme::Ident("add".to_string()),
            Lexeme::LParen,
            Lexeme::Int(1),
            Lexeme::Comma,
            Lexeme::Float(-2.5),
            Lexeme::RParen,
            Lexeme::Newline,
            Lexeme::Eof,
        ]
    );
}

#[test]
fn test_lex_newlines_inside_brackets_are_blank() {
    assert_eq!(
        lexemes("[\n1,\n]\n"),
        vec![
            Lexeme::LBracket,
            Lexeme::Int(1),
            Lexeme::Comma,
            Lexeme::RBracket,
            Lexeme::Newline,
            Lexeme::Eof,
        ]
    );
}

#[test]
fn test_lex_string_escapes() {
    assert_eq!(
        lexemes(r#""a\"b\n""#),
        vec![Lexeme::Str("a\"b\n".to_string()), Lexeme::Eof]
    );
}

#[test]
fn test_lex_errors() {
    let (_, diags) = Lexer::new("\"open\n@ 99999999999999999999").tokenize();
    let messages: Vec<&str> = diags.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "unterminated string literal",
            "unexpected character '@'",
            "number '99999999999999999999' is out of range",
        ]
    );
}

// ── Trees ─────────────────────────────────────────────────────────

#[test]
fn test_let_binding_is_shared() {
    let parsed = parse_ok("let inner = add(1, 2)\nadd(inner, inner)\n");
    assert_eq!(parsed.tree.len(), 4);
    assert!(parsed.warnings.is_empty());
    let inner = parsed.bindings["inner"];
    let Some(Node::Invocation(call)) = parsed.tree.get(parsed.root) else {
        panic!("root should be an invocation");
    };
    assert_eq!(call.args, vec![inner, inner]);
    assert!(matches!(&call.callee, Callee::Function(f) if f.name() == "add"));

    let (graph, key) = compile(&parsed.tree, parsed.root).expect("compiles");
    assert_eq!(graph.len(), 4);
    assert_eq!(key.to_string(), "add-3");
}

#[test]
fn test_each_literal_is_its_own_terminal() {
    let parsed = parse_ok("add(1, 1)");
    assert_eq!(parsed.tree.len(), 3);
}

#[test]
fn test_builtin_used_as_value() {
    let parsed = parse_ok("let f = identity(add)\nf(2, 3)");
    assert_eq!(parsed.tree.len(), 5);
    let kinds: Vec<NodeKind> = parsed.tree.iter().map(|(_, n)| n.kind()).collect();
    assert_eq!(kinds[0], NodeKind::Terminal);
    assert_eq!(eval("let f = identity(add)\nf(2, 3)"), Value::Int(5));
}

#[test]
fn test_keywords_and_literals() {
    assert_eq!(eval("clamp(15, lo = 0, hi = 10)"), Value::Int(10));
    assert_eq!(
        eval(r#"concat("a\"b", "c", sep = "-")"#),
        Value::str("a\"b-c")
    );
    assert_eq!(eval("add(-1, 2.5)"), Value::Float(1.5));
    assert_eq!(
        eval("[true, false, none]"),
        Value::List(vec![Value::Bool(true), Value::Bool(false), Value::None])
    );
}

#[test]
fn test_multiline_tuple_and_comments() {
    let source = "\
# numbers to add
let xs = [
    1,  # first
    2,
]

sum(xs)
";
    assert_eq!(eval(source), Value::Int(3));
}

#[test]
fn test_parenthesized_and_chained_calls() {
    assert_eq!(eval("(identity(neg))(4)"), Value::Int(-4));
    assert_eq!(eval("identity(neg)(4)"), Value::Int(-4));
}

// ── Diagnostics ───────────────────────────────────────────────────

#[test]
fn test_unknown_name() {
    let errors = match parse("frobnicate(1)") {
        Err(diags) => diags,
        Ok(_) => panic!("unknown name should fail"),
    };
    assert_eq!(errors[0].message, "unknown name 'frobnicate'");
    assert!(errors[0]
        .help
        .as_deref()
        .is_some_and(|help| help.contains("add")));
}

#[test]
fn test_root_count() {
    assert_eq!(parse_err("let x = 1\n"), vec!["missing root expression"]);
    assert_eq!(parse_err(""), vec!["missing root expression"]);
    assert_eq!(parse_err("1\n2\n"), vec!["more than one root expression"]);
}

#[test]
fn test_call_argument_errors() {
    assert_eq!(
        parse_err("clamp(lo = 1, 5)"),
        vec!["positional argument after keyword argument"]
    );
    assert_eq!(
        parse_err("clamp(5, lo = 1, lo = 2)"),
        vec!["keyword argument 'lo' given twice"]
    );
}

#[test]
fn test_bad_root_line_reports_one_error() {
    assert_eq!(parse_err("add(1, nope)\n"), vec!["unknown name 'nope'"]);
    assert_eq!(
        parse_err("let a = 1\nadd(a,\n"),
        vec!["expected an expression, found end of file"]
    );
}

#[test]
fn test_unclosed_bracket_recovers_at_let() {
    assert_eq!(
        parse_err("let x = (1\nlet y = 2\nadd(x, y)"),
        vec!["expected ')', found 'let'", "unknown name 'x'"]
    );
    assert_eq!(
        parse_err("let xs = [1, 2\nlet y = 3\nadd(y, 1)\n"),
        vec!["expected ',', found 'let'"]
    );
}

#[test]
fn test_rebinding_is_an_error() {
    assert_eq!(
        parse_err("let x = 1\nlet x = 2\nx"),
        vec!["'x' is already bound"]
    );
}

#[test]
fn test_errors_recover_at_next_line() {
    let errors = parse_err("let a = )\nlet b = nope\nadd(1, 2)");
    assert_eq!(
        errors,
        vec!["expected an expression, found ')'", "unknown name 'nope'"]
    );
}

#[test]
fn test_unused_binding_warns() {
    let parsed = parse_ok("let spare = 1\n2");
    assert_eq!(parsed.warnings.len(), 1);
    assert_eq!(parsed.warnings[0].severity, Severity::Warning);
    assert_eq!(parsed.warnings[0].message, "binding 'spare' is never used");
}
