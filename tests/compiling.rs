//! Compiling patterns into pattern trees.

mod common;

use common::{assignment, assignment_hidden_ws, assignment_or_expr, expressions, ids};
use tree_pattern::{
    Delimiters, ExternalParser, PatternCompileError, PatternCompiler, PatternNode, Tag, TokenKind,
};

#[test]
fn tokenizing_pattern() {
    let g = assignment();
    let compiler = PatternCompiler::new(&g, &g);
    let tokens = compiler.tokenize("<ID> = <expr> ;").unwrap();
    let rendered: Vec<String> = tokens.iter().map(ToString::to_string).collect();
    insta::assert_snapshot!(rendered.join(", "), @"ID:3, '='<1>, expr:rule1, ';'<2>");
    assert_eq!(tokens[2].kind, TokenKind::RuleRef(g.rule_index_of("expr").unwrap()));
    assert_eq!(tokens[0].tag, Some(Tag::new("ID")));
}

#[test]
fn compiling_pattern() {
    let g = assignment();
    let compiler = PatternCompiler::new(&g, &g);
    let pattern = compiler.compile_rule("<ID> = <expr> ;", "s").unwrap();
    insta::assert_snapshot!(pattern.to_string_tree(&g), @"(s <ID> = (expr <expr>) ;)");
    assert_eq!(pattern.pattern(), "<ID> = <expr> ;");
    assert_eq!(pattern.to_string(), "<ID> = <expr> ;");
    assert_eq!(Some(pattern.start_rule()), g.rule_index_of("s"));
}

#[test]
fn leading_rule_tag_in_left_recursive_rule() {
    let g = expressions();
    let compiler = PatternCompiler::new(&g, &g);
    let pattern = compiler.compile_rule("<expr> * <expr> * <expr>", "expr").unwrap();
    insta::assert_snapshot!(
        pattern.to_string_tree(&g),
        @"(expr (expr (expr <expr>) * (expr <expr>)) * (expr <expr>))"
    );

    let pattern = compiler.compile_rule("<lhs:expr> = <rhs:expr>;", "s").unwrap();
    insta::assert_snapshot!(
        pattern.to_string_tree(&g),
        @"(s (expr (expr <lhs:expr>) = (expr <rhs:expr>)) ;)"
    );
}

#[test]
fn compiling_pattern_consumes_all_tokens() {
    let g = assignment();
    let compiler = PatternCompiler::new(&g, &g);
    let err = compiler.compile_rule("<ID> = <expr> ; extra", "s").unwrap_err();
    assert_eq!(
        err,
        PatternCompileError::StartRuleDoesNotConsumeFullPattern {
            pattern: "<ID> = <expr> ; extra".into(),
            next: "'extra'".into(),
        }
    );
}

#[test]
fn pattern_matches_start_rule() {
    let g = assignment();
    let compiler = PatternCompiler::new(&g, &g);
    let err = compiler.compile_rule("<ID> ;", "s").unwrap_err();
    assert_eq!(
        err,
        PatternCompileError::UnexpectedToken {
            expected: "'='".into(),
            found: "';'".into(),
        }
    );
}

#[test]
fn pattern_matches_start_rule_with_alternatives() {
    let g = assignment_or_expr();
    let compiler = PatternCompiler::new(&g, &g);
    let err = compiler.compile_rule("<ID> <ID> ;", "s").unwrap_err();
    assert!(
        matches!(err, PatternCompileError::NoViableAlternative { ref rule, .. } if rule == "s"),
        "unexpected error: {err}"
    );
}

#[test]
fn hidden_tokens_not_seen_by_tree_pattern_parser() {
    let g = assignment_hidden_ws();
    let compiler = PatternCompiler::new(&g, &g);
    let pattern = compiler.compile_rule("<ID> = <expr> ;", "s").unwrap();
    insta::assert_snapshot!(pattern.to_string_tree(&g), @"(s <ID> = (expr <expr>) ;)");
    // one node per non-hidden token
    assert_eq!(pattern.tree().leaf_count(), 4);
}

#[test]
fn compiling_multiple_tokens() {
    let g = ids("ID '=' ID ';'");
    let compiler = PatternCompiler::new(&g, &g);
    let pattern = compiler.compile_rule("<ID> = <ID> ;", "s").unwrap();
    insta::assert_snapshot!(pattern.to_string_tree(&g), @"(s <ID> = <ID> ;)");
}

#[test]
fn labeled_tags_keep_labels() {
    let g = ids("ID ID ';'");
    let compiler = PatternCompiler::new(&g, &g);
    let pattern = compiler.compile_rule("<a:ID> <b:ID>;", "s").unwrap();
    let tags: Vec<_> = pattern.tree().children().iter().filter_map(PatternNode::tag).collect();
    assert_eq!(tags, vec![&Tag::labeled("a", "ID"), &Tag::labeled("b", "ID")]);
    insta::assert_snapshot!(pattern.to_string_tree(&g), @"(s <a:ID> <b:ID> ;)");
}

#[test]
fn unknown_tags_and_rules() {
    let g = assignment();
    let compiler = PatternCompiler::new(&g, &g);
    assert_eq!(
        compiler.compile_rule("<stmt> ;", "s").unwrap_err(),
        PatternCompileError::UnknownTag {
            name: "stmt".into(),
            pattern: "<stmt> ;".into(),
        }
    );
    assert_eq!(
        compiler.compile_rule("<ID>", "program").unwrap_err(),
        PatternCompileError::UnknownRule {
            name: "program".into()
        }
    );
}

#[test]
fn invalid_pattern_text_is_a_lex_error() {
    let g = assignment();
    let compiler = PatternCompiler::new(&g, &g);
    let err = compiler.compile_rule("<ID> = 1 $", "s").unwrap_err();
    assert!(matches!(err, PatternCompileError::Lex(ref f) if f.text == "$"));
}

#[test]
fn syntax_errors_surface_through_compile() {
    let g = assignment();
    let compiler = PatternCompiler::new(&g, &g);
    let err = compiler.compile_rule("<ID> = <expr ;", "s").unwrap_err();
    assert_eq!(err.to_string(), "unterminated tag in pattern: <ID> = <expr ;");
}

#[test]
fn compiler_with_custom_delimiters() {
    let g = assignment();
    let delimiters = Delimiters::new("{", "}", "\\").unwrap();
    let compiler = PatternCompiler::with_delimiters(&g, &g, delimiters);
    let pattern = compiler.compile_rule("{ID} = {value:expr};", "s").unwrap();
    insta::assert_snapshot!(pattern.to_string_tree(&g), @"(s <ID> = (expr <value:expr>) ;)");
    assert_eq!(compiler.chunker().delimiters().start(), "{");
}
