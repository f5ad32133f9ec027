//! Grammar fixtures shared by the integration tests.
#![allow(dead_code)]

use tree_pattern::{ExternalParser, Grammar, MatchResult, PatternCompiler, Tree};

/// `s : ID '=' expr ';' ;  expr : ID | INT ;` with whitespace skipped.
pub fn assignment() -> Grammar {
    assignment_with(&["ID '=' expr ';'"], false)
}

/// Like [`assignment`] but with whitespace on the hidden channel.
pub fn assignment_hidden_ws() -> Grammar {
    assignment_with(&["ID '=' expr ';'"], true)
}

/// `s : ID '=' expr ';' | expr ';' ;`
pub fn assignment_or_expr() -> Grammar {
    assignment_with(&["ID '=' expr ';'", "expr ';'"], false)
}

fn assignment_with(stat: &[&str], hidden_ws: bool) -> Grammar {
    let builder = Grammar::builder("Assign")
        .rule("s", stat)
        .rule("expr", &["ID", "INT"])
        .token("ID", "[a-z]+")
        .token("INT", "[0-9]+");
    let builder = if hidden_ws {
        builder.hidden("WS", r"[ \r\n\t]+")
    } else {
        builder.skip("WS", r"[ \r\n\t]+")
    };
    builder.build().expect("assignment grammar")
}

/// A single rule `s` over identifiers, e.g. `s : ID ID ';'`.
pub fn ids(stat: &str) -> Grammar {
    Grammar::builder("Ids")
        .rule("s", &[stat])
        .token("ID", "[a-z]+")
        .skip("WS", r"[ \r\n\t]+")
        .build()
        .expect("id grammar")
}

/// `s : expr ';' ;  expr : expr '.' ID | expr '*' expr | expr '=' expr | ID | INT ;`
pub fn expressions() -> Grammar {
    Grammar::builder("Expr")
        .rule("s", &["expr ';'"])
        .rule(
            "expr",
            &["expr '.' ID", "expr '*' expr", "expr '=' expr", "ID", "INT"],
        )
        .token("ID", "[a-z]+")
        .token("INT", "[0-9]+")
        .skip("WS", r"[ \r\n\t]+")
        .build()
        .expect("expression grammar")
}

pub fn parse(grammar: &Grammar, input: &str, rule: &str) -> Tree {
    let start = grammar.rule_index_of(rule).expect("start rule");
    grammar.parse_input(input, start).expect("input parses")
}

/// Compile `pattern` from `rule` and match it against the parse of `input`.
pub fn check_match<'t>(grammar: &Grammar, tree: &'t Tree, pattern: &str, rule: &str) -> MatchResult<'t, Tree> {
    let compiler = PatternCompiler::new(grammar, grammar);
    compiler
        .compile_rule(pattern, rule)
        .expect("pattern compiles")
        .match_tree(tree)
}
