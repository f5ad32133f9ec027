use std::fmt;

use crate::ast::{PatternNode, RuleId};
use crate::external::{ExternalParser, ParseTree};
use crate::matcher;
use crate::result::MatchResult;

/// A compiled tree pattern, ready to match against parse trees.
///
/// Immutable once built; one pattern can be matched from any number of threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTreePattern {
    pattern: String,
    start_rule: RuleId,
    tree: PatternNode,
}

impl ParseTreePattern {
    pub fn new(pattern: impl Into<String>, start_rule: RuleId, tree: PatternNode) -> Self {
        Self {
            pattern: pattern.into(),
            start_rule,
            tree,
        }
    }

    /// The pattern text this was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn start_rule(&self) -> RuleId {
        self.start_rule
    }

    pub fn tree(&self) -> &PatternNode {
        &self.tree
    }

    pub fn match_tree<'t, T: ParseTree>(&self, tree: &'t T) -> MatchResult<'t, T> {
        matcher::match_tree(&self.tree, tree)
    }

    pub fn matches<T: ParseTree>(&self, tree: &T) -> bool {
        self.match_tree(tree).succeeded()
    }

    /// Every subtree of `tree` (pre-order, `tree` included) rooted at the start
    /// rule that matches this pattern.
    pub fn find_all<'t, T: ParseTree>(&self, tree: &'t T) -> Vec<MatchResult<'t, T>> {
        let mut found = Vec::new();
        self.collect(tree, &mut found);
        found
    }

    fn collect<'t, T: ParseTree>(&self, node: &'t T, found: &mut Vec<MatchResult<'t, T>>) {
        if node.rule_id() == Some(self.start_rule) {
            let result = self.match_tree(node);
            if result.succeeded() {
                found.push(result);
            }
        }
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                self.collect(child, found);
            }
        }
    }

    pub fn to_string_tree<P: ExternalParser + ?Sized>(&self, parser: &P) -> String {
        self.tree.to_string_tree(parser)
    }
}

impl fmt::Display for ParseTreePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}
