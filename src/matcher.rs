use tracing::trace;

use crate::ast::{PatternNode, Tag};
use crate::external::ParseTree;
use crate::result::{Labels, MatchResult};

/// Match a compiled pattern tree against `actual`.
pub fn match_tree<'t, T: ParseTree>(pattern: &PatternNode, actual: &'t T) -> MatchResult<'t, T> {
    let mut labels = Labels::new();
    let mismatched = match_node(pattern, actual, &mut labels);
    if let Some(node) = mismatched {
        trace!(rule = ?node.rule_id(), text = %node.text(), "tree pattern mismatch");
    }
    MatchResult::new(actual, labels, mismatched)
}

/// Walk `pattern` and `actual` in lockstep, recording captures into `labels`.
/// Returns the first actual node that does not match.
pub(crate) fn match_node<'t, T: ParseTree>(
    pattern: &PatternNode,
    actual: &'t T,
    labels: &mut Labels<'t, T>,
) -> Option<&'t T> {
    match pattern {
        PatternNode::TokenTag { token_type, tag } => {
            if actual.is_leaf() && actual.token_type() == Some(*token_type) {
                record(labels, tag, actual);
                None
            } else {
                Some(actual)
            }
        }
        PatternNode::Literal { token_type, text } => {
            let same = actual.is_leaf()
                && actual.token_type() == Some(*token_type)
                && actual.token_text() == Some(text.as_str());
            if same { None } else { Some(actual) }
        }
        PatternNode::RuleTag { rule, tag } => {
            if actual.rule_id() == Some(*rule) {
                record(labels, tag, actual);
                None
            } else {
                Some(actual)
            }
        }
        PatternNode::Rule { rule, children } => {
            if actual.rule_id() != Some(*rule) || actual.child_count() != children.len() {
                return Some(actual);
            }
            for (i, child) in children.iter().enumerate() {
                let Some(actual_child) = actual.child(i) else {
                    return Some(actual);
                };
                if let Some(mismatch) = match_node(child, actual_child, labels) {
                    return Some(mismatch);
                }
            }
            None
        }
    }
}

// Captures go under the grammar name first, then under the explicit label.
fn record<'t, T>(labels: &mut Labels<'t, T>, tag: &Tag, node: &'t T) {
    labels.record(&tag.name, node);
    if let Some(label) = &tag.label {
        labels.record(label, node);
    }
}
