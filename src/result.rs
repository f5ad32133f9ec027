use std::fmt;

use crate::external::ParseTree;

/// Ordered multimap from label to captured nodes.
///
/// Labels keep the order in which they were first recorded and each label
/// keeps its captures in recording order.
#[derive(Debug, PartialEq)]
pub struct Labels<'t, T> {
    entries: Vec<(String, Vec<&'t T>)>,
}

impl<'t, T> Labels<'t, T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, label: &str, node: &'t T) {
        match self.entries.iter_mut().find(|(key, _)| key == label) {
            Some((_, nodes)) => nodes.push(node),
            None => self.entries.push((label.to_string(), vec![node])),
        }
    }

    pub fn get(&self, label: &str) -> Option<&[&'t T]> {
        self.entries
            .iter()
            .find(|(key, _)| key == label)
            .map(|(_, nodes)| nodes.as_slice())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[&'t T])> {
        self.entries
            .iter()
            .map(|(key, nodes)| (key.as_str(), nodes.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Labels<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Labels<'_, T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

/// Renders as `{ID=[x, y], id=[x, y]}` using each node's text.
impl<T: ParseTree> fmt::Display for Labels<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (label, nodes)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let texts: Vec<String> = nodes.iter().map(|n| n.text()).collect();
            write!(f, "{}=[{}]", label, texts.join(", "))?;
        }
        f.write_str("}")
    }
}

/// Outcome of matching a pattern against one tree.
#[derive(Debug, PartialEq)]
pub struct MatchResult<'t, T> {
    tree: &'t T,
    labels: Labels<'t, T>,
    mismatched: Option<&'t T>,
}

impl<'t, T> MatchResult<'t, T> {
    pub(crate) fn new(tree: &'t T, labels: Labels<'t, T>, mismatched: Option<&'t T>) -> Self {
        Self {
            tree,
            labels,
            mismatched,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.mismatched.is_none()
    }

    /// The tree the pattern was matched against.
    pub fn tree(&self) -> &'t T {
        self.tree
    }

    /// Last node captured under `label`.
    pub fn get(&self, label: &str) -> Option<&'t T> {
        self.labels.get(label).and_then(|nodes| nodes.last().copied())
    }

    /// Every node captured under `label`, in match order.
    pub fn get_all(&self, label: &str) -> &[&'t T] {
        self.labels.get(label).unwrap_or(&[])
    }

    pub fn labels(&self) -> &Labels<'t, T> {
        &self.labels
    }

    /// First node of the tree that did not match, if any.
    pub fn mismatched_node(&self) -> Option<&'t T> {
        self.mismatched
    }
}

impl<T> Clone for MatchResult<'_, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            labels: self.labels.clone(),
            mismatched: self.mismatched,
        }
    }
}

impl<T> fmt::Display for MatchResult<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Match {}; found {} labels",
            if self.succeeded() { "succeeded" } else { "failed" },
            self.labels.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Token, TokenType, Tree};

    fn leaf(text: &str) -> Tree {
        Tree::leaf(Token::new(TokenType(1), text))
    }

    #[test]
    fn labels_keep_first_insertion_order() {
        let (x, y) = (leaf("x"), leaf("y"));
        let mut labels = Labels::new();
        labels.record("b", &x);
        labels.record("a", &y);
        labels.record("b", &y);
        assert_eq!(labels.keys(), vec!["b", "a"]);
        assert_eq!(labels.to_string(), "{b=[x, y], a=[y]}");
        assert_eq!(labels.len(), 2);
        assert!(labels.contains("a"));
        assert!(!labels.contains("c"));
    }

    #[test]
    fn get_returns_last_capture() {
        let (x, y) = (leaf("x"), leaf("y"));
        let mut labels = Labels::new();
        labels.record("id", &x);
        labels.record("id", &y);
        let result = MatchResult::new(&x, labels, None);
        assert!(result.succeeded());
        assert_eq!(result.get("id"), Some(&y));
        assert_eq!(result.get_all("id"), &[&x, &y]);
        assert_eq!(result.get("missing"), None);
        assert!(result.get_all("missing").is_empty());
        assert_eq!(result.to_string(), "Match succeeded; found 1 labels");
    }

    #[test]
    fn mismatch_marks_failure() {
        let x = leaf("x");
        let result = MatchResult::new(&x, Labels::new(), Some(&x));
        assert!(!result.succeeded());
        assert_eq!(result.mismatched_node(), Some(&x));
        assert_eq!(result.clone(), result);
    }
}
