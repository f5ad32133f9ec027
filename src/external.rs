//! Capabilities supplied by the grammar-specific front end.
//!
//! The pattern compiler never knows which grammar it is working with. It lexes
//! literal pattern text through an [`ExternalLexer`], resolves tag names and
//! drives parsing through an [`ExternalParser`], and the matcher walks any tree
//! implementing [`ParseTree`].

use crate::ast::{RuleId, Token, TokenStream, TokenType, Tree};
use crate::error::{LexFailure, ParseFailure};

/// Read-only view of a concrete syntax tree node.
pub trait ParseTree {
    fn child_count(&self) -> usize;

    fn child(&self, index: usize) -> Option<&Self>;

    /// Rule of an internal node; `None` for leaves.
    fn rule_id(&self) -> Option<RuleId>;

    /// Token type of a leaf; `None` for internal nodes.
    fn token_type(&self) -> Option<TokenType>;

    /// Token text of a leaf; `None` for internal nodes.
    fn token_text(&self) -> Option<&str>;

    fn is_leaf(&self) -> bool {
        self.rule_id().is_none()
    }

    /// Source text covered by the node, concatenated from its leaves.
    fn text(&self) -> String {
        if let Some(text) = self.token_text() {
            return text.to_string();
        }
        let mut out = String::new();
        for i in 0..self.child_count() {
            if let Some(child) = self.child(i) {
                out.push_str(&child.text());
            }
        }
        out
    }
}

pub trait ExternalLexer {
    /// Tokenize `text`, including hidden-channel tokens.
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, LexFailure>;
}

pub trait ExternalParser {
    fn rule_index_of(&self, name: &str) -> Option<RuleId>;

    fn token_type_of(&self, name: &str) -> Option<TokenType>;

    fn rule_name(&self, rule: RuleId) -> Option<&str>;

    /// Parse from `start`, leaving any tokens the rule does not need in `tokens`.
    ///
    /// A [`Token::rule_tag`] for rule `r` seen where `r` is about to be entered
    /// must be consumed as the sole child of an `r` node.
    fn parse(&self, tokens: &mut TokenStream, start: RuleId) -> Result<Tree, ParseFailure>;
}

impl<L: ExternalLexer + ?Sized> ExternalLexer for &L {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, LexFailure> {
        (**self).tokenize(text)
    }
}

impl<P: ExternalParser + ?Sized> ExternalParser for &P {
    fn rule_index_of(&self, name: &str) -> Option<RuleId> {
        (**self).rule_index_of(name)
    }

    fn token_type_of(&self, name: &str) -> Option<TokenType> {
        (**self).token_type_of(name)
    }

    fn rule_name(&self, rule: RuleId) -> Option<&str> {
        (**self).rule_name(rule)
    }

    fn parse(&self, tokens: &mut TokenStream, start: RuleId) -> Result<Tree, ParseFailure> {
        (**self).parse(tokens, start)
    }
}
