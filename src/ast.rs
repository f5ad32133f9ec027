use std::fmt;

use crate::external::{ExternalParser, ParseTree};

/// Token type as numbered by the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenType(pub u32);

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a parser rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub usize);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Channel {
    #[default]
    Default,
    /// Whitespace, comments and anything else the parser never sees.
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A real token, or a placeholder standing in for one.
    Type(TokenType),
    /// Synthetic token standing in for a whole derivation of a rule.
    RuleRef(RuleId),
}

/// A placeholder as written in a pattern: `<name>` or `<label:name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub name: String,
    pub label: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
        }
    }

    pub fn labeled(label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: Some(label.into()),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{}:{}", label, self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub channel: Channel,
    /// Set when the token was produced from a tag rather than lexed.
    pub tag: Option<Tag>,
}

impl Token {
    pub fn new(token_type: TokenType, text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Type(token_type),
            text: text.into(),
            channel: Channel::Default,
            tag: None,
        }
    }

    pub fn hidden(token_type: TokenType, text: impl Into<String>) -> Self {
        Self {
            channel: Channel::Hidden,
            ..Self::new(token_type, text)
        }
    }

    /// Placeholder for a single token of `token_type`.
    pub fn token_tag(token_type: TokenType, tag: Tag) -> Self {
        Self {
            kind: TokenKind::Type(token_type),
            text: format!("<{}>", tag),
            channel: Channel::Default,
            tag: Some(tag),
        }
    }

    /// Placeholder for an entire derivation of `rule`.
    pub fn rule_tag(rule: RuleId, tag: Tag) -> Self {
        Self {
            kind: TokenKind::RuleRef(rule),
            text: format!("<{}>", tag),
            channel: Channel::Default,
            tag: Some(tag),
        }
    }

    pub fn token_type(&self) -> Option<TokenType> {
        match self.kind {
            TokenKind::Type(t) => Some(t),
            TokenKind::RuleRef(_) => None,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.channel == Channel::Hidden
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.tag, self.kind) {
            (Some(tag), TokenKind::Type(t)) => write!(f, "{}:{}", tag.name, t),
            (Some(tag), TokenKind::RuleRef(r)) => write!(f, "{}:rule{}", tag.name, r),
            (None, TokenKind::Type(t)) => write!(f, "'{}'<{}>", self.text, t),
            (None, TokenKind::RuleRef(r)) => write!(f, "'{}'<rule{}>", self.text, r),
        }
    }
}

/// Cursor over the tokens handed to an external parser.
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Consume the next token.
    pub fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Rewind (or fast-forward) to a position previously returned by [`position`](Self::position).
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len());
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn remaining(&self) -> &[Token] {
        &self.tokens[self.pos..]
    }

    /// Describe the next token for error messages, `<EOF>` at the end.
    pub fn describe_next(&self) -> String {
        match self.peek() {
            Some(token) => format!("'{}'", token.text),
            None => "<EOF>".to_string(),
        }
    }
}

/// Concrete parse tree built by external parsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tree {
    Rule { rule: RuleId, children: Vec<Tree> },
    Leaf(Token),
}

impl Tree {
    pub fn rule(rule: RuleId, children: Vec<Tree>) -> Self {
        Tree::Rule { rule, children }
    }

    pub fn leaf(token: Token) -> Self {
        Tree::Leaf(token)
    }

    pub fn token(&self) -> Option<&Token> {
        match self {
            Tree::Leaf(token) => Some(token),
            Tree::Rule { .. } => None,
        }
    }

    pub fn children(&self) -> &[Tree] {
        match self {
            Tree::Rule { children, .. } => children,
            Tree::Leaf(_) => &[],
        }
    }

    /// LISP-style rendering, e.g. `(s x = (expr 1) ;)`.
    pub fn to_string_tree<P: ExternalParser + ?Sized>(&self, parser: &P) -> String {
        match self {
            Tree::Leaf(token) => token.text.clone(),
            Tree::Rule { rule, children } => {
                render_node(&rule_display_name(parser, *rule), children, |c| c.to_string_tree(parser))
            }
        }
    }
}

impl ParseTree for Tree {
    fn child_count(&self) -> usize {
        self.children().len()
    }

    fn child(&self, index: usize) -> Option<&Self> {
        self.children().get(index)
    }

    fn rule_id(&self) -> Option<RuleId> {
        match self {
            Tree::Rule { rule, .. } => Some(*rule),
            Tree::Leaf(_) => None,
        }
    }

    fn token_type(&self) -> Option<TokenType> {
        self.token().and_then(Token::token_type)
    }

    fn token_text(&self) -> Option<&str> {
        self.token().map(|t| t.text.as_str())
    }
}

/// A compiled pattern tree node.
///
/// Mirrors [`Tree`], with the nodes that came from tags marked as placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternNode {
    /// Matches a rule node child-for-child.
    Rule {
        rule: RuleId,
        children: Vec<PatternNode>,
    },
    /// `<expr>`: matches any derivation of `rule` and captures it whole.
    RuleTag { rule: RuleId, tag: Tag },
    /// Literal token from the pattern text: type and text must both agree.
    Literal { token_type: TokenType, text: String },
    /// `<ID>`: matches any token of `token_type`.
    TokenTag { token_type: TokenType, tag: Tag },
}

impl PatternNode {
    pub fn tag(&self) -> Option<&Tag> {
        match self {
            PatternNode::RuleTag { tag, .. } | PatternNode::TokenTag { tag, .. } => Some(tag),
            PatternNode::Rule { .. } | PatternNode::Literal { .. } => None,
        }
    }

    pub fn children(&self) -> &[PatternNode] {
        match self {
            PatternNode::Rule { children, .. } => children,
            _ => &[],
        }
    }

    /// Number of leaves and placeholders, one per pattern token.
    pub fn leaf_count(&self) -> usize {
        match self {
            PatternNode::Rule { children, .. } => children.iter().map(PatternNode::leaf_count).sum(),
            _ => 1,
        }
    }

    /// LISP-style rendering, e.g. `(s <ID> = (expr <expr>) ;)`.
    pub fn to_string_tree<P: ExternalParser + ?Sized>(&self, parser: &P) -> String {
        match self {
            PatternNode::Rule { rule, children } => {
                render_node(&rule_display_name(parser, *rule), children, |c| c.to_string_tree(parser))
            }
            PatternNode::RuleTag { rule, tag } => {
                format!("({} <{}>)", rule_display_name(parser, *rule), tag)
            }
            PatternNode::Literal { text, .. } => text.clone(),
            PatternNode::TokenTag { tag, .. } => format!("<{}>", tag),
        }
    }
}

fn rule_display_name<P: ExternalParser + ?Sized>(parser: &P, rule: RuleId) -> String {
    parser
        .rule_name(rule)
        .map(str::to_string)
        .unwrap_or_else(|| format!("rule{}", rule))
}

fn render_node<C>(name: &str, children: &[C], render: impl Fn(&C) -> String) -> String {
    if children.is_empty() {
        return name.to_string();
    }
    let mut out = format!("({}", name);
    for child in children {
        out.push(' ');
        out.push_str(&render(child));
    }
    out.push(')');
    out
}
