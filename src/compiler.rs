//! Pattern compiler
//!
//! Turns a pattern string into a [`ParseTreePattern`] using the grammar that
//! produced the trees it will be matched against:
//!
//! 1. split the pattern into text and tag chunks
//! 2. lex text chunks with the external lexer, dropping hidden-channel tokens
//! 3. replace each tag with a placeholder token (a rule reference or a token of
//!    the named type)
//! 4. parse the resulting token stream from the start rule
//! 5. require the whole stream to be consumed
//! 6. mark the nodes that came from tags, producing a [`PatternNode`] tree

use tracing::debug;

use crate::ast::{PatternNode, RuleId, Token, TokenKind, TokenStream, Tree};
use crate::chunker::{Chunk, Chunker, Delimiters};
use crate::error::{PatternCompileError, PatternSyntaxError};
use crate::external::{ExternalLexer, ExternalParser, ParseTree};
use crate::pattern::ParseTreePattern;
use crate::result::MatchResult;

pub struct PatternCompiler<L, P> {
    lexer: L,
    parser: P,
    chunker: Chunker,
}

impl<L: ExternalLexer, P: ExternalParser> PatternCompiler<L, P> {
    pub fn new(lexer: L, parser: P) -> Self {
        Self::with_delimiters(lexer, parser, Delimiters::default())
    }

    pub fn with_delimiters(lexer: L, parser: P, delimiters: Delimiters) -> Self {
        Self {
            lexer,
            parser,
            chunker: Chunker::new(delimiters),
        }
    }

    pub fn lexer(&self) -> &L {
        &self.lexer
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    pub fn split(&self, pattern: &str) -> Result<Vec<Chunk>, PatternSyntaxError> {
        self.chunker.split(pattern)
    }

    /// Convert `pattern` into the token stream the parser will see.
    pub fn tokenize(&self, pattern: &str) -> Result<Vec<Token>, PatternCompileError> {
        let mut tokens = Vec::new();
        for chunk in self.chunker.split(pattern)? {
            match chunk {
                Chunk::Text(text) => {
                    let lexed = self.lexer.tokenize(&text)?;
                    tokens.extend(lexed.into_iter().filter(|t| !t.is_hidden()));
                }
                Chunk::Tag(tag) => {
                    if let Some(rule) = self.parser.rule_index_of(&tag.name) {
                        tokens.push(Token::rule_tag(rule, tag));
                    } else if let Some(token_type) = self.parser.token_type_of(&tag.name) {
                        tokens.push(Token::token_tag(token_type, tag));
                    } else {
                        return Err(PatternCompileError::UnknownTag {
                            name: tag.name,
                            pattern: pattern.to_string(),
                        });
                    }
                }
            }
        }
        Ok(tokens)
    }

    pub fn compile(&self, pattern: &str, start: RuleId) -> Result<ParseTreePattern, PatternCompileError> {
        let result = self.compile_tree(pattern, start);
        match &result {
            Ok(tree) => debug!(pattern, rule = %start, leaves = tree.leaf_count(), "compiled tree pattern"),
            Err(err) => debug!(pattern, rule = %start, error = %err, "tree pattern rejected"),
        }
        Ok(ParseTreePattern::new(pattern, start, result?))
    }

    /// Compile against a start rule given by name.
    pub fn compile_rule(&self, pattern: &str, rule_name: &str) -> Result<ParseTreePattern, PatternCompileError> {
        let start = self
            .parser
            .rule_index_of(rule_name)
            .ok_or_else(|| PatternCompileError::UnknownRule {
                name: rule_name.to_string(),
            })?;
        self.compile(pattern, start)
    }

    /// Compile `pattern` and match it against `tree` in one step.
    pub fn match_tree<'t, T: ParseTree>(
        &self,
        tree: &'t T,
        pattern: &str,
        start: RuleId,
    ) -> Result<MatchResult<'t, T>, PatternCompileError> {
        Ok(self.compile(pattern, start)?.match_tree(tree))
    }

    pub fn matches<T: ParseTree>(&self, tree: &T, pattern: &str, start: RuleId) -> Result<bool, PatternCompileError> {
        Ok(self.match_tree(tree, pattern, start)?.succeeded())
    }

    fn compile_tree(&self, pattern: &str, start: RuleId) -> Result<PatternNode, PatternCompileError> {
        let mut stream = TokenStream::new(self.tokenize(pattern)?);
        let tree = self.parser.parse(&mut stream, start)?;
        if !stream.is_exhausted() {
            return Err(PatternCompileError::StartRuleDoesNotConsumeFullPattern {
                pattern: pattern.to_string(),
                next: stream.describe_next(),
            });
        }
        annotate(tree, pattern)
    }
}

/// Mark the nodes of a parsed pattern that came from tag tokens.
fn annotate(tree: Tree, pattern: &str) -> Result<PatternNode, PatternCompileError> {
    match tree {
        Tree::Leaf(token) => leaf_node(token, pattern),
        Tree::Rule { rule, mut children } => {
            let is_rule_tag = matches!(
                children.as_slice(),
                [Tree::Leaf(token)] if token.kind == TokenKind::RuleRef(rule) && token.tag.is_some()
            );
            if is_rule_tag {
                if let Some(Tree::Leaf(Token { tag: Some(tag), .. })) = children.pop() {
                    return Ok(PatternNode::RuleTag { rule, tag });
                }
            }
            let children = children
                .into_iter()
                .map(|child| annotate(child, pattern))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PatternNode::Rule { rule, children })
        }
    }
}

fn leaf_node(token: Token, pattern: &str) -> Result<PatternNode, PatternCompileError> {
    match (token.kind, token.tag) {
        (TokenKind::Type(token_type), Some(tag)) => Ok(PatternNode::TokenTag { token_type, tag }),
        (TokenKind::Type(token_type), None) => Ok(PatternNode::Literal {
            token_type,
            text: token.text,
        }),
        (TokenKind::RuleRef(_), _) => Err(PatternCompileError::StrayRuleTag {
            tag: token.text,
            pattern: pattern.to_string(),
        }),
    }
}
