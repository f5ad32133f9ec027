//! Tree patterns: match parse trees against textual templates such as
//! `<ID> = <expr> ;`, compiled with the same grammar that produced the trees.

pub mod ast;
pub mod chunker;
pub mod compiler;
pub mod error;
pub mod external;
pub mod grammar;
pub mod matcher;
pub mod pattern;
pub mod result;

pub use ast::{Channel, PatternNode, RuleId, Tag, Token, TokenKind, TokenStream, TokenType, Tree};
pub use chunker::{Chunk, Chunker, Delimiters};
pub use compiler::PatternCompiler;
pub use error::{
    DelimiterError, GrammarError, InputError, LexFailure, ParseFailure, PatternCompileError,
    PatternSyntaxError,
};
pub use external::{ExternalLexer, ExternalParser, ParseTree};
pub use grammar::{Grammar, GrammarBuilder};
pub use matcher::match_tree;
pub use pattern::ParseTreePattern;
pub use result::{Labels, MatchResult};

/// Split `pattern` with the default `<`, `>` and `\` delimiters.
pub fn split(pattern: &str) -> Result<Vec<Chunk>, PatternSyntaxError> {
    Chunker::default().split(pattern)
}
