//! Error types for every stage of pattern handling.
//!
//! Each stage owns one closed enum:
//! - [`PatternSyntaxError`]: the pattern string could not be split into chunks
//! - [`PatternCompileError`]: the chunks could not be turned into a pattern tree
//! - [`LexFailure`] / [`ParseFailure`]: reported by the external lexer and parser
//! - [`GrammarError`] / [`InputError`]: the reference grammar front end
//!
//! Matching never fails; a non-match is reported through
//! [`MatchResult::succeeded`](crate::result::MatchResult::succeeded).

use thiserror::Error;

/// Raised while splitting a pattern into text and tag chunks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternSyntaxError {
    #[error("tag delimiters out of order in pattern: {pattern}")]
    TagsOutOfOrder { pattern: String },

    #[error("unterminated tag in pattern: {pattern}")]
    UnterminatedTag { pattern: String },

    #[error("missing start tag in pattern: {pattern}")]
    MissingStartTag { pattern: String },

    #[error("empty tag in pattern: {pattern}")]
    EmptyTag { pattern: String },
}

impl PatternSyntaxError {
    /// The full pattern text that was rejected.
    pub fn pattern(&self) -> &str {
        match self {
            PatternSyntaxError::TagsOutOfOrder { pattern }
            | PatternSyntaxError::UnterminatedTag { pattern }
            | PatternSyntaxError::MissingStartTag { pattern }
            | PatternSyntaxError::EmptyTag { pattern } => pattern,
        }
    }
}

/// Invalid chunker configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DelimiterError {
    #[error("start delimiter cannot be empty")]
    EmptyStart,

    #[error("stop delimiter cannot be empty")]
    EmptyStop,

    #[error("start and stop delimiters must differ: '{0}'")]
    Identical(String),
}

/// The external lexer found text it has no token for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("token recognition error at offset {offset}: '{text}'")]
pub struct LexFailure {
    pub offset: usize,
    pub text: String,
}

/// The external parser could not derive the token stream from the requested rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// A specific token was required and something else was found.
    #[error("mismatched input {found} expecting {expected}")]
    UnexpectedToken { expected: String, found: String },

    /// No alternative of `rule` can start with the upcoming input.
    #[error("no viable alternative at input {found} in rule {rule}")]
    NoViableAlternative { rule: String, found: String },
}

/// Raised while compiling a pattern into a [`ParseTreePattern`](crate::pattern::ParseTreePattern).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternCompileError {
    #[error(transparent)]
    Syntax(#[from] PatternSyntaxError),

    #[error(transparent)]
    Lex(#[from] LexFailure),

    #[error("unknown rule or token {name} in pattern: {pattern}")]
    UnknownTag { name: String, pattern: String },

    #[error("unknown start rule {name}")]
    UnknownRule { name: String },

    #[error("start rule does not consume full pattern: {pattern} (stopped at {next})")]
    StartRuleDoesNotConsumeFullPattern { pattern: String, next: String },

    #[error("mismatched input {found} expecting {expected}")]
    UnexpectedToken { expected: String, found: String },

    #[error("no viable alternative at input {found} in rule {rule}")]
    NoViableAlternative { rule: String, found: String },

    /// The parser placed a rule reference somewhere other than as the only
    /// child of the rule it names.
    #[error("rule tag {tag} is not the only child of its rule in pattern: {pattern}")]
    StrayRuleTag { tag: String, pattern: String },
}

impl From<ParseFailure> for PatternCompileError {
    fn from(failure: ParseFailure) -> Self {
        match failure {
            ParseFailure::UnexpectedToken { expected, found } => {
                PatternCompileError::UnexpectedToken { expected, found }
            }
            ParseFailure::NoViableAlternative { rule, found } => {
                PatternCompileError::NoViableAlternative { rule, found }
            }
        }
    }
}

/// Raised while building a [`Grammar`](crate::grammar::Grammar).
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("grammar {grammar} references undefined symbol {symbol} in rule {rule}")]
    UndefinedSymbol {
        grammar: String,
        rule: String,
        symbol: String,
    },

    #[error("grammar {grammar} defines {name} more than once")]
    DuplicateName { grammar: String, name: String },

    #[error("grammar {grammar} has an unterminated literal in rule {rule}")]
    UnterminatedLiteral { grammar: String, rule: String },

    #[error("invalid pattern for token {name}")]
    InvalidTokenPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// Raised while parsing real input with a [`Grammar`](crate::grammar::Grammar).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error(transparent)]
    Lex(#[from] LexFailure),

    #[error(transparent)]
    Parse(#[from] ParseFailure),

    #[error("extraneous input {found} after rule {rule}")]
    TrailingInput { rule: String, found: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_reproduce_pattern() {
        let err = PatternSyntaxError::UnterminatedTag {
            pattern: "<expr hi mom".into(),
        };
        assert_eq!(err.to_string(), "unterminated tag in pattern: <expr hi mom");
        assert_eq!(err.pattern(), "<expr hi mom");
    }

    #[test]
    fn parse_failures_keep_their_kind() {
        let err: PatternCompileError = ParseFailure::NoViableAlternative {
            rule: "s".into(),
            found: "'x'".into(),
        }
        .into();
        assert!(matches!(err, PatternCompileError::NoViableAlternative { .. }));

        let err: PatternCompileError = ParseFailure::UnexpectedToken {
            expected: "'='".into(),
            found: "';'".into(),
        }
        .into();
        assert_eq!(err.to_string(), "mismatched input ';' expecting '='");
    }
}
