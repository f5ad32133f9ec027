use std::fmt;

use crate::ast::Tag;
use crate::error::{DelimiterError, PatternSyntaxError};

/// One segment of a pattern: literal text or a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Text(String),
    Tag(Tag),
}

impl Chunk {
    pub fn text(text: impl Into<String>) -> Self {
        Chunk::Text(text.into())
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Chunk::Tag(Tag::new(name))
    }

    pub fn labeled(label: impl Into<String>, name: impl Into<String>) -> Self {
        Chunk::Tag(Tag::labeled(label, name))
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chunk::Text(text) => write!(f, "'{}'", text),
            Chunk::Tag(tag) => write!(f, "{}", tag),
        }
    }
}

/// Tag delimiters and the escape sequence that makes them literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    start: String,
    stop: String,
    escape: String,
}

impl Delimiters {
    pub fn new(
        start: impl Into<String>,
        stop: impl Into<String>,
        escape: impl Into<String>,
    ) -> Result<Self, DelimiterError> {
        let (start, stop) = (start.into(), stop.into());
        if start.is_empty() {
            return Err(DelimiterError::EmptyStart);
        }
        if stop.is_empty() {
            return Err(DelimiterError::EmptyStop);
        }
        if start == stop {
            return Err(DelimiterError::Identical(start));
        }
        Ok(Self {
            start,
            stop,
            escape: escape.into(),
        })
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn stop(&self) -> &str {
        &self.stop
    }

    pub fn escape(&self) -> &str {
        &self.escape
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            start: "<".into(),
            stop: ">".into(),
            escape: "\\".into(),
        }
    }
}

/// Splits pattern strings into [`Chunk`]s.
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    delimiters: Delimiters,
}

impl Chunker {
    pub fn new(delimiters: Delimiters) -> Self {
        Self { delimiters }
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Split `pattern` into text and tag chunks.
    ///
    /// Examples:
    /// - `<ID> = <expr> ;` → `[ID, ' = ', expr, ' ;']`
    /// - `<a:ID>;`         → `[a:ID, ';']`
    /// - `\<x\> foo`       → `['<x> foo']`
    pub fn split(&self, pattern: &str) -> Result<Vec<Chunk>, PatternSyntaxError> {
        let mut scanner = Scanner::new(pattern, &self.delimiters);
        let (starts, stops) = scanner.delimiter_positions();
        let tags = self.pair_tags(pattern, &starts, &stops)?;

        let mut chunks = Vec::new();
        let mut text_start = 0;
        for (start, stop) in tags {
            self.push_text(&mut chunks, &pattern[text_start..start]);
            let body = &pattern[start + self.delimiters.start.len()..stop];
            chunks.push(Chunk::Tag(self.parse_tag(pattern, &self.unescape(body))?));
            text_start = stop + self.delimiters.stop.len();
        }
        self.push_text(&mut chunks, &pattern[text_start..]);
        Ok(chunks)
    }

    /// Pair up start and stop delimiter offsets, checking counts first and then order.
    fn pair_tags(
        &self,
        pattern: &str,
        starts: &[usize],
        stops: &[usize],
    ) -> Result<Vec<(usize, usize)>, PatternSyntaxError> {
        if starts.len() > stops.len() {
            return Err(PatternSyntaxError::UnterminatedTag {
                pattern: pattern.to_string(),
            });
        }
        if starts.len() < stops.len() {
            return Err(PatternSyntaxError::MissingStartTag {
                pattern: pattern.to_string(),
            });
        }

        let mut tags = Vec::with_capacity(starts.len());
        let mut previous_stop = None;
        for (&start, &stop) in starts.iter().zip(stops) {
            let nested = previous_stop.is_some_and(|prev| start < prev);
            if start >= stop || nested {
                return Err(PatternSyntaxError::TagsOutOfOrder {
                    pattern: pattern.to_string(),
                });
            }
            tags.push((start, stop));
            previous_stop = Some(stop);
        }
        Ok(tags)
    }

    /// Split a tag body at the first colon into label and name.
    fn parse_tag(&self, pattern: &str, body: &str) -> Result<Tag, PatternSyntaxError> {
        let tag = match body.split_once(':') {
            Some((label, name)) => Tag::labeled(label, name),
            None => Tag::new(body),
        };
        if tag.name.is_empty() {
            return Err(PatternSyntaxError::EmptyTag {
                pattern: pattern.to_string(),
            });
        }
        Ok(tag)
    }

    fn push_text(&self, chunks: &mut Vec<Chunk>, raw: &str) {
        if raw.is_empty() {
            return;
        }
        chunks.push(Chunk::Text(self.unescape(raw)));
    }

    /// Replace escaped delimiters with the bare delimiter.
    fn unescape(&self, raw: &str) -> String {
        let Delimiters {
            start,
            stop,
            escape,
        } = &self.delimiters;
        if escape.is_empty() {
            return raw.to_string();
        }
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix(escape.as_str()) {
                if let Some(delim) = [start, stop].into_iter().find(|d| after.starts_with(d.as_str())) {
                    out.push_str(delim);
                    rest = &after[delim.len()..];
                    continue;
                }
            }
            let ch = rest.chars().next().unwrap_or_default();
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
        out
    }
}

/// Walks a pattern collecting unescaped delimiter offsets.
struct Scanner<'a> {
    pattern: &'a str,
    pos: usize,
    delimiters: &'a Delimiters,
}

impl<'a> Scanner<'a> {
    fn new(pattern: &'a str, delimiters: &'a Delimiters) -> Self {
        Self {
            pattern,
            pos: 0,
            delimiters,
        }
    }

    fn rest(&self) -> &'a str {
        &self.pattern[self.pos..]
    }

    /// Advance past `prefix` if the remaining pattern starts with it.
    fn eat(&mut self, prefix: &str) -> bool {
        if !prefix.is_empty() && self.rest().starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    /// Advance by one character.
    fn bump(&mut self) {
        if let Some(ch) = self.rest().chars().next() {
            self.pos += ch.len_utf8();
        }
    }

    fn escaped(&mut self, delim: &str) -> bool {
        let delimiters = self.delimiters;
        let escape = delimiters.escape.as_str();
        if escape.is_empty() || !self.rest().starts_with(escape) {
            return false;
        }
        if self.rest()[escape.len()..].starts_with(delim) {
            self.pos += escape.len() + delim.len();
            true
        } else {
            false
        }
    }

    fn delimiter_positions(&mut self) -> (Vec<usize>, Vec<usize>) {
        let mut starts = Vec::new();
        let mut stops = Vec::new();
        let delimiters = self.delimiters;
        let (start, stop) = (delimiters.start.as_str(), delimiters.stop.as_str());
        while self.pos < self.pattern.len() {
            let at = self.pos;
            if self.escaped(start) || self.escaped(stop) {
                continue;
            }
            if self.eat(start) {
                starts.push(at);
            } else if self.eat(stop) {
                stops.push(at);
            } else {
                self.bump();
            }
        }
        (starts, stops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(chunks: &[Chunk]) -> String {
        let parts: Vec<String> = chunks.iter().map(ToString::to_string).collect();
        format!("[{}]", parts.join(", "))
    }

    #[test]
    fn splits_tags_and_text() {
        let chunker = Chunker::default();
        let chunks = chunker.split("<ID> = <expr> ;").unwrap();
        assert_eq!(
            chunks,
            vec![
                Chunk::tag("ID"),
                Chunk::text(" = "),
                Chunk::tag("expr"),
                Chunk::text(" ;"),
            ]
        );
        assert_eq!(render(&chunks), "[ID, ' = ', expr, ' ;']");
    }

    #[test]
    fn label_precedes_colon() {
        let chunks = Chunker::default().split("<a:ID> <b:ID>;").unwrap();
        assert_eq!(
            chunks,
            vec![
                Chunk::labeled("a", "ID"),
                Chunk::text(" "),
                Chunk::labeled("b", "ID"),
                Chunk::text(";"),
            ]
        );
    }

    #[test]
    fn adjacent_tags_have_no_empty_text() {
        let chunks = Chunker::default().split("<a><b>").unwrap();
        assert_eq!(chunks, vec![Chunk::tag("a"), Chunk::tag("b")]);
    }

    #[test]
    fn escaped_delimiters_are_literal() {
        let chunker = Chunker::default();
        assert_eq!(chunker.split("\\<x\\> foo").unwrap(), vec![Chunk::text("<x> foo")]);
        assert_eq!(chunker.split("a\\b").unwrap(), vec![Chunk::text("a\\b")]);
    }

    #[test]
    fn nested_tags_are_out_of_order() {
        let err = Chunker::default().split("<<a>>").unwrap_err();
        assert!(matches!(err, PatternSyntaxError::TagsOutOfOrder { .. }));
    }

    #[test]
    fn empty_tag_is_rejected() {
        let err = Chunker::default().split("x <> y").unwrap_err();
        assert_eq!(err.to_string(), "empty tag in pattern: x <> y");
        let err = Chunker::default().split("<lbl:>").unwrap_err();
        assert!(matches!(err, PatternSyntaxError::EmptyTag { .. }));
    }

    #[test]
    fn delimiters_must_not_be_empty() {
        assert_eq!(Delimiters::new("", ">", "\\"), Err(DelimiterError::EmptyStart));
        assert_eq!(Delimiters::new("<", "", "\\"), Err(DelimiterError::EmptyStop));
        assert!(Delimiters::new("<<", ">>", "").is_ok());
    }

    #[test]
    fn delimiters_must_differ() {
        let err = Delimiters::new("|", "|", "\\").unwrap_err();
        assert_eq!(err, DelimiterError::Identical("|".into()));
        assert_eq!(err.to_string(), "start and stop delimiters must differ: '|'");
    }

    #[test]
    fn escapes_inside_tags_are_unescaped() {
        let chunks = Chunker::default().split("<a\\>b> x").unwrap();
        assert_eq!(chunks, vec![Chunk::tag("a>b"), Chunk::text(" x")]);
        let chunks = Chunker::default().split("<l\\<b:ID>").unwrap();
        assert_eq!(chunks, vec![Chunk::labeled("l<b", "ID")]);
    }

    #[test]
    fn handles_multibyte_text() {
        let chunks = Chunker::default().split("é <ID> ü").unwrap();
        assert_eq!(chunks, vec![Chunk::text("é "), Chunk::tag("ID"), Chunk::text(" ü")]);
    }
}
