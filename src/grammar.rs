//! Reference grammar front end
//!
//! A small interpreted grammar implementing both [`ExternalLexer`] and
//! [`ExternalParser`], so patterns can be compiled and matched without a
//! generated parser. Grammars are declared in a notation close to the usual
//! parser-generator one:
//!
//! ```text
//! Grammar::builder("Assign")
//!     .rule("s", &["ID '=' expr ';'"])
//!     .rule("expr", &["expr '*' expr", "ID", "INT"])
//!     .token("ID", "[a-z]+")
//!     .token("INT", "[0-9]+")
//!     .skip("WS", r"[ \t\r\n]+")
//!     .build()?;
//! ```
//!
//! Lexing:
//!     Quoted literals used in rules become tokens first, numbered from 1 in order
//!     of appearance, followed by the named tokens in declaration order. At every
//!     offset the longest match wins; on a tie the earlier definition wins, so
//!     literals beat named tokens.
//!
//! Parsing:
//!     Plain recursive descent. Rules with several alternatives pick the first
//!     one that parses on a trial run (rewinding the token stream afterwards); if
//!     none does, the rule reports `NoViableAlternative`. Once an alternative is
//!     chosen, a wrong token is an `UnexpectedToken`. Alternatives that start with
//!     the rule itself (`expr '*' expr`) are parsed by precedence climbing:
//!     earlier alternatives bind tighter and operators associate to the left.

use regex::Regex;

use crate::ast::{RuleId, Token, TokenKind, TokenStream, TokenType, Tree};
use crate::error::{GrammarError, InputError, LexFailure, ParseFailure};
use crate::external::{ExternalLexer, ExternalParser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    Token(TokenType),
    Rule(RuleId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexAction {
    Emit,
    Hidden,
    Skip,
}

#[derive(Debug)]
enum TokenMatcher {
    Literal(String),
    Pattern(Regex),
}

#[derive(Debug)]
struct TokenDef {
    token_type: TokenType,
    matcher: TokenMatcher,
    action: LexAction,
}

impl TokenDef {
    fn match_len(&self, rest: &str) -> Option<usize> {
        let len = match &self.matcher {
            TokenMatcher::Literal(text) => rest.starts_with(text.as_str()).then_some(text.len())?,
            TokenMatcher::Pattern(regex) => regex.find(rest)?.end(),
        };
        (len > 0).then_some(len)
    }
}

#[derive(Debug)]
struct RuleDef {
    name: String,
    /// Alternatives not starting with the rule itself.
    primaries: Vec<Vec<Symbol>>,
    /// Left-recursive alternatives with the leading self reference removed.
    suffixes: Vec<Vec<Symbol>>,
}

#[derive(Debug)]
pub struct Grammar {
    name: String,
    rules: Vec<RuleDef>,
    lexer_rules: Vec<TokenDef>,
    /// Display names indexed by token type - 1.
    token_names: Vec<String>,
    /// Named tokens only; literals have no symbolic name.
    named_tokens: Vec<(String, TokenType)>,
}

impl Grammar {
    pub fn builder(name: impl Into<String>) -> GrammarBuilder {
        GrammarBuilder {
            name: name.into(),
            rules: Vec::new(),
            tokens: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `ID` for named tokens, `'='` for literals.
    pub fn token_name(&self, token_type: TokenType) -> Option<&str> {
        let index = (token_type.0 as usize).checked_sub(1)?;
        self.token_names.get(index).map(String::as_str)
    }

    /// Parse real input from `start`, requiring all of it to be consumed.
    pub fn parse_input(&self, input: &str, start: RuleId) -> Result<Tree, InputError> {
        let tokens = self
            .tokenize(input)?
            .into_iter()
            .filter(|t| !t.is_hidden())
            .collect();
        let mut stream = TokenStream::new(tokens);
        let tree = self.parse(&mut stream, start)?;
        if !stream.is_exhausted() {
            return Err(InputError::TrailingInput {
                rule: self.rule_display(start),
                found: stream.describe_next(),
            });
        }
        Ok(tree)
    }

    fn rule_display(&self, rule: RuleId) -> String {
        self.rule_name(rule)
            .map(str::to_string)
            .unwrap_or_else(|| format!("rule{}", rule))
    }

    fn token_display(&self, token_type: TokenType) -> String {
        self.token_name(token_type)
            .map(str::to_string)
            .unwrap_or_else(|| format!("<{}>", token_type))
    }

    fn parse_rule(&self, rule: RuleId, tokens: &mut TokenStream) -> Result<Tree, ParseFailure> {
        let def = self
            .rules
            .get(rule.0)
            .ok_or_else(|| ParseFailure::NoViableAlternative {
                rule: self.rule_display(rule),
                found: tokens.describe_next(),
            })?;
        // Left-recursive rules take a leading placeholder as their seed.
        if !def.suffixes.is_empty() {
            return self.parse_left_recursive(rule, def, 0, tokens);
        }
        if let Some(tree) = self.rule_tag(rule, tokens) {
            return Ok(tree);
        }
        let alt = self.predict(def, tokens)?;
        Ok(Tree::rule(rule, self.parse_symbols(&def.primaries[alt], tokens)?))
    }

    /// Consume a placeholder standing in for the whole of `rule`.
    fn rule_tag(&self, rule: RuleId, tokens: &mut TokenStream) -> Option<Tree> {
        let token = tokens.peek()?;
        if token.kind != TokenKind::RuleRef(rule) {
            return None;
        }
        let token = token.clone();
        tokens.advance();
        Some(Tree::rule(rule, vec![Tree::leaf(token)]))
    }

    /// Index of the first primary alternative that parses from here.
    fn predict(&self, def: &RuleDef, tokens: &mut TokenStream) -> Result<usize, ParseFailure> {
        if def.primaries.len() == 1 {
            return Ok(0);
        }
        let mark = tokens.position();
        for (i, alt) in def.primaries.iter().enumerate() {
            let viable = self.parse_symbols(alt, tokens).is_ok();
            tokens.seek(mark);
            if viable {
                return Ok(i);
            }
        }
        Err(ParseFailure::NoViableAlternative {
            rule: def.name.clone(),
            found: tokens.describe_next(),
        })
    }

    fn parse_symbols(&self, symbols: &[Symbol], tokens: &mut TokenStream) -> Result<Vec<Tree>, ParseFailure> {
        symbols
            .iter()
            .map(|symbol| self.parse_symbol(*symbol, tokens))
            .collect()
    }

    fn parse_symbol(&self, symbol: Symbol, tokens: &mut TokenStream) -> Result<Tree, ParseFailure> {
        match symbol {
            Symbol::Token(token_type) => self.expect(token_type, tokens),
            Symbol::Rule(rule) => self.parse_rule(rule, tokens),
        }
    }

    fn expect(&self, token_type: TokenType, tokens: &mut TokenStream) -> Result<Tree, ParseFailure> {
        match tokens.peek() {
            Some(token) if token.kind == TokenKind::Type(token_type) => {
                let leaf = Tree::leaf(token.clone());
                tokens.advance();
                Ok(leaf)
            }
            _ => Err(ParseFailure::UnexpectedToken {
                expected: self.token_display(token_type),
                found: tokens.describe_next(),
            }),
        }
    }

    /// Precedence climbing over the left-recursive alternatives of `rule`.
    ///
    /// Suffix `i` of `n` has precedence `n - i`; only suffixes at or above
    /// `min_prec` may extend the current node.
    fn parse_left_recursive(
        &self,
        rule: RuleId,
        def: &RuleDef,
        min_prec: usize,
        tokens: &mut TokenStream,
    ) -> Result<Tree, ParseFailure> {
        let mut node = match self.rule_tag(rule, tokens) {
            Some(tree) => tree,
            None => {
                let alt = self.predict(def, tokens)?;
                Tree::rule(rule, self.parse_symbols(&def.primaries[alt], tokens)?)
            }
        };

        loop {
            let mut extended = false;
            for (i, suffix) in def.suffixes.iter().enumerate() {
                let prec = def.suffixes.len() - i;
                if prec < min_prec {
                    continue;
                }
                let mark = tokens.position();
                match self.parse_suffix(rule, def, suffix, prec, tokens) {
                    Ok(rest) if tokens.position() > mark => {
                        let mut children = vec![node];
                        children.extend(rest);
                        node = Tree::rule(rule, children);
                        extended = true;
                        break;
                    }
                    _ => tokens.seek(mark),
                }
            }
            if !extended {
                return Ok(node);
            }
        }
    }

    fn parse_suffix(
        &self,
        rule: RuleId,
        def: &RuleDef,
        suffix: &[Symbol],
        prec: usize,
        tokens: &mut TokenStream,
    ) -> Result<Vec<Tree>, ParseFailure> {
        let mut children = Vec::with_capacity(suffix.len());
        for (i, symbol) in suffix.iter().enumerate() {
            let child = match symbol {
                Symbol::Rule(r) if *r == rule && i + 1 == suffix.len() => {
                    self.parse_left_recursive(rule, def, prec + 1, tokens)?
                }
                _ => self.parse_symbol(*symbol, tokens)?,
            };
            children.push(child);
        }
        Ok(children)
    }
}

impl ExternalLexer for Grammar {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, LexFailure> {
        let mut tokens = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];
            let mut best: Option<(usize, &TokenDef)> = None;
            for def in &self.lexer_rules {
                if let Some(len) = def.match_len(rest) {
                    if best.map_or(true, |(best_len, _)| len > best_len) {
                        best = Some((len, def));
                    }
                }
            }
            let Some((len, def)) = best else {
                return Err(LexFailure {
                    offset: pos,
                    text: rest.chars().next().map(String::from).unwrap_or_default(),
                });
            };
            let lexeme = &rest[..len];
            match def.action {
                LexAction::Emit => tokens.push(Token::new(def.token_type, lexeme)),
                LexAction::Hidden => tokens.push(Token::hidden(def.token_type, lexeme)),
                LexAction::Skip => {}
            }
            pos += len;
        }
        Ok(tokens)
    }
}

impl ExternalParser for Grammar {
    fn rule_index_of(&self, name: &str) -> Option<RuleId> {
        self.rules.iter().position(|r| r.name == name).map(RuleId)
    }

    fn token_type_of(&self, name: &str) -> Option<TokenType> {
        self.named_tokens
            .iter()
            .find(|(token, _)| token == name)
            .map(|(_, token_type)| *token_type)
    }

    fn rule_name(&self, rule: RuleId) -> Option<&str> {
        self.rules.get(rule.0).map(|r| r.name.as_str())
    }

    fn parse(&self, tokens: &mut TokenStream, start: RuleId) -> Result<Tree, ParseFailure> {
        self.parse_rule(start, tokens)
    }
}

/// Collects rule and token declarations; see the module docs for the notation.
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    name: String,
    rules: Vec<(String, Vec<String>)>,
    tokens: Vec<(String, String, LexAction)>,
}

impl GrammarBuilder {
    /// Declare a parser rule with one string per alternative.
    pub fn rule(mut self, name: &str, alternatives: &[&str]) -> Self {
        let alternatives = alternatives.iter().map(|alt| alt.to_string()).collect();
        self.rules.push((name.to_string(), alternatives));
        self
    }

    pub fn token(self, name: &str, pattern: &str) -> Self {
        self.lexer_rule(name, pattern, LexAction::Emit)
    }

    /// Token sent to the hidden channel.
    pub fn hidden(self, name: &str, pattern: &str) -> Self {
        self.lexer_rule(name, pattern, LexAction::Hidden)
    }

    /// Token dropped by the lexer.
    pub fn skip(self, name: &str, pattern: &str) -> Self {
        self.lexer_rule(name, pattern, LexAction::Skip)
    }

    fn lexer_rule(mut self, name: &str, pattern: &str, action: LexAction) -> Self {
        self.tokens.push((name.to_string(), pattern.to_string(), action));
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        self.check_duplicates()?;

        // split every alternative into raw symbols, collecting literals on the way
        let mut literals: Vec<String> = Vec::new();
        let mut raw_rules = Vec::with_capacity(self.rules.len());
        for (name, alternatives) in &self.rules {
            let mut raw_alts = Vec::with_capacity(alternatives.len());
            for alt in alternatives {
                let symbols = split_symbols(alt).ok_or_else(|| GrammarError::UnterminatedLiteral {
                    grammar: self.name.clone(),
                    rule: name.clone(),
                })?;
                for symbol in &symbols {
                    if let RawSymbol::Literal(text) = symbol {
                        if !literals.contains(text) {
                            literals.push(text.clone());
                        }
                    }
                }
                raw_alts.push(symbols);
            }
            raw_rules.push((name.clone(), raw_alts));
        }

        let mut lexer_rules = Vec::new();
        let mut token_names = Vec::new();
        let mut named_tokens = Vec::new();
        for literal in &literals {
            let token_type = TokenType(token_names.len() as u32 + 1);
            token_names.push(format!("'{}'", literal));
            lexer_rules.push(TokenDef {
                token_type,
                matcher: TokenMatcher::Literal(literal.clone()),
                action: LexAction::Emit,
            });
        }
        for (name, pattern, action) in &self.tokens {
            let token_type = TokenType(token_names.len() as u32 + 1);
            let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|source| {
                GrammarError::InvalidTokenPattern {
                    name: name.clone(),
                    source,
                }
            })?;
            token_names.push(name.clone());
            named_tokens.push((name.clone(), token_type));
            lexer_rules.push(TokenDef {
                token_type,
                matcher: TokenMatcher::Pattern(regex),
                action: *action,
            });
        }

        let mut rules = Vec::with_capacity(raw_rules.len());
        for (index, (name, raw_alts)) in raw_rules.into_iter().enumerate() {
            let mut def = RuleDef {
                name,
                primaries: Vec::new(),
                suffixes: Vec::new(),
            };
            for raw in raw_alts {
                let mut symbols = raw
                    .into_iter()
                    .map(|symbol| self.resolve(&def.name, symbol, &literals, &named_tokens))
                    .collect::<Result<Vec<_>, _>>()?;
                if symbols.first() == Some(&Symbol::Rule(RuleId(index))) {
                    symbols.remove(0);
                    def.suffixes.push(symbols);
                } else {
                    def.primaries.push(symbols);
                }
            }
            rules.push(def);
        }

        Ok(Grammar {
            name: self.name,
            rules,
            lexer_rules,
            token_names,
            named_tokens,
        })
    }

    fn check_duplicates(&self) -> Result<(), GrammarError> {
        let mut seen: Vec<&str> = Vec::new();
        let names = self
            .rules
            .iter()
            .map(|(name, _)| name.as_str())
            .chain(self.tokens.iter().map(|(name, _, _)| name.as_str()));
        for name in names {
            if seen.contains(&name) {
                return Err(GrammarError::DuplicateName {
                    grammar: self.name.clone(),
                    name: name.to_string(),
                });
            }
            seen.push(name);
        }
        Ok(())
    }

    fn resolve(
        &self,
        rule: &str,
        symbol: RawSymbol,
        literals: &[String],
        named_tokens: &[(String, TokenType)],
    ) -> Result<Symbol, GrammarError> {
        match symbol {
            RawSymbol::Literal(text) => {
                let index = literals.iter().position(|l| *l == text).unwrap_or_default();
                Ok(Symbol::Token(TokenType(index as u32 + 1)))
            }
            RawSymbol::Name(name) => {
                if let Some(index) = self.rules.iter().position(|(r, _)| *r == name) {
                    return Ok(Symbol::Rule(RuleId(index)));
                }
                if let Some((_, token_type)) = named_tokens.iter().find(|(t, _)| *t == name) {
                    return Ok(Symbol::Token(*token_type));
                }
                Err(GrammarError::UndefinedSymbol {
                    grammar: self.name.clone(),
                    rule: rule.to_string(),
                    symbol: name,
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RawSymbol {
    Literal(String),
    Name(String),
}

/// Split an alternative into names and quoted literals; `None` on an unterminated quote.
fn split_symbols(alt: &str) -> Option<Vec<RawSymbol>> {
    let mut symbols = Vec::new();
    let mut rest = alt.trim_start();
    while !rest.is_empty() {
        if let Some(quoted) = rest.strip_prefix('\'') {
            let end = quoted.find('\'')?;
            symbols.push(RawSymbol::Literal(quoted[..end].to_string()));
            rest = &quoted[end + 1..];
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            symbols.push(RawSymbol::Name(rest[..end].to_string()));
            rest = &rest[end..];
        }
        rest = rest.trim_start();
    }
    Some(symbols)
}
