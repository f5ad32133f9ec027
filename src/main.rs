use std::io::{self, Read};
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tree_pattern::{Chunker, Delimiters, ExternalParser, Grammar, PatternCompiler, ParseTree};

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile tree patterns and match them against statements", long_about = None)]
struct Cli {
    /// Log filter such as `debug` or `tree_pattern=trace` (falls back to RUST_LOG, then `warn`)
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a pattern into text and tag chunks
    Split {
        pattern: String,
        #[command(flatten)]
        delimiters: DelimiterArgs,
    },
    /// Show the token stream a pattern compiles to
    Tokenize {
        pattern: String,
        #[command(flatten)]
        delimiters: DelimiterArgs,
    },
    /// Compile a pattern and print its tree
    Compile {
        pattern: String,
        /// Start rule (`stat` or `expr`)
        #[arg(short, long, default_value = "stat")]
        rule: String,
        #[command(flatten)]
        delimiters: DelimiterArgs,
    },
    /// Match a pattern against input; exits with 1 when it does not match
    Match {
        pattern: String,
        /// Input to parse; read from stdin when omitted
        input: Option<String>,
        /// Start rule (`stat` or `expr`)
        #[arg(short, long, default_value = "stat")]
        rule: String,
        #[command(flatten)]
        delimiters: DelimiterArgs,
    },
}

#[derive(Args, Debug)]
struct DelimiterArgs {
    /// Tag start delimiter
    #[arg(long, default_value = "<")]
    start: String,

    /// Tag stop delimiter
    #[arg(long, default_value = ">")]
    stop: String,

    /// Escape sequence making a delimiter literal
    #[arg(long, default_value = "\\")]
    escape: String,
}

impl DelimiterArgs {
    fn delimiters(&self) -> Result<Delimiters> {
        Delimiters::new(&self.start, &self.stop, &self.escape).context("invalid delimiters")
    }
}

/// Assignments and arithmetic expression statements.
fn statement_grammar() -> Result<Grammar> {
    Grammar::builder("Statements")
        .rule("stat", &["ID '=' expr ';'", "expr ';'"])
        .rule("expr", &["expr '*' expr", "expr '+' expr", "'(' expr ')'", "ID", "INT"])
        .token("ID", "[A-Za-z_][A-Za-z_0-9]*")
        .token("INT", "[0-9]+")
        .hidden("WS", r"[ \t\r\n]+")
        .build()
        .context("building statement grammar")
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("reading input from stdin")?;
    // Trim the trailing newline so it does not show up in the parse
    Ok(input.trim_end_matches('\n').to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command {
        Command::Split { pattern, delimiters } => {
            let chunks = Chunker::new(delimiters.delimiters()?).split(&pattern)?;
            for chunk in chunks {
                println!("{}", chunk);
            }
        }
        Command::Tokenize { pattern, delimiters } => {
            let grammar = statement_grammar()?;
            let compiler = PatternCompiler::with_delimiters(&grammar, &grammar, delimiters.delimiters()?);
            for token in compiler.tokenize(&pattern)? {
                let name = match token.token_type() {
                    Some(t) => grammar.token_name(t).unwrap_or("?").to_string(),
                    None => "rule".to_string(),
                };
                println!("{:<8} {}", name, token.text);
            }
        }
        Command::Compile {
            pattern,
            rule,
            delimiters,
        } => {
            let grammar = statement_grammar()?;
            let compiler = PatternCompiler::with_delimiters(&grammar, &grammar, delimiters.delimiters()?);
            let compiled = compiler.compile_rule(&pattern, &rule)?;
            println!("{}", compiled.to_string_tree(&grammar));
        }
        Command::Match {
            pattern,
            input,
            rule,
            delimiters,
        } => {
            let grammar = statement_grammar()?;
            let compiler = PatternCompiler::with_delimiters(&grammar, &grammar, delimiters.delimiters()?);
            let compiled = compiler.compile_rule(&pattern, &rule)?;
            let input = match input {
                Some(input) => input,
                None => read_stdin()?,
            };
            let tree = grammar.parse_input(&input, compiled.start_rule())?;
            let result = compiled.match_tree(&tree);

            println!("{}", tree.to_string_tree(&grammar));
            println!("{}", result);
            for (label, nodes) in result.labels().iter() {
                let texts: Vec<String> = nodes.iter().map(|n| n.text()).collect();
                println!("  {} = [{}]", label, texts.join(", "));
            }
            if !result.succeeded() {
                if let Some(node) = result.mismatched_node() {
                    let rule = node.rule_id().and_then(|r| grammar.rule_name(r));
                    println!("  mismatch at {} '{}'", rule.unwrap_or("token"), node.text());
                }
                process::exit(1);
            }
        }
    }
    Ok(())
}
