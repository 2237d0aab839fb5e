//! Turns one line of input into raw pipelines.
//!
//! The grammar is deliberately small: pipelines are separated by `;`,
//! stages within a pipeline by `|`, a trailing `&` sends the pipeline to
//! the background, and `< file`, `> file`, and `>> file` redirect a
//! stage's standard streams. There is no quoting, expansion, or
//! globbing. A stage with no words at all parses to the `None`
//! placeholder that [`pipelines::validate`] later inspects.

pub mod pipelines;

use self::pipelines::{Command, RawPipeline, Redirection, RedirectionKind};
use std::mem;
use thiserror::Error;

/// The line violates the grammar outright.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A redirection operator with no file name after it, as in `a > |`.
    #[error("redirection is missing a file name")]
    ExpectedFile,
    /// A redirection with no command to attach to, as in a bare `> f`.
    #[error("redirection without a command")]
    RedirectionWithoutCommand,
    /// `&` somewhere other than the end of a pipeline.
    #[error("'&' is only valid at the end of a pipeline")]
    BackgroundNotLast,
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Word(String),
    Pipe,
    Semicolon,
    Ampersand,
    RedirectIn,
    RedirectOut,
    RedirectAppend,
}

fn flush_word(word: &mut String, tokens: &mut Vec<Token>) {
    if !word.is_empty() {
        tokens.push(Token::Word(mem::take(word)));
    }
}

fn lex(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => flush_word(&mut word, &mut tokens),
            '|' => {
                flush_word(&mut word, &mut tokens);
                tokens.push(Token::Pipe);
            }
            ';' => {
                flush_word(&mut word, &mut tokens);
                tokens.push(Token::Semicolon);
            }
            '&' => {
                flush_word(&mut word, &mut tokens);
                tokens.push(Token::Ampersand);
            }
            '<' => {
                flush_word(&mut word, &mut tokens);
                tokens.push(Token::RedirectIn);
            }
            '>' => {
                flush_word(&mut word, &mut tokens);
                if chars.peek() == Some(&'>') {
                    chars.next();
                    tokens.push(Token::RedirectAppend);
                } else {
                    tokens.push(Token::RedirectOut);
                }
            }
            c => word.push(c),
        }
    }
    flush_word(&mut word, &mut tokens);
    tokens
}

#[derive(Default)]
struct Parser {
    pipelines:    Vec<RawPipeline>,
    pipeline:     RawPipeline,
    args:         Vec<String>,
    redirections: Vec<Redirection>,
}

impl Parser {
    fn finish_stage(&mut self) -> Result<(), ParseError> {
        if self.args.is_empty() {
            if !self.redirections.is_empty() {
                return Err(ParseError::RedirectionWithoutCommand);
            }
            self.pipeline.stages.push(None);
        } else {
            self.pipeline.stages.push(Some(Command {
                args:         mem::take(&mut self.args),
                redirections: mem::take(&mut self.redirections),
            }));
        }
        Ok(())
    }

    fn finish_pipeline(&mut self) -> Result<(), ParseError> {
        self.finish_stage()?;
        self.pipelines.push(mem::take(&mut self.pipeline));
        Ok(())
    }
}

/// Parses one line into raw pipelines. Missing stages come back as
/// `None` placeholders; deciding whether they are harmless or a syntax
/// error is the validator's job.
pub fn parse(line: &str) -> Result<Vec<RawPipeline>, ParseError> {
    let mut parser = Parser::default();
    let mut tokens = lex(line).into_iter().peekable();

    while let Some(token) = tokens.next() {
        // Once `&` has been seen, only the pipeline separator may follow.
        if parser.pipeline.background && token != Token::Semicolon {
            return Err(ParseError::BackgroundNotLast);
        }
        match token {
            Token::Word(word) => parser.args.push(word),
            Token::RedirectIn | Token::RedirectOut | Token::RedirectAppend => {
                let kind = match token {
                    Token::RedirectIn => RedirectionKind::Input,
                    Token::RedirectOut => RedirectionKind::Overwrite,
                    _ => RedirectionKind::Append,
                };
                match tokens.next() {
                    Some(Token::Word(file)) => {
                        parser.redirections.push(Redirection { kind, file })
                    }
                    _ => return Err(ParseError::ExpectedFile),
                }
            }
            Token::Pipe => parser.finish_stage()?,
            Token::Ampersand => parser.pipeline.background = true,
            Token::Semicolon => parser.finish_pipeline()?,
        }
    }
    parser.finish_pipeline()?;
    Ok(parser.pipelines)
}
