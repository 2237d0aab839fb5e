//! The abstract form of a parsed line: pipelines of commands with their
//! redirections, and the validation step that turns the parser's raw
//! output into something the executor will accept.

use thiserror::Error;

/// Which standard stream a redirection repoints, and how its target file
/// is opened.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectionKind {
    /// `< file`: read standard input from the file.
    Input,
    /// `> file`: create or truncate the file and write standard output
    /// to it.
    Overwrite,
    /// `>> file`: create the file if needed and append standard output
    /// to it.
    Append,
}

/// A request to repoint a command's standard input or output to a named
/// file instead of the default stream.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Redirection {
    pub kind: RedirectionKind,
    pub file: String,
}

/// One program invocation with its arguments and redirections.
///
/// `args` is never empty; `args[0]` is the name used both for builtin
/// lookup and for program execution. Redirections apply left to right,
/// so a later redirection of the same descriptor overrides an earlier
/// one.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Command {
    pub args:         Vec<String>,
    pub redirections: Vec<Redirection>,
}

/// A pipeline as the parser produced it. A `None` stage is the
/// placeholder for a missing command, as in `a | | b` or a bare `;`.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct RawPipeline {
    pub stages:     Vec<Option<Command>>,
    pub background: bool,
}

/// A pipeline that passed validation: at least one stage, and every
/// stage is a real command.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Pipeline {
    pub stages:     Vec<Command>,
    pub background: bool,
}

/// A pipeline on the line has a missing stage, as in `a | | b`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("missing command between pipes")]
pub struct InvalidPipeline;

impl RawPipeline {
    /// A pipeline with no real command at all: a stray separator, like
    /// the space between the semicolons of `; ;`.
    fn is_empty(&self) -> bool {
        self.stages.is_empty() || (self.stages.len() == 1 && self.stages[0].is_none())
    }
}

/// Strips empty pipelines from a freshly parsed line, and rejects the
/// whole line if any surviving pipeline still has a missing stage.
///
/// The relative order of survivors is preserved. A line of nothing but
/// separators validates to no pipelines at all.
pub fn validate(raw: Vec<RawPipeline>) -> Result<Vec<Pipeline>, InvalidPipeline> {
    raw.into_iter()
        .filter(|pipeline| !pipeline.is_empty())
        .map(|pipeline| {
            let RawPipeline { stages, background } = pipeline;
            stages
                .into_iter()
                .collect::<Option<Vec<Command>>>()
                .map(|stages| Pipeline { stages, background })
                .ok_or(InvalidPipeline)
        })
        .collect()
}
