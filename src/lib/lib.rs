//! The minnow shell library.
//!
//! minnow is a small interactive command interpreter for POSIX-like
//! systems. This crate contains the whole engine: the [`parser`] that
//! turns a line of input into pipelines, the [`builtins`] registry, and
//! the process plumbing under [`shell`] that wires pipes and
//! redirections, spawns stages, and tracks foreground and background
//! jobs. The `minnow` binary is a thin interactive REPL around
//! [`Shell::on_command`].

pub mod builtins;
pub mod parser;
pub mod shell;

pub use crate::{
    builtins::{BuiltinMap, Status},
    parser::pipelines::{Command, Pipeline, Redirection, RedirectionKind},
    shell::{Shell, ShellError},
};
pub use crate::shell::pipe_exec::PipelineError;
