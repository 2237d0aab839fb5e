//! The shell itself: the state one session carries, and the dispatch of
//! a line of input through parsing, validation, and pipeline execution.

pub mod job_control;
pub mod pipe_exec;
pub(crate) mod signals;

pub use self::job_control::{BackgroundJob, JobControl, ProcessState};
use self::pipe_exec::PipelineError;
use crate::{
    builtins::BuiltinMap,
    parser::{self, pipelines, pipelines::InvalidPipeline, ParseError},
};
use thiserror::Error;

/// Errors from dispatching one line of input.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The line failed to parse.
    #[error("syntax error: {0}")]
    InvalidSyntax(#[from] ParseError),
    /// The line parsed, but a pipeline has a missing stage.
    #[error("syntax error: {0}")]
    InvalidPipeline(#[from] InvalidPipeline),
    /// A pipeline could not be executed.
    #[error("pipeline execution error: {0}")]
    PipelineExecution(#[from] PipelineError),
}

impl ShellError {
    /// Syntax errors are recoverable: the offending line is skipped and
    /// the session continues. Execution errors are not; they leave the
    /// shell's descriptor or process-table assumptions violated.
    pub fn is_syntax(&self) -> bool {
        matches!(self, ShellError::InvalidSyntax(_) | ShellError::InvalidPipeline(_))
    }
}

/// The state of one shell session: the builtin registry and the
/// job-control context. Created at process start and alive until exit.
pub struct Shell {
    builtins: BuiltinMap,
    jobs:     JobControl,
}

impl Shell {
    /// Creates a shell, installing the signal dispositions the execution
    /// engine relies on.
    pub fn new() -> nix::Result<Self> {
        Ok(Shell { builtins: BuiltinMap::new(), jobs: JobControl::new()? })
    }

    /// Access to the builtin registry.
    pub const fn builtins(&self) -> &BuiltinMap { &self.builtins }

    /// Access to the job-control context.
    pub fn jobs(&self) -> &JobControl { &self.jobs }

    pub(crate) fn jobs_mut(&mut self) -> &mut JobControl { &mut self.jobs }

    /// Parses, validates, and executes one line of input.
    ///
    /// Pipelines on the line run strictly in order; one pipeline's
    /// outcome never short-circuits the next. A validation failure
    /// rejects the entire line before anything is executed.
    pub fn on_command(&mut self, line: &str) -> Result<(), ShellError> {
        let raw = parser::parse(line)?;
        let validated = pipelines::validate(raw)?;
        for pipeline in &validated {
            self.execute_pipeline(pipeline)?;
        }
        Ok(())
    }

    /// Collects any children that terminated since the last call and
    /// updates the background registry. Cheap when nothing happened.
    pub fn reap(&mut self) { self.jobs.reap(); }

    /// Reports every background job that has finished since the last
    /// call, exactly once each, then forgets it.
    pub fn report_finished_jobs(&mut self) {
        self.jobs.drain_finished(|njob, job| {
            println!("minnow: [{}] {} {}", njob, job.pid(), job.state());
        });
    }
}
