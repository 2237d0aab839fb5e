//! Pipeline execution: turning one validated pipeline into running
//! processes with the right pipe and redirection plumbing, and waiting
//! for foreground pipelines to finish.
//!
//! Child-termination delivery is suspended for the whole spawn loop, so
//! spawning and registering every stage is atomic with respect to the
//! asynchronous reaper; delivery resumes only once all stages are
//! spawned and, for a foreground pipeline, the synchronous wait has
//! returned. Without this a stage could exit and be reaped before its
//! PID was registered, leaving the wait blocked on a process nobody is
//! tracking.

mod fork;
pub(crate) mod streams;

use self::fork::spawn_stage;
use super::{signals::SigchldGuard, Shell};
use crate::{
    builtins::{BuiltinFunction, Status},
    parser::pipelines::Pipeline,
};
use nix::{errno::Errno, unistd};
use thiserror::Error;

/// Everything that can go wrong while executing a pipeline.
///
/// The `Command*`, `File*`, and `Open` variants arise only inside a
/// forked child, which prints them and exits; the remaining variants are
/// OS resource failures, fatal to whichever process encountered them.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// fork(2) failed; no stage was created.
    #[error("fork failed: {0}")]
    Fork(#[source] Errno),
    /// pipe(2) failed while chaining stages.
    #[error("failed to create pipe: {0}")]
    Pipe(#[source] Errno),
    /// Duplicating the shell's stdin for the first stage failed.
    #[error("failed to duplicate stdin: {0}")]
    DupStdin(#[source] Errno),
    /// dup2(2) failed while wiring a stage's standard streams.
    #[error("failed to duplicate file descriptor: {0}")]
    Dup(#[source] Errno),
    /// close(2) failed; descriptor bookkeeping can no longer be trusted.
    #[error("failed to close file descriptor: {0}")]
    Close(#[source] Errno),
    /// setsid(2) failed while detaching a background stage.
    #[error("failed to detach into a new session: {0}")]
    Setsid(#[source] Errno),
    /// waitpid(2) failed while awaiting the foreground pipeline.
    #[error("failed to wait for child: {0}")]
    WaitPid(#[source] Errno),
    /// A redirection target does not exist.
    #[error("{0}: no such file or directory")]
    FileNotFound(String),
    /// A redirection target is not accessible.
    #[error("{0}: permission denied")]
    FileDenied(String),
    /// A redirection target could not be opened for another reason.
    #[error("{0}: open error: {1}")]
    Open(String, #[source] Errno),
    /// The program to execute does not exist.
    #[error("{0}: no such file or directory")]
    CommandNotFound(String),
    /// The program is not executable by this user.
    #[error("{0}: permission denied")]
    CommandDenied(String),
    /// exec(2) failed for another reason.
    #[error("{0}: exec error")]
    CommandExec(String),
}

impl PipelineError {
    /// The status a failed child exits with. An exec-start failure uses
    /// a code distinguishable from both success and ordinary failure, so
    /// "could not even start" is visible in the exit status.
    pub(crate) fn child_exit_status(&self) -> Status {
        match self {
            PipelineError::CommandNotFound(_)
            | PipelineError::CommandDenied(_)
            | PipelineError::CommandExec(_) => Status::COULD_NOT_EXEC,
            _ => Status::FAILURE,
        }
    }
}

impl Shell {
    /// Executes one validated pipeline: to completion if it runs in the
    /// foreground, or without waiting if it runs in the background.
    pub fn execute_pipeline(&mut self, pipeline: &Pipeline) -> Result<(), PipelineError> {
        // Builtins run in the shell's own process, so they can mutate
        // shell-owned state such as the working directory.
        if let Some(builtin) = self.builtin_fast_path(pipeline) {
            let status = builtin(&pipeline.stages[0].args, self);
            if !status.is_success() {
                eprintln!("minnow: builtin {} error", pipeline.stages[0].args[0]);
            }
            return Ok(());
        }
        self.pipe(pipeline)
    }

    /// A single foreground command with no redirections may dispatch to
    /// a builtin, bypassing process creation entirely.
    fn builtin_fast_path(&self, pipeline: &Pipeline) -> Option<BuiltinFunction> {
        if pipeline.background
            || pipeline.stages.len() != 1
            || !pipeline.stages[0].redirections.is_empty()
        {
            return None;
        }
        self.builtins().get(&pipeline.stages[0].args[0])
    }

    /// Runs every stage of `pipeline` as an OS process, chaining
    /// standard streams through pipes.
    fn pipe(&mut self, pipeline: &Pipeline) -> Result<(), PipelineError> {
        let _guard = SigchldGuard::new();

        // Stage 0 reads from a duplicate of the shell's own stdin, which
        // must itself stay open for the next prompt.
        let mut read_fd = unistd::dup(streams::STDIN_FILENO).map_err(PipelineError::DupStdin)?;

        let last = pipeline.stages.len() - 1;
        for (index, command) in pipeline.stages.iter().enumerate() {
            let pipe_fds = if index == last {
                None
            } else {
                Some(unistd::pipe().map_err(PipelineError::Pipe)?)
            };

            let pid = spawn_stage(command, read_fd, pipe_fds, pipeline.background)?;
            if pipeline.background {
                self.jobs_mut().register_background(pid);
            } else {
                self.jobs_mut().register_foreground(pid);
            }

            // Close the copies this process no longer needs, so EOF can
            // propagate down the chain.
            unistd::close(read_fd).map_err(PipelineError::Close)?;
            if let Some((reader, writer)) = pipe_fds {
                unistd::close(writer).map_err(PipelineError::Close)?;
                read_fd = reader;
            }
        }

        if !pipeline.background {
            self.jobs_mut().wait_foreground()?;
        }
        Ok(())
    }
}
