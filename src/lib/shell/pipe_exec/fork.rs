//! Spawning one pipeline stage: fork, set the child up as an ordinary
//! process wired into the pipeline, and replace its image with the
//! target program.

use super::{streams, PipelineError};
use crate::{parser::pipelines::Command, shell::signals};
use nix::{
    errno::Errno,
    unistd::{self, execvp, ForkResult, Pid},
};
use std::{
    convert::Infallible,
    ffi::CString,
    io::{self, Write},
    os::unix::io::RawFd,
};

/// Forks one pipeline stage and returns its PID without waiting.
///
/// `stdin_fd` becomes the child's standard input. For every stage but
/// the last, `pipe_fds` carries the pipe to the next stage: the child
/// writes standard output into the write end and discards the read end,
/// which belongs to its successor. The caller keeps its own copies of
/// all descriptors and closes them once the stage is spawned.
pub(crate) fn spawn_stage(
    command: &Command,
    stdin_fd: RawFd,
    pipe_fds: Option<(RawFd, RawFd)>,
    background: bool,
) -> Result<Pid, PipelineError> {
    // Flush buffered shell output so it appears before anything the
    // child writes to the shared stream.
    let _ = io::stdout().flush();

    match unsafe { unistd::fork() }.map_err(PipelineError::Fork)? {
        ForkResult::Parent { child } => Ok(child),
        ForkResult::Child => {
            let error = match exec_stage(command, stdin_fd, pipe_fds, background) {
                Ok(infallible) => match infallible {},
                Err(error) => error,
            };
            eprintln!("{}", error);
            let _ = io::stderr().flush();
            unsafe { nix::libc::_exit(error.child_exit_status().as_os_code()) }
        }
    }
}

/// Runs in the forked child; only returns on failure.
fn exec_stage(
    command: &Command,
    stdin_fd: RawFd,
    pipe_fds: Option<(RawFd, RawFd)>,
    background: bool,
) -> Result<Infallible, PipelineError> {
    if background {
        // Detach into a new session: no controlling terminal, so
        // terminal-generated interrupts cannot reach this stage.
        unistd::setsid().map_err(PipelineError::Setsid)?;
    }

    // The child must behave like an ordinary process, not a shell-aware
    // one.
    signals::restore_for_child();

    streams::move_fd(stdin_fd, streams::STDIN_FILENO)?;
    if let Some((reader, writer)) = pipe_fds {
        streams::move_fd(writer, streams::STDOUT_FILENO)?;
        unistd::close(reader).map_err(PipelineError::Close)?;
    }

    // Redirections run after the pipe wiring and therefore win over it.
    for redirection in &command.redirections {
        streams::apply_redirection(redirection)?;
    }

    let argv = command
        .args
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| PipelineError::CommandExec(command.args[0].clone()))?;

    // argv[0] doubles as the lookup name and the program's reported name.
    match execvp(&argv[0], &argv) {
        Ok(infallible) => match infallible {},
        Err(Errno::ENOENT) => Err(PipelineError::CommandNotFound(command.args[0].clone())),
        Err(Errno::EACCES) => Err(PipelineError::CommandDenied(command.args[0].clone())),
        Err(_) => Err(PipelineError::CommandExec(command.args[0].clone())),
    }
}
