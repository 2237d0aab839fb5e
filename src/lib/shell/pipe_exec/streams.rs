//! File-descriptor plumbing for pipeline stages: repointing the standard
//! streams and applying file redirections. Everything here runs in a
//! forked child that has not yet exec'd, so a failure terminates only
//! that child, never the shell or a sibling stage.

use super::PipelineError;
use crate::parser::pipelines::{Redirection, RedirectionKind};
use nix::{
    errno::Errno,
    fcntl::{open, OFlag},
    sys::stat::Mode,
    unistd::{close, dup2},
};
use std::os::unix::io::RawFd;

pub(crate) const STDIN_FILENO: RawFd = 0;
pub(crate) const STDOUT_FILENO: RawFd = 1;

/// Permissions for files created by an output redirection: rw-r--r--.
fn create_mode() -> Mode { Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH }

/// Repoints `to` at whatever `from` refers to, then closes `from`.
pub(crate) fn move_fd(from: RawFd, to: RawFd) -> Result<(), PipelineError> {
    if from == to {
        return Ok(());
    }
    dup2(from, to).map_err(PipelineError::Dup)?;
    close(from).map_err(PipelineError::Close)
}

fn open_target(redirection: &Redirection) -> Result<RawFd, PipelineError> {
    let (flags, mode) = match redirection.kind {
        RedirectionKind::Input => (OFlag::O_RDONLY, Mode::empty()),
        RedirectionKind::Overwrite => {
            (OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC, create_mode())
        }
        RedirectionKind::Append => {
            (OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND, create_mode())
        }
    };
    open(redirection.file.as_str(), flags, mode).map_err(|errno| match errno {
        Errno::ENOENT => PipelineError::FileNotFound(redirection.file.clone()),
        Errno::EACCES => PipelineError::FileDenied(redirection.file.clone()),
        errno => PipelineError::Open(redirection.file.clone(), errno),
    })
}

/// Opens the redirection's target and repoints the corresponding
/// standard descriptor at it, closing whatever occupied that slot.
/// Applying redirections left to right means a later redirection of the
/// same descriptor overrides an earlier one.
pub(crate) fn apply_redirection(redirection: &Redirection) -> Result<(), PipelineError> {
    let fd = open_target(redirection)?;
    let target = match redirection.kind {
        RedirectionKind::Input => STDIN_FILENO,
        RedirectionKind::Overwrite | RedirectionKind::Append => STDOUT_FILENO,
    };
    move_fd(fd, target)
}
