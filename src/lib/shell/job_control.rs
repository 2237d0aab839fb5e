//! Bookkeeping for the shell's children: which PIDs the current
//! foreground pipeline is awaiting, and the registry of background jobs
//! whose completion is reported at the next prompt.

use super::{pipe_exec::PipelineError, signals};
use nix::{
    errno::Errno,
    sys::{
        signal::Signal,
        wait::{waitpid, WaitPidFlag, WaitStatus},
    },
    unistd::Pid,
};
use smallvec::SmallVec;
use std::fmt;

/// Matches any child of this process in waitpid(2).
const ANY_CHILD: Pid = Pid::from_raw(-1);

/// The last state the shell has observed for a background job.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProcessState {
    /// Still running as far as the shell knows.
    Running,
    /// Exited on its own with the given code.
    Exited(i32),
    /// Terminated by a signal.
    Signaled(Signal),
    /// Already reported to the user; the slot may be reused.
    Empty,
}

impl ProcessState {
    fn is_finished(self) -> bool {
        matches!(self, ProcessState::Exited(_) | ProcessState::Signaled(_))
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ProcessState::Running => write!(f, "running"),
            ProcessState::Exited(code) => write!(f, "exited with {}", code),
            ProcessState::Signaled(signal) => write!(f, "terminated by {}", signal),
            ProcessState::Empty => write!(f, "done"),
        }
    }
}

/// A process launched without waiting for it. The shell retains only its
/// PID and last known state.
#[derive(Debug, Clone, Copy)]
pub struct BackgroundJob {
    pid:   Pid,
    state: ProcessState,
}

impl BackgroundJob {
    pub fn pid(&self) -> Pid { self.pid }

    pub fn state(&self) -> ProcessState { self.state }
}

/// The job-control context: foreground and background child bookkeeping,
/// plus the process-wide signal dispositions it relies on. Exactly one
/// exists per shell, created at process start and never reinitialized.
#[derive(Debug)]
pub struct JobControl {
    foreground: SmallVec<[Pid; 8]>,
    background: Vec<BackgroundJob>,
}

impl JobControl {
    /// Creates the context and installs the shell's signal dispositions.
    pub(crate) fn new() -> nix::Result<Self> {
        signals::install()?;
        Ok(JobControl { foreground: SmallVec::new(), background: Vec::new() })
    }

    /// Background jobs not yet reported, with their job ids.
    pub fn background(&self) -> impl Iterator<Item = (usize, &BackgroundJob)> {
        self.background
            .iter()
            .enumerate()
            .filter(|(_, job)| job.state != ProcessState::Empty)
    }

    /// Marks `pid` as awaited by the current foreground pipeline. Only
    /// called while SIGCHLD delivery is suspended, so registration cannot
    /// race the reaper.
    pub(crate) fn register_foreground(&mut self, pid: Pid) { self.foreground.push(pid); }

    /// Adds `pid` to the background registry as running, reusing a
    /// reported slot if one is free. Returns the job id.
    pub(crate) fn register_background(&mut self, pid: Pid) -> usize {
        let job = BackgroundJob { pid, state: ProcessState::Running };
        match self.background.iter().position(|j| j.state == ProcessState::Empty) {
            Some(njob) => {
                self.background[njob] = job;
                njob
            }
            None => {
                self.background.push(job);
                self.background.len() - 1
            }
        }
    }

    /// Folds one wait result into the bookkeeping: a foreground PID
    /// leaves the awaited set, anything else updates the registry.
    fn record(&mut self, status: WaitStatus) {
        let (pid, state) = match status {
            WaitStatus::Exited(pid, code) => (pid, ProcessState::Exited(code)),
            WaitStatus::Signaled(pid, signal, _) => (pid, ProcessState::Signaled(signal)),
            _ => return,
        };
        if let Some(index) = self.foreground.iter().position(|&awaited| awaited == pid) {
            self.foreground.swap_remove(index);
        } else if let Some(job) = self
            .background
            .iter_mut()
            .find(|job| job.state != ProcessState::Empty && job.pid == pid)
        {
            // Reported slots keep their old PID, which the OS may have
            // reused for a live job by now.
            job.state = state;
        }
    }

    /// Blocks until every registered foreground PID has terminated.
    /// Terminations of background children observed along the way are
    /// folded into the registry rather than lost.
    pub(crate) fn wait_foreground(&mut self) -> Result<(), PipelineError> {
        while !self.foreground.is_empty() {
            match waitpid(ANY_CHILD, None) {
                Ok(status) => self.record(status),
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => {
                    // No children left at all, awaited or otherwise.
                    self.foreground.clear();
                }
                Err(errno) => return Err(PipelineError::WaitPid(errno)),
            }
        }
        Ok(())
    }

    /// Non-blocking, exhaustive reap of every child that terminated since
    /// the last call. Runs on the normal control path whenever the
    /// SIGCHLD notifier has fired; cheap when it has not.
    pub(crate) fn reap(&mut self) {
        if !signals::take_pending() {
            return;
        }
        loop {
            match waitpid(ANY_CHILD, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
                Ok(status) => self.record(status),
                Err(_) => break,
            }
        }
    }

    /// Drains every finished background job, invoking `report` once per
    /// job before its slot is forgotten.
    pub(crate) fn drain_finished<F: FnMut(usize, &BackgroundJob)>(&mut self, mut report: F) {
        for (njob, job) in self.background.iter_mut().enumerate() {
            if job.state.is_finished() {
                report(njob, job);
                job.state = ProcessState::Empty;
            }
        }
    }
}
