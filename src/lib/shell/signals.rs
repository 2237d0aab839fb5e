//! Process-wide signal dispositions for the shell, and the masking
//! primitives that make child bookkeeping atomic with respect to
//! asynchronous child-termination notifications.
//!
//! The shell ignores SIGINT so an operator interrupt never kills the
//! interpreter, and handles SIGCHLD with a handler that does nothing but
//! raise an atomic flag; the reaping the flag triggers always runs on
//! the normal control path.

use nix::sys::signal::{
    self, sigaction, sigprocmask, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal,
};
use std::sync::atomic::{AtomicBool, Ordering};

static SIGCHLD_PENDING: AtomicBool = AtomicBool::new(false);

// Must stay async-signal-safe: a single atomic store and nothing else.
extern "C" fn sigchld_notifier(_: i32) {
    SIGCHLD_PENDING.store(true, Ordering::SeqCst);
}

/// Installs the shell's dispositions. Called exactly once, when the
/// job-control context is created at startup; children undo this before
/// exec via [`restore_for_child`].
pub(crate) fn install() -> nix::Result<()> {
    unsafe {
        signal::signal(Signal::SIGINT, SigHandler::SigIgn)?;
        sigaction(
            Signal::SIGCHLD,
            &SigAction::new(
                SigHandler::Handler(sigchld_notifier),
                SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP,
                SigSet::empty(),
            ),
        )?;
    }
    Ok(())
}

/// Takes the notification left behind by the SIGCHLD handler, if any.
pub(crate) fn take_pending() -> bool { SIGCHLD_PENDING.swap(false, Ordering::SeqCst) }

fn sigchld_set() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGCHLD);
    set
}

/// Suspends delivery of SIGCHLD to the shell.
pub(crate) fn block() {
    let _ = sigprocmask(SigmaskHow::SIG_BLOCK, Some(&sigchld_set()), None);
}

/// Resumes delivery of SIGCHLD; anything that arrived while suspended is
/// delivered now.
pub(crate) fn unblock() {
    let _ = sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&sigchld_set()), None);
}

/// Restores what an ordinary, non-shell-aware process expects: default
/// SIGINT and SIGCHLD handling, with SIGCHLD delivery unblocked. Runs in
/// a forked child before exec.
pub(crate) fn restore_for_child() {
    unblock();
    unsafe {
        let _ = signal::signal(Signal::SIGINT, SigHandler::SigDfl);
        let _ = signal::signal(Signal::SIGCHLD, SigHandler::SigDfl);
    }
}

/// While a value of this type is alive, SIGCHLD delivery is suspended.
/// The orchestrator holds one across its entire spawn-and-register loop
/// and, for foreground pipelines, the synchronous wait, so that sequence
/// is atomic with respect to the asynchronous reaper.
pub(crate) struct SigchldGuard;

impl SigchldGuard {
    pub(crate) fn new() -> SigchldGuard {
        block();
        SigchldGuard
    }
}

impl Drop for SigchldGuard {
    fn drop(&mut self) { unblock(); }
}
