//! Builtin commands and the closed registry used to dispatch them.
//!
//! A builtin runs inside the shell's own process, which is what lets
//! `cd` change the working directory the next command inherits. The set
//! of builtins is fixed at compile time.

use crate::shell::Shell;
use nix::{
    sys::signal::{kill, Signal},
    unistd::Pid,
};
use std::{
    convert::TryFrom,
    env,
    io::{self, Write},
    process,
};

/// The exit status of a command.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Status(i32);

impl Status {
    /// Ordinary success.
    pub const SUCCESS: Self = Status(0);
    /// Ordinary failure.
    pub const FAILURE: Self = Status(1);
    /// The program could not be started at all, distinguishable from
    /// both success and ordinary failure.
    pub const COULD_NOT_EXEC: Self = Status(127);

    pub const fn from_exit_code(code: i32) -> Self { Status(code) }

    pub const fn is_success(self) -> bool { self.0 == 0 }

    pub const fn as_os_code(self) -> i32 { self.0 }
}

/// The signature every builtin shares: the command's argument list
/// (argument 0 is the builtin's own name) and the shell whose state it
/// may mutate.
pub type BuiltinFunction = fn(&[String], &mut Shell) -> Status;

const BUILTINS: &[(&str, BuiltinFunction)] = &[
    ("cd", builtin_cd),
    ("exit", builtin_exit),
    ("jobs", builtin_jobs),
    ("kill", builtin_kill),
];

/// The closed mapping from command names to builtins.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinMap;

impl BuiltinMap {
    pub fn new() -> Self { BuiltinMap }

    /// Looks up a builtin; `None` means the name is not a builtin and
    /// should be executed as a program.
    pub fn get(&self, name: &str) -> Option<BuiltinFunction> {
        BUILTINS.iter().find(|&&(builtin, _)| builtin == name).map(|&(_, function)| function)
    }
}

/// Change the working directory; `$HOME` when no argument is given.
fn builtin_cd(args: &[String], _shell: &mut Shell) -> Status {
    let target = match args.get(1) {
        Some(dir) => dir.into(),
        None => match env::var_os("HOME") {
            Some(home) => std::path::PathBuf::from(home),
            None => return Status::FAILURE,
        },
    };
    if env::set_current_dir(&target).is_ok() {
        Status::SUCCESS
    } else {
        Status::FAILURE
    }
}

/// Terminate the shell with the given status, default success.
fn builtin_exit(args: &[String], _shell: &mut Shell) -> Status {
    let code = match args.get(1) {
        Some(arg) => match arg.parse::<i32>() {
            Ok(code) => code,
            Err(_) => return Status::FAILURE,
        },
        None => 0,
    };
    let _ = io::stdout().flush();
    process::exit(code)
}

/// List the background jobs that have not been reported yet.
fn builtin_jobs(_args: &[String], shell: &mut Shell) -> Status {
    for (njob, job) in shell.jobs().background() {
        println!("[{}] {}\t{}", njob, job.pid(), job.state());
    }
    Status::SUCCESS
}

/// Send a signal (`TERM` unless `-SIGNUM` says otherwise) to a process.
fn builtin_kill(args: &[String], _shell: &mut Shell) -> Status {
    let mut args = args.iter().skip(1);
    let mut signal = Signal::SIGTERM;
    let mut target = args.next();

    if let Some(arg) = target {
        if let Some(number) = arg.strip_prefix('-') {
            signal = match number.parse::<i32>().ok().and_then(|n| Signal::try_from(n).ok()) {
                Some(signal) => signal,
                None => return Status::FAILURE,
            };
            target = args.next();
        }
    }

    match target.and_then(|pid| pid.parse::<i32>().ok()) {
        Some(pid) if kill(Pid::from_raw(pid), signal).is_ok() => Status::SUCCESS,
        _ => Status::FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve() {
        let builtins = BuiltinMap::new();
        assert!(builtins.get("cd").is_some());
        assert!(builtins.get("exit").is_some());
        assert!(builtins.get("jobs").is_some());
        assert!(builtins.get("kill").is_some());
    }

    #[test]
    fn unknown_names_do_not() {
        let builtins = BuiltinMap::new();
        assert!(builtins.get("ls").is_none());
        assert!(builtins.get("").is_none());
    }

    #[test]
    fn status_codes_are_distinguishable() {
        assert!(Status::SUCCESS.is_success());
        assert!(!Status::FAILURE.is_success());
        assert_ne!(Status::FAILURE.as_os_code(), Status::COULD_NOT_EXEC.as_os_code());
        assert_eq!(Status::from_exit_code(42).as_os_code(), 42);
    }
}
