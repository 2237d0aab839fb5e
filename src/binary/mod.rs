//! The interactive surface of minnow: the REPL turn loop, the prompt,
//! and the background-job summary printed before it.

mod readln;

use self::readln::{readln, LineRead};
use minnow::{Shell, Status};
use std::{
    io::{self, Write},
    process,
};

const PROMPT: &str = "$ ";
const SYNTAX_ERROR: &str = "minnow: syntax error";

pub struct InteractiveShell {
    shell:  Shell,
    is_tty: bool,
}

impl InteractiveShell {
    pub fn new(shell: Shell) -> Self {
        InteractiveShell { shell, is_tty: atty::is(atty::Stream::Stdin) }
    }

    /// Runs REPL turns until end of input, which terminates the process
    /// with success status.
    pub fn execute_interactive(mut self) -> ! {
        loop {
            self.shell.reap();
            if self.is_tty {
                self.shell.report_finished_jobs();
                print!("{}", PROMPT);
                let _ = io::stdout().flush();
            }

            match readln() {
                LineRead::Line(line) => self.dispatch(&line),
                LineRead::Malformed => eprintln!("{}", SYNTAX_ERROR),
                LineRead::Eof => process::exit(0),
            }
        }
    }

    fn dispatch(&mut self, line: &str) {
        match self.shell.on_command(line) {
            Ok(()) => (),
            Err(ref why) if why.is_syntax() => eprintln!("{}", SYNTAX_ERROR),
            Err(why) => {
                // A resource failure leaves descriptor or process-table
                // state that cannot be trusted; end the session.
                eprintln!("minnow: {}", why);
                process::exit(Status::FAILURE.as_os_code());
            }
        }
    }
}
