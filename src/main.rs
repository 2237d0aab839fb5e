//! The minnow binary: an interactive REPL around the minnow library.

mod binary;

use self::binary::InteractiveShell;
use minnow::Shell;
use std::process;

fn main() {
    let shell = match Shell::new() {
        Ok(shell) => shell,
        Err(errno) => {
            eprintln!("minnow: failed to initialize: {}", errno);
            process::exit(1);
        }
    };

    InteractiveShell::new(shell).execute_interactive()
}
