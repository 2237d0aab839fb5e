//! Line acquisition for the REPL. End of input is distinguishable from
//! a malformed read (bytes that do not form valid UTF-8, or an I/O
//! failure mid-line), which costs the turn but not the session.

use std::io;

pub enum LineRead {
    /// A complete line, trailing newline included when one was read.
    Line(String),
    /// End of input; the session is over.
    Eof,
    /// The line could not be read; the turn is abandoned.
    Malformed,
}

pub fn readln() -> LineRead {
    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) => LineRead::Eof,
        Ok(_) => LineRead::Line(line),
        Err(_) => LineRead::Malformed,
    }
}
