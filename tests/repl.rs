//! End-to-end tests that drive the minnow binary with a non-terminal
//! stdin, the way a script would.

use mktemp::Temp;
use nix::{
    sys::signal::{kill, Signal},
    unistd::Pid,
};
use serial_test::serial;
use std::{
    fs,
    io::Write,
    process::{Command, Output, Stdio},
    thread,
    time::{Duration, Instant},
};

fn run_shell(input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_minnow"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn minnow");
    child
        .stdin
        .as_mut()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("failed to write input");
    child.wait_with_output().expect("failed to collect output")
}

// For scripts that leave a background child behind: the child would
// otherwise inherit the piped stderr and keep it open past the shell's
// exit, stalling output collection until the child dies.
fn run_shell_quiet(input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_minnow"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn minnow");
    child
        .stdin
        .as_mut()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("failed to write input");
    child.wait_with_output().expect("failed to collect output")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn eof_exits_with_success() {
    let output = run_shell("");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "");
}

#[test]
fn separator_only_lines_are_a_no_op() {
    let output = run_shell(";;\n; ;\n;\n");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "");
    assert_eq!(stderr_of(&output), "");
}

#[test]
fn empty_pipe_stage_rejects_the_whole_line() {
    let output = run_shell("echo a | | echo b\n");
    assert!(output.status.success());
    // Neither echo ran.
    assert_eq!(stdout_of(&output), "");
    assert!(stderr_of(&output).contains("syntax error"));
}

#[test]
fn syntax_error_does_not_end_the_session() {
    let output = run_shell("echo a | |\necho ok\n");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "ok\n");
    assert!(stderr_of(&output).contains("syntax error"));
}

#[test]
fn pipeline_chains_stage_streams() {
    let output = run_shell("echo hello | tr a-z A-Z\n");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "HELLO\n");
}

#[test]
fn three_stage_pipeline_propagates_eof() {
    // Hangs forever if the shell leaks a pipe write end to itself.
    let output = run_shell("echo one | cat | cat\n");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "one\n");
}

#[test]
fn pipelines_on_one_line_run_in_order() {
    let output = run_shell("echo first; echo second; echo third\n");
    assert_eq!(stdout_of(&output), "first\nsecond\nthird\n");
}

#[test]
fn failed_pipeline_does_not_stop_the_line() {
    let output = run_shell("no-such-command-anywhere; echo still here\n");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "still here\n");
    assert!(stderr_of(&output).contains("no such file or directory"));
}

#[test]
fn builtin_cd_mutates_shell_state() {
    let output = run_shell("cd /\npwd\n");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "/\n");
}

#[test]
fn builtin_failure_is_reported_and_recoverable() {
    let output = run_shell("cd /definitely/not/a/directory\necho alive\n");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "alive\n");
    assert!(stderr_of(&output).contains("builtin cd error"));
}

#[test]
fn builtin_exit_sets_the_process_status() {
    let output = run_shell("exit 3\necho unreachable\n");
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(stdout_of(&output), "");
}

#[test]
fn output_redirection_wins_over_the_terminal() {
    let target = Temp::new_file().expect("temp file");
    let path = target.to_path_buf();
    let output = run_shell(&format!("echo redirected > {}\n", path.display()));
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "");
    assert_eq!(fs::read_to_string(&path).expect("read target"), "redirected\n");
}

#[test]
fn output_redirection_wins_over_the_pipe() {
    let target = Temp::new_file().expect("temp file");
    let path = target.to_path_buf();
    let output = run_shell(&format!("echo piped | cat > {}\n", path.display()));
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "");
    assert_eq!(fs::read_to_string(&path).expect("read target"), "piped\n");
}

#[test]
fn append_redirection_keeps_earlier_contents() {
    let target = Temp::new_file().expect("temp file");
    let path = target.to_path_buf();
    let script = format!("echo one > {0}\necho two >> {0}\n", path.display());
    let output = run_shell(&script);
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&path).expect("read target"), "one\ntwo\n");
}

#[test]
fn redirection_round_trip_reproduces_bytes() {
    let target = Temp::new_file().expect("temp file");
    let path = target.to_path_buf();
    let script = format!("echo payload > {0}\ncat < {0}\n", path.display());
    let output = run_shell(&script);
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "payload\n");
}

#[test]
fn later_redirection_of_a_descriptor_overrides_earlier() {
    let first = Temp::new_file().expect("temp file");
    let second = Temp::new_file().expect("temp file");
    let script =
        format!("echo winner > {} > {}\n", first.to_path_buf().display(), second.to_path_buf().display());
    let output = run_shell(&script);
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(second.to_path_buf()).expect("read target"), "winner\n");
    assert_eq!(fs::read_to_string(first.to_path_buf()).expect("read target"), "");
}

#[test]
fn missing_input_redirection_kills_only_the_stage() {
    let output = run_shell("cat < /definitely/not/a/file\necho alive\n");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "alive\n");
    assert!(stderr_of(&output).contains("no such file or directory"));
}

#[test]
#[serial]
fn foreground_pipeline_blocks_until_it_finishes() {
    let started = Instant::now();
    let output = run_shell("sleep 1\necho woke\n");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "woke\n");
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[test]
#[serial]
fn interrupt_during_a_foreground_pipeline_leaves_the_shell_running() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_minnow"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn minnow");
    child
        .stdin
        .as_mut()
        .expect("stdin is piped")
        .write_all(b"sleep 2\necho survived\n")
        .expect("failed to write input");

    // Interrupt the shell while it is blocked on the foreground sleep.
    thread::sleep(Duration::from_millis(500));
    kill(Pid::from_raw(child.id() as i32), Signal::SIGINT).expect("failed to signal shell");

    let output = child.wait_with_output().expect("failed to collect output");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "survived\n");
}

#[test]
#[serial]
fn background_pipeline_does_not_block() {
    let started = Instant::now();
    // The job's own stdout goes elsewhere so it cannot hold the test's
    // capture pipe open after the shell exits.
    let output = run_shell_quiet("sleep 5 > /dev/null &\necho prompt is back\n");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "prompt is back\n");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
#[serial]
fn jobs_builtin_lists_a_running_background_job() {
    let output = run_shell_quiet("sleep 2 > /dev/null &\njobs\n");
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("running"));
}
