//! End-to-end tests that drive the built interpreter binary through piped
//! standard input, the way a user script would.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

fn run_shell(script: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mysh"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn interpreter");
    child
        .stdin
        .take()
        .expect("stdin handle")
        .write_all(script.as_bytes())
        .expect("write script");
    child.wait_with_output().expect("collect output")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn output_redirection_creates_and_truncates_the_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.txt");
    fs::write(&path, "stale contents that must disappear").unwrap();

    let output = run_shell(&format!("echo hello > {}\nexit\n", path.display()));

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
}

#[test]
fn input_and_output_redirection_round_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let result = dir.path().join("out.txt");
    fs::write(&input, "abc\n").unwrap();

    let output = run_shell(&format!(
        "tr a-z A-Z < {} > {}\nexit\n",
        input.display(),
        result.display()
    ));

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert_eq!(fs::read_to_string(&result).unwrap(), "ABC\n");
}

#[test]
fn pipeline_connects_first_stdout_to_second_stdin() {
    let output = run_shell("printf a | tr a b\nexit\n");

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert!(
        stdout_of(&output).contains('b'),
        "stdout: {}",
        stdout_of(&output)
    );
}

#[test]
fn pipeline_honors_outer_redirections() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let result = dir.path().join("out.txt");
    fs::write(&input, "a").unwrap();

    let output = run_shell(&format!(
        "tr a b < {} | tr b c > {}\nexit\n",
        input.display(),
        result.display()
    ));

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert_eq!(fs::read_to_string(&result).unwrap(), "c");
}

#[test]
fn foreground_line_waits_for_its_child() {
    let start = Instant::now();
    let output = run_shell("sleep 1\nexit\n");

    assert!(output.status.success());
    assert!(
        start.elapsed() >= Duration::from_millis(900),
        "interpreter re-prompted without waiting"
    );
}

#[test]
fn background_line_returns_before_its_child_exits() {
    // stdout/stderr go to null so the detached sleep cannot keep the
    // output pipes open past the interpreter's own exit.
    let start = Instant::now();
    let mut child = Command::new(env!("CARGO_BIN_EXE_mysh"))
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn interpreter");
    child
        .stdin
        .take()
        .expect("stdin handle")
        .write_all(b"sleep 5 &\nexit\n")
        .expect("write script");
    let status = child.wait().expect("interpreter exit");

    assert!(status.success());
    assert!(
        start.elapsed() < Duration::from_secs(4),
        "interpreter blocked on a background child"
    );
}

#[test]
fn background_line_is_acknowledged_with_a_pid() {
    let output = run_shell("true &\nexit\n");

    assert!(output.status.success());
    assert!(
        stdout_of(&output).contains("background pid"),
        "stdout: {}",
        stdout_of(&output)
    );
}

#[test]
fn exit_code_is_propagated() {
    let output = run_shell("exit 3\n");
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn exit_with_a_non_numeric_code_is_diagnosed_not_fatal() {
    let output = run_shell("exit notanumber\nexit 5\n");

    // The second exit proves the first one did not terminate anything.
    assert_eq!(output.status.code(), Some(5));
    assert!(!stderr_of(&output).is_empty());
}

#[test]
fn end_of_input_exits_cleanly() {
    let output = run_shell("");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn cd_failure_is_diagnosed_and_nonfatal() {
    let output = run_shell("cd /nonexistent-mysh-test-dir\nexit 0\n");

    assert_eq!(output.status.code(), Some(0));
    assert!(
        stderr_of(&output).contains("cd"),
        "stderr: {}",
        stderr_of(&output)
    );
}

#[test]
fn cd_changes_the_directory_children_run_in() {
    let dir = tempfile::tempdir().unwrap();
    let result = dir.path().join("cwd.txt");

    let output = run_shell(&format!(
        "cd {}\npwd > {}\nexit\n",
        dir.path().display(),
        result.display()
    ));

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let printed = fs::read_to_string(&result).unwrap();
    assert_eq!(
        Path::new(printed.trim()),
        fs::canonicalize(dir.path()).unwrap()
    );
}

#[test]
fn command_not_found_kills_only_the_child() {
    let output = run_shell("definitely-not-a-command-xyz\nexit 0\n");

    assert_eq!(output.status.code(), Some(0));
    assert!(
        stderr_of(&output).contains("command not found"),
        "stderr: {}",
        stderr_of(&output)
    );
}

#[test]
fn unreadable_input_redirection_kills_only_the_child() {
    let output = run_shell("cat < /nonexistent-mysh-input\nexit 0\n");

    assert_eq!(output.status.code(), Some(0));
    assert!(
        stderr_of(&output).contains("input redirection"),
        "stderr: {}",
        stderr_of(&output)
    );
}

#[test]
fn malformed_lines_are_diagnosed_and_the_loop_continues() {
    let script = "ls >\n\
                  cat < a < b\n\
                  a | b | c\n\
                  | b\n\
                  echo \"unterminated\n\
                  exit 7\n";
    let output = run_shell(script);

    // The final exit proves every malformed line was recovered from.
    assert_eq!(output.status.code(), Some(7));

    let stderr = stderr_of(&output);
    assert!(stderr.contains("missing filename"), "stderr: {stderr}");
    assert!(stderr.contains("multiple input redirections"), "stderr: {stderr}");
    assert!(stderr.contains("multiple pipes"), "stderr: {stderr}");
    assert!(stderr.contains("command on both sides"), "stderr: {stderr}");
    assert!(stderr.contains("unterminated quote"), "stderr: {stderr}");
}

#[test]
fn redirection_attached_to_the_piped_side_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.txt");

    let output = run_shell(&format!(
        "printf a > {} | tr a b\nexit 0\n",
        path.display()
    ));

    assert_eq!(output.status.code(), Some(0));
    assert!(
        stderr_of(&output).contains("feeds a pipe"),
        "stderr: {}",
        stderr_of(&output)
    );
    // Rejected at parse time: nothing ran, nothing was created.
    assert!(!path.exists());
}
