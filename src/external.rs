//! Launching commands that are not builtins: fork, descriptor wiring, exec,
//! and the foreground-wait / background-detach policy.
//!
//! Descriptor protocol: each pipe end is an [`OwnedFd`] whose drop closes
//! it, so every copy not deliberately wired into a child is released on
//! every exit path, including fork-failure paths. The interpreter's own
//! pipe-end copies are dropped immediately after both forks; a surviving
//! write end would starve the downstream child of end-of-stream.

use crate::parser::{CommandSegment, ParsedLine};
use crate::signals;
use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::wait::waitpid;
use nix::unistd::{self, ForkResult, Pid};
use std::convert::Infallible;
use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

/// Runs a parsed line: forks its process graph, then either waits for the
/// children (foreground) or prints an acknowledgement and returns to the
/// caller immediately (background), leaving them to the asynchronous
/// reaper.
pub fn launch(line: &ParsedLine) -> Result<()> {
    match &line.second {
        None => {
            let child = spawn_single(&line.first)?;
            if line.background {
                println!("[background pid {child}]");
            } else {
                wait_foreground(&[child]);
            }
        }
        Some(second) => {
            let (left, right) = spawn_pipeline(&line.first, second)?;
            if line.background {
                println!("[background pids {left} {right}]");
            } else {
                wait_foreground(&[left, right]);
            }
        }
    }
    Ok(())
}

fn spawn_single(segment: &CommandSegment) -> Result<Pid> {
    match unsafe { unistd::fork() }.context("fork failed")? {
        ForkResult::Parent { child } => Ok(child),
        ForkResult::Child => exec_child(segment, None, None),
    }
}

/// Forks both ends of a two-command pipeline.
///
/// The pipe exists before either fork, and both children are forked before
/// the parent waits on either, so neither child can block on the other's
/// absence.
fn spawn_pipeline(first: &CommandSegment, second: &CommandSegment) -> Result<(Pid, Pid)> {
    let (read_end, write_end) = unistd::pipe().context("pipe creation failed")?;

    let left = match unsafe { unistd::fork() }.context("fork failed")? {
        ForkResult::Parent { child } => child,
        ForkResult::Child => {
            drop(read_end);
            exec_child(first, None, Some(write_end))
        }
    };

    // A fork failure here abandons the line: both pipe ends close on
    // return, and the already-running left child is left to finish and be
    // reaped asynchronously.
    let right = match unsafe { unistd::fork() }.context("fork failed")? {
        ForkResult::Parent { child } => child,
        ForkResult::Child => {
            drop(write_end);
            exec_child(second, Some(read_end), None)
        }
    };

    // The interpreter's own endpoint copies must close before any wait.
    drop(read_end);
    drop(write_end);

    Ok((left, right))
}

/// Completes a forked child: resets signal dispositions, wires pipe ends
/// and redirection files onto stdin/stdout, and replaces the process
/// image. Never returns; every failure is reported on stderr and
/// terminates only this child, with a non-zero status.
fn exec_child(
    segment: &CommandSegment,
    pipe_stdin: Option<OwnedFd>,
    pipe_stdout: Option<OwnedFd>,
) -> ! {
    signals::reset_for_child();
    let err = match wire_and_exec(segment, pipe_stdin, pipe_stdout) {
        Err(e) => e,
        Ok(never) => match never {},
    };
    eprintln!("mysh: {err:#}");
    unsafe { libc::_exit(1) }
}

fn wire_and_exec(
    segment: &CommandSegment,
    pipe_stdin: Option<OwnedFd>,
    pipe_stdout: Option<OwnedFd>,
) -> Result<Infallible> {
    if let Some(fd) = pipe_stdout {
        unistd::dup2(fd.as_raw_fd(), libc::STDOUT_FILENO).context("binding pipe to stdout")?;
        drop(fd);
    }
    if let Some(fd) = pipe_stdin {
        unistd::dup2(fd.as_raw_fd(), libc::STDIN_FILENO).context("binding pipe to stdin")?;
        drop(fd);
    }

    // Redirection files: the dup2'd copies on fds 0/1 survive exec, the
    // originals close with `file` (std opens with O_CLOEXEC).
    if let Some(path) = &segment.stdin_file {
        let file = File::open(path)
            .with_context(|| format!("input redirection: {}", path.display()))?;
        unistd::dup2(file.as_raw_fd(), libc::STDIN_FILENO)
            .context("binding input file to stdin")?;
    }
    if let Some(path) = &segment.stdout_file {
        let file = open_output(path)
            .with_context(|| format!("output redirection: {}", path.display()))?;
        unistd::dup2(file.as_raw_fd(), libc::STDOUT_FILENO)
            .context("binding output file to stdout")?;
    }

    let argv = to_cstrings(&segment.argv)?;
    match unistd::execvp(&argv[0], &argv) {
        Err(Errno::ENOENT) => Err(anyhow::anyhow!("{}: command not found", segment.argv[0])),
        Err(e) => Err(anyhow::Error::new(e).context(format!("{}: exec failed", segment.argv[0]))),
        Ok(never) => match never {},
    }
}

/// `>` target semantics: write-only, created if absent, truncated if
/// present, mode 0644.
fn open_output(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o644)
        .open(path)
}

fn to_cstrings(argv: &[String]) -> Result<Vec<CString>> {
    argv.iter()
        .map(|arg| {
            CString::new(arg.as_str())
                .map_err(|_| anyhow::anyhow!("argument contains a NUL byte"))
        })
        .collect()
}

/// Blocks until every listed child has terminated, discarding statuses
/// (exit codes are not propagated to the prompt loop in this design).
///
/// The asynchronous reaper can win the race for any of these pids, so
/// ECHILD counts as completion rather than an error.
fn wait_foreground(pids: &[Pid]) {
    for &pid in pids {
        loop {
            match waitpid(pid, None) {
                Ok(_) => break,
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => break,
                Err(e) => {
                    log::warn!("waitpid({pid}) failed: {e}");
                    break;
                }
            }
        }
    }
}
