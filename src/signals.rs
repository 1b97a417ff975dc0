//! Signal dispositions for the interpreter and its children, and the
//! asynchronous reaping of terminated children.

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

/// Reaps every already-terminated child without blocking.
///
/// Runs on SIGCHLD delivery, so it can interrupt any instruction of the
/// main loop: it must not allocate or block, touches no interpreter state,
/// and preserves the ambient errno. Collecting statuses here is what keeps
/// terminated background children from lingering as zombies.
extern "C" fn reap_children(_signo: libc::c_int) {
    let saved_errno = Errno::last_raw();
    loop {
        let pid = unsafe { libc::waitpid(-1, std::ptr::null_mut(), libc::WNOHANG) };
        if pid <= 0 {
            break;
        }
    }
    Errno::set_raw(saved_errno);
}

/// Installs the interpreter's signal dispositions.
///
/// SIGCHLD runs the asynchronous reaper, with `SA_RESTART` so interrupted
/// system calls resume; SIGINT is ignored so the interrupt key at the
/// prompt never terminates the interpreter itself. Call once, before the
/// prompt loop starts.
pub fn install() -> Result<()> {
    let reaper = SigAction::new(
        SigHandler::Handler(reap_children),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    unsafe {
        signal::sigaction(Signal::SIGCHLD, &reaper).context("installing SIGCHLD handler")?;
        signal::signal(Signal::SIGINT, SigHandler::SigIgn).context("ignoring SIGINT")?;
    }
    Ok(())
}

/// Restores the default SIGINT disposition.
///
/// Called in a forked child between fork and exec: an ignored disposition
/// survives exec, so without this reset the interrupt key could never
/// terminate a foreground command.
pub fn reset_for_child() {
    unsafe {
        let _ = signal::signal(Signal::SIGINT, SigHandler::SigDfl);
    }
}
