//! The interpreter's explicit session state.

use std::env as stdenv;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Mutable session state threaded through builtin execution.
///
/// The working directory is deliberately not mirrored here: it is inherently
/// process-global (children inherit it across fork), so `cd` mutates it
/// through [`std::env::set_current_dir`] directly. That is the one exception
/// to keeping interpreter state in this value.
#[derive(Debug, Default)]
pub struct Environment {
    /// When set, the prompt loop terminates with this exit code.
    pub should_exit: Option<ExitCode>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value of the `HOME` environment variable, when present.
    pub fn home(&self) -> Option<String> {
        stdenv::var("HOME").ok()
    }
}
