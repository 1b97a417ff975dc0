//! Built-in commands, executed in-process.
//!
//! Builtins are parsed using the [`argh`] crate (`FromArgs`) and run inside
//! the interpreter itself: their whole point is to mutate interpreter state
//! (the working directory, the exit request), which a forked child could
//! never do.

use crate::env::{Environment, ExitCode};
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd".
    fn name() -> &'static str;

    /// Executes the command.
    ///
    /// Return value follows shell conventions: 0 for success, non-zero for
    /// error.
    fn execute(self, env: &mut Environment) -> Result<ExitCode>;
}

/// Runs `argv` as a builtin when its first element names one.
///
/// Returns `None` for non-builtin command names, so the caller can fall
/// back to external execution.
pub fn dispatch(argv: &[String], env: &mut Environment) -> Option<Result<ExitCode>> {
    match argv[0].as_str() {
        "cd" => Some(run::<Cd>(argv, env)),
        "exit" => Some(run::<Exit>(argv, env)),
        _ => None,
    }
}

fn run<T: BuiltinCommand>(argv: &[String], env: &mut Environment) -> Result<ExitCode> {
    let args: Vec<&str> = argv[1..].iter().map(String::as_str).collect();
    match T::from_args(&[T::name()], &args) {
        Ok(cmd) => cmd.execute(env),
        Err(EarlyExit { output, status }) => match status {
            // `--help` was requested; printing usage is not a failure.
            Ok(()) => {
                println!("{output}");
                Ok(0)
            }
            Err(()) => Err(anyhow::anyhow!("{}", output.trim_end())),
        },
    }
}

#[derive(FromArgs)]
/// Change the working directory.
/// With no target, changes to the directory named by the HOME environment
/// variable.
struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current
    /// directory. Defaults to $HOME when omitted.
    target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, env: &mut Environment) -> Result<ExitCode> {
        let target = match self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => PathBuf::from(env.home().context("cd: HOME is not set")?),
        };
        // Children inherit the directory across fork, so this is the one
        // place the interpreter mutates process-global state.
        std::env::set_current_dir(&target)
            .with_context(|| format!("cd: {}", target.display()))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Terminate the interpreter.
/// In-flight background children are not waited for.
struct Exit {
    #[argh(positional)]
    /// exit code to terminate with; defaults to 0.
    code: Option<ExitCode>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, env: &mut Environment) -> Result<ExitCode> {
        let code = self.code.unwrap_or(0);
        env.should_exit = Some(code);
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn non_builtin_names_are_not_dispatched() {
        let mut env = Environment::new();
        assert!(dispatch(&argv(&["ls"]), &mut env).is_none());
    }

    #[test]
    fn exit_defaults_to_code_zero() {
        let mut env = Environment::new();
        let code = dispatch(&argv(&["exit"]), &mut env).unwrap().unwrap();
        assert_eq!(code, 0);
        assert_eq!(env.should_exit, Some(0));
    }

    #[test]
    fn exit_records_the_requested_code() {
        let mut env = Environment::new();
        dispatch(&argv(&["exit", "42"]), &mut env).unwrap().unwrap();
        assert_eq!(env.should_exit, Some(42));
    }

    #[test]
    fn exit_rejects_a_non_numeric_code() {
        let mut env = Environment::new();
        let result = dispatch(&argv(&["exit", "soon"]), &mut env).unwrap();
        assert!(result.is_err());
        // The bad argument must not terminate the interpreter.
        assert_eq!(env.should_exit, None);
    }

    #[test]
    fn cd_failure_leaves_the_working_directory_unchanged() {
        let mut env = Environment::new();
        let before = std::env::current_dir().unwrap();
        let result = dispatch(&argv(&["cd", "/nonexistent-dir-for-cd-test"]), &mut env).unwrap();
        assert!(result.is_err());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }
}
