//! The interactive interpreter: prompt loop, line evaluation, dispatch.

use crate::builtin;
use crate::env::{Environment, ExitCode};
use crate::external;
use crate::lexer;
use crate::parser;
use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

const PROMPT: &str = "mysh> ";

/// The interactive command runner: owns the session state and drives each
/// input line from the prompt through parsing to process orchestration.
pub struct Interpreter {
    env: Environment,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Runs the prompt loop until end-of-input or an `exit` builtin,
    /// returning the interpreter's exit code.
    ///
    /// Every per-line diagnostic (parse errors, builtin failures,
    /// orchestration failures) goes to stderr and the loop continues;
    /// nothing a line does terminates the interpreter.
    pub fn repl(&mut self) -> Result<ExitCode> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line);
                    if let Err(e) = self.eval(line) {
                        eprintln!("mysh: {e:#}");
                    }
                    if let Some(code) = self.env.should_exit {
                        return Ok(code);
                    }
                }
                // The interrupt key at the prompt discards the partial
                // line; the interpreter itself ignores SIGINT.
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    println!();
                    return Ok(0);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Evaluates one input line: tokenize, decompose, then run a builtin
    /// in-process or orchestrate external processes.
    pub fn eval(&mut self, line: &str) -> Result<()> {
        let tokens = lexer::split_into_tokens(line)?;
        log::debug!("tokens: {tokens:?}");

        let Some(parsed) = parser::parse(tokens)? else {
            return Ok(());
        };
        log::debug!("parsed: {parsed:?}");

        // Builtins take effect in the interpreter itself, so they are
        // dispatched only for single-command lines and never forked; their
        // exit codes are discarded like any other command's.
        if !parsed.is_pipeline() {
            if let Some(result) = builtin::dispatch(&parsed.first.argv, &mut self.env) {
                result?;
                return Ok(());
            }
        }

        external::launch(&parsed)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
