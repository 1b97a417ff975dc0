//! A tiny interactive command interpreter built on the POSIX process model.
//!
//! This crate parses one line of input into at most two external commands
//! connected by an optional pipe, applies input/output file redirection, and
//! launches the resulting processes, either in the foreground (waiting for
//! them) or detached in the background (reaped asynchronously). It is intentionally
//! small and easy to read, suitable for experiments with process management
//! and descriptor wiring.
//!
//! The main entry point is [`Interpreter`], which owns the prompt loop. The
//! public modules [`lexer`] and [`parser`] expose the tokenization and
//! line-decomposition stages so they can be exercised independently.

mod builtin;
pub mod env;
mod external;
mod interpreter;
pub mod lexer;
pub mod parser;
pub mod signals;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
