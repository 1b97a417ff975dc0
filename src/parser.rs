//! Decomposition of a token sequence into an executable line: syntax
//! validation of the operators, splitting at the single permitted pipe, and
//! per-segment redirection extraction.

use crate::lexer::Token;
use std::path::PathBuf;
use thiserror::Error;

/// One side of an optional pipe: a single external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSegment {
    /// Argument vector; the first element is the program name. Never empty.
    pub argv: Vec<String>,
    /// Input redirection target (`< file`), opened read-only in the child.
    pub stdin_file: Option<PathBuf>,
    /// Output redirection target (`> file`), created and truncated in the
    /// child.
    pub stdout_file: Option<PathBuf>,
}

/// The result of decomposing one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// The only command, or the one feeding the pipe.
    pub first: CommandSegment,
    /// Present iff the line contained a pipe; reads the first command's
    /// output.
    pub second: Option<CommandSegment>,
    /// True when a trailing `&` marked the line for detached execution.
    pub background: bool,
}

impl ParsedLine {
    /// True when the line contains a pipe.
    pub fn is_pipeline(&self) -> bool {
        self.second.is_some()
    }
}

/// Errors that can occur while decomposing a validated token sequence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// `<` or `>` was the last token of the line.
    #[error("'{0}' operator missing filename")]
    MissingFilename(char),
    /// `<` or `>` was immediately followed by another operator token.
    #[error("'{0}' operator followed by another operator")]
    OperatorFollowedByOperator(char),
    /// More than one `<` on the line.
    #[error("multiple input redirections not supported")]
    DuplicateInputRedirection,
    /// More than one `>` on the line.
    #[error("multiple output redirections not supported")]
    DuplicateOutputRedirection,
    /// More than one `|` on the line.
    #[error("multiple pipes not supported")]
    MultiplePipesUnsupported,
    /// A `|` with no command on one of its sides.
    #[error("pipe syntax requires a command on both sides")]
    EmptyPipeSegment,
    /// A segment whose argument vector is empty once redirections are
    /// extracted, e.g. a line consisting only of `> file`.
    #[error("redirection without a command")]
    EmptyCommand,
    /// An `&` that is not the final token of the line.
    #[error("'&' is only allowed at the end of a line")]
    MisplacedBackgroundMarker,
    /// A `> file` on the side of a pipe whose output the pipe consumes.
    #[error("cannot redirect the output of a command that feeds a pipe")]
    OutputRedirectIntoPipe,
    /// A `< file` on the side of a pipe whose input the pipe supplies.
    #[error("cannot redirect the input of a command that reads from a pipe")]
    InputRedirectFromPipe,
}

/// Decomposes a token sequence into a [`ParsedLine`].
///
/// Stages, in order: strip a trailing `&` (the background marker), validate
/// operator placement over the whole line, split at the single permitted
/// pipe, then extract the redirection pairs of each segment. Returns
/// `Ok(None)` when nothing remains to run (an empty token list, or a lone
/// `&`).
///
/// Validation runs before pipe splitting, so redirection errors on either
/// side of a pipe are diagnosed uniformly.
pub fn parse(mut tokens: Vec<Token>) -> Result<Option<ParsedLine>, ParseError> {
    let background = strip_background_marker(&mut tokens);
    if tokens.is_empty() {
        return Ok(None);
    }

    validate(&tokens)?;

    let (left, right) = split_pipe(tokens)?;
    let first = extract_redirections(left)?;
    let second = right.map(extract_redirections).transpose()?;

    // A pipe owns the descriptor it replaces; a competing file target on the
    // same descriptor is rejected rather than silently overridden.
    if let Some(second) = &second {
        if first.stdout_file.is_some() {
            return Err(ParseError::OutputRedirectIntoPipe);
        }
        if second.stdin_file.is_some() {
            return Err(ParseError::InputRedirectFromPipe);
        }
    }

    Ok(Some(ParsedLine {
        first,
        second,
        background,
    }))
}

/// Removes a trailing `&`, returning whether the line runs in the
/// background. Runs before any validation; a non-trailing `&` is caught
/// later by [`validate`].
fn strip_background_marker(tokens: &mut Vec<Token>) -> bool {
    if tokens.last() == Some(&Token::Ampersand) {
        tokens.pop();
        true
    } else {
        false
    }
}

/// Checks operator placement over the whole token sequence.
fn validate(tokens: &[Token]) -> Result<(), ParseError> {
    let mut seen_input = false;
    let mut seen_output = false;

    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::RedirectLeft | Token::RedirectRight => {
                let op = token.operator_char();
                match tokens.get(i + 1) {
                    None => return Err(ParseError::MissingFilename(op)),
                    Some(next) if next.is_operator() => {
                        return Err(ParseError::OperatorFollowedByOperator(op));
                    }
                    Some(_) => {}
                }
                if *token == Token::RedirectLeft {
                    if seen_input {
                        return Err(ParseError::DuplicateInputRedirection);
                    }
                    seen_input = true;
                } else {
                    if seen_output {
                        return Err(ParseError::DuplicateOutputRedirection);
                    }
                    seen_output = true;
                }
            }
            Token::Ampersand => return Err(ParseError::MisplacedBackgroundMarker),
            Token::PipeOp | Token::Word(_) => {}
        }
    }

    Ok(())
}

/// Partitions the tokens at the single permitted pipe operator.
fn split_pipe(mut tokens: Vec<Token>) -> Result<(Vec<Token>, Option<Vec<Token>>), ParseError> {
    let mut pipes = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| **t == Token::PipeOp)
        .map(|(i, _)| i);
    let first_pipe = pipes.next();
    if pipes.next().is_some() {
        return Err(ParseError::MultiplePipesUnsupported);
    }
    let Some(at) = first_pipe else {
        return Ok((tokens, None));
    };

    let mut right = tokens.split_off(at);
    right.remove(0); // the pipe itself

    if tokens.is_empty() || right.is_empty() {
        return Err(ParseError::EmptyPipeSegment);
    }
    Ok((tokens, Some(right)))
}

/// Consumes each `<`/`>` operator together with its following filename
/// token, leaving the bare argument vector.
fn extract_redirections(tokens: Vec<Token>) -> Result<CommandSegment, ParseError> {
    let mut argv = Vec::new();
    let mut stdin_file = None;
    let mut stdout_file = None;

    let mut iter = tokens.into_iter();
    while let Some(token) = iter.next() {
        match token {
            Token::Word(word) => argv.push(word),
            Token::RedirectLeft => {
                // validate() guarantees a word follows every redirection.
                let Some(Token::Word(target)) = iter.next() else {
                    unreachable!()
                };
                stdin_file = Some(PathBuf::from(target));
            }
            Token::RedirectRight => {
                let Some(Token::Word(target)) = iter.next() else {
                    unreachable!()
                };
                stdout_file = Some(PathBuf::from(target));
            }
            // Removed by split_pipe() and strip_background_marker().
            Token::PipeOp | Token::Ampersand => unreachable!(),
        }
    }

    if argv.is_empty() {
        return Err(ParseError::EmptyCommand);
    }
    Ok(CommandSegment {
        argv,
        stdin_file,
        stdout_file,
    })
}
