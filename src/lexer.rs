//! A module implementing lexical analysis (tokenization) for the
//! interpreter's line grammar.

use thiserror::Error;

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word: a program name, an argument, or a redirection target.
    /// Quote markers are already stripped.
    Word(String),
    /// Input redirection symbol, `<`.
    RedirectLeft,
    /// Output redirection symbol, `>`.
    RedirectRight,
    /// The pipe operator, `|`.
    PipeOp,
    /// The background marker, `&`.
    Ampersand,
}

impl Token {
    /// True for the operator tokens `<`, `>`, `|` and `&`.
    pub fn is_operator(&self) -> bool {
        !matches!(self, Token::Word(_))
    }

    /// The character this operator token was read from.
    pub(crate) fn operator_char(&self) -> char {
        match self {
            Token::RedirectLeft => '<',
            Token::RedirectRight => '>',
            Token::PipeOp => '|',
            Token::Ampersand => '&',
            Token::Word(_) => unreachable!(),
        }
    }
}

/// Errors that can occur during the lexical analysis process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexingError {
    /// A closing double quote was not found before the end of the line.
    #[error("unterminated quote")]
    UnterminatedQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingQuoted,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
        }
    }

    /// Performs lexical analysis on the input line and returns its tokens.
    ///
    /// Outside quotes, whitespace separates words and each occurrence of
    /// `<`, `>`, `|` or `&` is emitted as its own single-character operator
    /// token, even when adjacent to word characters. A double quote toggles
    /// a literal span without being included in any token; inside the span
    /// whitespace and operator characters accumulate into the current word.
    fn make_tokens(mut self) -> Result<Vec<Token>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch, &mut out),
                LexingState::ReadingWord => self.handle_word(ch, &mut out),
                LexingState::ReadingQuoted => self.handle_quoted(ch),
            }
        }

        if self.state == LexingState::ReadingQuoted {
            return Err(LexingError::UnterminatedQuote);
        }

        if !self.buffer.is_empty() {
            out.push(Token::Word(std::mem::take(&mut self.buffer)));
        }

        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn handle_start(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            c if c.is_whitespace() => {}
            '<' | '>' | '|' | '&' => out.push(Self::operator_token(ch)),
            '"' => self.state = LexingState::ReadingQuoted,
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            c if c.is_whitespace() => {
                self.flush_word(out);
                self.state = LexingState::Start;
            }
            '<' | '>' | '|' | '&' => {
                self.flush_word(out);
                out.push(Self::operator_token(ch));
                self.state = LexingState::Start;
            }
            '"' => self.state = LexingState::ReadingQuoted,
            c => self.buffer.push(c),
        }
    }

    fn handle_quoted(&mut self, ch: char) {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            c => self.buffer.push(c),
        }
    }

    fn flush_word(&mut self, out: &mut Vec<Token>) {
        if !self.buffer.is_empty() {
            out.push(Token::Word(std::mem::take(&mut self.buffer)));
        }
    }

    fn operator_token(ch: char) -> Token {
        match ch {
            '<' => Token::RedirectLeft,
            '>' => Token::RedirectRight,
            '|' => Token::PipeOp,
            '&' => Token::Ampersand,
            _ => unreachable!(),
        }
    }
}

/// The main entry point function to perform lexical analysis.
///
/// Returns the ordered token sequence for `line`, or
/// [`LexingError::UnterminatedQuote`] when the line ends inside a quoted
/// span, in which case no tokens are produced and the line must be
/// discarded.
///
/// A quoted span that contributes no characters and is not attached to a
/// word (`""` on its own) yields no token.
pub fn split_into_tokens(line: &str) -> Result<Vec<Token>, LexingError> {
    LexingFSM::new(line).make_tokens()
}
