//! Token reader for CNF and CPOG files
//!
//! Both input formats are line-oriented sequences of whitespace-separated
//! tokens: 32-bit signed decimals, short words (command names, comment
//! text), and the `*` placeholder some proof generators emit for hints.
//! End-of-line is a token of its own since commands may not span lines.

use crate::error::{CheckFailure, FailureKind, Result};
use std::{fmt, iter::Peekable};

/// A peekable byte reader that records file and line information.
pub struct Input<'a> {
    /// The source of the input data
    source: Peekable<Box<dyn Iterator<Item = u8> + 'a>>,
    /// File name used in diagnostics
    file: String,
    /// The current line, starting at 1
    line: usize,
}

/// One lexical token.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Token {
    Int(i32),
    Word(String),
    Star,
    Eol,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Int(value) => write!(f, "integer ('{}')", value),
            Token::Word(text) => write!(f, "string ('{}')", text),
            Token::Star => write!(f, "star ('*')"),
            Token::Eol => write!(f, "EOL"),
            Token::Eof => write!(f, "EOF"),
        }
    }
}

/// True for whitespace that does not end the line.
fn is_space(c: u8) -> bool {
    c == b' ' || c == b'\t' || c == b'\r'
}

impl<'a> Input<'a> {
    /// Create a new `Input` from some byte source.
    pub fn new(source: Box<dyn Iterator<Item = u8> + 'a>, file: &str) -> Self {
        Input {
            source: source.peekable(),
            file: file.to_string(),
            line: 1,
        }
    }
    /// Look at the next byte without consuming it.
    pub fn peek(&mut self) -> Option<u8> {
        self.source.peek().cloned()
    }
    /// The file name, for diagnostics.
    pub fn file(&self) -> &str {
        &self.file
    }
    /// The current line number, for diagnostics.
    pub fn line(&self) -> usize {
        self.line
    }
    /// Create a failure at the current input position.
    pub fn failure(
        &self,
        kind: FailureKind,
        function: &'static str,
        message: String,
    ) -> CheckFailure {
        CheckFailure::new(kind, &self.file, self.line, function, message)
    }

    /// Read the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        while let Some(c) = self.peek() {
            if is_space(c) {
                self.next();
            } else {
                break;
            }
        }
        match self.peek() {
            None => return Ok(Token::Eof),
            Some(b'\n') => {
                self.next();
                return Ok(Token::Eol);
            }
            Some(_) => (),
        }
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if is_space(c) || c == b'\n' {
                break;
            }
            word.push(c as char);
            self.next();
        }
        if word == "*" {
            return Ok(Token::Star);
        }
        let numeric = {
            let unsigned = word.strip_prefix('-').unwrap_or(&word);
            !unsigned.is_empty() && unsigned.bytes().all(|c| c.is_ascii_digit())
        };
        if numeric {
            match word.parse::<i32>() {
                // The magnitude must be representable as well.
                Ok(value) if value != i32::min_value() => Ok(Token::Int(value)),
                _ => Err(self.failure(
                    FailureKind::Parse,
                    "next_token",
                    format!("Number '{}' does not fit into 32 bits", word),
                )),
            }
        } else {
            Ok(Token::Word(word))
        }
    }
    /// Read a token that must be an integer.
    pub fn require_int(&mut self, function: &'static str) -> Result<i32> {
        match self.next_token()? {
            Token::Int(value) => Ok(value),
            other => Err(self.failure(
                FailureKind::Parse,
                function,
                format!("Expecting integer. Got {} instead", other),
            )),
        }
    }
    /// Read a token that must end the line (or the file).
    pub fn require_eol(&mut self, function: &'static str) -> Result<()> {
        match self.next_token()? {
            Token::Eol | Token::Eof => Ok(()),
            other => Err(self.failure(
                FailureKind::Parse,
                function,
                format!("Expected end of line. Got {} instead", other),
            )),
        }
    }
    /// Discard everything up to and including the next end of line.
    pub fn skip_to_eol(&mut self) {
        while let Some(c) = self.next() {
            if c == b'\n' {
                return;
            }
        }
    }
    /// Read a raw whitespace-delimited word, for rational weight literals
    /// that are not tokens of the ordinary grammar.
    pub fn next_raw_word(&mut self, function: &'static str) -> Result<String> {
        while let Some(c) = self.peek() {
            if is_space(c) {
                self.next();
            } else {
                break;
            }
        }
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if is_space(c) || c == b'\n' {
                break;
            }
            word.push(c as char);
            self.next();
        }
        if word.is_empty() {
            Err(self.failure(
                FailureKind::Parse,
                function,
                "Expected a weight literal".to_string(),
            ))
        } else {
            Ok(word)
        }
    }
}

impl Iterator for Input<'_> {
    type Item = u8;
    fn next(&mut self) -> Option<u8> {
        self.source.next().map(|c| {
            if c == b'\n' {
                self.line += 1;
            }
            c
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(text: &'static str) -> Input<'static> {
        Input::new(Box::new(text.as_bytes().iter().cloned()), "<test>")
    }

    #[test]
    fn token_stream() {
        let mut reader = input("12 -3 * cnf\n0");
        assert_eq!(reader.next_token().unwrap(), Token::Int(12));
        assert_eq!(reader.next_token().unwrap(), Token::Int(-3));
        assert_eq!(reader.next_token().unwrap(), Token::Star);
        assert_eq!(reader.next_token().unwrap(), Token::Word("cnf".to_string()));
        assert_eq!(reader.next_token().unwrap(), Token::Eol);
        assert_eq!(reader.next_token().unwrap(), Token::Int(0));
        assert_eq!(reader.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn line_numbers() {
        let mut reader = input("a\nb\nc");
        assert_eq!(reader.line(), 1);
        reader.next_token().unwrap();
        reader.next_token().unwrap();
        assert_eq!(reader.line(), 2);
        reader.skip_to_eol();
        assert_eq!(reader.line(), 3);
    }

    #[test]
    fn oversized_numbers_are_rejected() {
        let mut reader = input("99999999999");
        assert!(reader.next_token().is_err());
    }

    #[test]
    fn raw_words_capture_rationals() {
        let mut reader = input(" 0.25 0");
        assert_eq!(reader.next_raw_word("test").unwrap(), "0.25");
        assert_eq!(reader.next_token().unwrap(), Token::Int(0));
    }
}
