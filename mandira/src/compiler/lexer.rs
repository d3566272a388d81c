use std::borrow::Cow;

use crate::compiler::tokens::Token;
use crate::error::{Error, ErrorKind};

/// Tokenizes the expression of a variable or conditional tag.
struct Tokenizer<'s> {
    source: &'s str,
    tokens: Vec<Token<'s>>,
    word_start: usize,
}

fn syntax_error(msg: String) -> Error {
    Error::new(ErrorKind::SyntaxError, msg)
}

fn looks_numeric(word: &str) -> bool {
    let mut bytes = word.bytes();
    match bytes.next() {
        Some(b'0'..=b'9') => true,
        Some(b'+' | b'-' | b'.') => matches!(bytes.next(), Some(b'0'..=b'9' | b'.')),
        _ => false,
    }
}

fn classify_word(word: &str) -> Token<'_> {
    match word {
        "and" => return Token::And,
        "or" => return Token::Or,
        "not" => return Token::Not,
        _ => {}
    }
    if looks_numeric(word) {
        if let Ok(int) = word.parse::<i64>() {
            return Token::Int(int);
        }
        if let Ok(float) = word.parse::<f64>() {
            return Token::Float(float);
        }
    }
    Token::Word(word)
}

fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('\\') {
        return Cow::Borrowed(s);
    }
    let mut rv = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped @ ('"' | '\\')) => rv.push(escaped),
                Some(other) => {
                    rv.push('\\');
                    rv.push(other);
                }
                None => rv.push('\\'),
            }
        } else {
            rv.push(c);
        }
    }
    Cow::Owned(rv)
}

impl<'s> Tokenizer<'s> {
    fn new(source: &'s str) -> Tokenizer<'s> {
        Tokenizer {
            source,
            tokens: Vec::new(),
            word_start: 0,
        }
    }

    /// Emits the word accumulated up to (but excluding) `end`.
    fn flush_word(&mut self, end: usize) {
        if self.word_start < end {
            let word = &self.source[self.word_start..end];
            self.tokens.push(classify_word(word));
        }
    }

    fn push(&mut self, pos: usize, len: usize, token: Token<'s>) {
        self.flush_word(pos);
        self.tokens.push(token);
        self.word_start = pos + len;
    }

    /// Consumes a string literal opening at `pos` and returns the position
    /// after the closing quote.
    fn eat_string(&mut self, pos: usize) -> usize {
        self.flush_word(pos);
        let bytes = self.source.as_bytes();
        let mut idx = pos + 1;
        let mut escaped = false;
        while idx < bytes.len() {
            match bytes[idx] {
                b'\\' if !escaped => escaped = true,
                b'"' if !escaped => {
                    let body = &self.source[pos + 1..idx];
                    self.tokens.push(Token::Str(unescape(body)));
                    return idx + 1;
                }
                _ => escaped = false,
            }
            idx += 1;
        }
        // an unterminated literal swallows the rest of the expression
        trace!(expr = self.source, "unterminated string literal");
        self.tokens
            .push(Token::Str(unescape(&self.source[pos + 1..])));
        bytes.len()
    }

    fn tokenize(mut self) -> Result<Vec<Token<'s>>, Error> {
        let bytes = self.source.as_bytes();
        let mut pos = 0;
        while pos < bytes.len() {
            let next_is_eq = bytes.get(pos + 1) == Some(&b'=');
            match bytes[pos] {
                b' ' | b'\t' => {
                    self.flush_word(pos);
                    self.word_start = pos + 1;
                }
                b'<' if next_is_eq => self.push(pos, 2, Token::Lte),
                b'<' => self.push(pos, 1, Token::Lt),
                b'>' if next_is_eq => self.push(pos, 2, Token::Gte),
                b'>' => self.push(pos, 1, Token::Gt),
                b'=' if next_is_eq => self.push(pos, 2, Token::Eq),
                b'!' if next_is_eq => self.push(pos, 2, Token::Ne),
                c @ (b'=' | b'!') => {
                    return Err(syntax_error(format!(
                        "invalid token: {} (at offset {})",
                        c as char, pos
                    )));
                }
                b'|' => self.push(pos, 1, Token::Pipe),
                b'(' => self.push(pos, 1, Token::ParenOpen),
                b')' => self.push(pos, 1, Token::ParenClose),
                b',' => self.push(pos, 1, Token::Comma),
                b'"' => {
                    let end = self.eat_string(pos);
                    self.word_start = end;
                    pos = end;
                    continue;
                }
                _ => {
                    pos += 1;
                    continue;
                }
            }
            pos = self.word_start.max(pos + 1);
        }
        self.flush_word(bytes.len());
        Ok(self.tokens)
    }
}

/// Splits an expression into tokens.
///
/// Spaces and tabs separate tokens.  `<` and `>` may be followed by `=`,
/// while `!` and `=` must be.  String literals are delimited by double
/// quotes and may contain `\"`.  Everything else accumulates into words,
/// which are classified as keywords, numbers or names.
pub fn tokenize(expr: &str) -> Result<Vec<Token<'_>>, Error> {
    Tokenizer::new(expr).tokenize()
}
