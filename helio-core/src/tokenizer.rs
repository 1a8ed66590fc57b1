//! Turns source text into a flat token vector.
//!
//! The scanner is deliberately permissive: an unterminated string literal
//! or block comment simply runs to end-of-input. Words run up to the next
//! ASCII whitespace or `\`; there are no escapes outside string literals.

use std::fmt;

use crate::quote::QuoteId;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A bare word: a name, a number, or one of `: ; [ ]`.
    Word(String),
    /// A string literal with escapes already decoded.
    Str(String),
    /// A reference to an interned quotation, emitted by the compiler when
    /// it captures a nested `[ ... ]` inside a colon definition. Never
    /// produced by the scanner.
    QuoteRef(QuoteId),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "{}", w),
            Token::Str(s) => {
                write!(f, "\"")?;
                for ch in s.chars() {
                    match ch {
                        '\n' => write!(f, "\\n")?,
                        '\r' => write!(f, "\\r")?,
                        '\t' => write!(f, "\\t")?,
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        _ => write!(f, "{}", ch)?,
                    }
                }
                write!(f, "\"")
            }
            Token::QuoteRef(id) => write!(f, "<quote#{}>", id),
        }
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_ascii_whitespace() {
            chars.next();
            continue;
        }

        match ch {
            // Line comment: through (but not including) the newline; the
            // newline is eaten as whitespace on the next iteration.
            '\\' => {
                chars.next();
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }

            // Block comment: through and including the closing paren.
            '(' => {
                chars.next();
                for c in chars.by_ref() {
                    if c == ')' {
                        break;
                    }
                }
            }

            '"' => {
                chars.next();
                let mut text = String::new();
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => match chars.next() {
                            Some('n') => text.push('\n'),
                            Some('r') => text.push('\r'),
                            Some('t') => text.push('\t'),
                            Some('"') => text.push('"'),
                            Some('\\') => text.push('\\'),
                            Some(other) => text.push(other),
                            None => {
                                text.push('\\');
                                break;
                            }
                        },
                        _ => text.push(c),
                    }
                }
                tokens.push(Token::Str(text));
            }

            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_whitespace() || c == '\\' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }

    tokens
}

/// Recognize and decode a signed 64-bit integer with auto-base: `0x`/`0X`
/// is hex, a leading `0` is octal, anything else decimal. The whole token
/// must be consumed, so `09` or `12a` are names, not numbers.
pub fn parse_int(token: &str) -> Option<i64> {
    let (negative, rest) = if let Some(stripped) = token.strip_prefix('-') {
        (true, stripped)
    } else if let Some(stripped) = token.strip_prefix('+') {
        (false, stripped)
    } else {
        (false, token)
    };
    if rest.is_empty() {
        return None;
    }

    let (radix, digits) = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        (16, hex)
    } else if rest.len() > 1 && rest.starts_with('0') {
        (8, &rest[1..])
    } else {
        (10, rest)
    };
    if digits.is_empty() {
        return None;
    }

    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
