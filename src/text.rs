//! Textual form of scalars and an S-expression pretty-printer.
//!
//! Integers and floats use the standard parsers; floats additionally
//! spell non-finite values as `nan`, `inf` and `-inf`. Strings are double
//! quoted with backslash escapes for newline, tab, carriage return,
//! backslash and quote. Every `parse_*` is the inverse of the matching
//! `serialize_*`.

use crate::dyn_str::DynStr;
use core::num::{ParseFloatError, ParseIntError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid integer: {0}")]
    Int(#[from] ParseIntError),
    #[error("invalid float: {0}")]
    Float(#[from] ParseFloatError),
    #[error("string literal must start with '\"'")]
    MissingQuote,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated escape sequence")]
    UnterminatedEscape,
    #[error("unexpected trailing input at byte {0}")]
    Trailing(usize),
    #[error("unbalanced parenthesis at byte {0}")]
    Unbalanced(usize),
}

pub fn serialize_int(v: i64) -> DynStr {
    DynStr::formatted(format_args!("{v}"))
}

/// Surrounding whitespace is ignored; overflow is an error.
pub fn parse_int(s: &str) -> Result<i64, ParseError> {
    Ok(s.trim().parse::<i64>()?)
}

/// Shortest text that reads back to the same bits (NaN payloads aside).
pub fn serialize_float(v: f64) -> DynStr {
    if v.is_nan() {
        DynStr::from("nan")
    } else if v.is_infinite() {
        DynStr::from(if v > 0.0 { "inf" } else { "-inf" })
    } else {
        DynStr::formatted(format_args!("{v:?}"))
    }
}

pub fn parse_float(s: &str) -> Result<f64, ParseError> {
    match s.trim() {
        "nan" => Ok(f64::NAN),
        "inf" => Ok(f64::INFINITY),
        "-inf" => Ok(f64::NEG_INFINITY),
        t => Ok(t.parse::<f64>()?),
    }
}

pub fn serialize_str(s: &str) -> DynStr {
    let mut out = DynStr::with_capacity(s.len() + 2);
    out.push(b'"');
    for c in s.chars() {
        match c {
            '\n' => out.append("\\n"),
            '\t' => out.append("\\t"),
            '\r' => out.append("\\r"),
            '\\' => out.append("\\\\"),
            '"' => out.append("\\\""),
            c => out.push_char(c),
        }
    }
    out.push(b'"');
    out
}

/// Decode one quoted literal. Leading and trailing whitespace is allowed;
/// anything else after the closing quote is an error. An escape outside
/// the known set yields the escaped character itself.
pub fn parse_str(s: &str) -> Result<DynStr, ParseError> {
    let body = s.trim_start();
    let offset = s.len() - body.len();
    let mut chars = body.char_indices();
    match chars.next() {
        Some((_, '"')) => {}
        _ => return Err(ParseError::MissingQuote),
    }
    let mut out = DynStr::new();
    loop {
        let Some((i, c)) = chars.next() else {
            return Err(ParseError::UnterminatedString);
        };
        match c {
            '"' => {
                let rest = &body[i + 1..];
                return match rest.find(|c: char| !c.is_whitespace()) {
                    Some(j) => Err(ParseError::Trailing(offset + i + 1 + j)),
                    None => Ok(out),
                };
            }
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push(b'\n'),
                Some((_, 't')) => out.push(b'\t'),
                Some((_, 'r')) => out.push(b'\r'),
                Some((_, other)) => out.push_char(other),
                None => return Err(ParseError::UnterminatedEscape),
            },
            c => out.push_char(c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Open(usize),
    Close(usize),
    Atom(&'a str),
}

fn tokenize(src: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => {
                out.push(Token::Open(i));
                i += 1;
            }
            b')' => {
                out.push(Token::Close(i));
                i += 1;
            }
            b if b.is_ascii_whitespace() => i += 1,
            b'"' => {
                let start = i;
                i += 1;
                loop {
                    match bytes.get(i) {
                        None => return Err(ParseError::UnterminatedString),
                        Some(b'\\') if i + 1 >= bytes.len() => {
                            return Err(ParseError::UnterminatedEscape)
                        }
                        Some(b'\\') => i += 2,
                        Some(b'"') => {
                            i += 1;
                            break;
                        }
                        Some(_) => i += 1,
                    }
                }
                out.push(Token::Atom(&src[start..i]));
            }
            _ => {
                let start = i;
                while i < bytes.len()
                    && !matches!(bytes[i], b'(' | b')' | b'"')
                    && !bytes[i].is_ascii_whitespace()
                {
                    i += 1;
                }
                out.push(Token::Atom(&src[start..i]));
            }
        }
    }
    Ok(out)
}

/// Lay out an S-expression one element per line, `indent` spaces per
/// nesting level. Atoms and string literals are copied verbatim. Several
/// top-level forms are separated by newlines.
pub fn pretty_print(src: &str, indent: usize) -> Result<DynStr, ParseError> {
    let tokens = tokenize(src)?;
    let mut out = DynStr::new();
    let mut depth = 0usize;
    let mut first = true;
    for tok in tokens {
        let level = match tok {
            Token::Close(at) => {
                depth = depth.checked_sub(1).ok_or(ParseError::Unbalanced(at))?;
                depth
            }
            _ => depth,
        };
        if !first {
            out.push(b'\n');
        }
        first = false;
        for _ in 0..level * indent {
            out.push(b' ');
        }
        match tok {
            Token::Open(_) => {
                out.push(b'(');
                depth += 1;
            }
            Token::Close(_) => out.push(b')'),
            Token::Atom(a) => out.append(a),
        }
    }
    if depth != 0 {
        return Err(ParseError::Unbalanced(src.len()));
    }
    Ok(out)
}

/// Integer rendering without a fresh allocation, for callers building a
/// larger string.
pub fn write_int(out: &mut DynStr, v: i64) {
    out.format(format_args!("{v}"));
}
