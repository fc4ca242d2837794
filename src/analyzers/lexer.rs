//! Tokenizer shared by the type-span parsers.
//!
//! Produces borrowed tokens with byte offsets so parsers can slice the
//! original text for every sub-span they recognize.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    TypeScript,
    OCaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: usize,
}

impl<'a> Token<'a> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    pub fn is_punct(&self, punct: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == punct
    }

    pub fn is_ident(&self, ident: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == ident
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub offset: usize,
    pub message: &'static str,
}

const TS_PUNCTS: &[&str] = &["...", "=>", "?.", "(", ")", "[", "]", "{", "}", "<", ">", ",", ";", ":", "|", "&", "?", "=", "*", ".", "-", "+", "!", "@", "#"];
const OCAML_PUNCTS: &[&str] = &[
    "->", "<-", ":=", "::", ";;", "<>", "<=", ">=", "||", "&&", "|>", "@@", "==", "!=", "[|", "|]",
    "(", ")", "[", "]", "{", "}", "<", ">", ",", ";", ":", "|", "&", "?", "=", "*", ".", "'", "`",
    "~", "-", "#", "!",
];

/// Split `source` into tokens, skipping whitespace and comments.
pub fn tokenize(source: &str, syntax: Syntax) -> Result<Vec<Token<'_>>, LexError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        if let Some(end) = skip_comment(source, pos, syntax)? {
            pos = end;
            continue;
        }

        if is_ident_start(c, syntax) {
            let end = scan_while(bytes, pos + 1, |b| is_ident_continue(b, syntax));
            tokens.push(Token {
                kind: TokenKind::Ident,
                text: &source[pos..end],
                start: pos,
            });
            pos = end;
            continue;
        }

        if c.is_ascii_digit() {
            let end = scan_while(bytes, pos + 1, |b| {
                b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
            });
            tokens.push(Token {
                kind: TokenKind::Number,
                text: &source[pos..end],
                start: pos,
            });
            pos = end;
            continue;
        }

        if is_quote(c, syntax) {
            let end = scan_string(bytes, pos)?;
            tokens.push(Token {
                kind: TokenKind::Str,
                text: &source[pos..end],
                start: pos,
            });
            pos = end;
            continue;
        }

        let puncts = match syntax {
            Syntax::TypeScript => TS_PUNCTS,
            Syntax::OCaml => OCAML_PUNCTS,
        };
        match puncts.iter().find(|p| source[pos..].starts_with(**p)) {
            Some(p) => {
                tokens.push(Token {
                    kind: TokenKind::Punct,
                    text: &source[pos..pos + p.len()],
                    start: pos,
                });
                pos += p.len();
            }
            // OCaml operators are free-form sequences of symbol characters
            None if syntax == Syntax::OCaml && c.is_ascii_punctuation() => {
                tokens.push(Token {
                    kind: TokenKind::Punct,
                    text: &source[pos..pos + 1],
                    start: pos,
                });
                pos += 1;
            }
            None => {
                return Err(LexError {
                    offset: pos,
                    message: "unexpected character",
                })
            }
        }
    }

    Ok(tokens)
}

fn is_ident_start(c: u8, syntax: Syntax) -> bool {
    match syntax {
        Syntax::TypeScript => c.is_ascii_alphabetic() || c == b'_' || c == b'$' || c >= 0x80,
        Syntax::OCaml => c.is_ascii_alphabetic() || c == b'_' || c >= 0x80,
    }
}

fn is_ident_continue(c: u8, syntax: Syntax) -> bool {
    match syntax {
        Syntax::TypeScript => c.is_ascii_alphanumeric() || c == b'_' || c == b'$' || c >= 0x80,
        // OCaml identifiers may contain primes, e.g. `model'`
        Syntax::OCaml => c.is_ascii_alphanumeric() || c == b'_' || c == b'\'' || c >= 0x80,
    }
}

fn is_quote(c: u8, syntax: Syntax) -> bool {
    match syntax {
        Syntax::TypeScript => c == b'"' || c == b'\'' || c == b'`',
        Syntax::OCaml => c == b'"',
    }
}

fn scan_while(bytes: &[u8], mut pos: usize, pred: impl Fn(u8) -> bool) -> usize {
    while pos < bytes.len() && pred(bytes[pos]) {
        pos += 1;
    }
    pos
}

fn scan_string(bytes: &[u8], start: usize) -> Result<usize, LexError> {
    let quote = bytes[start];
    let mut pos = start + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b if b == quote => return Ok(pos + 1),
            _ => pos += 1,
        }
    }
    Err(LexError {
        offset: start,
        message: "unterminated string literal",
    })
}

fn skip_comment(source: &str, pos: usize, syntax: Syntax) -> Result<Option<usize>, LexError> {
    let rest = &source[pos..];
    match syntax {
        Syntax::TypeScript => {
            if rest.starts_with("//") {
                let end = rest.find('\n').map_or(source.len(), |i| pos + i + 1);
                return Ok(Some(end));
            }
            if rest.starts_with("/*") {
                return match rest[2..].find("*/") {
                    Some(i) => Ok(Some(pos + 2 + i + 2)),
                    None => Err(LexError {
                        offset: pos,
                        message: "unterminated comment",
                    }),
                };
            }
        }
        Syntax::OCaml => {
            if rest.starts_with("(*") {
                // OCaml comments nest
                let mut depth = 0usize;
                let mut i = pos;
                while i < source.len() {
                    let r = &source[i..];
                    if r.starts_with("(*") {
                        depth += 1;
                        i += 2;
                    } else if r.starts_with("*)") {
                        depth -= 1;
                        i += 2;
                        if depth == 0 {
                            return Ok(Some(i));
                        }
                    } else {
                        i += r.chars().next().map_or(1, char::len_utf8);
                    }
                }
                return Err(LexError {
                    offset: pos,
                    message: "unterminated comment",
                });
            }
        }
    }
    Ok(None)
}

/// Convert a byte offset into a zero-based (line, column) pair.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count();
    let column = before.rfind('\n').map_or(before.len(), |i| before.len() - i - 1);
    (line, column)
}

/// Convert a zero-based (line, column) pair into a byte offset, clamped to
/// the end of the line.
pub fn offset_of(source: &str, line: usize, column: usize) -> Option<usize> {
    let mut offset = 0;
    for (index, text) in source.split('\n').enumerate() {
        if index == line {
            return Some(offset + column.min(text.len()));
        }
        offset += text.len() + 1;
    }
    None
}
