//! Recursive-descent classification of OCaml type expressions and type
//! definitions (records and variants).

use crate::analyzers::analysis::TypeAnalysis;
use crate::analyzers::lexer::{tokenize, Syntax, Token, TokenKind};

const MAX_DEPTH: usize = 64;

const PRIMITIVES: &[&str] = &[
    "int",
    "float",
    "string",
    "bool",
    "char",
    "unit",
    "bytes",
    "int32",
    "int64",
    "nativeint",
    "exn",
];

pub(crate) const KEYWORDS: &[&str] = &[
    "and",
    "as",
    "begin",
    "constraint",
    "else",
    "end",
    "fun",
    "function",
    "if",
    "in",
    "let",
    "match",
    "module",
    "mutable",
    "nonrec",
    "of",
    "open",
    "private",
    "rec",
    "then",
    "type",
    "val",
    "with",
];

pub fn is_primitive_keyword(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

fn is_uppercase(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_uppercase)
}

/// Analyze an OCaml type expression or the right-hand side of a type
/// definition.
pub fn analyze(span: &str) -> TypeAnalysis {
    let trimmed = trim_span(span);
    let tokens = match tokenize(trimmed, Syntax::OCaml) {
        Ok(tokens) if !tokens.is_empty() => tokens,
        _ => return TypeAnalysis::unknown(trimmed),
    };

    let mut parser = Parser {
        tokens: &tokens,
        source: trimmed,
        pos: 0,
        depth: 0,
    };
    match parser.parse_definition() {
        Some(analysis) if parser.at_end() => analysis,
        _ => TypeAnalysis::unknown(trimmed),
    }
}

fn trim_span(span: &str) -> &str {
    let mut s = span.trim();
    loop {
        let next = s
            .strip_suffix(";;")
            .or_else(|| s.strip_suffix('='))
            .map(str::trim_end);
        match next {
            Some(rest) => s = rest,
            None => return s,
        }
    }
}

enum Atom {
    Single(TypeAnalysis),
    /// `(a, b)`, only valid before a type constructor
    Arguments(Vec<TypeAnalysis>),
}

struct Parser<'s, 't> {
    tokens: &'t [Token<'s>],
    source: &'s str,
    pos: usize,
    depth: usize,
}

impl<'s, 't> Parser<'s, 't> {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token<'s>> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token<'s>> {
        self.tokens.get(self.pos + offset)
    }

    fn peek_is_punct(&self, punct: &str) -> bool {
        self.peek().is_some_and(|t| t.is_punct(punct))
    }

    fn bump(&mut self) -> Option<Token<'s>> {
        let token = *self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.peek_is_punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: &str) -> Option<()> {
        self.eat_punct(punct).then_some(())
    }

    fn text_from(&self, from: usize) -> &'s str {
        if from >= self.pos {
            return "";
        }
        &self.source[self.tokens[from].start..self.tokens[self.pos - 1].end()]
    }

    fn descend<T>(&mut self, parse: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        self.depth += 1;
        let result = if self.depth > MAX_DEPTH {
            None
        } else {
            parse(self)
        };
        self.depth -= 1;
        result
    }

    fn variant_starts(&self) -> bool {
        match self.peek() {
            Some(t) if t.is_punct("|") => true,
            Some(t) if t.kind == TokenKind::Ident && is_uppercase(t.text) => {
                !self.peek_at(1).is_some_and(|next| next.is_punct("."))
            }
            _ => false,
        }
    }

    fn parse_definition(&mut self) -> Option<TypeAnalysis> {
        if self.peek().is_some_and(|t| t.is_ident("private")) {
            self.pos += 1;
        }
        if self.peek_is_punct("{") {
            return self.parse_record();
        }
        if self.variant_starts() {
            return self.parse_variant();
        }
        self.parse_type()
    }

    fn parse_record(&mut self) -> Option<TypeAnalysis> {
        let start = self.pos;
        self.expect_punct("{")?;
        let mut fields = Vec::new();
        while !self.eat_punct("}") {
            if self.peek().is_some_and(|t| t.is_ident("mutable")) {
                self.pos += 1;
            }
            let name = self.bump()?;
            if name.kind != TokenKind::Ident {
                return None;
            }
            self.expect_punct(":")?;
            let ty = self.parse_type()?;
            fields.push((name.text.to_string(), ty));
            if !self.eat_punct(";") {
                self.expect_punct("}")?;
                break;
            }
        }
        Some(TypeAnalysis::object(self.text_from(start), fields))
    }

    fn parse_variant(&mut self) -> Option<TypeAnalysis> {
        let start = self.pos;
        self.eat_punct("|");
        let mut members = Vec::new();
        loop {
            let member_start = self.pos;
            let constructor = self.bump()?;
            if constructor.kind != TokenKind::Ident || !is_uppercase(constructor.text) {
                return None;
            }
            let mut payload = Vec::new();
            if self.peek().is_some_and(|t| t.is_ident("of")) {
                self.pos += 1;
                payload.push(self.parse_payload()?);
            }
            members.push(TypeAnalysis::named(
                self.text_from(member_start),
                constructor.text,
                payload,
            ));
            if !self.eat_punct("|") {
                break;
            }
        }
        Some(TypeAnalysis::union(self.text_from(start), members))
    }

    fn parse_payload(&mut self) -> Option<TypeAnalysis> {
        if self.peek_is_punct("{") {
            return self.parse_record();
        }
        self.parse_type()
    }

    fn parse_type(&mut self) -> Option<TypeAnalysis> {
        self.descend(Self::parse_arrow)
    }

    fn parse_arrow(&mut self) -> Option<TypeAnalysis> {
        let start = self.pos;
        let label = self.parse_label();
        let parameter = self.parse_tuple()?;
        if !self.eat_punct("->") {
            return label.is_none().then_some(parameter);
        }
        let return_type = self.parse_type()?;
        Some(TypeAnalysis::function(
            self.text_from(start),
            vec![(label.unwrap_or_default(), parameter)],
            return_type,
        ))
    }

    /// `~name:`, `?name:` or `name:` before a parameter type.
    fn parse_label(&mut self) -> Option<String> {
        let sigil = self
            .peek()
            .filter(|t| t.is_punct("~") || t.is_punct("?"))
            .map(|t| t.text);
        let offset = usize::from(sigil.is_some());
        let name = self.peek_at(offset).copied()?;
        let colon = self.peek_at(offset + 1).is_some_and(|t| t.is_punct(":"));
        if name.kind != TokenKind::Ident || !colon {
            return None;
        }
        self.pos += offset + 2;
        Some(format!("{}{}", sigil.unwrap_or(""), name.text))
    }

    fn parse_tuple(&mut self) -> Option<TypeAnalysis> {
        let start = self.pos;
        let first = self.parse_application()?;
        if !self.peek_is_punct("*") {
            return Some(first);
        }
        let mut elements = vec![first];
        while self.eat_punct("*") {
            elements.push(self.parse_application()?);
        }
        Some(TypeAnalysis::tuple(self.text_from(start), elements))
    }

    fn constructor_follows(&self) -> bool {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Ident => {
                if KEYWORDS.contains(&t.text) {
                    return false;
                }
                !is_uppercase(t.text) || self.peek_at(1).is_some_and(|next| next.is_punct("."))
            }
            _ => false,
        }
    }

    fn parse_application(&mut self) -> Option<TypeAnalysis> {
        let start = self.pos;
        let mut arguments = match self.parse_atom()? {
            Atom::Single(ty) => {
                if !self.constructor_follows() {
                    return Some(ty);
                }
                vec![ty]
            }
            Atom::Arguments(arguments) => arguments,
        };
        loop {
            let name = self.parse_path()?;
            let applied = TypeAnalysis::named(self.text_from(start), name, arguments);
            if !self.constructor_follows() {
                return Some(applied);
            }
            arguments = vec![applied];
        }
    }

    /// `M.N.t`
    fn parse_path(&mut self) -> Option<&'s str> {
        let start = self.pos;
        loop {
            let segment = self.bump()?;
            if segment.kind != TokenKind::Ident {
                return None;
            }
            let more = is_uppercase(segment.text)
                && self.peek_is_punct(".")
                && self.peek_at(1).is_some_and(|t| t.kind == TokenKind::Ident);
            if !more {
                return (!is_uppercase(segment.text)).then(|| self.text_from(start));
            }
            self.pos += 1;
        }
    }

    fn parse_atom(&mut self) -> Option<Atom> {
        let start = self.pos;
        let token = *self.peek()?;
        match token.kind {
            TokenKind::Punct => match token.text {
                "'" => {
                    self.pos += 1;
                    self.bump().filter(|t| t.kind == TokenKind::Ident)?;
                    Some(Atom::Single(TypeAnalysis::unknown(self.text_from(start))))
                }
                "(" => {
                    self.pos += 1;
                    let first = if self.peek_is_punct("{") {
                        self.parse_record()?
                    } else if self.variant_starts() {
                        self.descend(Self::parse_variant)?
                    } else {
                        self.parse_type()?
                    };
                    if self.eat_punct(")") {
                        return Some(Atom::Single(first));
                    }
                    let mut arguments = vec![first];
                    while self.eat_punct(",") {
                        arguments.push(self.parse_type()?);
                    }
                    self.expect_punct(")")?;
                    Some(Atom::Arguments(arguments))
                }
                "[" | "<" => {
                    let close = if token.text == "[" { "]" } else { ">" };
                    self.skip_group(token.text, close)?;
                    Some(Atom::Single(TypeAnalysis::unknown(self.text_from(start))))
                }
                _ => None,
            },
            TokenKind::Ident => {
                if token.text == "_" {
                    self.pos += 1;
                    return Some(Atom::Single(TypeAnalysis::unknown("_")));
                }
                if is_primitive_keyword(token.text) {
                    self.pos += 1;
                    return Some(Atom::Single(TypeAnalysis::primitive(token.text)));
                }
                if KEYWORDS.contains(&token.text) {
                    return None;
                }
                let name = self.parse_path()?;
                Some(Atom::Single(TypeAnalysis::named(name, name, Vec::new())))
            }
            _ => None,
        }
    }

    /// Polymorphic variants and object types are kept opaque.
    fn skip_group(&mut self, open: &str, close: &str) -> Option<()> {
        let mut depth = 0usize;
        loop {
            let token = self.bump()?;
            if token.is_punct(open) {
                depth += 1;
            } else if token.is_punct(close) {
                depth -= 1;
                if depth == 0 {
                    return Some(());
                }
            }
        }
    }
}
