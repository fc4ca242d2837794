//! Recursive-descent classification of TypeScript type expressions.

use crate::analyzers::analysis::{Marker, TypeAnalysis};
use crate::analyzers::lexer::{tokenize, Syntax, Token, TokenKind};

const MAX_DEPTH: usize = 64;

const PRIMITIVES: &[&str] = &[
    "string",
    "number",
    "boolean",
    "bigint",
    "symbol",
    "any",
    "unknown",
    "never",
    "void",
    "object",
    "undefined",
    "null",
    "true",
    "false",
    "this",
];

pub fn is_primitive_keyword(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// Analyze a TypeScript type span.
///
/// A trailing `;` or ` =` left over from slicing a declaration is ignored.
pub fn analyze(span: &str) -> TypeAnalysis {
    let trimmed = trim_span(span);
    let tokens = match tokenize(trimmed, Syntax::TypeScript) {
        Ok(tokens) if !tokens.is_empty() => tokens,
        _ => return TypeAnalysis::unknown(trimmed),
    };

    let mut parser = Parser {
        tokens: &tokens,
        source: trimmed,
        pos: 0,
        depth: 0,
    };
    match parser.parse_type() {
        Some(analysis) if parser.at_end() => analysis,
        _ => TypeAnalysis::unknown(trimmed),
    }
}

fn marker(rest: bool, optional: bool) -> Option<Marker> {
    if rest {
        Some(Marker::Rest)
    } else if optional {
        Some(Marker::Optional)
    } else {
        None
    }
}

fn trim_span(span: &str) -> &str {
    let mut s = span.trim();
    loop {
        let next = s
            .strip_suffix(';')
            .or_else(|| s.strip_suffix('='))
            .map(str::trim_end);
        match next {
            Some(rest) => s = rest,
            None => return s,
        }
    }
}

enum Member {
    Field(String, TypeAnalysis),
    Mapped,
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

    fn peek_at_is_punct(&self, offset: usize, punct: &str) -> bool {
        self.peek_at(offset).is_some_and(|t| t.is_punct(punct))
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

    fn slice(&self, from: usize, to: usize) -> &'s str {
        if from >= to {
            return "";
        }
        &self.source[self.tokens[from].start..self.tokens[to - 1].end()]
    }

    fn text_from(&self, from: usize) -> &'s str {
        self.slice(from, self.pos)
    }

    /// Index of the token closing the bracket opened at `open`.
    fn matching_close(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (index, token) in self.tokens.iter().enumerate().skip(open) {
            if token.kind != TokenKind::Punct {
                continue;
            }
            match token.text {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(index);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn is_function_start(&self) -> bool {
        if self.peek_is_punct("<") {
            return true;
        }
        if !self.peek_is_punct("(") {
            return false;
        }
        self.matching_close(self.pos)
            .and_then(|close| self.tokens.get(close + 1))
            .is_some_and(|t| t.is_punct("=>"))
    }

    fn parse_type(&mut self) -> Option<TypeAnalysis> {
        self.depth += 1;
        let result = if self.depth > MAX_DEPTH {
            None
        } else {
            self.parse_type_inner()
        };
        self.depth -= 1;
        result
    }

    fn parse_type_inner(&mut self) -> Option<TypeAnalysis> {
        let start = self.pos;

        if self.is_function_start() {
            return self.parse_function();
        }

        if self.peek().is_some_and(|t| t.is_ident("abstract"))
            && self.peek_at(1).is_some_and(|t| t.is_ident("new"))
        {
            self.pos += 1;
        }
        if self.peek().is_some_and(|t| t.is_ident("new")) {
            self.pos += 1;
            self.parse_function()?;
            return Some(TypeAnalysis::unknown(self.text_from(start)));
        }

        let checked = self.parse_union()?;
        if self.peek().is_some_and(|t| t.is_ident("extends")) {
            self.pos += 1;
            self.parse_union()?;
            self.expect_punct("?")?;
            self.parse_type()?;
            self.expect_punct(":")?;
            self.parse_type()?;
            return Some(TypeAnalysis::unknown(self.text_from(start)));
        }
        Some(checked)
    }

    fn parse_function(&mut self) -> Option<TypeAnalysis> {
        let start = self.pos;
        let parameters = self.parse_parameter_list()?;
        self.expect_punct("=>")?;
        let return_type = self.parse_return_type()?;
        Some(TypeAnalysis::function(
            self.text_from(start),
            parameters,
            return_type,
        ))
    }

    /// Method and call signatures: `(params): R`, return type optional.
    fn parse_signature(&mut self) -> Option<TypeAnalysis> {
        let params_start = self.pos;
        let parameters = self.parse_parameter_list()?;
        let params_text = self.text_from(params_start);
        let return_type = if self.eat_punct(":") {
            self.parse_return_type()?
        } else {
            TypeAnalysis::primitive("any")
        };
        let text = format!("{} => {}", params_text, return_type.text);
        Some(TypeAnalysis::function(text, parameters, return_type))
    }

    fn parse_parameter_list(&mut self) -> Option<Vec<(String, TypeAnalysis)>> {
        if self.eat_punct("<") {
            self.skip_angle_group()?;
        }
        self.expect_punct("(")?;
        let mut parameters = Vec::new();
        while !self.eat_punct(")") {
            parameters.push(self.parse_parameter()?);
            if !self.eat_punct(",") {
                self.expect_punct(")")?;
                break;
            }
        }
        Some(parameters)
    }

    /// Skip type parameters after the opening `<` has been consumed.
    fn skip_angle_group(&mut self) -> Option<()> {
        let mut depth = 1usize;
        while depth > 0 {
            let token = self.bump()?;
            if token.is_punct("<") {
                depth += 1;
            } else if token.is_punct(">") {
                depth -= 1;
            }
        }
        Some(())
    }

    fn parse_parameter(&mut self) -> Option<(String, TypeAnalysis)> {
        let rest = self.eat_punct("...");
        let token = *self.peek()?;

        let named = token.kind == TokenKind::Ident
            && (self.peek_at_is_punct(1, ":")
                || (self.peek_at_is_punct(1, "?") && self.peek_at_is_punct(2, ":")));
        if named {
            self.pos += 1;
            let optional = self.eat_punct("?");
            self.expect_punct(":")?;
            let ty = self.parse_type()?;
            let label = format!(
                "{}{}{}",
                if rest { "..." } else { "" },
                token.text,
                if optional { "?" } else { "" }
            );
            return Some((label, ty.with_marker(marker(rest, optional))));
        }

        if token.is_punct("{") || token.is_punct("[") {
            let close = self.matching_close(self.pos)?;
            if self.tokens.get(close + 1).is_some_and(|t| t.is_punct(":")) {
                let label = self.slice(self.pos, close + 1).to_string();
                self.pos = close + 2;
                let ty = self.parse_type()?;
                return Some((label, ty));
            }
        }

        let ty = self.parse_type()?;
        let optional = self.eat_punct("?");
        Some((String::new(), ty.with_marker(marker(rest, optional))))
    }

    fn parse_return_type(&mut self) -> Option<TypeAnalysis> {
        let start = self.pos;
        let asserts = self.peek().is_some_and(|t| t.is_ident("asserts"))
            && self.peek_at(1).is_some_and(|t| t.kind == TokenKind::Ident);
        if asserts {
            self.pos += 2;
            if self.peek().is_some_and(|t| t.is_ident("is")) {
                self.pos += 1;
                self.parse_type()?;
            }
            return Some(TypeAnalysis::unknown(self.text_from(start)));
        }
        let predicate = self.peek().is_some_and(|t| t.kind == TokenKind::Ident)
            && self.peek_at(1).is_some_and(|t| t.is_ident("is"));
        if predicate {
            self.pos += 2;
            self.parse_type()?;
            return Some(TypeAnalysis::unknown(self.text_from(start)));
        }
        self.parse_type()
    }

    fn parse_union(&mut self) -> Option<TypeAnalysis> {
        let start = self.pos;
        self.eat_punct("|");
        let mut members = vec![self.parse_intersection()?];
        while self.eat_punct("|") {
            members.push(self.parse_intersection()?);
        }
        if members.len() == 1 {
            return members.pop();
        }
        Some(TypeAnalysis::union(self.text_from(start), members))
    }

    fn parse_intersection(&mut self) -> Option<TypeAnalysis> {
        let start = self.pos;
        self.eat_punct("&");
        let first = self.parse_operand()?;
        if !self.peek_is_punct("&") {
            return Some(first);
        }
        while self.eat_punct("&") {
            self.parse_operand()?;
        }
        Some(TypeAnalysis::unknown(self.text_from(start)))
    }

    fn parse_operand(&mut self) -> Option<TypeAnalysis> {
        let start = self.pos;
        let token = *self.peek()?;
        if token.kind == TokenKind::Ident {
            match token.text {
                "keyof" | "unique" => {
                    self.pos += 1;
                    self.parse_operand()?;
                    return Some(TypeAnalysis::unknown(self.text_from(start)));
                }
                "readonly" => {
                    self.pos += 1;
                    return self.parse_operand();
                }
                "typeof" => {
                    self.pos += 1;
                    self.parse_qualified_name()?;
                    self.parse_postfix_from(start, TypeAnalysis::unknown(""))?;
                    return Some(TypeAnalysis::unknown(self.text_from(start)));
                }
                "infer" => {
                    self.pos += 1;
                    self.bump()?;
                    return Some(TypeAnalysis::unknown(self.text_from(start)));
                }
                _ => {}
            }
        }
        let primary = self.parse_primary()?;
        self.parse_postfix_from(start, primary)
    }

    fn parse_postfix_from(&mut self, start: usize, mut ty: TypeAnalysis) -> Option<TypeAnalysis> {
        while self.peek_is_punct("[") {
            if self.peek_at_is_punct(1, "]") {
                self.pos += 2;
                ty = TypeAnalysis::array(self.text_from(start), ty);
            } else {
                // indexed access `T[K]`
                self.pos += 1;
                self.parse_type()?;
                self.expect_punct("]")?;
                ty = TypeAnalysis::unknown(self.text_from(start));
            }
        }
        Some(ty)
    }

    fn parse_qualified_name(&mut self) -> Option<&'s str> {
        let start = self.pos;
        let first = self.bump()?;
        if first.kind != TokenKind::Ident {
            return None;
        }
        while self.peek_is_punct(".") && self.peek_at(1).is_some_and(|t| t.kind == TokenKind::Ident)
        {
            self.pos += 2;
        }
        Some(self.text_from(start))
    }

    fn parse_primary(&mut self) -> Option<TypeAnalysis> {
        let start = self.pos;
        let token = *self.peek()?;
        match token.kind {
            TokenKind::Str | TokenKind::Number => {
                self.pos += 1;
                Some(TypeAnalysis::primitive(token.text))
            }
            TokenKind::Punct => match token.text {
                "-" => {
                    self.pos += 1;
                    let number = self.bump()?;
                    (number.kind == TokenKind::Number)
                        .then(|| TypeAnalysis::primitive(self.text_from(start)))
                }
                "(" => {
                    self.pos += 1;
                    let inner = self.parse_type()?;
                    self.expect_punct(")")?;
                    Some(inner)
                }
                "[" => {
                    self.pos += 1;
                    self.parse_tuple(start)
                }
                "{" => {
                    self.pos += 1;
                    self.parse_object(start)
                }
                _ => None,
            },
            TokenKind::Ident => {
                if is_primitive_keyword(token.text) {
                    self.pos += 1;
                    return Some(TypeAnalysis::primitive(token.text));
                }
                let name = self.parse_qualified_name()?;
                let mut arguments = Vec::new();
                if self.eat_punct("<") {
                    loop {
                        arguments.push(self.parse_type()?);
                        if !self.eat_punct(",") {
                            self.expect_punct(">")?;
                            break;
                        }
                    }
                }
                let text = self.text_from(start);
                if matches!(name, "Array" | "ReadonlyArray") && arguments.len() == 1 {
                    let element = arguments.pop()?;
                    return Some(TypeAnalysis::array(text, element));
                }
                Some(TypeAnalysis::named(text, name, arguments))
            }
        }
    }

    fn parse_tuple(&mut self, start: usize) -> Option<TypeAnalysis> {
        let mut elements = Vec::new();
        while !self.eat_punct("]") {
            let rest = self.eat_punct("...");
            let labelled = self.peek().is_some_and(|t| t.kind == TokenKind::Ident)
                && (self.peek_at_is_punct(1, ":")
                    || (self.peek_at_is_punct(1, "?") && self.peek_at_is_punct(2, ":")));
            let mut optional = false;
            if labelled {
                self.pos += 1;
                optional = self.eat_punct("?");
                self.expect_punct(":")?;
            }
            let element = self.parse_type()?;
            optional |= self.eat_punct("?");
            elements.push(element.with_marker(marker(rest, optional)));
            if !self.eat_punct(",") {
                self.expect_punct("]")?;
                break;
            }
        }
        Some(TypeAnalysis::tuple(self.text_from(start), elements))
    }

    fn parse_object(&mut self, start: usize) -> Option<TypeAnalysis> {
        let mut fields = Vec::new();
        let mut mapped = false;
        loop {
            while self.eat_punct(";") || self.eat_punct(",") {}
            if self.eat_punct("}") {
                break;
            }
            match self.parse_member()? {
                Member::Field(label, ty) => fields.push((label, ty)),
                Member::Mapped => mapped = true,
            }
        }
        if mapped {
            return Some(TypeAnalysis::unknown(self.text_from(start)));
        }
        Some(TypeAnalysis::object(self.text_from(start), fields))
    }

    fn parse_member(&mut self) -> Option<Member> {
        if self.peek_is_punct("+") || self.peek_is_punct("-") {
            self.pos += 1;
        }
        let modifier = self.peek().is_some_and(|t| t.is_ident("readonly"))
            && !self.peek_at(1).is_some_and(|t| {
                t.kind == TokenKind::Punct && matches!(t.text, ":" | "?" | "(" | ";" | "," | "}")
            });
        if modifier {
            self.pos += 1;
        }

        let token = *self.peek()?;

        if token.is_punct("[") {
            let key = self.peek_at(1).copied();
            let is_ident_key = key.is_some_and(|t| t.kind == TokenKind::Ident);
            if is_ident_key && self.peek_at_is_punct(2, ":") {
                self.pos += 3;
                let key_type = self.parse_type()?;
                self.expect_punct("]")?;
                let label = format!("[{}: {}]", key.map_or("", |t| t.text), key_type.text);
                self.expect_punct(":")?;
                let ty = self.parse_type()?;
                return Some(Member::Field(label, ty));
            }
            if is_ident_key && self.peek_at(2).is_some_and(|t| t.is_ident("in")) {
                self.pos += 3;
                self.parse_type()?;
                if self.peek().is_some_and(|t| t.is_ident("as")) {
                    self.pos += 1;
                    self.parse_type()?;
                }
                self.expect_punct("]")?;
                if self.peek_is_punct("+") || self.peek_is_punct("-") {
                    self.pos += 1;
                }
                self.eat_punct("?");
                self.expect_punct(":")?;
                self.parse_type()?;
                return Some(Member::Mapped);
            }
            let close = self.matching_close(self.pos)?;
            let label = self.slice(self.pos, close + 1).to_string();
            self.pos = close + 1;
            return self.finish_member(label);
        }

        if token.is_punct("(") || token.is_punct("<") {
            let ty = self.parse_signature()?;
            return Some(Member::Field("()".to_string(), ty));
        }

        if token.is_ident("new") && (self.peek_at_is_punct(1, "(") || self.peek_at_is_punct(1, "<"))
        {
            let start = self.pos;
            self.pos += 1;
            self.parse_signature()?;
            let text = self.text_from(start);
            return Some(Member::Field("new".to_string(), TypeAnalysis::unknown(text)));
        }

        match token.kind {
            TokenKind::Ident | TokenKind::Str | TokenKind::Number => {
                self.pos += 1;
                self.finish_member(token.text.to_string())
            }
            TokenKind::Punct => None,
        }
    }

    fn finish_member(&mut self, label: String) -> Option<Member> {
        let label = if self.eat_punct("?") {
            format!("{label}?")
        } else {
            label
        };
        if self.peek_is_punct("(") || self.peek_is_punct("<") {
            let ty = self.parse_signature()?;
            return Some(Member::Field(label, ty));
        }
        if self.eat_punct(":") {
            let ty = self.parse_type()?;
            return Some(Member::Field(label, ty));
        }
        Some(Member::Field(label, TypeAnalysis::primitive("any")))
    }
}
