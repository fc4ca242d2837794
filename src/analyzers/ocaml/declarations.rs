//! Declaration-level queries over OCaml source.
//!
//! Top-level items are recognized by their leading keyword at column 0.

use super::type_span::{is_primitive_keyword, KEYWORDS};
use crate::analyzers::analysis::{
    DeclarationKind, DeclarationSpan, TopLevelDeclaration, TypeIdentifier,
};
use crate::analyzers::lexer::{line_column, offset_of, tokenize, Syntax, Token, TokenKind};
use crate::core::Position;

const ITEM_KEYWORDS: &[&str] = &[
    "type",
    "let",
    "and",
    "module",
    "open",
    "include",
    "exception",
    "external",
    "class",
    "val",
];

const HOLE_PREDECESSORS: &[&str] = &["=", "->", "in", "then", "else", "(", "begin"];

/// One top-level item: its chain keyword (`type` or `let` for an `and`
/// continuation) and its token range.
#[derive(Debug, Clone, Copy)]
struct Item {
    keyword: &'static str,
    first: usize,
    end: usize,
}

fn position_of(source: &str, offset: usize) -> Position {
    let (line, column) = line_column(source, offset);
    Position::new(line as u32, column as u32)
}

fn is_uppercase(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_uppercase)
}

fn items(source: &str, tokens: &[Token<'_>]) -> Vec<Item> {
    let mut starts: Vec<(usize, &'static str)> = Vec::new();
    let mut chain: &'static str = "";
    for (index, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Ident || line_column(source, token.start).1 != 0 {
            continue;
        }
        let Some(&keyword) = ITEM_KEYWORDS.iter().find(|k| **k == token.text) else {
            continue;
        };
        if keyword != "and" {
            chain = keyword;
        }
        starts.push((index, chain));
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, (first, keyword))| Item {
            keyword: *keyword,
            first: *first,
            end: starts.get(i + 1).map_or(tokens.len(), |(next, _)| *next),
        })
        .collect()
}

fn item_text<'a>(source: &'a str, tokens: &[Token<'_>], item: &Item) -> &'a str {
    let start = tokens[item.first].start;
    let end = tokens[item.end - 1].end();
    source[start..end]
        .trim_end()
        .trim_end_matches(";;")
        .trim_end()
}

pub fn extract_identifiers(declaration_text: &str) -> Vec<TypeIdentifier> {
    let Ok(tokens) = tokenize(declaration_text, Syntax::OCaml) else {
        return Vec::new();
    };
    let type_mode = tokens
        .first()
        .is_some_and(|t| t.is_ident("type") || t.is_ident("and"));

    let mut identifiers = Vec::new();
    let mut depth = 0usize;
    let mut annotation_depth: Option<usize> = None;

    for (index, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Punct {
            match token.text {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    if annotation_depth == Some(depth) {
                        annotation_depth = None;
                    }
                    depth = depth.saturating_sub(1);
                }
                ":" if !type_mode => annotation_depth = Some(depth),
                "=" | "," if annotation_depth == Some(depth) => annotation_depth = None,
                _ => {}
            }
            continue;
        }

        let in_type_position = type_mode || annotation_depth.is_some();
        if !in_type_position || token.kind != TokenKind::Ident {
            continue;
        }
        let previous = index.checked_sub(1).and_then(|i| tokens.get(i));
        let next = tokens.get(index + 1);
        let candidate = !is_uppercase(token.text)
            && !KEYWORDS.contains(&token.text)
            && !is_primitive_keyword(token.text)
            && token.text != "_"
            && !previous.is_some_and(|p| p.is_punct("'") || p.is_punct("~") || p.is_punct("?"))
            && !next.is_some_and(|n| n.is_punct(":"));
        if candidate {
            let (line, column) = line_column(declaration_text, token.start);
            identifiers.push(TypeIdentifier {
                name: token.text.to_string(),
                start_offset: token.start,
                line: line + 1,
                column: column + 1,
            });
        }
    }
    identifiers
}

pub fn declaration_name(declaration_text: &str) -> Option<String> {
    let tokens = tokenize(declaration_text, Syntax::OCaml).ok()?;
    let mut iter = tokens.iter().peekable();
    let keyword = iter.next()?;
    if !(keyword.is_ident("type") || keyword.is_ident("and")) {
        return None;
    }
    if iter.peek().is_some_and(|t| t.is_ident("nonrec")) {
        iter.next();
    }
    // type parameters: `'a t` or `('a, 'b) t`
    match iter.peek() {
        Some(t) if t.is_punct("'") => {
            iter.next();
            iter.next();
        }
        Some(t) if t.is_punct("(") => {
            for token in iter.by_ref() {
                if token.is_punct(")") {
                    break;
                }
            }
        }
        _ => {}
    }
    iter.next()
        .filter(|t| t.kind == TokenKind::Ident)
        .map(|t| t.text.to_string())
}

pub fn alias_definition(declaration_text: &str) -> Option<String> {
    let tokens = tokenize(declaration_text, Syntax::OCaml).ok()?;
    let first = tokens.first()?;
    if !(first.is_ident("type") || first.is_ident("and")) {
        return None;
    }
    let equals = tokens.iter().find(|t| t.is_punct("="))?;
    let definition = declaration_text[equals.end()..].trim();
    (!definition.is_empty()).then(|| definition.to_string())
}

pub fn find_enclosing_declaration(source: &str, position: Position) -> Option<DeclarationSpan> {
    let tokens = tokenize(source, Syntax::OCaml).ok()?;
    let offset = offset_of(source, position.line as usize, position.character as usize)?;
    let item = items(source, &tokens).into_iter().find(|item| {
        let start = tokens[item.first].start;
        let end = tokens[item.end - 1].end();
        start <= offset && offset <= end
    })?;
    if item.keyword != "type" {
        return None;
    }
    Some(DeclarationSpan {
        text: item_text(source, &tokens, &item).to_string(),
        start: position_of(source, tokens[item.first].start),
    })
}

/// Parameter annotations of a `let` binding, `None` when any is missing.
fn binding_subject_type(source: &str, tokens: &[Token<'_>]) -> (bool, Option<String>) {
    let mut parameters: Vec<Option<String>> = Vec::new();
    let mut index = 0;
    let mut return_type = None;

    while let Some(token) = tokens.get(index) {
        if token.is_punct("=") {
            break;
        }
        if token.is_punct(":") {
            let end = tokens[index..]
                .iter()
                .position(|t| t.is_punct("="))
                .map_or(tokens.len(), |p| index + p);
            return_type = slice(source, tokens, index + 1, end).map(str::to_string);
            break;
        }
        if token.is_punct("(") {
            let Some(close) = matching_paren(tokens, index) else {
                break;
            };
            let inner = &tokens[index + 1..close];
            let annotation = inner
                .iter()
                .position(|t| t.is_punct(":"))
                .and_then(|colon| slice(source, inner, colon + 1, inner.len()))
                .map(str::to_string);
            // `()` is a unit parameter
            parameters.push(if inner.is_empty() {
                Some("unit".to_string())
            } else {
                annotation
            });
            index = close + 1;
            continue;
        }
        parameters.push(None);
        index += 1;
    }

    let is_function = !parameters.is_empty();
    let Some(return_type) = return_type else {
        return (is_function, None);
    };
    let parameters: Option<Vec<String>> = parameters.into_iter().collect();
    let subject = parameters.map(|parameters| {
        parameters
            .into_iter()
            .map(|p| {
                if p.contains("->") {
                    format!("({p})")
                } else {
                    p
                }
            })
            .chain(std::iter::once(return_type))
            .collect::<Vec<_>>()
            .join(" -> ")
    });
    (is_function, subject)
}

fn matching_paren(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        if token.is_punct("(") {
            depth += 1;
        } else if token.is_punct(")") {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
    }
    None
}

fn slice<'a>(source: &'a str, tokens: &[Token<'_>], from: usize, to: usize) -> Option<&'a str> {
    if from >= to || to > tokens.len() {
        return None;
    }
    Some(&source[tokens[from].start..tokens[to - 1].end()])
}

fn let_binding(source: &str, tokens: &[Token<'_>], item: &Item) -> Option<TopLevelDeclaration> {
    let body = &tokens[item.first..item.end];
    let mut index = 1;
    if body.get(index).is_some_and(|t| t.is_ident("rec")) {
        index += 1;
    }
    let name = body.get(index)?;
    if name.kind != TokenKind::Ident || name.text == "_" || is_uppercase(name.text) {
        return None;
    }
    let equals = body.iter().position(|t| t.is_punct("="))?;
    let (is_function, subject_type) = binding_subject_type(source, &body[index + 1..equals]);
    let header = slice(source, body, 0, equals)?.trim_end().to_string();

    Some(TopLevelDeclaration {
        kind: if is_function {
            DeclarationKind::Function
        } else {
            DeclarationKind::Variable
        },
        name: name.text.to_string(),
        name_position: position_of(source, name.start),
        start: position_of(source, body[0].start),
        header,
        subject_type,
    })
}

pub fn top_level_declarations(source: &str) -> Vec<TopLevelDeclaration> {
    let Ok(tokens) = tokenize(source, Syntax::OCaml) else {
        return Vec::new();
    };
    items(source, &tokens)
        .iter()
        .filter(|item| item.keyword == "let")
        .filter_map(|item| let_binding(source, &tokens, item))
        .collect()
}

/// The top-level `let` binding containing `position`.
pub fn enclosing_binding(source: &str, position: Position) -> Option<DeclarationSpan> {
    let tokens = tokenize(source, Syntax::OCaml).ok()?;
    let offset = offset_of(source, position.line as usize, position.character as usize)?;
    items(source, &tokens)
        .into_iter()
        .filter(|item| item.keyword == "let")
        .find(|item| tokens[item.first].start <= offset && offset <= tokens[item.end - 1].end())
        .map(|item| DeclarationSpan {
            text: item_text(source, &tokens, &item).to_string(),
            start: position_of(source, tokens[item.first].start),
        })
}

/// Position of the first `_` used as an expression.
pub fn find_hole(source: &str) -> Option<Position> {
    let tokens = tokenize(source, Syntax::OCaml).ok()?;
    tokens
        .iter()
        .enumerate()
        .find(|(index, token)| {
            let previous = index.checked_sub(1).and_then(|i| tokens.get(i));
            let next = tokens.get(index + 1);
            token.is_ident("_")
                && previous.is_some_and(|p| HOLE_PREDECESSORS.contains(&p.text))
                && !next.is_some_and(|n| n.is_punct(":") || n.is_punct(","))
        })
        .map(|(_, token)| position_of(source, token.start))
}
