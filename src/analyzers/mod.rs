//! Per-language type grammars.
//!
//! The extraction algorithms are written once against [`TypeGrammar`];
//! each driver supplies the grammar of its language.

pub mod analysis;
pub mod lexer;
pub mod ocaml;
pub mod typescript;

use crate::core::{Language, Position};

pub use analysis::{
    DeclarationKind, DeclarationSpan, Marker, TopLevelDeclaration, TypeAnalysis, TypeIdentifier,
    TypeKind,
};

/// A normalized constituent, handed back to the grammar for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub kind: TypeKind,
    pub marker: Option<Marker>,
}

impl Rendered {
    pub fn new(text: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            text: text.into(),
            kind,
            marker: None,
        }
    }

    pub fn with_marker(self, marker: Option<Marker>) -> Self {
        Self { marker, ..self }
    }
}

/// Canonical shapes the normalizer asks a grammar to serialize.
#[derive(Debug, Clone, Copy)]
pub enum Shape<'a> {
    Tuple(&'a [Rendered]),
    Union(&'a [Rendered]),
    Array(&'a Rendered),
    Object {
        labels: &'a [String],
        fields: &'a [Rendered],
    },
    Function {
        parameters: &'a [Rendered],
        return_type: &'a Rendered,
    },
    Application {
        name: &'a str,
        arguments: &'a [Rendered],
    },
}

/// Language-specific type syntax used by the generic extraction algorithms.
pub trait TypeGrammar {
    fn language(&self) -> Language;

    /// Classify a type span. Never fails: unparseable input is `Unknown`
    /// carrying the trimmed text.
    fn analyze(&self, span: &str) -> TypeAnalysis;

    /// Identifiers in type positions of a declaration, with 1-indexed
    /// positions relative to the declaration text.
    fn extract_identifiers(&self, declaration_text: &str) -> Vec<TypeIdentifier>;

    /// Declared name of a type, interface or class declaration.
    fn declaration_name(&self, declaration_text: &str) -> Option<String>;

    /// Right-hand side of an alias declaration.
    fn alias_definition(&self, declaration_text: &str) -> Option<String>;

    /// The type declaration whose span contains `position`.
    fn find_enclosing_declaration(&self, source: &str, position: Position)
        -> Option<DeclarationSpan>;

    /// Functions and variables declared at module scope.
    fn top_level_declarations(&self, source: &str) -> Vec<TopLevelDeclaration>;

    fn statement_terminator(&self) -> &'static str;

    /// Extract the type of a symbol from flattened hover text.
    fn type_from_hover(&self, hover: &str) -> Option<String>;

    /// Header text for a declaration whose type came from the language
    /// service rather than the source.
    fn header_with_type(&self, declaration: &TopLevelDeclaration, subject_type: &str) -> String;

    /// Serialize a normalized shape in this language's syntax.
    fn render(&self, shape: Shape<'_>) -> String;
}

/// Remove one trailing statement terminator and surrounding whitespace.
pub fn strip_terminator<'a>(text: &'a str, terminator: &str) -> &'a str {
    let trimmed = text.trim_end();
    if terminator.is_empty() {
        return trimmed;
    }
    trimmed
        .strip_suffix(terminator)
        .map_or(trimmed, str::trim_end)
}
