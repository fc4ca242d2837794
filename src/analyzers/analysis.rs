//! Structural classification of type spans.

use crate::core::Position;
use serde::Serialize;

/// Structural kind of a type span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKind {
    Primitive,
    Function,
    Tuple,
    Array,
    Union,
    Object,
    NamedReference,
    Unknown,
}

impl TypeKind {
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            TypeKind::Function | TypeKind::Tuple | TypeKind::Union | TypeKind::Object
        )
    }
}

/// Marker a tuple element or parameter carries in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Marker {
    /// `T?` or `name?: T`
    Optional,
    /// `...T` or `...name: T`
    Rest,
}

/// Result of analyzing one type span.
///
/// `constituents` holds, depending on `kind`:
/// - Tuple: the element types, in order
/// - Union: the members, in order
/// - Object: the field types, aligned with `labels`
/// - Array: the single element type
/// - Function: the parameter types, aligned with `labels`
/// - NamedReference: the type arguments, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeAnalysis {
    pub kind: TypeKind,
    pub text: String,
    pub name: Option<String>,
    pub constituents: Vec<TypeAnalysis>,
    pub labels: Vec<String>,
    pub return_type: Option<Box<TypeAnalysis>>,
    /// Set on tuple elements and parameters only.
    pub marker: Option<Marker>,
}

impl TypeAnalysis {
    fn leaf(kind: TypeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            name: None,
            constituents: Vec::new(),
            labels: Vec::new(),
            return_type: None,
            marker: None,
        }
    }

    pub fn with_marker(self, marker: Option<Marker>) -> Self {
        Self { marker, ..self }
    }

    pub fn primitive(text: impl Into<String>) -> Self {
        Self::leaf(TypeKind::Primitive, text)
    }

    pub fn unknown(text: impl Into<String>) -> Self {
        Self::leaf(TypeKind::Unknown, text)
    }

    pub fn named(text: impl Into<String>, name: impl Into<String>, args: Vec<TypeAnalysis>) -> Self {
        Self {
            name: Some(name.into()),
            constituents: args,
            ..Self::leaf(TypeKind::NamedReference, text)
        }
    }

    pub fn tuple(text: impl Into<String>, elements: Vec<TypeAnalysis>) -> Self {
        Self {
            constituents: elements,
            ..Self::leaf(TypeKind::Tuple, text)
        }
    }

    pub fn union(text: impl Into<String>, members: Vec<TypeAnalysis>) -> Self {
        Self {
            constituents: members,
            ..Self::leaf(TypeKind::Union, text)
        }
    }

    pub fn array(text: impl Into<String>, element: TypeAnalysis) -> Self {
        Self {
            constituents: vec![element],
            ..Self::leaf(TypeKind::Array, text)
        }
    }

    pub fn object(text: impl Into<String>, fields: Vec<(String, TypeAnalysis)>) -> Self {
        let (labels, constituents) = fields.into_iter().unzip();
        Self {
            constituents,
            labels,
            ..Self::leaf(TypeKind::Object, text)
        }
    }

    pub fn function(
        text: impl Into<String>,
        parameters: Vec<(String, TypeAnalysis)>,
        return_type: TypeAnalysis,
    ) -> Self {
        let (labels, constituents) = parameters.into_iter().unzip();
        Self {
            constituents,
            labels,
            return_type: Some(Box::new(return_type)),
            ..Self::leaf(TypeKind::Function, text)
        }
    }

    /// Sub-spans the target-type and header traversals descend into:
    /// a function's return type or a tuple's elements.
    pub fn decomposition(&self) -> Vec<&TypeAnalysis> {
        match self.kind {
            TypeKind::Function => self.return_type.iter().map(Box::as_ref).collect(),
            TypeKind::Tuple => self.constituents.iter().collect(),
            _ => Vec::new(),
        }
    }
}

/// A type-position identifier found inside a declaration's text.
///
/// `line` and `column` are 1-indexed and relative to the declaration text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeIdentifier {
    pub name: String,
    pub start_offset: usize,
    pub line: usize,
    pub column: usize,
}

impl TypeIdentifier {
    /// Translate the relative position into document coordinates, given
    /// the absolute start of the declaration text.
    pub fn absolute_position(&self, declaration_start: Position) -> Position {
        let line = self.line.saturating_sub(1) as u32;
        let column = self.column.saturating_sub(1) as u32;
        if line == 0 {
            Position::new(declaration_start.line, declaration_start.character + column)
        } else {
            Position::new(declaration_start.line + line, column)
        }
    }
}

/// A type declaration located inside a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationSpan {
    pub text: String,
    pub start: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Function,
    Variable,
}

/// A top-level function or variable declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevelDeclaration {
    pub kind: DeclarationKind,
    pub name: String,
    /// Position of the declared name, used to hover when the subject
    /// type is not written out.
    pub name_position: Position,
    /// Declaration start, part of the identity used for deduplication.
    pub start: Position,
    /// Signature as written, without the initializer or body.
    pub header: String,
    /// Declared subject type: a function's constructed function type or
    /// a variable's annotation.
    pub subject_type: Option<String>,
}
