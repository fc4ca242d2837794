// Export modules for library usage
pub mod analyzers;
pub mod cli;
pub mod config;
pub mod core;
pub mod drivers;
pub mod extraction;
pub mod io;
pub mod lsp;
pub mod observability;

// Re-export commonly used types
pub use crate::core::{
    Error, ExtractionResult, HoleContext, Language, Location, Position, Range,
    RelevantHeaderEntry, RelevantTypeEntry, RelevantTypes, Result, SymbolInfo,
};

pub use crate::analyzers::{TypeAnalysis, TypeGrammar, TypeKind};

pub use crate::drivers::{LanguageDriver, OcamlDriver, TypeScriptDriver};

pub use crate::extraction::{
    extract_context, generate_target_types, ExtractionOptions, Normalizer, RelevantHeaderSelector,
    RelevantTypeResolver, SourceCache,
};

pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};

pub use crate::lsp::{LanguageService, LspClient};
