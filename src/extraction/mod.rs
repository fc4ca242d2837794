//! Language-independent extraction algorithms.
//!
//! Everything here is generic over a [`TypeGrammar`](crate::analyzers::TypeGrammar)
//! and a [`LanguageService`](crate::lsp::LanguageService). State lives in
//! explicit per-run objects; nothing is cached across runs.

pub mod cache;
pub mod headers;
pub mod normalize;
pub mod resolver;
pub mod run;
pub mod targets;

pub use cache::{AnalysisCache, NormalFormCache, SourceCache};
pub use headers::RelevantHeaderSelector;
pub use normalize::Normalizer;
pub use resolver::RelevantTypeResolver;
pub use run::{build_result, extract_context, ExtractionOptions};
pub use targets::generate_target_types;
