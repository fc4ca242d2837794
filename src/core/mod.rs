pub mod errors;
pub mod types;

use serde::{Deserialize, Serialize};

pub use errors::{Error, Result, ResultExt};
pub use types::{
    ExtractionResult, HoleContext, Location, Position, Range, RelevantHeaderEntry,
    RelevantTypeEntry, RelevantTypes, SymbolInfo,
};

/// Languages with a driver.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[value(name = "typescript")]
    TypeScript,
    #[value(name = "ocaml")]
    OCaml,
}

impl Language {
    pub fn from_extension(ext: &str) -> Option<Self> {
        static EXTENSION_MAP: &[(&[&str], Language)] = &[
            (&["ts", "tsx", "mts", "cts"], Language::TypeScript),
            (&["ml"], Language::OCaml),
        ];

        EXTENSION_MAP
            .iter()
            .find(|(exts, _)| exts.contains(&ext))
            .map(|(_, lang)| *lang)
    }

    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// File extensions scanned for top-level declarations.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::TypeScript => &["ts", "tsx", "mts", "cts"],
            Language::OCaml => &["ml"],
        }
    }

    /// `languageId` sent with `textDocument/didOpen`.
    pub fn language_id(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::OCaml => "ocaml",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let display_str = match self {
            Language::TypeScript => "TypeScript",
            Language::OCaml => "OCaml",
        };
        write!(f, "{display_str}")
    }
}
