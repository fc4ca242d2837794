use crate::core::Language;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = ".context-extractor.toml";

/// Settings read from `.context-extractor.toml`.
///
/// ```toml
/// language = "typescript"
/// ignore_patterns = ["**/node_modules/**"]
///
/// [server_command]
/// typescript = "typescript-language-server --stdio"
/// ocaml = "ocamllsp"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Forces a driver instead of inferring it from the sketch extension.
    pub language: Option<Language>,
    pub server_command: ServerCommands,
    /// Glob patterns excluded from the header scan.
    pub ignore_patterns: Vec<String>,
    pub include_hidden: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            language: None,
            server_command: ServerCommands::default(),
            ignore_patterns: vec!["**/node_modules/**".to_string(), "**/_build/**".to_string()],
            include_hidden: true,
        }
    }
}

impl ExtractorConfig {
    pub fn validate(&self) -> Result<(), String> {
        for language in [Language::TypeScript, Language::OCaml] {
            if self.server_command.for_language(language).trim().is_empty() {
                return Err(format!("empty server command for {language}"));
            }
        }
        for pattern in &self.ignore_patterns {
            glob::Pattern::new(pattern)
                .map_err(|e| format!("invalid ignore pattern {pattern:?}: {e}"))?;
        }
        Ok(())
    }
}

/// Language server command line per language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerCommands {
    pub typescript: String,
    pub ocaml: String,
}

impl Default for ServerCommands {
    fn default() -> Self {
        Self {
            typescript: "typescript-language-server --stdio".to_string(),
            ocaml: "ocamllsp".to_string(),
        }
    }
}

impl ServerCommands {
    pub fn for_language(&self, language: Language) -> &str {
        match language {
            Language::TypeScript => &self.typescript,
            Language::OCaml => &self.ocaml,
        }
    }
}
