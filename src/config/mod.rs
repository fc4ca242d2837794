//! Extractor configuration.
//!
//! Settings come from the nearest `.context-extractor.toml`; command-line
//! flags override them.

mod core;
mod loader;

pub use self::core::{ExtractorConfig, ServerCommands, CONFIG_FILE_NAME};
pub use loader::{directory_ancestors, load_config, load_config_from, parse_and_validate_config};
