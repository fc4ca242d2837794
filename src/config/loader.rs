use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::{ExtractorConfig, CONFIG_FILE_NAME};
use tracing::{debug, warn};

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Pure function to read config file contents
pub(crate) fn read_config_file(path: &Path) -> Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Pure function to parse and validate config from TOML string
pub fn parse_and_validate_config(contents: &str) -> Result<ExtractorConfig, String> {
    let config = toml::from_str::<ExtractorConfig>(contents)
        .map_err(|e| format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))?;
    config.validate()?;
    Ok(config)
}

/// Pure function to try loading config from a specific path
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<ExtractorConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            warn!("{}. Using defaults.", e);
            None
        }
    }
}

/// Handle file read errors with appropriate logging
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // "not found" is the normal case while walking up
    if error.kind() != std::io::ErrorKind::NotFound {
        warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Load the nearest config file at or above `start`.
pub fn load_config_from(start: &Path) -> ExtractorConfig {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            ExtractorConfig::default()
        })
}

/// Load the nearest config file at or above the current directory.
pub fn load_config() -> ExtractorConfig {
    match std::env::current_dir() {
        Ok(dir) => load_config_from(&dir),
        Err(e) => {
            warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            ExtractorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Language;
    use indoc::indoc;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let config = parse_and_validate_config(indoc! {r#"
            language = "ocaml"
            ignore_patterns = ["**/vendor/**"]
            include_hidden = false

            [server_command]
            ocaml = "opam exec -- ocamllsp"
        "#})
        .unwrap();

        assert_eq!(config.language, Some(Language::OCaml));
        assert_eq!(config.ignore_patterns, vec!["**/vendor/**"]);
        assert!(!config.include_hidden);
        assert_eq!(
            config.server_command.for_language(Language::OCaml),
            "opam exec -- ocamllsp"
        );
        assert_eq!(
            config.server_command.for_language(Language::TypeScript),
            "typescript-language-server --stdio"
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(parse_and_validate_config("language = \"cobol\"").is_err());
        assert!(parse_and_validate_config("ignore_patterns = [\"[\"]").is_err());
        assert!(parse_and_validate_config("[server_command]\ntypescript = \" \"").is_err());
    }

    #[test]
    fn test_directory_ancestors_respects_depth() {
        let ancestors: Vec<PathBuf> = directory_ancestors(PathBuf::from("/a/b/c/d"), 3).collect();
        assert_eq!(
            ancestors,
            vec![
                PathBuf::from("/a/b/c/d"),
                PathBuf::from("/a/b/c"),
                PathBuf::from("/a/b")
            ]
        );
    }

    #[test]
    fn test_load_config_from_parent_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "language = \"typescript\"\n",
        )
        .unwrap();
        let nested = dir.path().join("src").join("todo");
        fs::create_dir_all(&nested).unwrap();

        let config = load_config_from(&nested);
        assert_eq!(config.language, Some(Language::TypeScript));
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "language = [").unwrap();
        assert_eq!(load_config_from(dir.path()), ExtractorConfig::default());
    }
}
