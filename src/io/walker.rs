use crate::core::{Error, Language, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

pub struct FileWalker {
    root: PathBuf,
    languages: Vec<Language>,
    ignore_patterns: Vec<String>,
    excluded: Vec<PathBuf>,
    include_hidden: bool,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            languages: vec![Language::TypeScript, Language::OCaml],
            ignore_patterns: vec![],
            excluded: vec![],
            include_hidden: true,
        }
    }

    pub fn with_languages(mut self, languages: Vec<Language>) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Skip these exact paths, e.g. generated documents.
    pub fn with_excluded(mut self, paths: Vec<PathBuf>) -> Self {
        self.excluded = paths;
        self
    }

    pub fn with_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// All matching files under the root, sorted.
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let patterns = self
            .ignore_patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(!self.include_hidden)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = entry.map_err(|e| Error::file_system(e.to_string(), &self.root))?;
            let path = entry.path();

            if path.is_file() && self.should_process(path, &patterns) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    fn should_process(&self, path: &Path, patterns: &[glob::Pattern]) -> bool {
        let Some(language) = Language::from_path(path) else {
            return false;
        };
        if !self.languages.contains(&language) || self.excluded.iter().any(|e| e == path) {
            return false;
        }

        let path_str = path.to_string_lossy();
        !patterns.iter().any(|p| p.matches(&path_str))
    }
}

/// Source files of `language` under `root`.
pub fn find_source_files(root: &Path, language: Language) -> Result<Vec<PathBuf>> {
    FileWalker::new(root.to_path_buf())
        .with_languages(vec![language])
        .walk()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("prelude.ts"), "type A = number;").unwrap();
        fs::write(dir.path().join("sketch.ts"), "const x = _();").unwrap();
        fs::write(dir.path().join("injected_sketch.ts"), "").unwrap();
        fs::write(dir.path().join("prelude.ml"), "type t = int").unwrap();
        fs::write(dir.path().join("README.md"), "# p").unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib").join("util.ts"), "").unwrap();
        dir
    }

    fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_find_source_files_by_language() {
        let dir = project();
        let files = find_source_files(dir.path(), Language::TypeScript).unwrap();
        assert_eq!(
            names(&files, dir.path()),
            vec!["injected_sketch.ts", "lib/util.ts", "prelude.ts", "sketch.ts"]
        );

        let files = find_source_files(dir.path(), Language::OCaml).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["prelude.ml"]);
    }

    #[test]
    fn test_excluded_and_ignored_paths() {
        let dir = project();
        let files = FileWalker::new(dir.path().to_path_buf())
            .with_languages(vec![Language::TypeScript])
            .with_excluded(vec![dir.path().join("injected_sketch.ts")])
            .with_ignore_patterns(vec!["**/lib/**".to_string()])
            .walk()
            .unwrap();
        assert_eq!(names(&files, dir.path()), vec!["prelude.ts", "sketch.ts"]);
    }

    #[test]
    fn test_invalid_ignore_pattern_is_error() {
        let dir = project();
        let result = FileWalker::new(dir.path().to_path_buf())
            .with_ignore_patterns(vec!["[".to_string()])
            .walk();
        assert!(result.is_err());
    }
}
