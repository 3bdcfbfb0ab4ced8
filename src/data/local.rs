//! Local-filesystem resource provider.

use std::path::{Path, PathBuf};

use crate::data::provider::ResourceProvider;
use crate::error::AppError;

/// Serves `*.csv` files from one directory.
pub struct LocalDirProvider {
    dir: PathBuf,
}

impl LocalDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ResourceProvider for LocalDirProvider {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn list(&self) -> Result<Vec<String>, AppError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            AppError::usage(format!(
                "Failed to read data directory '{}': {e}",
                self.dir.display()
            ))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| AppError::usage(format!("Failed to list data directory: {e}")))?;
            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if is_csv && path.is_file() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn fetch(&self, name: &str) -> Result<Vec<u8>, AppError> {
        // Resources live in the data directory; roster candidates may also
        // be given as paths relative to the working directory (or absolute).
        let in_dir = self.dir.join(name);
        let path = if in_dir.is_file() {
            in_dir
        } else if Path::new(name).is_file() {
            PathBuf::from(name)
        } else {
            return Err(AppError::usage(format!("No such resource: '{name}'")));
        };
        std::fs::read(&path)
            .map_err(|e| AppError::usage(format!("Failed to read '{}': {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn lists_only_csv_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), b"x").unwrap();
        fs::write(dir.path().join("a.CSV"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let provider = LocalDirProvider::new(dir.path());
        assert_eq!(provider.list().unwrap(), vec!["a.CSV", "b.csv"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let provider = LocalDirProvider::new("/definitely/not/here");
        assert!(provider.list().is_err());
    }

    #[test]
    fn fetch_reads_from_the_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.csv"), b"hello").unwrap();

        let provider = LocalDirProvider::new(dir.path());
        assert_eq!(provider.fetch("x.csv").unwrap(), b"hello");
        assert!(provider.fetch("missing.csv").is_err());
    }

    #[test]
    fn fetch_accepts_absolute_paths_outside_the_directory() {
        let data_dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let roster = other.path().join("Nomina.txt");
        fs::write(&roster, b"00011\tBanco X\tBX").unwrap();

        let provider = LocalDirProvider::new(data_dir.path());
        assert_eq!(
            provider.fetch(roster.to_str().unwrap()).unwrap(),
            b"00011\tBanco X\tBX"
        );
    }
}
