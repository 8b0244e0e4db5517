use std::path::PathBuf;

use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};
use sift_utils::path::resolve_path;

use crate::error::Result;

/// Defines a repository whose metadata is loaded into the package pool.
#[derive(Clone, Debug, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Repository {
    /// Unique name of the repository.
    pub name: String,

    /// Path to the repository's JSON metadata file.
    /// Environment variables and `~` are expanded.
    pub path: String,

    /// Whether the repository is enabled.
    /// Default: true
    pub enabled: Option<bool>,
}

impl Repository {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            enabled: Some(true),
        }
    }

    pub fn get_path(&self) -> Result<PathBuf> {
        Ok(resolve_path(&self.path)?)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_enabled_default() {
        let mut repo = Repository::new("main", "/srv/main.json");
        assert!(repo.is_enabled());

        repo.enabled = None;
        assert!(repo.is_enabled());

        repo.enabled = Some(false);
        assert!(!repo.is_enabled());
    }

    #[test]
    fn test_repository_absolute_path() {
        let repo = Repository::new("main", "/srv/main.json");
        assert_eq!(repo.get_path().unwrap(), PathBuf::from("/srv/main.json"));
    }

    #[test]
    fn test_repository_empty_path_fails() {
        let repo = Repository::new("main", "");
        assert!(repo.get_path().is_err());
    }
}
