//! Loading package metadata from repository files.

use std::{fs, path::Path};

use sift_config::config::Config;
use tracing::{debug, warn};

use crate::{
    error::{ErrorContext, RegistryError, Result},
    package::RemotePackage,
};

/// Parses a JSON array of package records.
///
/// `source` names the repository in error messages. Disabled records are
/// kept; the pool builder decides what to skip.
///
/// # Errors
///
/// Returns [`RegistryError::EmptyMetadata`] for blank input and
/// [`RegistryError::JsonError`] for anything that is not a package array.
pub fn parse_metadata(source: &str, content: &[u8]) -> Result<Vec<RemotePackage>> {
    if content.iter().all(u8::is_ascii_whitespace) {
        return Err(RegistryError::EmptyMetadata(source.to_string()));
    }
    Ok(serde_json::from_slice(content)?)
}

/// Reads and parses a metadata file.
pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<Vec<RemotePackage>> {
    let path = path.as_ref();
    let content =
        fs::read(path).with_context(|| format!("reading metadata file {}", path.display()))?;

    let packages = parse_metadata(&path.display().to_string(), &content)?;
    debug!(
        path = %path.display(),
        count = packages.len(),
        "loaded repository metadata"
    );
    Ok(packages)
}

/// Loads every enabled repository of `config`, in configuration order.
///
/// A repository whose metadata file does not exist is skipped with a
/// warning; any other failure aborts loading.
pub fn load_repositories(config: &Config) -> Result<Vec<(String, Vec<RemotePackage>)>> {
    let mut loaded = Vec::new();

    for repo in config.enabled_repositories() {
        let path = repo.get_path()?;
        if !path.exists() {
            warn!(
                "Metadata for repository '{}' not found at {}",
                repo.name,
                path.display()
            );
            continue;
        }

        let packages = load_metadata(&path)?;
        loaded.push((repo.name.clone(), packages));
    }

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use sift_config::repository::Repository;
    use tempfile::tempdir;

    use super::*;

    const METADATA: &str = r#"[
        { "name": "pkg", "version": "1.2", "release": "3", "arch": "x86_64" },
        { "name": "pkg", "version": "1.2", "release": "3", "arch": "src" }
    ]"#;

    #[test]
    fn test_parse_metadata() {
        let packages = parse_metadata("main", METADATA.as_bytes()).unwrap();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[1].arch, "src");
    }

    #[test]
    fn test_parse_empty_metadata() {
        assert!(matches!(
            parse_metadata("main", b"  \n"),
            Err(RegistryError::EmptyMetadata(name)) if name == "main"
        ));
        assert!(matches!(
            parse_metadata("main", b"{}"),
            Err(RegistryError::JsonError(_))
        ));
    }

    #[test]
    fn test_load_metadata_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_metadata(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, RegistryError::IoError { .. }));
    }

    #[test]
    fn test_load_repositories() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("main.json");
        fs::write(&main, METADATA).unwrap();

        let mut config = Config::default_config();
        config.repositories = vec![
            Repository::new("main", main.to_string_lossy()),
            Repository::new("missing", dir.path().join("nope.json").to_string_lossy()),
        ];
        let mut disabled = Repository::new("disabled", main.to_string_lossy());
        disabled.enabled = Some(false);
        config.repositories.push(disabled);

        let loaded = load_repositories(&config).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, "main");
        assert_eq!(loaded[0].1.len(), 2);
    }
}
