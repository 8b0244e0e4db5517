use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{LazyLock, RwLock},
};

use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};
use sift_utils::path::xdg_config_home;
use toml_edit::DocumentMut;
use tracing::{debug, info};

use crate::{
    annotations::{annotate_toml_array_of_tables, annotate_toml_table},
    error::{ConfigError, Result},
    repository::Repository,
};

/// Application's configuration
#[derive(Clone, Debug, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Config {
    /// List of repositories loaded into the package pool.
    pub repositories: Vec<Repository>,

    /// Search description and url in addition to name and summary.
    /// Every pattern may match on its own when enabled.
    /// Default: false
    pub search_all: Option<bool>,

    /// Keep every version of a package in search results instead of the latest only.
    /// Default: false
    pub show_duplicates: Option<bool>,

    /// Limits the number of packages printed by a search.
    /// Default: 20
    pub search_limit: Option<usize>,

    /// Match package specs case-insensitively.
    /// Default: false
    pub ignore_case: Option<bool>,

    /// Resolve package specs against provides when no NEVRA form matches.
    /// Default: true
    pub with_provides: Option<bool>,

    /// Resolve path-like package specs against file lists.
    /// Default: true
    pub with_filenames: Option<bool>,

    /// Resolve plain package specs as binaries in /usr/bin and /usr/sbin.
    /// Default: true
    pub with_binaries: Option<bool>,

    /// Include source packages when resolving NEVRA forms.
    /// Default: true
    pub with_src: Option<bool>,
}

pub static CONFIG: LazyLock<RwLock<Option<Config>>> = LazyLock::new(|| RwLock::new(None));

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var("SIFT_CONFIG") {
        Ok(path_str) => PathBuf::from(path_str),
        Err(_) => xdg_config_home().join("sift").join("config.toml"),
    })
});

pub fn init() -> Result<()> {
    let config = Config::new()?;
    let mut global_config = CONFIG.write().unwrap();
    *global_config = Some(config);
    Ok(())
}

pub fn get_config() -> Config {
    {
        let config_guard = CONFIG.read().unwrap();
        if let Some(config) = config_guard.as_ref() {
            return config.clone();
        }
    }

    let mut config_guard = CONFIG.write().unwrap();
    config_guard.get_or_insert_with(Config::default_config).clone()
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            repositories: vec![Repository::new(
                "main",
                "$XDG_DATA_HOME/sift/repos/main.json",
            )],
            search_all: Some(false),
            show_duplicates: Some(false),
            search_limit: Some(20),
            ignore_case: Some(false),
            with_provides: Some(true),
            with_filenames: Some(true),
            with_binaries: Some(true),
            with_src: Some(true),
        }
    }

    /// Creates a new configuration by loading it from [`CONFIG_PATH`].
    /// If the configuration file is not found, it uses the default configuration.
    pub fn new() -> Result<Self> {
        let config_path = CONFIG_PATH.read().unwrap().to_path_buf();
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config not found, using defaults");
                Self::default_config()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;

        Ok(config)
    }

    pub fn resolve(&mut self) -> Result<()> {
        self.search_all.get_or_insert(false);
        self.show_duplicates.get_or_insert(false);
        self.search_limit.get_or_insert(20);
        self.ignore_case.get_or_insert(false);
        self.with_provides.get_or_insert(true);
        self.with_filenames.get_or_insert(true);
        self.with_binaries.get_or_insert(true);
        self.with_src.get_or_insert(true);

        let mut seen_repos = HashSet::new();

        for repo in &mut self.repositories {
            if repo.name.trim().is_empty() {
                return Err(ConfigError::EmptyRepositoryName);
            }
            if repo.path.trim().is_empty() {
                return Err(ConfigError::EmptyRepositoryPath(repo.name.clone()));
            }
            if !seen_repos.insert(&repo.name) {
                return Err(ConfigError::DuplicateRepositoryName(repo.name.clone()));
            }

            repo.enabled.get_or_insert(true);
        }

        Ok(())
    }

    pub fn get_repository(&self, repo_name: &str) -> Option<&Repository> {
        self.repositories
            .iter()
            .find(|repo| repo.name == repo_name && repo.is_enabled())
    }

    pub fn enabled_repositories(&self) -> impl Iterator<Item = &Repository> {
        self.repositories.iter().filter(|repo| repo.is_enabled())
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;

        annotate_toml_table::<Config>(doc.as_table_mut(), true)?;

        if let Some(repositories_item) = doc.get_mut("repositories") {
            if let Some(repositories_array) = repositories_item.as_array_of_tables_mut() {
                annotate_toml_array_of_tables::<Repository>(repositories_array)?;
            }
        }

        Ok(doc)
    }
}

pub fn generate_default_config() -> Result<()> {
    let config_path = CONFIG_PATH.read().unwrap().to_path_buf();
    write_default_config(&config_path)
}

/// Writes the annotated default configuration to `path`, refusing to overwrite.
pub fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(ConfigError::ConfigAlreadyExists);
    }

    let annotated_doc = Config::default_config().to_annotated_document()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, annotated_doc.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        path.display()
    );
    Ok(())
}
