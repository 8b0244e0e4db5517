use miette::Diagnostic;
use sift_utils::error::PathError;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(sift_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(sift_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists")]
    #[diagnostic(
        code(sift_config::already_exists),
        help("Remove the existing config file or use a different location")
    )]
    ConfigAlreadyExists,

    #[error("Repository name cannot be empty")]
    #[diagnostic(
        code(sift_config::empty_repo_name),
        help("Give every [[repositories]] entry a name")
    )]
    EmptyRepositoryName,

    #[error("Repository '{0}' has no metadata path")]
    #[diagnostic(
        code(sift_config::empty_repo_path),
        help("Point `path` at the repository's JSON metadata file")
    )]
    EmptyRepositoryPath(String),

    #[error("Duplicate repository name: {0}")]
    #[diagnostic(
        code(sift_config::duplicate_repo),
        help("Each repository must have a unique name")
    )]
    DuplicateRepositoryName(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(sift_config::io))]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(sift_config::path))]
    Path(#[from] PathError),

    #[error("Failed to parse TOML: {0}")]
    #[diagnostic(code(sift_config::toml))]
    Toml(#[from] toml_edit::TomlError),

    #[error("Encountered unexpected TOML item: {0}")]
    #[diagnostic(code(sift_config::unexpected_toml_item))]
    UnexpectedTomlItem(String),

    #[error("Failed to annotate first table in array: {0}")]
    #[diagnostic(code(sift_config::annotate_first_table))]
    AnnotateFirstTable(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
