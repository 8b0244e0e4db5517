//! Error types for sift-core.

use miette::Diagnostic;
use sift_config::error::ConfigError;
use sift_registry::RegistryError;
use sift_utils::error::PathError;
use thiserror::Error;

use crate::query::{cmp::QueryCmp, Field};

/// Core error type for selection, query and search operations.
#[derive(Error, Diagnostic, Debug)]
pub enum SiftError {
    #[error("Entity id {id} is out of range for a set of capacity {capacity}")]
    #[diagnostic(
        code(sift::out_of_range),
        help("Entity ids must be smaller than the pool size")
    )]
    OutOfRange { id: usize, capacity: usize },

    #[error("Comparator '{cmp}' is not supported for field '{field}'")]
    #[diagnostic(
        code(sift::unsupported_comparator),
        help("Use one of the comparators allowed for this field")
    )]
    UnsupportedComparator { field: Field, cmp: QueryCmp },

    #[error("Malformed spec '{spec}': {reason}")]
    #[diagnostic(
        code(sift::malformed_spec),
        help(
            "Use forms like 'name', 'name.arch', 'name-[epoch:]version-release.arch' or 'name >= version'"
        )
    )]
    MalformedSpec { spec: String, reason: String },

    #[error("Incompatible operands: {0}")]
    #[diagnostic(
        code(sift::incompatible),
        help("Only combine queries and sets built from the same package pool")
    )]
    Incompatible(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    #[diagnostic(code(sift::path), help("Check the path and the variables it references"))]
    PathError(#[from] PathError),

    #[error("Error while {action}")]
    #[diagnostic(code(sift::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },
}

impl SiftError {
    pub(crate) fn malformed(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSpec {
            spec: spec.into(),
            reason: reason.into(),
        }
    }
}

/// Trait for adding context to IO errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, SiftError>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, SiftError>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            SiftError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SiftError::OutOfRange {
            id: 40,
            capacity: 32,
        };
        assert_eq!(
            err.to_string(),
            "Entity id 40 is out of range for a set of capacity 32"
        );

        let err = SiftError::UnsupportedComparator {
            field: Field::Arch,
            cmp: QueryCmp::Gt,
        };
        assert_eq!(
            err.to_string(),
            "Comparator 'gt' is not supported for field 'arch'"
        );
    }

    #[test]
    fn test_io_context() {
        let res: std::io::Result<()> = Err(std::io::Error::other("boom"));
        let err = res.with_context(|| "writing output".into()).unwrap_err();
        assert_eq!(err.to_string(), "Error while writing output");
    }
}
