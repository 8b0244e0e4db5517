use std::{error::Error, fmt};

#[derive(Debug)]
pub enum PathError {
    CurrentDir { source: std::io::Error },

    Empty,

    MissingEnvVar { var: String, input: String },

    UnclosedVariable { input: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Empty => write!(f, "Path is empty"),
            PathError::CurrentDir { source } => {
                write!(f, "Failed to get current directory: {source}")
            }
            PathError::UnclosedVariable { input } => {
                write!(f, "Unclosed variable expression starting at `{input}`")
            }
            PathError::MissingEnvVar { var, input } => {
                write!(f, "Environment variable `{var}` not set in `{input}`")
            }
        }
    }
}

impl Error for PathError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PathError::CurrentDir { source } => Some(source),
            _ => None,
        }
    }
}

pub type PathResult<T> = std::result::Result<T, PathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_error_display() {
        assert_eq!(PathError::Empty.to_string(), "Path is empty");

        let err = PathError::MissingEnvVar {
            var: "SIFT_ROOT".into(),
            input: "$SIFT_ROOT/repo.json".into(),
        };
        assert_eq!(
            err.to_string(),
            "Environment variable `SIFT_ROOT` not set in `$SIFT_ROOT/repo.json`"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_current_dir_error_has_source() {
        let err = PathError::CurrentDir {
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.source().is_some());
    }
}
