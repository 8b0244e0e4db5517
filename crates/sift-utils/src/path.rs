use std::{
    env,
    iter::Peekable,
    path::PathBuf,
    str::Chars,
};

use crate::error::{PathError, PathResult};

/// Returns the user's home directory from `$HOME`, or `/` when it is unset.
pub fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Returns `$XDG_CONFIG_HOME`, defaulting to `$HOME/.config`.
pub fn xdg_config_home() -> PathBuf {
    env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns `$XDG_DATA_HOME`, defaulting to `$HOME/.local/share`.
pub fn xdg_data_home() -> PathBuf {
    env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Resolves a path string that may contain environment variables.
///
/// `$VAR` and `${VAR}` are expanded, a leading `~` becomes the home
/// directory, and relative results are joined onto the current directory.
/// The XDG variables fall back to their defaults when unset.
///
/// # Errors
///
/// * [`PathError::Empty`] if the path is empty
/// * [`PathError::UnclosedVariable`] for a `${` without a closing brace
/// * [`PathError::MissingEnvVar`] if a referenced variable is undefined
/// * [`PathError::CurrentDir`] if the current directory cannot be determined
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    let path = path.trim();
    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let expanded = PathBuf::from(expand_variables(path)?);
    if expanded.is_absolute() {
        return Ok(expanded);
    }

    env::current_dir()
        .map(|cwd| cwd.join(expanded))
        .map_err(|source| PathError::CurrentDir { source })
}

fn expand_variables(input: &str) -> PathResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '~' if out.is_empty() => out.push_str(&home_dir().to_string_lossy()),
            '$' if chars.peek() == Some(&'{') => {
                chars.next();
                let name = braced_name(&mut chars).ok_or_else(|| {
                    PathError::UnclosedVariable {
                        input: input.to_string(),
                    }
                })?;
                out.push_str(&lookup(&name, input)?);
            }
            '$' => {
                let name = bare_name(&mut chars);
                if name.is_empty() {
                    out.push('$');
                } else {
                    out.push_str(&lookup(&name, input)?);
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

fn braced_name(chars: &mut Peekable<Chars>) -> Option<String> {
    let mut name = String::new();
    for c in chars.by_ref() {
        if c == '}' {
            return Some(name);
        }
        name.push(c);
    }
    None
}

fn bare_name(chars: &mut Peekable<Chars>) -> String {
    let mut name = String::new();
    while let Some(c) = chars.next_if(|c| c.is_alphanumeric() || *c == '_') {
        name.push(c);
    }
    name
}

fn lookup(name: &str, input: &str) -> PathResult<String> {
    let value = match name {
        "HOME" => home_dir(),
        "XDG_CONFIG_HOME" => xdg_config_home(),
        "XDG_DATA_HOME" => xdg_data_home(),
        _ => {
            return env::var(name).map_err(|_| {
                PathError::MissingEnvVar {
                    var: name.to_string(),
                    input: input.to_string(),
                }
            })
        }
    };
    Ok(value.to_string_lossy().into_owned())
}
