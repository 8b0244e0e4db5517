//! Pattern helpers shared by the query engine and the CLI.

use regex::{Regex, RegexBuilder};

/// Returns true if `pattern` contains any glob metacharacter (`*`, `?`, `[`).
///
/// # Examples
///
/// ```
/// use sift_utils::pattern::is_glob_pattern;
///
/// assert!(is_glob_pattern("lib*"));
/// assert!(is_glob_pattern("pk?"));
/// assert!(!is_glob_pattern("kernel-core"));
/// ```
pub fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Returns true if `pattern` looks like a file path rather than a package spec.
///
/// Absolute paths qualify, as do globs starting with `*/`.
pub fn is_file_pattern(pattern: &str) -> bool {
    pattern.starts_with('/') || pattern.starts_with("*/")
}

/// A compiled shell-style glob.
///
/// Follows `fnmatch(3)` without `FNM_PATHNAME`: `*` and `?` also match `/`.
/// `[...]` classes accept `!` or `^` for negation, and `\` escapes the next
/// character.
///
/// # Examples
///
/// ```
/// use sift_utils::pattern::GlobPattern;
///
/// let glob = GlobPattern::new("*/bin/*").unwrap();
/// assert!(glob.is_match("/usr/bin/ls"));
/// ```
#[derive(Debug, Clone)]
pub struct GlobPattern {
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Self::build(pattern, false)
    }

    pub fn new_icase(pattern: &str) -> Result<Self, regex::Error> {
        Self::build(pattern, true)
    }

    fn build(pattern: &str, icase: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&glob_to_regex(pattern))
            .case_insensitive(icase)
            .dot_matches_new_line(true)
            .build()?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' if i + 1 < chars.len() => {
                i += 1;
                push_literal(&mut out, chars[i]);
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    push_class(&mut out, &chars[i + 1..end]);
                    i = end;
                }
                None => push_literal(&mut out, '['),
            },
            c => push_literal(&mut out, c),
        }
        i += 1;
    }

    out.push('$');
    out
}

/// Index of the `]` closing the class opened at `start`, if any.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if matches!(chars.get(i), Some('!') | Some('^')) {
        i += 1;
    }
    // a leading ']' is a member, not the terminator
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    chars[i.min(chars.len())..]
        .iter()
        .position(|&c| c == ']')
        .map(|offset| i + offset)
}

fn push_class(out: &mut String, body: &[char]) {
    out.push('[');
    let mut body = body;
    if let Some(('!' | '^', rest)) = body.split_first() {
        out.push('^');
        body = rest;
    }
    for &c in body {
        match c {
            '\\' | '[' | ']' | '&' | '~' | '^' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(']');
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

/// Case-insensitive substring test. `needle` is expected to be lowercased already.
pub fn contains_icase(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glob_match(pattern: &str, candidate: &str) -> bool {
        GlobPattern::new(pattern).unwrap().is_match(candidate)
    }

    fn glob_match_icase(pattern: &str, candidate: &str) -> bool {
        GlobPattern::new_icase(pattern).unwrap().is_match(candidate)
    }

    #[test]
    fn test_is_glob_pattern() {
        assert!(is_glob_pattern("*"));
        assert!(is_glob_pattern("pkg-[0-9]"));
        assert!(is_glob_pattern("pk?.x86_64"));
        assert!(!is_glob_pattern("pkg-1.2-3.x86_64"));
        assert!(!is_glob_pattern(""));
    }

    #[test]
    fn test_is_file_pattern() {
        assert!(is_file_pattern("/usr/bin/ls"));
        assert!(is_file_pattern("*/bin/ls"));
        assert!(!is_file_pattern("ls"));
        assert!(!is_file_pattern("bin/ls"));
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("pk?-1.*", "pkg-1.2"));
        assert!(glob_match("x8[0-9]_64", "x86_64"));
        assert!(!glob_match("Pkg*", "pkg"));
        assert!(!glob_match("pkg", "pkg-libs"));
        assert!(glob_match_icase("Pkg*", "pkg-libs"));
        assert!(glob_match_icase("*LIBS", "pkg-libs"));
    }

    #[test]
    fn test_glob_crosses_slashes() {
        assert!(glob_match("*example.com*", "https://example.com/pkg"));
        assert!(glob_match("*/bin/pkg", "/usr/bin/pkg"));
        assert!(glob_match("/usr/?in/pkg", "/usr/bin/pkg"));
        assert!(glob_match("/usr*", "/usr/lib64/libpkg.so.1"));
        assert!(!glob_match("*/sbin/pkg", "/usr/bin/pkg"));
    }

    #[test]
    fn test_glob_classes_and_literals() {
        assert!(glob_match("pkg-[!0-9]*", "pkg-libs"));
        assert!(!glob_match("pkg-[!0-9]*", "pkg-1"));
        assert!(glob_match("pkg-[^0-9]*", "pkg-libs"));
        assert!(glob_match("[]x]", "]"));
        assert!(glob_match("lib.so.[12]", "lib.so.2"));
        assert!(!glob_match("lib.so", "libxso"));
        assert!(glob_match("a\\*b", "a*b"));
        assert!(!glob_match("a\\*b", "axb"));
        assert!(glob_match("pkg[", "pkg["));
        assert!(glob_match("(a|b)+", "(a|b)+"));
    }

    #[test]
    fn test_compiled_glob() {
        let glob = GlobPattern::new_icase("*/BIN/*").unwrap();
        assert!(glob.is_match("/usr/bin/tool"));
        assert!(!glob.is_match("/usr/sbin"));
        assert!(GlobPattern::new("[z-a]").is_err());
    }

    #[test]
    fn test_contains_icase() {
        assert!(contains_icase("Package Manager", "manager"));
        assert!(!contains_icase("Package Manager", "solver"));
    }
}
