use sift_utils::pattern::{contains_icase, is_glob_pattern, GlobPattern};

use super::cmp::QueryCmp;

/// A string pattern bound to one of the non-ordering comparators.
#[derive(Debug, Clone)]
pub(crate) enum Matcher {
    Exact(String),
    IExact(String),
    Glob(GlobPattern),
    IGlob(GlobPattern),
    Contains(String),
    IContains(String),
}

impl Matcher {
    /// Builds a matcher for the positive form of `cmp`.
    ///
    /// Glob comparators whose pattern has no metacharacter become exact
    /// comparisons. Returns `None` for ordering comparators and for globs
    /// that do not compile, which therefore match nothing.
    pub(crate) fn new(cmp: QueryCmp, pattern: &str) -> Option<Self> {
        let glob = is_glob_pattern(pattern);
        let matcher = match cmp.positive() {
            QueryCmp::Eq => Matcher::Exact(pattern.to_string()),
            QueryCmp::IExact => Matcher::IExact(pattern.to_lowercase()),
            QueryCmp::Glob if glob => Matcher::Glob(GlobPattern::new(pattern).ok()?),
            QueryCmp::Glob => Matcher::Exact(pattern.to_string()),
            QueryCmp::IGlob if glob => Matcher::IGlob(GlobPattern::new_icase(pattern).ok()?),
            QueryCmp::IGlob => Matcher::IExact(pattern.to_lowercase()),
            QueryCmp::Contains => Matcher::Contains(pattern.to_string()),
            QueryCmp::IContains => Matcher::IContains(pattern.to_lowercase()),
            _ => return None,
        };
        Some(matcher)
    }

    pub(crate) fn matches(&self, value: &str) -> bool {
        match self {
            Matcher::Exact(p) => value == p,
            Matcher::IExact(p) => value.to_lowercase() == *p,
            Matcher::Glob(glob) | Matcher::IGlob(glob) => glob.is_match(value),
            Matcher::Contains(p) => value.contains(p.as_str()),
            Matcher::IContains(p) => contains_icase(value, p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_without_metachar_is_exact() {
        let m = Matcher::new(QueryCmp::Glob, "pkg").unwrap();
        assert!(matches!(m, Matcher::Exact(_)));
        assert!(m.matches("pkg"));
        assert!(!m.matches("pkg-libs"));

        let m = Matcher::new(QueryCmp::NotIGlob, "PKG").unwrap();
        assert!(m.matches("pkg"));
    }

    #[test]
    fn test_matchers() {
        assert!(Matcher::new(QueryCmp::Glob, "pkg*").unwrap().matches("pkg-libs"));
        assert!(Matcher::new(QueryCmp::IGlob, "PKG*").unwrap().matches("pkg-libs"));
        assert!(Matcher::new(QueryCmp::Contains, "lib").unwrap().matches("pkg-libs"));
        assert!(!Matcher::new(QueryCmp::Contains, "LIB").unwrap().matches("pkg-libs"));
        assert!(Matcher::new(QueryCmp::IContains, "LIB").unwrap().matches("pkg-libs"));
        assert!(Matcher::new(QueryCmp::IExact, "Pkg").unwrap().matches("pKG"));
        assert!(Matcher::new(QueryCmp::Gt, "1").is_none());
    }

    #[test]
    fn test_glob_spans_path_separators() {
        let m = Matcher::new(QueryCmp::Glob, "*/bin/pkg").unwrap();
        assert!(m.matches("/usr/bin/pkg"));
        assert!(!m.matches("/usr/bin/pkg-libs"));

        let m = Matcher::new(QueryCmp::IGlob, "*EXAMPLE.COM/*").unwrap();
        assert!(m.matches("https://example.com/pkg"));

        assert!(Matcher::new(QueryCmp::Glob, "[z-a]*").is_none());
    }
}
