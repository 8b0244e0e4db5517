//! Comparators and the fields they can be applied to.

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::error::SiftError;

/// How a filter pattern is compared against a package attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCmp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Glob,
    NotGlob,
    IGlob,
    NotIGlob,
    IExact,
    NotIExact,
    Contains,
    NotContains,
    IContains,
    NotIContains,
}

impl QueryCmp {
    pub const ALL: [QueryCmp; 16] = [
        QueryCmp::Eq,
        QueryCmp::Neq,
        QueryCmp::Gt,
        QueryCmp::Gte,
        QueryCmp::Lt,
        QueryCmp::Lte,
        QueryCmp::Glob,
        QueryCmp::NotGlob,
        QueryCmp::IGlob,
        QueryCmp::NotIGlob,
        QueryCmp::IExact,
        QueryCmp::NotIExact,
        QueryCmp::Contains,
        QueryCmp::NotContains,
        QueryCmp::IContains,
        QueryCmp::NotIContains,
    ];

    /// Negated comparators remove matches from the selection instead of keeping them.
    pub fn is_negated(self) -> bool {
        matches!(
            self,
            QueryCmp::Neq
                | QueryCmp::NotGlob
                | QueryCmp::NotIGlob
                | QueryCmp::NotIExact
                | QueryCmp::NotContains
                | QueryCmp::NotIContains
        )
    }

    /// The comparator with negation stripped.
    pub fn positive(self) -> Self {
        match self {
            QueryCmp::Neq => QueryCmp::Eq,
            QueryCmp::NotGlob => QueryCmp::Glob,
            QueryCmp::NotIGlob => QueryCmp::IGlob,
            QueryCmp::NotIExact => QueryCmp::IExact,
            QueryCmp::NotContains => QueryCmp::Contains,
            QueryCmp::NotIContains => QueryCmp::IContains,
            other => other,
        }
    }

    pub fn is_icase(self) -> bool {
        matches!(
            self.positive(),
            QueryCmp::IGlob | QueryCmp::IExact | QueryCmp::IContains
        )
    }

    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            QueryCmp::Gt | QueryCmp::Gte | QueryCmp::Lt | QueryCmp::Lte
        )
    }

    pub fn is_glob(self) -> bool {
        matches!(self.positive(), QueryCmp::Glob | QueryCmp::IGlob)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueryCmp::Eq => "eq",
            QueryCmp::Neq => "neq",
            QueryCmp::Gt => "gt",
            QueryCmp::Gte => "gte",
            QueryCmp::Lt => "lt",
            QueryCmp::Lte => "lte",
            QueryCmp::Glob => "glob",
            QueryCmp::NotGlob => "not_glob",
            QueryCmp::IGlob => "iglob",
            QueryCmp::NotIGlob => "not_iglob",
            QueryCmp::IExact => "iexact",
            QueryCmp::NotIExact => "not_iexact",
            QueryCmp::Contains => "contains",
            QueryCmp::NotContains => "not_contains",
            QueryCmp::IContains => "icontains",
            QueryCmp::NotIContains => "not_icontains",
        }
    }
}

impl fmt::Display for QueryCmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryCmp {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        QueryCmp::ALL
            .into_iter()
            .find(|cmp| cmp.as_str() == normalized)
            .ok_or_else(|| SiftError::malformed(s, "unknown comparator"))
    }
}

/// Package attribute a filter reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Arch,
    RepoId,
    Sourcerpm,
    Epoch,
    Version,
    Release,
    Evr,
    Nevra,
    Summary,
    Description,
    Url,
    File,
    Location,
    Provides,
    Requires,
    Conflicts,
    Obsoletes,
}

impl Field {
    /// Whether `cmp` may be used to filter on this field.
    pub fn supports(self, cmp: QueryCmp) -> bool {
        use QueryCmp::*;

        let positive = cmp.positive();
        match self {
            Field::Name => !cmp.is_ordering(),
            Field::Arch | Field::RepoId | Field::Sourcerpm => {
                matches!(positive, Eq | Glob | IGlob | IExact)
            }
            Field::Epoch | Field::Version | Field::Release => {
                matches!(positive, Eq | Gt | Gte | Lt | Lte | Glob)
            }
            Field::Evr => matches!(positive, Eq | Gt | Gte | Lt | Lte),
            Field::Nevra => matches!(positive, Eq | Gt | Gte | Lt | Lte | Glob | IGlob | IExact),
            Field::Summary | Field::Description | Field::Url | Field::File => !cmp.is_ordering(),
            Field::Location => positive == Eq,
            Field::Provides | Field::Requires | Field::Conflicts | Field::Obsoletes => {
                matches!(positive, Eq | Glob)
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Arch => "arch",
            Field::RepoId => "repo_id",
            Field::Sourcerpm => "sourcerpm",
            Field::Epoch => "epoch",
            Field::Version => "version",
            Field::Release => "release",
            Field::Evr => "evr",
            Field::Nevra => "nevra",
            Field::Summary => "summary",
            Field::Description => "description",
            Field::Url => "url",
            Field::File => "file",
            Field::Location => "location",
            Field::Provides => "provides",
            Field::Requires => "requires",
            Field::Conflicts => "conflicts",
            Field::Obsoletes => "obsoletes",
        }
    }

    pub(crate) fn check(self, cmp: QueryCmp) -> Result<(), SiftError> {
        if self.supports(cmp) {
            Ok(())
        } else {
            Err(SiftError::UnsupportedComparator { field: self, cmp })
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
