//! Relevance-ranked package search.
//!
//! Every pattern is matched against a fixed set of weighted fields. Each
//! matching field leaves a mark on the package's [`Priority`], and packages
//! with the same marks are returned together, best group first.

use std::{collections::HashMap, fmt};

use serde::{Serialize, Serializer};
use sift_config::config::Config;
use sift_utils::pattern::is_glob_pattern;
use tracing::debug;

use crate::{
    entity_set::EntitySet,
    pool::Pool,
    query::{Field, MetadataQuery, QueryCmp},
    SiftResult,
};

/// Package attribute searched by [`SearchRanker`], in descending weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Name,
    Summary,
    Description,
    Url,
}

impl SearchField {
    pub const ALL: [SearchField; 4] = [
        SearchField::Name,
        SearchField::Summary,
        SearchField::Description,
        SearchField::Url,
    ];

    /// Weight bit of a partial match. The bit above it marks an exact match.
    pub fn weight(self) -> u32 {
        match self {
            SearchField::Name => 1 << 6,
            SearchField::Summary => 1 << 4,
            SearchField::Description => 1 << 2,
            SearchField::Url => 1 << 0,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SearchField::Name => "name",
            SearchField::Summary => "summary",
            SearchField::Description => "description",
            SearchField::Url => "url",
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SearchField> for Field {
    fn from(field: SearchField) -> Self {
        match field {
            SearchField::Name => Field::Name,
            SearchField::Summary => Field::Summary,
            SearchField::Description => Field::Description,
            SearchField::Url => Field::Url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMatch {
    Exact,
    Partial,
}

/// Per-field record of how a package matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Priority {
    partial: [bool; 4],
    exact: [bool; 4],
}

impl Priority {
    pub fn mark(&mut self, field: SearchField, key_match: KeyMatch) {
        match key_match {
            KeyMatch::Partial => self.partial[field.index()] = true,
            KeyMatch::Exact => self.exact[field.index()] = true,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Single-integer form: each field's weight for a partial match and
    /// the weight shifted left by one for an exact match.
    pub fn packed(&self) -> u32 {
        SearchField::ALL
            .into_iter()
            .map(|field| {
                let mut bits = 0;
                if self.partial[field.index()] {
                    bits |= field.weight();
                }
                if self.exact[field.index()] {
                    bits |= field.weight() << 1;
                }
                bits
            })
            .fold(0, |acc, bits| acc | bits)
    }

    pub fn from_packed(packed: u32) -> Self {
        let mut priority = Self::default();
        for field in SearchField::ALL {
            if packed & field.weight() != 0 {
                priority.mark(field, KeyMatch::Partial);
            }
            if packed & (field.weight() << 1) != 0 {
                priority.mark(field, KeyMatch::Exact);
            }
        }
        priority
    }

    /// Fields that matched, heaviest first. An exact match hides the partial one.
    pub fn matched_fields(&self) -> Vec<(SearchField, KeyMatch)> {
        SearchField::ALL
            .into_iter()
            .filter_map(|field| {
                if self.exact[field.index()] {
                    Some((field, KeyMatch::Exact))
                } else if self.partial[field.index()] {
                    Some((field, KeyMatch::Partial))
                } else {
                    None
                }
            })
            .collect()
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.packed().cmp(&other.packed())
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.packed())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchOptions {
    /// Also search description and url; any pattern may match on its own.
    pub search_all: bool,
    /// Search every version instead of the latest per name and arch.
    pub show_duplicates: bool,
}

impl SearchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            search_all: config.search_all.unwrap_or(false),
            show_duplicates: config.show_duplicates.unwrap_or(false),
        }
    }

    pub fn fields(&self) -> &'static [SearchField] {
        let all: &'static [SearchField] = &SearchField::ALL;
        if self.search_all {
            all
        } else {
            &all[..2]
        }
    }
}

/// Packages sharing one priority.
#[derive(Debug, Clone)]
pub struct SearchGroup {
    pub matched_fields: Vec<(SearchField, KeyMatch)>,
    pub priority: Priority,
    pub entities: EntitySet,
}

#[derive(Debug, Clone)]
pub struct SearchResults {
    /// Best group first.
    pub groups: Vec<SearchGroup>,
    pub patterns: Vec<String>,
    pub options: SearchOptions,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.entities.len()).sum()
    }
}

pub struct SearchRanker<'p> {
    pool: &'p dyn Pool,
    options: SearchOptions,
}

impl<'p> SearchRanker<'p> {
    pub fn new(pool: &'p dyn Pool, options: SearchOptions) -> Self {
        Self { pool, options }
    }

    /// Searches for `patterns` and groups the matches by priority.
    ///
    /// Patterns with glob metacharacters are matched as case-insensitive
    /// globs, anything else as a case-insensitive substring. With a single
    /// non-glob pattern, fields equal to the pattern also get an exact mark.
    /// Without `search_all` every pattern must match.
    pub fn search<S: AsRef<str>>(&self, patterns: &[S]) -> SiftResult<SearchResults> {
        let mut base = MetadataQuery::new(self.pool);
        if !self.options.show_duplicates {
            base.filter_latest_evr(1);
        }

        let mut priorities = vec![Priority::default(); self.pool.len()];
        let mut all_matches = EntitySet::new(self.pool.len());

        for (i, pattern) in patterns.iter().enumerate() {
            let pattern = pattern.as_ref();
            let glob = is_glob_pattern(pattern);
            let cmp = if glob {
                QueryCmp::IGlob
            } else {
                QueryCmp::IContains
            };

            let mut pattern_matches = EntitySet::new(self.pool.len());
            for &field in self.options.fields() {
                let mut contains = base.clone();
                contains.filter(field.into(), &[pattern], cmp)?;
                for id in contains.iter() {
                    priorities[id].mark(field, KeyMatch::Partial);
                }

                if patterns.len() == 1 && !glob {
                    let mut exact = contains.clone();
                    exact.filter(field.into(), &[pattern], QueryCmp::Eq)?;
                    for id in exact.iter() {
                        priorities[id].mark(field, KeyMatch::Exact);
                    }
                }

                pattern_matches.union_with(contains.selection());
            }

            if i == 0 || self.options.search_all {
                all_matches.union_with(&pattern_matches);
            } else {
                all_matches.intersect_with(&pattern_matches);
            }
            debug!(pattern, %cmp, matched = pattern_matches.len(), "search pattern");
        }

        let mut grouped: HashMap<Priority, EntitySet> = HashMap::new();
        for id in all_matches.iter() {
            grouped
                .entry(priorities[id])
                .or_insert_with(|| EntitySet::new(self.pool.len()))
                .set(id);
        }

        let mut groups: Vec<SearchGroup> = grouped
            .into_iter()
            .map(|(priority, entities)| SearchGroup {
                matched_fields: priority.matched_fields(),
                priority,
                entities,
            })
            .collect();
        groups.sort_by(|a, b| b.priority.cmp(&a.priority));

        debug!(
            patterns = patterns.len(),
            groups = groups.len(),
            matched = all_matches.len(),
            "search finished"
        );

        Ok(SearchResults {
            groups,
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            options: self.options,
        })
    }
}
