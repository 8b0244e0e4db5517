//! Chainable package filtering over a [`Pool`].
//!
//! A [`MetadataQuery`] owns a selection of entity ids and narrows it with
//! each filter call. Patterns passed to one call are OR-ed together; the
//! result is AND-ed with the current selection. Negated comparators remove
//! their matches instead.
//!
//! ```ignore
//! let mut query = MetadataQuery::new(&pool);
//! query
//!     .filter_name(&["pkg*"], QueryCmp::Glob)?
//!     .filter_arch(&["x86_64", "noarch"], QueryCmp::Eq)?
//!     .filter_latest_evr(1);
//! ```

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    fmt,
};

use sift_utils::pattern::is_glob_pattern;
use tracing::{debug, trace};

use crate::{
    entity_set::{EntityId, EntitySet},
    error::SiftError,
    evr::{rpmvercmp, Evr},
    nevra::{Form, Nevra},
    package::Package,
    pool::Pool,
    reldep::Reldep,
    SiftResult,
};

pub mod cmp;
mod latest;
mod matcher;
mod resolve;

pub use cmp::{Field, QueryCmp};
pub use latest::LatestGroup;
pub use resolve::{Resolution, ResolveSpecSettings};

use matcher::Matcher;

/// A selection of packages from one pool.
///
/// Cloning copies the selection, so clones can be filtered independently.
#[derive(Clone)]
pub struct MetadataQuery<'p> {
    pool: &'p dyn Pool,
    selection: EntitySet,
}

/// Dependency pattern: a name matcher plus the version range of the pattern.
struct DepPattern {
    name: Matcher,
    reldep: Reldep,
}

impl DepPattern {
    fn new(pattern: &str, cmp: QueryCmp) -> SiftResult<Self> {
        Self::from_reldep(Reldep::parse(pattern)?, cmp)
    }

    fn from_reldep(reldep: Reldep, cmp: QueryCmp) -> SiftResult<Self> {
        let name = Matcher::new(cmp, &reldep.name).ok_or_else(|| {
            SiftError::malformed(reldep.to_string(), "unsupported dependency comparison")
        })?;
        Ok(Self { name, reldep })
    }

    fn matches(&self, dep: &Reldep) -> bool {
        self.name.matches(&dep.name) && self.reldep.ranges_overlap(dep)
    }
}

fn ordering_holds(cmp: QueryCmp, order: Ordering) -> bool {
    match cmp {
        QueryCmp::Gt => order == Ordering::Greater,
        QueryCmp::Gte => order != Ordering::Less,
        QueryCmp::Lt => order == Ordering::Less,
        QueryCmp::Lte => order != Ordering::Greater,
        _ => order == Ordering::Equal,
    }
}

fn is_plain_version(pattern: &str) -> bool {
    !pattern.is_empty() && !pattern.contains(char::is_whitespace)
}

impl<'p> MetadataQuery<'p> {
    /// Query selecting every package in `pool`.
    pub fn new(pool: &'p dyn Pool) -> Self {
        Self {
            pool,
            selection: EntitySet::full(pool.len()),
        }
    }

    /// Query selecting nothing.
    pub fn empty(pool: &'p dyn Pool) -> Self {
        Self {
            pool,
            selection: EntitySet::new(pool.len()),
        }
    }

    /// Query over an existing selection.
    ///
    /// # Errors
    ///
    /// [`SiftError::Incompatible`] if the set was not sized for `pool`.
    pub fn from_set(pool: &'p dyn Pool, selection: EntitySet) -> SiftResult<Self> {
        if selection.capacity() != pool.len() {
            return Err(SiftError::Incompatible(format!(
                "set capacity {} does not match pool size {}",
                selection.capacity(),
                pool.len()
            )));
        }
        Ok(Self { pool, selection })
    }

    pub fn pool(&self) -> &'p dyn Pool {
        self.pool
    }

    pub fn len(&self) -> usize {
        self.selection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selection.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.selection.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.selection.iter()
    }

    /// Selected packages in id order.
    pub fn packages(&self) -> impl Iterator<Item = &'p Package> + '_ {
        let pool = self.pool;
        self.selection.iter().map(move |id| pool.package(id))
    }

    pub fn selection(&self) -> &EntitySet {
        &self.selection
    }

    pub fn into_selection(self) -> EntitySet {
        self.selection
    }

    /// Keeps (or, when `negate`, drops) the selected packages `predicate` accepts.
    fn retain_matching<F>(&mut self, negate: bool, mut predicate: F)
    where
        F: FnMut(&Package) -> bool,
    {
        let pool = self.pool;
        let mut matched = EntitySet::new(self.selection.capacity());
        for id in self.selection.iter() {
            if predicate(pool.package(id)) {
                matched.set(id);
            }
        }

        if negate {
            self.selection.difference_with(&matched);
        } else {
            self.selection = matched;
        }
    }

    fn apply_matched(&mut self, cmp: QueryCmp, matched: &EntitySet) {
        if cmp.is_negated() {
            self.selection.difference_with(matched);
        } else {
            self.selection.intersect_with(matched);
        }
    }

    fn filter_strings<S, F>(
        &mut self,
        field: Field,
        patterns: &[S],
        cmp: QueryCmp,
        values: F,
    ) -> SiftResult<&mut Self>
    where
        S: AsRef<str>,
        F: Fn(&Package) -> Vec<&str>,
    {
        field.check(cmp)?;
        let matchers: Vec<Matcher> = patterns
            .iter()
            .filter_map(|p| Matcher::new(cmp, p.as_ref()))
            .collect();

        self.retain_matching(cmp.is_negated(), |pkg| {
            values(pkg)
                .into_iter()
                .any(|value| matchers.iter().any(|m| m.matches(value)))
        });

        debug!(%field, %cmp, patterns = patterns.len(), matched = self.len(), "filtered");
        Ok(self)
    }

    pub fn filter_name<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        if cmp.positive() != QueryCmp::Eq {
            return self.filter_strings(Field::Name, patterns, cmp, |p| vec![p.name.as_str()]);
        }

        let mut matched = EntitySet::new(self.selection.capacity());
        for pattern in patterns {
            for id in self.pool.ids_by_name(pattern.as_ref()) {
                matched.set(id);
            }
        }
        self.apply_matched(cmp, &matched);
        debug!(
            field = %Field::Name,
            %cmp,
            patterns = patterns.len(),
            matched = self.len(),
            "filtered by name index"
        );
        Ok(self)
    }

    pub fn filter_arch<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        self.filter_strings(Field::Arch, patterns, cmp, |p| vec![p.arch.as_str()])
    }

    pub fn filter_repo_id<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        self.filter_strings(Field::RepoId, patterns, cmp, |p| vec![p.repo_id.as_str()])
    }

    /// Packages without a source rpm never match.
    pub fn filter_sourcerpm<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        self.filter_strings(Field::Sourcerpm, patterns, cmp, |p| {
            p.source_rpm.as_deref().into_iter().collect()
        })
    }

    pub fn filter_summary<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        self.filter_strings(Field::Summary, patterns, cmp, |p| vec![p.summary.as_str()])
    }

    pub fn filter_description<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        self.filter_strings(Field::Description, patterns, cmp, |p| {
            vec![p.description.as_str()]
        })
    }

    /// Packages without a url never match.
    pub fn filter_url<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        self.filter_strings(Field::Url, patterns, cmp, |p| p.url.as_deref().into_iter().collect())
    }

    /// Matches packages owning at least one file that matches.
    pub fn filter_file<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        self.filter_strings(Field::File, patterns, cmp, |p| {
            p.files.iter().map(String::as_str).collect()
        })
    }

    pub fn filter_location<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        self.filter_strings(Field::Location, patterns, cmp, |p| vec![p.location.as_str()])
    }

    /// Epoch patterns must be integers, except for globs.
    pub fn filter_epoch<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        Field::Epoch.check(cmp)?;
        if cmp.is_glob() {
            let matchers: Vec<Matcher> = patterns
                .iter()
                .filter_map(|p| Matcher::new(cmp, p.as_ref()))
                .collect();
            self.retain_matching(cmp.is_negated(), |pkg| {
                let epoch = pkg.epoch.to_string();
                matchers.iter().any(|m| m.matches(&epoch))
            });
        } else {
            let epochs = patterns
                .iter()
                .map(|p| {
                    p.as_ref()
                        .trim()
                        .parse::<u64>()
                        .map_err(|_| {
                            SiftError::malformed(p.as_ref(), "epoch must be a non-negative integer")
                        })
                })
                .collect::<SiftResult<Vec<u64>>>()?;
            let positive = cmp.positive();
            self.retain_matching(cmp.is_negated(), |pkg| {
                epochs
                    .iter()
                    .any(|epoch| ordering_holds(positive, pkg.epoch.cmp(epoch)))
            });
        }

        debug!(field = %Field::Epoch, %cmp, matched = self.len(), "filtered");
        Ok(self)
    }

    fn filter_version_part<S, F>(
        &mut self,
        field: Field,
        patterns: &[S],
        cmp: QueryCmp,
        value: F,
    ) -> SiftResult<&mut Self>
    where
        S: AsRef<str>,
        F: Fn(&Package) -> &str,
    {
        field.check(cmp)?;
        if cmp.is_glob() {
            return self.filter_strings(field, patterns, cmp, |p| vec![value(p)]);
        }

        let patterns: Vec<&str> = patterns.iter().map(AsRef::as_ref).collect();
        if let Some(bad) = patterns.iter().find(|p| !is_plain_version(p)) {
            return Err(SiftError::malformed(*bad, "expected a version string"));
        }

        let positive = cmp.positive();
        self.retain_matching(cmp.is_negated(), |pkg| {
            patterns
                .iter()
                .any(|pattern| ordering_holds(positive, rpmvercmp(value(pkg), pattern)))
        });

        debug!(%field, %cmp, matched = self.len(), "filtered");
        Ok(self)
    }

    /// Compares versions with rpm ordering; `1.02` equals `1.2`.
    pub fn filter_version<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        self.filter_version_part(Field::Version, patterns, cmp, |p| p.version.as_str())
    }

    pub fn filter_release<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        self.filter_version_part(Field::Release, patterns, cmp, |p| p.release.as_str())
    }

    /// Patterns are `[epoch:]version[-release]`. A pattern without release
    /// sorts before every release of the same version.
    pub fn filter_evr<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        Field::Evr.check(cmp)?;
        let evrs = patterns
            .iter()
            .map(|p| Evr::parse(p.as_ref()))
            .collect::<SiftResult<Vec<Evr>>>()?;

        let positive = cmp.positive();
        self.retain_matching(cmp.is_negated(), |pkg| {
            let evr = pkg.evr();
            evrs.iter().any(|other| ordering_holds(positive, evr.cmp(other)))
        });

        debug!(field = %Field::Evr, %cmp, matched = self.len(), "filtered");
        Ok(self)
    }

    /// Filters on the whole `name-[epoch:]version-release.arch` string.
    ///
    /// Exact comparison treats a missing epoch in the pattern as `0`, and a
    /// non-zero epoch in the pattern never matches an epoch-0 package.
    /// Globs are matched against `name-epoch:version-release.arch` when the
    /// pattern contains `:`, and against `name-version-release.arch`
    /// otherwise. Ordering comparators compare EVRs of packages with the
    /// same name and arch.
    pub fn filter_nevra<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        Field::Nevra.check(cmp)?;
        let positive = cmp.positive();

        match positive {
            QueryCmp::Eq => {
                let targets: Vec<(Nevra, String)> = patterns
                    .iter()
                    .filter_map(|p| parse_strict_nevra(p.as_ref()))
                    .collect();
                self.retain_matching(cmp.is_negated(), |pkg| {
                    targets.iter().any(|(nevra, evr)| {
                        pkg.name == nevra.name && pkg.arch == nevra.arch && pkg.evr_string() == *evr
                    })
                });
            }
            QueryCmp::Gt | QueryCmp::Gte | QueryCmp::Lt | QueryCmp::Lte => {
                let targets = patterns
                    .iter()
                    .map(|p| {
                        let p = p.as_ref();
                        let nevra = Nevra::parse(p, &[Form::Nevra])?.pop().ok_or_else(|| {
                            SiftError::malformed(p, "expected name-[epoch:]version-release.arch")
                        })?;
                        let epoch = match nevra.epoch.as_str() {
                            "" => 0,
                            e => e.parse::<u64>().map_err(|_| {
                                SiftError::malformed(p, "epoch must be a non-negative integer")
                            })?,
                        };
                        let evr = Evr::new(epoch, nevra.version.as_str(), nevra.release.as_str());
                        Ok((nevra, evr))
                    })
                    .collect::<SiftResult<Vec<(Nevra, Evr)>>>()?;

                self.retain_matching(false, |pkg| {
                    targets.iter().any(|(nevra, evr)| {
                        pkg.name == nevra.name
                            && pkg.arch == nevra.arch
                            && ordering_holds(positive, pkg.evr().cmp(evr))
                    })
                });
            }
            QueryCmp::IExact => {
                let matchers: Vec<Matcher> = patterns
                    .iter()
                    .filter_map(|p| Matcher::new(cmp, p.as_ref()))
                    .collect();
                self.retain_matching(cmp.is_negated(), |pkg| {
                    let nevra = pkg.nevra();
                    matchers.iter().any(|m| m.matches(&nevra))
                });
            }
            _ => {
                let matchers: Vec<(bool, Matcher)> = patterns
                    .iter()
                    .filter_map(|p| {
                        let p = p.as_ref();
                        Matcher::new(cmp, p).map(|m| (p.contains(':'), m))
                    })
                    .collect();
                self.retain_matching(cmp.is_negated(), |pkg| {
                    let without_epoch =
                        format!("{}-{}-{}.{}", pkg.name, pkg.version, pkg.release, pkg.arch);
                    let with_epoch = pkg.full_nevra();
                    matchers.iter().any(|(has_epoch, m)| {
                        if *has_epoch {
                            m.matches(&with_epoch)
                        } else {
                            m.matches(&without_epoch)
                        }
                    })
                });
            }
        }

        debug!(field = %Field::Nevra, %cmp, matched = self.len(), "filtered");
        Ok(self)
    }

    /// Filters on each present part of `nevra`; absent parts are not tested.
    ///
    /// Source packages are dropped unless `with_src` is set.
    pub fn filter_nevra_parts(
        &mut self,
        nevra: &Nevra,
        cmp: QueryCmp,
        with_src: bool,
    ) -> SiftResult<&mut Self> {
        let part = |value: &str| -> SiftResult<Option<Matcher>> {
            if value.is_empty() {
                return Ok(None);
            }
            Matcher::new(cmp, value)
                .map(Some)
                .ok_or(SiftError::UnsupportedComparator {
                    field: Field::Nevra,
                    cmp,
                })
        };

        let name = part(&nevra.name)?;
        let epoch = part(&nevra.epoch)?;
        let version = part(&nevra.version)?;
        let release = part(&nevra.release)?;
        let arch = part(&nevra.arch)?;

        let test = |matcher: &Option<Matcher>, value: &str| {
            matcher.as_ref().map_or(true, |m| m.matches(value))
        };

        self.retain_matching(cmp.is_negated(), |pkg| {
            (with_src || !pkg.is_source())
                && test(&name, &pkg.name)
                && test(&epoch, &pkg.epoch.to_string())
                && test(&version, &pkg.version)
                && test(&release, &pkg.release)
                && test(&arch, &pkg.arch)
        });

        trace!(%nevra, %cmp, matched = self.len(), "filtered nevra parts");
        Ok(self)
    }

    fn filter_dependency<S, F>(
        &mut self,
        field: Field,
        patterns: &[S],
        cmp: QueryCmp,
        deps: F,
    ) -> SiftResult<&mut Self>
    where
        S: AsRef<str>,
        F: Fn(&Package) -> &[Reldep],
    {
        field.check(cmp)?;
        let dep_patterns = patterns
            .iter()
            .map(|p| DepPattern::new(p.as_ref(), cmp))
            .collect::<SiftResult<Vec<_>>>()?;

        self.retain_matching(cmp.is_negated(), |pkg| {
            deps(pkg)
                .iter()
                .any(|dep| dep_patterns.iter().any(|p| p.matches(dep)))
        });

        debug!(%field, %cmp, patterns = patterns.len(), matched = self.len(), "filtered");
        Ok(self)
    }

    /// Keeps packages providing any of the dependency expressions.
    ///
    /// Exact patterns go through [`Pool::what_provides`]; globs match
    /// provide names.
    pub fn filter_provides<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        Field::Provides.check(cmp)?;
        if cmp.positive() == QueryCmp::Eq || !patterns.iter().any(|p| is_glob_pattern(p.as_ref())) {
            let reldeps = patterns
                .iter()
                .map(|p| Reldep::parse(p.as_ref()))
                .collect::<SiftResult<Vec<_>>>()?;
            let mut matched = EntitySet::new(self.selection.capacity());
            for reldep in &reldeps {
                matched.union_with(&self.pool.what_provides(reldep));
            }
            self.apply_matched(cmp, &matched);
            debug!(field = %Field::Provides, %cmp, matched = self.len(), "filtered");
            return Ok(self);
        }
        self.filter_dependency(Field::Provides, patterns, cmp, |p| p.provides.as_slice())
    }

    pub fn filter_requires<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        self.filter_dependency(Field::Requires, patterns, cmp, |p| p.requires.as_slice())
    }

    pub fn filter_conflicts<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        self.filter_dependency(Field::Conflicts, patterns, cmp, |p| p.conflicts.as_slice())
    }

    pub fn filter_obsoletes<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        self.filter_dependency(Field::Obsoletes, patterns, cmp, |p| p.obsoletes.as_slice())
    }

    /// Dispatches to the filter for `field`.
    pub fn filter<S: AsRef<str>>(
        &mut self,
        field: Field,
        patterns: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        match field {
            Field::Name => self.filter_name(patterns, cmp),
            Field::Arch => self.filter_arch(patterns, cmp),
            Field::RepoId => self.filter_repo_id(patterns, cmp),
            Field::Sourcerpm => self.filter_sourcerpm(patterns, cmp),
            Field::Epoch => self.filter_epoch(patterns, cmp),
            Field::Version => self.filter_version(patterns, cmp),
            Field::Release => self.filter_release(patterns, cmp),
            Field::Evr => self.filter_evr(patterns, cmp),
            Field::Nevra => self.filter_nevra(patterns, cmp),
            Field::Summary => self.filter_summary(patterns, cmp),
            Field::Description => self.filter_description(patterns, cmp),
            Field::Url => self.filter_url(patterns, cmp),
            Field::File => self.filter_file(patterns, cmp),
            Field::Location => self.filter_location(patterns, cmp),
            Field::Provides => self.filter_provides(patterns, cmp),
            Field::Requires => self.filter_requires(patterns, cmp),
            Field::Conflicts => self.filter_conflicts(patterns, cmp),
            Field::Obsoletes => self.filter_obsoletes(patterns, cmp),
        }
    }

    /// Keeps packages whose name appears (or, with `Neq`, does not appear) in `other`.
    pub fn filter_name_in(
        &mut self,
        other: &MetadataQuery<'_>,
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        self.check_same_pool(other)?;
        if !matches!(cmp, QueryCmp::Eq | QueryCmp::Neq) {
            return Err(SiftError::UnsupportedComparator {
                field: Field::Name,
                cmp,
            });
        }

        let names: HashSet<&str> = other.packages().map(|p| p.name.as_str()).collect();
        self.retain_matching(cmp.is_negated(), |pkg| names.contains(pkg.name.as_str()));
        Ok(self)
    }

    /// Like [`Self::filter_name_in`], keyed on name and arch.
    pub fn filter_name_arch_in(
        &mut self,
        other: &MetadataQuery<'_>,
        cmp: QueryCmp,
    ) -> SiftResult<&mut Self> {
        self.check_same_pool(other)?;
        if !matches!(cmp, QueryCmp::Eq | QueryCmp::Neq) {
            return Err(SiftError::UnsupportedComparator {
                field: Field::Nevra,
                cmp,
            });
        }

        let keys: HashSet<(&str, &str)> = other
            .packages()
            .map(|p| (p.name.as_str(), p.arch.as_str()))
            .collect();
        self.retain_matching(cmp.is_negated(), |pkg| {
            keys.contains(&(pkg.name.as_str(), pkg.arch.as_str()))
        });
        Ok(self)
    }

    /// Keeps packages sharing name and arch with a selected package of a different EVR.
    pub fn filter_duplicates(&mut self) -> &mut Self {
        let pool = self.pool;
        let mut groups: HashMap<(&str, &str), Vec<(EntityId, Evr)>> = HashMap::new();
        for pkg_id in self.selection.iter() {
            let pkg = pool.package(pkg_id);
            groups
                .entry((pkg.name.as_str(), pkg.arch.as_str()))
                .or_default()
                .push((pkg_id, pkg.evr()));
        }

        let mut kept = EntitySet::new(self.selection.capacity());
        for members in groups.values() {
            let first = &members[0].1;
            if members.iter().any(|(_, evr)| evr != first) {
                for (pkg_id, _) in members {
                    kept.set(*pkg_id);
                }
            }
        }

        self.selection = kept;
        debug!(matched = self.len(), "filtered duplicates");
        self
    }

    fn check_same_pool(&self, other: &MetadataQuery<'_>) -> SiftResult<()> {
        if self.pool.identity() != other.pool.identity() {
            return Err(SiftError::Incompatible(
                "queries were built from different pools".into(),
            ));
        }
        Ok(())
    }

    fn check_capacity(&self, set: &EntitySet) -> SiftResult<()> {
        if set.capacity() != self.pool.len() {
            return Err(SiftError::Incompatible(format!(
                "set capacity {} does not match pool size {}",
                set.capacity(),
                self.pool.len()
            )));
        }
        Ok(())
    }

    pub fn union(&mut self, other: &MetadataQuery<'_>) -> SiftResult<&mut Self> {
        self.check_same_pool(other)?;
        self.selection.union_with(&other.selection);
        Ok(self)
    }

    pub fn intersection(&mut self, other: &MetadataQuery<'_>) -> SiftResult<&mut Self> {
        self.check_same_pool(other)?;
        self.selection.intersect_with(&other.selection);
        Ok(self)
    }

    pub fn difference(&mut self, other: &MetadataQuery<'_>) -> SiftResult<&mut Self> {
        self.check_same_pool(other)?;
        self.selection.difference_with(&other.selection);
        Ok(self)
    }

    pub fn union_set(&mut self, set: &EntitySet) -> SiftResult<&mut Self> {
        self.check_capacity(set)?;
        self.selection.union_with(set);
        Ok(self)
    }

    pub fn intersect_set(&mut self, set: &EntitySet) -> SiftResult<&mut Self> {
        self.check_capacity(set)?;
        self.selection.intersect_with(set);
        Ok(self)
    }

    pub fn difference_set(&mut self, set: &EntitySet) -> SiftResult<&mut Self> {
        self.check_capacity(set)?;
        self.selection.difference_with(set);
        Ok(self)
    }
}

/// Parses an exact NEVRA pattern into its name/arch and the EVR string a
/// matching package must have. A zero epoch is dropped.
fn parse_strict_nevra(pattern: &str) -> Option<(Nevra, String)> {
    let nevra = Nevra::parse(pattern, &[Form::Nevra]).ok()?.pop()?;
    let epoch = match nevra.epoch.as_str() {
        "" | "0" => String::new(),
        e => format!("{e}:"),
    };
    let evr = format!("{epoch}{}-{}", nevra.version, nevra.release);
    Some((nevra, evr))
}

impl fmt::Debug for MetadataQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataQuery")
            .field("pool", &self.pool.identity())
            .field("selection", &self.selection)
            .finish()
    }
}
