//! The package pool queries read from.
//!
//! [`Pool`] is the boundary between the query engine and wherever package
//! metadata lives. [`PackagePool`] is the in-memory implementation built
//! from repository metadata.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use sift_registry::RemotePackage;
use tracing::{debug, trace, warn};

use crate::{
    entity_set::{EntityId, EntitySet},
    package::Package,
    reldep::{DepOp, Reldep},
};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a pool instance; sets and queries from different pools never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId(u64);

impl PoolId {
    pub fn next() -> Self {
        Self(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Read-only package store.
///
/// Entity ids are `0..len()`. Implementations must not change while queries
/// built on them are alive.
pub trait Pool {
    fn identity(&self) -> PoolId;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Package behind `id`. Panics if `id >= len()`.
    fn package(&self, id: EntityId) -> &Package;

    fn ids_by_name(&self, name: &str) -> Vec<EntityId> {
        (0..self.len())
            .filter(|&id| self.package(id).name == name)
            .collect()
    }

    /// Packages with a provide intersecting `reldep`.
    fn what_provides(&self, reldep: &Reldep) -> EntitySet {
        let mut result = EntitySet::new(self.len());
        for id in 0..self.len() {
            if self
                .package(id)
                .provides
                .iter()
                .any(|provide| provide.intersects(reldep))
            {
                result.set(id);
            }
        }
        result
    }
}

/// In-memory pool with name and provide indexes.
pub struct PackagePool {
    id: PoolId,
    packages: Vec<Package>,
    by_name: HashMap<String, Vec<EntityId>>,
    by_provide: HashMap<String, Vec<EntityId>>,
}

#[derive(Default)]
pub struct PackagePoolBuilder {
    packages: Vec<Package>,
}

impl PackagePoolBuilder {
    pub fn add_package(&mut self, package: Package) -> &mut Self {
        self.packages.push(package);
        self
    }

    pub fn build(&mut self) -> PackagePool {
        PackagePool::new(std::mem::take(&mut self.packages))
    }
}

impl PackagePool {
    pub fn builder() -> PackagePoolBuilder {
        PackagePoolBuilder::default()
    }

    /// Builds a pool, giving every binary package its implicit
    /// `name = epoch:version-release` provide.
    pub fn new(mut packages: Vec<Package>) -> Self {
        let mut by_name: HashMap<String, Vec<EntityId>> = HashMap::new();
        let mut by_provide: HashMap<String, Vec<EntityId>> = HashMap::new();

        for (id, package) in packages.iter_mut().enumerate() {
            if !package.is_source() {
                let self_provide =
                    Reldep::versioned(package.name.clone(), DepOp::Eq, package.evr());
                if !package.provides.contains(&self_provide) {
                    package.provides.push(self_provide);
                }
            }

            by_name.entry(package.name.clone()).or_default().push(id);
            for provide in &package.provides {
                let ids = by_provide.entry(provide.name.clone()).or_default();
                if ids.last() != Some(&id) {
                    ids.push(id);
                }
            }
        }

        debug!(
            packages = packages.len(),
            names = by_name.len(),
            provides = by_provide.len(),
            "built package pool"
        );

        Self {
            id: PoolId::next(),
            packages,
            by_name,
            by_provide,
        }
    }

    /// Builds a pool from `(repo_id, records)` pairs, skipping disabled records.
    ///
    /// Rich dependencies such as `(foo if bar)` are kept verbatim as
    /// unversioned names. Other dependency strings that do not parse are
    /// dropped with a warning.
    pub fn from_repositories<I>(repositories: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<RemotePackage>)>,
    {
        let mut packages = Vec::new();
        for (repo_id, records) in repositories {
            for record in records {
                if record.is_disabled() {
                    trace!(repo = repo_id, name = record.name, "skipping disabled package");
                    continue;
                }
                packages.push(package_from_remote(&repo_id, record));
            }
        }
        Self::new(packages)
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }
}

fn parse_deps(repo_id: &str, package: &str, deps: Vec<String>) -> Vec<Reldep> {
    deps.into_iter()
        .filter_map(|dep| {
            let trimmed = dep.trim();
            if trimmed.starts_with('(') {
                return Some(Reldep::unversioned(trimmed));
            }
            match Reldep::parse(trimmed) {
                Ok(reldep) => Some(reldep),
                Err(err) => {
                    warn!(
                        repo = repo_id,
                        package,
                        dependency = trimmed,
                        "skipping malformed dependency: {err}"
                    );
                    None
                }
            }
        })
        .collect()
}

fn package_from_remote(repo_id: &str, record: RemotePackage) -> Package {
    let deps = |deps: Vec<String>| parse_deps(repo_id, &record.name, deps);
    Package {
        epoch: record.epoch.unwrap_or(0),
        provides: deps(record.provides),
        requires: deps(record.requires),
        conflicts: deps(record.conflicts),
        obsoletes: deps(record.obsoletes),
        name: record.name,
        version: record.version,
        release: record.release,
        arch: record.arch,
        repo_id: repo_id.to_string(),
        summary: record.summary,
        description: record.description,
        url: record.url,
        location: record.location,
        checksum: record.checksum,
        source_rpm: record.source_rpm,
        files: record.files,
    }
}

impl Pool for PackagePool {
    fn identity(&self) -> PoolId {
        self.id
    }

    fn len(&self) -> usize {
        self.packages.len()
    }

    fn package(&self, id: EntityId) -> &Package {
        &self.packages[id]
    }

    fn ids_by_name(&self, name: &str) -> Vec<EntityId> {
        self.by_name.get(name).cloned().unwrap_or_default()
    }

    fn what_provides(&self, reldep: &Reldep) -> EntitySet {
        let mut result = EntitySet::new(self.len());
        for &id in self.by_provide.get(&reldep.name).into_iter().flatten() {
            if self.packages[id]
                .provides
                .iter()
                .any(|provide| provide.intersects(reldep))
            {
                result.set(id);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixture_pool;

    #[test]
    fn test_pool_ids_are_unique() {
        let a = PackagePool::new(Vec::new());
        let b = PackagePool::new(Vec::new());
        assert_ne!(a.identity(), b.identity());
        assert!(a.is_empty());
    }

    #[test]
    fn test_self_provides_skip_source() {
        let pool = fixture_pool();
        let src = pool
            .packages()
            .iter()
            .find(|p| p.name == "pkg" && p.arch == "src")
            .unwrap();
        assert!(src.provides.iter().all(|p| p.name != "pkg"));

        let bin = pool
            .packages()
            .iter()
            .find(|p| p.name == "pkg" && p.arch == "x86_64")
            .unwrap();
        assert!(bin.provides.contains(&Reldep::parse("pkg = 1.2-3").unwrap()));
    }

    #[test]
    fn test_what_provides_index_matches_scan() {
        struct Scan<'a>(&'a PackagePool);
        impl Pool for Scan<'_> {
            fn identity(&self) -> PoolId {
                self.0.identity()
            }
            fn len(&self) -> usize {
                self.0.len()
            }
            fn package(&self, id: EntityId) -> &Package {
                self.0.package(id)
            }
        }

        let pool = fixture_pool();
        for spec in ["pkg >= 1", "pkg", "libpkg.so.1", "pkg < 1", "nothing"] {
            let dep = Reldep::parse(spec).unwrap();
            assert_eq!(pool.what_provides(&dep), Scan(&pool).what_provides(&dep), "{spec}");
        }
        assert_eq!(pool.ids_by_name("pkg"), Scan(&pool).ids_by_name("pkg"));
    }

    #[test]
    fn test_from_repositories() {
        let records = vec![
            RemotePackage {
                name: "tool".into(),
                version: "2.0".into(),
                release: "1".into(),
                arch: "x86_64".into(),
                requires: vec!["libc.so.6".into(), "pkg >= 1.0".into()],
                ..Default::default()
            },
            RemotePackage {
                name: "old".into(),
                version: "0.1".into(),
                arch: "noarch".into(),
                disabled: Some(true),
                ..Default::default()
            },
        ];

        let pool = PackagePool::from_repositories([("main".to_string(), records)]);
        assert_eq!(pool.len(), 1);
        let tool = pool.package(0);
        assert_eq!(tool.repo_id, "main");
        assert_eq!(tool.requires.len(), 2);
        assert_eq!(tool.provides, vec![Reldep::parse("tool = 2.0-1").unwrap()]);
    }

    #[test]
    fn test_from_repositories_keeps_rich_and_skips_malformed_deps() {
        let records = vec![RemotePackage {
            name: "editor".into(),
            version: "1".into(),
            release: "1".into(),
            arch: "x86_64".into(),
            requires: vec![
                "(editor-data if desktop)".into(),
                "pkg >=".into(),
                "libc.so.6".into(),
            ],
            ..Default::default()
        }];

        let pool = PackagePool::from_repositories([("main".to_string(), records)]);
        assert_eq!(pool.len(), 1);
        assert_eq!(
            pool.package(0).requires,
            vec![
                Reldep::unversioned("(editor-data if desktop)"),
                Reldep::unversioned("libc.so.6"),
            ]
        );
    }
}
