use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use super::MetadataQuery;
use crate::{entity_set::EntityId, evr::Evr, package::Package};

/// Grouping key used when reducing a selection to its newest or oldest versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatestGroup {
    #[default]
    NameArch,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Newest,
    Oldest,
}

struct Entry<'p> {
    id: EntityId,
    package: &'p Package,
    evr: Evr,
}

impl LatestGroup {
    fn same_group(self, a: &Package, b: &Package) -> bool {
        a.name == b.name && (self == LatestGroup::Name || a.arch == b.arch)
    }

    fn cmp(self, a: &Package, b: &Package) -> Ordering {
        let order = a.name.cmp(&b.name);
        match self {
            LatestGroup::NameArch => order.then_with(|| a.arch.cmp(&b.arch)),
            LatestGroup::Name => order,
        }
    }
}

/// Whether the entry at distinct-EVR position `rank` survives `limit`.
fn keeps(rank: usize, limit: i64) -> bool {
    match limit {
        0 => rank == 0,
        l if l > 0 => (rank as u64) < l.unsigned_abs(),
        l => (rank as u64) >= l.unsigned_abs(),
    }
}

impl MetadataQuery<'_> {
    /// Keeps the `limit` newest EVRs per name and arch.
    ///
    /// All packages sharing a kept EVR stay. A negative `limit` drops the
    /// newest `|limit|` EVRs instead and keeps the rest, so groups with no
    /// more than `|limit|` EVRs disappear. `0` behaves like `1`.
    pub fn filter_latest_evr(&mut self, limit: i64) -> &mut Self {
        self.reduce_by_evr(LatestGroup::NameArch, Direction::Newest, limit)
    }

    /// [`Self::filter_latest_evr`] grouping by name only.
    pub fn filter_latest_evr_any_arch(&mut self, limit: i64) -> &mut Self {
        self.reduce_by_evr(LatestGroup::Name, Direction::Newest, limit)
    }

    /// Keeps the `limit` oldest EVRs per name and arch.
    pub fn filter_earliest_evr(&mut self, limit: i64) -> &mut Self {
        self.reduce_by_evr(LatestGroup::NameArch, Direction::Oldest, limit)
    }

    pub fn filter_earliest_evr_any_arch(&mut self, limit: i64) -> &mut Self {
        self.reduce_by_evr(LatestGroup::Name, Direction::Oldest, limit)
    }

    pub fn filter_latest_evr_by(&mut self, group: LatestGroup, limit: i64) -> &mut Self {
        self.reduce_by_evr(group, Direction::Newest, limit)
    }

    fn reduce_by_evr(&mut self, group: LatestGroup, direction: Direction, limit: i64) -> &mut Self {
        let pool = self.pool;
        let mut entries: Vec<Entry<'_>> = self
            .selection
            .iter()
            .map(|id| {
                let package = pool.package(id);
                Entry {
                    id,
                    package,
                    evr: package.evr(),
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            group
                .cmp(a.package, b.package)
                .then_with(|| match direction {
                    Direction::Newest => b.evr.cmp(&a.evr),
                    Direction::Oldest => a.evr.cmp(&b.evr),
                })
                .then(a.id.cmp(&b.id))
        });

        self.selection.clear();
        for block in entries.chunk_by(|a, b| group.same_group(a.package, b.package)) {
            let mut rank = 0;
            for (i, entry) in block.iter().enumerate() {
                if i > 0 && entry.evr != block[i - 1].evr {
                    rank += 1;
                }
                if keeps(rank, limit) {
                    self.selection.set(entry.id);
                }
            }
        }

        debug!(?group, ?direction, limit, matched = self.len(), "reduced by evr");
        self
    }
}
