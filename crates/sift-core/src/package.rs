use serde::Serialize;

use crate::{evr::Evr, reldep::Reldep};

/// A package held by a pool.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Package {
    pub name: String,
    pub epoch: u64,
    pub version: String,
    pub release: String,
    pub arch: String,
    pub repo_id: String,
    pub summary: String,
    pub description: String,
    pub url: Option<String>,
    pub location: String,
    pub checksum: Option<String>,
    pub source_rpm: Option<String>,
    pub files: Vec<String>,
    pub provides: Vec<Reldep>,
    pub requires: Vec<Reldep>,
    pub conflicts: Vec<Reldep>,
    pub obsoletes: Vec<Reldep>,
}

impl Package {
    pub fn evr(&self) -> Evr {
        Evr::new(self.epoch, self.version.clone(), self.release.clone())
    }

    /// `version-release`, prefixed with `epoch:` when the epoch is not zero.
    pub fn evr_string(&self) -> String {
        self.evr().to_string()
    }

    /// `name-[epoch:]version-release.arch`, omitting a zero epoch.
    pub fn nevra(&self) -> String {
        format!("{}-{}.{}", self.name, self.evr_string(), self.arch)
    }

    /// `name-epoch:version-release.arch`, always with an epoch.
    pub fn full_nevra(&self) -> String {
        let evr = Evr::new(0, self.version.as_str(), self.release.as_str());
        format!("{}-{}:{evr}.{}", self.name, self.epoch, self.arch)
    }

    pub fn is_source(&self) -> bool {
        self.arch == "src" || self.arch == "nosrc"
    }
}
