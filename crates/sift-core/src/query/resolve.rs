use serde::Serialize;
use sift_config::config::Config;
use sift_utils::pattern::{is_file_pattern, is_glob_pattern};
use tracing::{debug, trace};

use super::{DepPattern, MetadataQuery, QueryCmp};
use crate::{
    entity_set::EntitySet,
    nevra::{Form, Nevra, DEFAULT_PKG_SPEC_FORMS},
    reldep::Reldep,
    SiftResult,
};

const BINARY_DIRS: [&str; 2] = ["/usr/bin/", "/usr/sbin/"];

/// Which interpretations [`MetadataQuery::resolve_pkg_spec`] may try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveSpecSettings {
    pub ignore_case: bool,
    pub with_nevra: bool,
    pub with_provides: bool,
    pub with_filenames: bool,
    pub with_binaries: bool,
    pub expand_globs: bool,
    pub with_src: bool,
    pub nevra_forms: Vec<Form>,
}

impl Default for ResolveSpecSettings {
    fn default() -> Self {
        Self {
            ignore_case: false,
            with_nevra: true,
            with_provides: true,
            with_filenames: true,
            with_binaries: true,
            expand_globs: true,
            with_src: true,
            nevra_forms: DEFAULT_PKG_SPEC_FORMS.to_vec(),
        }
    }
}

impl ResolveSpecSettings {
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            ignore_case: config.ignore_case.unwrap_or(defaults.ignore_case),
            with_provides: config.with_provides.unwrap_or(defaults.with_provides),
            with_filenames: config.with_filenames.unwrap_or(defaults.with_filenames),
            with_binaries: config.with_binaries.unwrap_or(defaults.with_binaries),
            with_src: config.with_src.unwrap_or(defaults.with_src),
            ..defaults
        }
    }
}

/// How a spec was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "nevra", rename_all = "snake_case")]
pub enum Resolution {
    /// Matched as the given parsed form.
    Nevra(Nevra),
    /// Matched as a glob over full NEVRA strings.
    NevraGlob,
    Provide,
    File,
    /// Matched `/usr/bin/<spec>` or `/usr/sbin/<spec>`.
    Binary,
    NotFound,
}

impl Resolution {
    pub fn is_match(&self) -> bool {
        !matches!(self, Resolution::NotFound)
    }
}

impl MetadataQuery<'_> {
    /// Narrows the selection to the packages `spec` names.
    ///
    /// Interpretations are tried in order and the first one matching
    /// anything wins: the NEVRA form, a glob over whole NEVRA strings, the
    /// remaining NEVRA forms, provides, file paths, and finally binaries in
    /// `/usr/bin` and `/usr/sbin`. When nothing matches the selection is
    /// cleared and [`Resolution::NotFound`] is returned.
    ///
    /// # Errors
    ///
    /// [`crate::error::SiftError::MalformedSpec`] if `spec` reaches the
    /// provide step with a comparison operator but a malformed version.
    /// Specs that are not dependency expressions at all skip that step.
    pub fn resolve_pkg_spec(
        &mut self,
        spec: &str,
        settings: &ResolveSpecSettings,
    ) -> SiftResult<Resolution> {
        let glob = settings.expand_globs && is_glob_pattern(spec);
        let cmp = match (glob, settings.ignore_case) {
            (true, true) => QueryCmp::IGlob,
            (true, false) => QueryCmp::Glob,
            (false, true) => QueryCmp::IExact,
            (false, false) => QueryCmp::Eq,
        };

        if !settings.with_src {
            self.retain_matching(true, |pkg| pkg.is_source());
        }

        if settings.with_nevra {
            if let Some(resolution) = self.resolve_nevra_forms(spec, settings, glob, cmp)? {
                return Ok(resolution);
            }
        }

        if settings.with_provides && self.narrow_by_provides(&[spec], cmp)? {
            debug!(spec, "resolved as provide");
            return Ok(Resolution::Provide);
        }

        if is_file_pattern(spec) {
            if settings.with_filenames && self.narrow_by_files(&[spec], cmp)? {
                debug!(spec, "resolved as file");
                return Ok(Resolution::File);
            }
        } else if settings.with_binaries && !spec.contains('/') {
            let paths: Vec<String> = BINARY_DIRS.iter().map(|dir| format!("{dir}{spec}")).collect();
            if self.narrow_by_provides(&paths, cmp)? || self.narrow_by_files(&paths, cmp)? {
                debug!(spec, "resolved as binary");
                return Ok(Resolution::Binary);
            }
        }

        debug!(spec, "no package matches spec");
        self.selection.clear();
        Ok(Resolution::NotFound)
    }

    fn resolve_nevra_forms(
        &mut self,
        spec: &str,
        settings: &ResolveSpecSettings,
        glob: bool,
        cmp: QueryCmp,
    ) -> SiftResult<Option<Resolution>> {
        for &form in &settings.nevra_forms {
            let candidates = match Nevra::parse(spec, &[form]) {
                Ok(candidates) => candidates,
                Err(err) => {
                    trace!(spec, %err, "not a nevra spec");
                    return Ok(None);
                }
            };

            for nevra in candidates {
                let mut candidate = self.clone();
                candidate.filter_nevra_parts(&nevra, cmp, settings.with_src)?;
                if !candidate.is_empty() {
                    debug!(spec, ?form, matched = candidate.len(), "resolved as nevra");
                    self.selection = candidate.selection;
                    return Ok(Some(Resolution::Nevra(nevra)));
                }
            }

            if form == Form::Nevra && glob {
                let mut candidate = self.clone();
                candidate.filter_nevra(&[spec], cmp)?;
                if !candidate.is_empty() {
                    debug!(spec, matched = candidate.len(), "resolved as nevra glob");
                    self.selection = candidate.selection;
                    return Ok(Some(Resolution::NevraGlob));
                }
            }
        }
        Ok(None)
    }

    /// Provide matching that accepts case-insensitive comparators.
    fn narrow_by_provides<S: AsRef<str>>(
        &mut self,
        specs: &[S],
        cmp: QueryCmp,
    ) -> SiftResult<bool> {
        let mut matched = EntitySet::new(self.selection.capacity());
        for spec in specs {
            let spec = spec.as_ref();
            let Some(reldep) = Reldep::try_parse(spec)? else {
                trace!(spec, "not a dependency expression");
                continue;
            };
            if cmp == QueryCmp::Eq {
                matched.union_with(&self.pool.what_provides(&reldep));
                continue;
            }

            let pattern = DepPattern::from_reldep(reldep, cmp)?;
            for id in self.selection.iter() {
                if self
                    .pool
                    .package(id)
                    .provides
                    .iter()
                    .any(|provide| pattern.matches(provide))
                {
                    matched.set(id);
                }
            }
        }

        matched.intersect_with(&self.selection);
        if matched.is_empty() {
            return Ok(false);
        }
        self.selection = matched;
        Ok(true)
    }

    fn narrow_by_files<S: AsRef<str>>(&mut self, paths: &[S], cmp: QueryCmp) -> SiftResult<bool> {
        let mut candidate = self.clone();
        candidate.filter_file(paths, cmp)?;
        if candidate.is_empty() {
            return Ok(false);
        }
        self.selection = candidate.selection;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::SiftError, package::Package, pool::PackagePool, test_utils::*};

    fn resolve(spec: &str, settings: &ResolveSpecSettings) -> (Resolution, Vec<String>) {
        let pool = fixture_pool();
        let mut query = MetadataQuery::new(&pool);
        let resolution = query.resolve_pkg_spec(spec, settings).unwrap();
        (resolution, query.packages().map(|p| p.nevra()).collect())
    }

    #[test]
    fn test_resolve_name_arch() {
        let (resolution, matched) = resolve("pkg.x86_64", &ResolveSpecSettings::default());
        assert_eq!(
            resolution,
            Resolution::Nevra(Nevra {
                name: "pkg".into(),
                arch: "x86_64".into(),
                ..Default::default()
            })
        );
        assert_eq!(matched, vec!["pkg-1.2-3.x86_64"]);
    }

    #[test]
    fn test_resolve_ignore_case() {
        let settings = ResolveSpecSettings {
            ignore_case: true,
            ..Default::default()
        };
        let (resolution, matched) = resolve("Pkg.x86_64", &settings);
        assert!(resolution.is_match());
        assert_eq!(matched, vec!["pkg-1.2-3.x86_64"]);

        let (resolution, _) = resolve("Pkg.x86_64", &ResolveSpecSettings::default());
        assert!(!resolution.is_match());
    }

    #[test]
    fn test_resolve_not_found_clears_selection() {
        let (resolution, matched) = resolve("doesnotexist", &ResolveSpecSettings::default());
        assert_eq!(resolution, Resolution::NotFound);
        assert!(matched.is_empty());
    }

    #[test]
    fn test_resolve_full_nevra_and_name() {
        let (_, matched) = resolve("pkg-libs-1:1.2-4.x86_64", &ResolveSpecSettings::default());
        assert_eq!(matched, vec!["pkg-libs-1:1.2-4.x86_64"]);

        let (resolution, matched) = resolve("pkg", &ResolveSpecSettings::default());
        assert_eq!(resolution, Resolution::Nevra(Nevra::from_name("pkg")));
        assert_eq!(matched, vec!["pkg-1.2-3.src", "pkg-1.2-3.x86_64"]);

        let settings = ResolveSpecSettings {
            with_src: false,
            ..Default::default()
        };
        let (_, matched) = resolve("pkg", &settings);
        assert_eq!(matched, vec!["pkg-1.2-3.x86_64"]);
    }

    #[test]
    fn test_resolve_name_version() {
        let (resolution, matched) = resolve("pkg-libs-1.3", &ResolveSpecSettings::default());
        assert!(matches!(resolution, Resolution::Nevra(ref n) if n.version == "1.3"));
        assert_eq!(matched, vec!["pkg-libs-1:1.3-4.x86_64"]);
    }

    #[test]
    fn test_resolve_glob() {
        let (resolution, matched) = resolve("pkg-lib*", &ResolveSpecSettings::default());
        assert!(resolution.is_match());
        assert_eq!(matched.len(), 3);

        let (resolution, matched) = resolve("pkg-libs-1.*.x86_64", &ResolveSpecSettings::default());
        assert_eq!(resolution, Resolution::NevraGlob);
        assert_eq!(matched.len(), 3);
    }

    #[test]
    fn test_resolve_provides_and_files() {
        let (resolution, matched) = resolve("pkg-tools", &ResolveSpecSettings::default());
        assert_eq!(resolution, Resolution::Provide);
        assert_eq!(matched, vec!["tool-2.0-1.x86_64"]);

        let (resolution, matched) = resolve("pkg >= 1", &ResolveSpecSettings::default());
        assert_eq!(resolution, Resolution::Provide);
        assert_eq!(matched, vec!["pkg-1.2-3.x86_64"]);

        let (resolution, matched) =
            resolve("/usr/lib64/libpkg.so.1", &ResolveSpecSettings::default());
        assert_eq!(resolution, Resolution::File);
        assert_eq!(matched.len(), 3);

        let settings = ResolveSpecSettings {
            with_filenames: false,
            ..Default::default()
        };
        let (resolution, _) = resolve("/usr/lib64/libpkg.so.1", &settings);
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[test]
    fn test_resolve_file_glob() {
        let (resolution, matched) = resolve("*/bin/pkg", &ResolveSpecSettings::default());
        assert_eq!(resolution, Resolution::File);
        assert_eq!(matched, vec!["pkg-1.2-3.x86_64"]);

        let (resolution, matched) = resolve("*/libpkg.so.*", &ResolveSpecSettings::default());
        assert_eq!(resolution, Resolution::File);
        assert_eq!(matched.len(), 3);
    }

    #[test]
    fn test_resolve_path_with_spaces() {
        let pool = PackagePool::new(vec![
            Package {
                files: vec!["/opt/My App/bin/run".into()],
                ..package("myapp-1.0-1.x86_64")
            },
            package("other-1.0-1.x86_64"),
        ]);
        let mut query = MetadataQuery::new(&pool);
        let resolution = query
            .resolve_pkg_spec("/opt/My App/bin/run", &ResolveSpecSettings::default())
            .unwrap();
        assert_eq!(resolution, Resolution::File);
        let matched: Vec<_> = query.packages().map(|p| p.nevra()).collect();
        assert_eq!(matched, vec!["myapp-1.0-1.x86_64"]);

        let mut query = MetadataQuery::new(&pool);
        let resolution = query
            .resolve_pkg_spec("/opt/Other App/bin/run", &ResolveSpecSettings::default())
            .unwrap();
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[test]
    fn test_resolve_binaries() {
        let (resolution, matched) = resolve("toold", &ResolveSpecSettings::default());
        assert_eq!(resolution, Resolution::Binary);
        assert_eq!(matched, vec!["tool-2.0-1.x86_64"]);

        let settings = ResolveSpecSettings {
            with_binaries: false,
            ..Default::default()
        };
        assert_eq!(resolve("toold", &settings).0, Resolution::NotFound);
    }

    #[test]
    fn test_resolve_respects_disabled_forms() {
        let settings = ResolveSpecSettings {
            with_nevra: false,
            with_provides: false,
            with_binaries: false,
            ..Default::default()
        };
        assert_eq!(resolve("pkg", &settings).0, Resolution::NotFound);

        let settings = ResolveSpecSettings {
            nevra_forms: vec![Form::Nevra],
            with_provides: false,
            ..Default::default()
        };
        assert_eq!(resolve("pkg.x86_64", &settings).0, Resolution::NotFound);
    }

    #[test]
    fn test_resolve_malformed_dependency() {
        let pool = fixture_pool();
        let mut query = MetadataQuery::new(&pool);
        let err = query
            .resolve_pkg_spec("pkg >=", &ResolveSpecSettings::default())
            .unwrap_err();
        assert!(matches!(err, SiftError::MalformedSpec { .. }));
    }

    #[test]
    fn test_resolution_serializes() {
        let json = serde_json::to_string(&Resolution::Provide).unwrap();
        assert_eq!(json, r#"{"kind":"provide"}"#);
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            ignore_case: Some(true),
            with_binaries: Some(false),
            ..Config::default_config()
        };
        let settings = ResolveSpecSettings::from_config(&config);
        assert!(settings.ignore_case);
        assert!(!settings.with_binaries);
        assert!(settings.with_provides);
        assert_eq!(settings.nevra_forms, DEFAULT_PKG_SPEC_FORMS.to_vec());
    }
}
