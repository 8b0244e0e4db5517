use nu_ansi_term::Color::{Blue, Cyan, Green, LightRed, Magenta, Red, Yellow};
use sift_config::config::Config;
use sift_core::{
    package::Package,
    pool::{PackagePool, Pool},
    query::{MetadataQuery, QueryCmp, Resolution, ResolveSpecSettings},
    search::{KeyMatch, SearchGroup, SearchOptions, SearchRanker},
    SiftResult,
};
use tabled::{
    builder::Builder,
    settings::{themes::BorderCorrection, Panel, Style},
};
use tracing::{debug, info, warn};

use crate::utils::{first_line, Colored};

/// Filters accepted by `sift query`.
#[derive(Debug, Default)]
pub struct QueryFilters {
    pub name: Vec<String>,
    pub arch: Vec<String>,
    pub repo: Vec<String>,
    pub evr: Vec<String>,
    pub cmp: String,
    pub evr_cmp: String,
    pub whatprovides: Vec<String>,
    pub whatrequires: Vec<String>,
    pub file: Vec<String>,
    pub latest_limit: Option<i64>,
    pub duplicates: bool,
}

fn log_package(package: &Package) {
    info!(
        name = package.name,
        evr = package.evr_string(),
        arch = package.arch,
        repo = package.repo_id,
        summary = package.summary,
        "{}-{}.{} {} : {}",
        Colored(Blue, &package.name),
        Colored(LightRed, package.evr_string()),
        Colored(Cyan, &package.arch),
        Colored(Green, &package.repo_id),
        first_line(&package.summary, 60)
    );
}

fn group_header(group: &SearchGroup, patterns: &[String]) -> String {
    let fields = group
        .matched_fields
        .iter()
        .map(|(field, key_match)| {
            match key_match {
                KeyMatch::Exact => format!("{field} (exact)"),
                KeyMatch::Partial => field.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("Matched {}: {}", fields, patterns.join(", "))
}

fn print_summary(header: &str, rows: &[(&str, String)]) {
    let mut builder = Builder::new();
    for (label, value) in rows {
        builder.push_record([label.to_string(), value.clone()]);
    }

    let table = builder
        .build()
        .with(Panel::header(header))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .to_string();

    info!("\n{table}");
}

pub fn search_packages(
    pool: &PackagePool,
    config: &Config,
    patterns: Vec<String>,
    all: bool,
    showduplicates: bool,
    limit: Option<usize>,
) -> SiftResult<()> {
    let mut options = SearchOptions::from_config(config);
    options.search_all |= all;
    options.show_duplicates |= showduplicates;
    let limit = limit.or(config.search_limit);

    debug!(
        patterns = ?patterns,
        search_all = options.search_all,
        show_duplicates = options.show_duplicates,
        limit = ?limit,
        "searching packages"
    );

    let results = SearchRanker::new(pool, options).search(&patterns)?;
    if results.is_empty() {
        warn!("No matches found for {}", patterns.join(", "));
        return Ok(());
    }

    let total = results.len();
    let mut shown = 0;
    'groups: for group in &results.groups {
        info!(
            priority = group.priority.packed(),
            "{}",
            Colored(Yellow, group_header(group, &results.patterns))
        );
        for id in group.entities.iter() {
            if limit.is_some_and(|limit| shown >= limit) {
                break 'groups;
            }
            log_package(pool.package(id));
            shown += 1;
        }
    }

    print_summary(
        "Search Results",
        &[
            (
                "Found",
                format!("{} (showing {})", Colored(Cyan, total), Colored(Green, shown)),
            ),
            ("Groups", format!("{}", Colored(Magenta, results.groups.len()))),
        ],
    );

    Ok(())
}

/// Narrows `query` by every filter set in `filters`.
fn apply_filters(query: &mut MetadataQuery<'_>, filters: &QueryFilters) -> SiftResult<()> {
    let cmp: QueryCmp = filters.cmp.parse()?;
    let evr_cmp: QueryCmp = filters.evr_cmp.parse()?;
    if !filters.name.is_empty() {
        query.filter_name(&filters.name, cmp)?;
    }
    if !filters.arch.is_empty() {
        query.filter_arch(&filters.arch, cmp)?;
    }
    if !filters.repo.is_empty() {
        query.filter_repo_id(&filters.repo, cmp)?;
    }
    if !filters.evr.is_empty() {
        query.filter_evr(&filters.evr, evr_cmp)?;
    }
    if !filters.whatprovides.is_empty() {
        query.filter_provides(&filters.whatprovides, QueryCmp::Eq)?;
    }
    if !filters.whatrequires.is_empty() {
        query.filter_requires(&filters.whatrequires, QueryCmp::Glob)?;
    }
    if !filters.file.is_empty() {
        query.filter_file(&filters.file, QueryCmp::Glob)?;
    }
    if filters.duplicates {
        query.filter_duplicates();
    }
    if let Some(limit) = filters.latest_limit {
        query.filter_latest_evr(limit);
    }
    Ok(())
}

pub fn query_packages(
    pool: &PackagePool,
    config: &Config,
    specs: Vec<String>,
    filters: QueryFilters,
) -> SiftResult<()> {
    debug!(specs = ?specs, filters = ?filters, "querying packages");

    let mut query = if specs.is_empty() {
        MetadataQuery::new(pool)
    } else {
        let settings = ResolveSpecSettings::from_config(config);
        let mut resolved = MetadataQuery::empty(pool);
        for spec in &specs {
            let mut candidate = MetadataQuery::new(pool);
            let resolution = candidate.resolve_pkg_spec(spec, &settings)?;
            if !resolution.is_match() {
                warn!("No match for argument: {}", Colored(Red, spec));
                continue;
            }
            debug!(spec, resolution = ?resolution, matched = candidate.len(), "resolved spec");
            resolved.union(&candidate)?;
        }
        resolved
    };

    apply_filters(&mut query, &filters)?;

    for package in query.packages() {
        log_package(package);
    }

    print_summary(
        "Query Results",
        &[
            ("Packages", format!("{}", Colored(Cyan, query.len()))),
            ("Pool", format!("{}", Colored(Green, pool.len()))),
        ],
    );

    Ok(())
}

pub fn resolve_spec(
    pool: &PackagePool,
    spec: &str,
    settings: &ResolveSpecSettings,
) -> SiftResult<()> {
    let mut query = MetadataQuery::new(pool);
    let resolution = query.resolve_pkg_spec(spec, settings)?;

    let how = match &resolution {
        Resolution::Nevra(nevra) => format!("nevra {nevra}"),
        Resolution::NevraGlob => "nevra glob".to_string(),
        Resolution::Provide => "provide".to_string(),
        Resolution::File => "file".to_string(),
        Resolution::Binary => "binary".to_string(),
        Resolution::NotFound => {
            warn!("No match for argument: {}", Colored(Red, spec));
            return Ok(());
        }
    };

    info!(
        spec,
        resolution = ?resolution,
        matched = query.len(),
        "{} resolved as {}",
        Colored(Blue, spec),
        Colored(Magenta, how)
    );
    for package in query.packages() {
        log_package(package);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> PackagePool {
        let package = |name: &str, version: &str, arch: &str| Package {
            name: name.into(),
            version: version.into(),
            release: "1".into(),
            arch: arch.into(),
            repo_id: "main".into(),
            ..Default::default()
        };
        PackagePool::new(vec![
            package("foo", "1.0", "x86_64"),
            package("foo", "1.2", "x86_64"),
            package("foo", "1.2", "noarch"),
            package("bar", "2.0", "x86_64"),
        ])
    }

    fn filters() -> QueryFilters {
        QueryFilters {
            cmp: "eq".into(),
            evr_cmp: "eq".into(),
            ..Default::default()
        }
    }

    fn nevras(query: &MetadataQuery<'_>) -> Vec<String> {
        query.packages().map(|p| p.nevra()).collect()
    }

    #[test]
    fn test_evr_comparator_is_independent() {
        let pool = pool();
        let mut query = MetadataQuery::new(&pool);
        let filters = QueryFilters {
            name: vec!["foo".into()],
            arch: vec!["x86_64".into()],
            evr: vec!["1.0-1".into()],
            evr_cmp: "gt".into(),
            ..filters()
        };
        apply_filters(&mut query, &filters).unwrap();
        assert_eq!(nevras(&query), vec!["foo-1.2-1.x86_64"]);
    }

    #[test]
    fn test_ordering_comparator_rejected_for_arch() {
        let pool = pool();
        let mut query = MetadataQuery::new(&pool);
        let filters = QueryFilters {
            arch: vec!["x86_64".into()],
            cmp: "gt".into(),
            ..filters()
        };
        assert!(apply_filters(&mut query, &filters).is_err());
    }

    #[test]
    fn test_duplicates_and_latest() {
        let pool = pool();
        let mut query = MetadataQuery::new(&pool);
        let filters = QueryFilters {
            duplicates: true,
            ..filters()
        };
        apply_filters(&mut query, &filters).unwrap();
        assert_eq!(nevras(&query), vec!["foo-1.0-1.x86_64", "foo-1.2-1.x86_64"]);

        let mut query = MetadataQuery::new(&pool);
        let filters = QueryFilters {
            name: vec!["foo".into()],
            latest_limit: Some(1),
            ..self::filters()
        };
        apply_filters(&mut query, &filters).unwrap();
        assert_eq!(nevras(&query), vec!["foo-1.2-1.x86_64", "foo-1.2-1.noarch"]);
    }
}
