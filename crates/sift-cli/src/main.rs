use std::{env, fs};

use clap::Parser;
use cli::{Args, Commands};
use list::{query_packages, resolve_spec, search_packages, QueryFilters};
use logging::setup_logging;
use sift_config::config::{self, generate_default_config, get_config, Config, CONFIG_PATH};
use sift_core::{
    error::{ErrorContext, SiftError},
    pool::PackagePool,
    query::ResolveSpecSettings,
    SiftResult,
};
use sift_registry::load_repositories;
use sift_utils::path::resolve_path;
use tracing::{debug, info, warn};
use utils::COLOR;

mod cli;
mod list;
mod logging;
mod utils;

fn load_pool(config: &Config) -> SiftResult<PackagePool> {
    let repositories = load_repositories(config)?;
    debug!(repositories = repositories.len(), "loaded repository metadata");
    Ok(PackagePool::from_repositories(repositories))
}

fn print_config() -> SiftResult<()> {
    let config_path = CONFIG_PATH.read().unwrap().to_path_buf();
    let content = match fs::read_to_string(&config_path) {
        Ok(v) => v,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file {} not found", config_path.display());
            Config::default_config()
                .to_annotated_document()?
                .to_string()
        }
        Err(err) => {
            return Err(SiftError::IoError {
                action: "reading config".to_string(),
                source: err,
            });
        }
    };
    info!("{content}");
    Ok(())
}

fn handle_cli() -> SiftResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        let mut color = COLOR.write().unwrap();
        *color = false;
    }

    if let Some(ref c) = args.config {
        let mut config_path = CONFIG_PATH.write().unwrap();
        let path = resolve_path(c)?;
        let path = if path.is_absolute() {
            path
        } else {
            env::current_dir()
                .with_context(|| "retrieving current directory".into())?
                .join(path)
        };
        *config_path = path;
    }

    match args.command {
        Commands::DefConfig => generate_default_config()?,
        command => {
            config::init()?;

            match command {
                Commands::Config => print_config()?,
                Commands::Search {
                    patterns,
                    all,
                    showduplicates,
                    limit,
                } => {
                    let config = get_config();
                    let pool = load_pool(&config)?;
                    search_packages(&pool, &config, patterns, all, showduplicates, limit)?;
                }
                Commands::Query {
                    specs,
                    name,
                    arch,
                    repo,
                    evr,
                    cmp,
                    evr_cmp,
                    whatprovides,
                    whatrequires,
                    file,
                    latest_limit,
                    duplicates,
                } => {
                    let config = get_config();
                    let pool = load_pool(&config)?;
                    let filters = QueryFilters {
                        name,
                        arch,
                        repo,
                        evr,
                        cmp,
                        evr_cmp,
                        whatprovides,
                        whatrequires,
                        file,
                        latest_limit,
                        duplicates,
                    };
                    query_packages(&pool, &config, specs, filters)?;
                }
                Commands::Resolve {
                    spec,
                    ignore_case,
                    no_provides,
                    no_filenames,
                    no_binaries,
                    no_src,
                } => {
                    let config = get_config();
                    let pool = load_pool(&config)?;
                    let mut settings = ResolveSpecSettings::from_config(&config);
                    settings.ignore_case |= ignore_case;
                    settings.with_provides &= !no_provides;
                    settings.with_filenames &= !no_filenames;
                    settings.with_binaries &= !no_binaries;
                    settings.with_src &= !no_src;
                    resolve_spec(&pool, &spec, &settings)?;
                }
                Commands::DefConfig => unreachable!(),
            }
        }
    }

    Ok(())
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
