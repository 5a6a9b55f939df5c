//! Binary entry point: read config and CLI flags, load the catalog, start the
//! search worker and drive the Ratatui event loop until the user exits.
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use songbook::search::SearchWorker;
use songbook::{catalog, logging, run_app, App, AppSettings, Booklet, Config};

#[derive(Parser, Debug)]
#[command(name = "songbook", version, about = "Browse, search and share songs from the terminal")]
struct Args {
    /// Song catalog (.json, .sqlite or .db). Overrides `[catalog] path`.
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Config file (default: ~/.songbook/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL for shareable booklet links.
    #[arg(long)]
    base_url: Option<String>,

    /// Comma-separated song ids to start the booklet with.
    #[arg(long, value_delimiter = ',')]
    booklet: Vec<String>,

    /// Log filter directive, e.g. `debug` or `songbook=trace`.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("failed to load config")?;
    if let Some(level) = args.log_level {
        config.log.level = level;
    }
    if let Some(base_url) = args.base_url {
        config.link.base_url = base_url;
    }
    let _log_guard = logging::init(&config)?;

    let Some(catalog_path) = args.catalog.or_else(|| config.catalog.path.clone()) else {
        bail!("no song catalog given; pass --catalog or set [catalog] path in the config");
    };
    let catalog = catalog::load(&catalog_path)
        .with_context(|| format!("failed to load catalog {}", catalog_path.display()))?;

    let booklet = Booklet::from_ids(
        args.booklet
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty()),
    );
    let worker = SearchWorker::spawn(config.rank_settings()).context("failed to start search worker")?;

    let settings = AppSettings {
        base_url: config.link.base_url.clone(),
        collapse_width: config.ui.collapse_width,
    };
    let mut app = App::new(catalog, booklet, settings, Box::new(worker))?;
    run_app(&mut app)
}
