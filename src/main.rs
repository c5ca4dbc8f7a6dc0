//! Binary entrypoint for the motive-of-the-day server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use motday::config::Configuration;
use motday::motive::MotiveMaker;
use motday::provider::FlickrIndex;
use motday::render::PageTemplate;
use motday::search::{PhotoSearch, shared_rng};
use motday::tasks::prefetch;
use motday::themes::ThemeStore;
use motday::web::{self, MotiveSource};

#[derive(Debug, Parser)]
#[command(name = "motday", version, about = "Serves a themed photo of the day")]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Override the listen address
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    if let Err(err) = try_main().await {
        error!(error = ?err, "motday exited with error");
        std::process::exit(1);
    }
}

async fn try_main() -> Result<()> {
    let cli = Cli::parse();
    motday::logging::init(cli.verbose);

    let mut cfg = Configuration::from_yaml_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?
        .validated()
        .context("validating configuration")?;
    if let Some(addr) = cli.listen {
        cfg.listen_address = addr;
    }

    let themes = ThemeStore::from_json_file(&cfg.themes_path)
        .with_context(|| format!("loading themes from {}", cfg.themes_path.display()))?;
    info!(themes = themes.len(), path = %cfg.themes_path.display(), "loaded themes");

    let template = match &cfg.template_path {
        Some(path) => PageTemplate::from_file(path)?,
        None => PageTemplate::default(),
    };

    let api_key = cfg.resolve_api_key(&themes)?;
    let index = FlickrIndex::new(
        cfg.search.endpoint.clone(),
        api_key,
        cfg.search.request_timeout,
        &cfg.search.user_agent,
    )
    .context("building photo index client")?;

    let rng = shared_rng(cfg.random_seed);
    let search = Arc::new(PhotoSearch::new(
        Arc::new(index),
        cfg.search.options(),
        rng.clone(),
    ));
    let maker = Arc::new(MotiveMaker::new(
        Arc::new(themes),
        search,
        cfg.query_mode,
        rng,
    ));

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();
    let source = if cfg.prefetch.enabled {
        let (to_web, queue) = prefetch::channel(cfg.prefetch.capacity);
        tasks.spawn({
            let maker = maker.clone();
            let cancel = cancel.clone();
            let backoff = cfg.prefetch.backoff();
            async move {
                prefetch::run(maker, to_web, cancel, backoff)
                    .await
                    .context("prefetch task failed")
            }
        });
        MotiveSource::Prefetched {
            queue,
            wait: cfg.prefetch.wait_timeout,
        }
    } else {
        info!("prefetch disabled; searching on the request path");
        MotiveSource::Direct(maker)
    };

    let app = web::router(source, template);
    tasks.spawn({
        let cancel = cancel.clone();
        let addr = cfg.listen_address;
        async move { web::serve(app, addr, cancel).await }
    });

    // Any task ending (cleanly or not) stops the rest.
    while let Some(joined) = tasks.join_next().await {
        cancel.cancel();
        joined.context("task panicked")??;
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut term) = signal(SignalKind::terminate()) {
            term.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
