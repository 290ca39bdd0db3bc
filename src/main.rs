//! deepsearch-rs: iterative multi-engine deep search
//!
//! Runs the HTTP service by default, or a single session with `search`.

use anyhow::{bail, Context, Result};
use deepsearch_rs::{
    cache::HitCache,
    config::{self, Settings},
    engines::EngineLoader,
    metrics::Metrics,
    network::HttpClient,
    oracle::LlmOracle,
    search::{DeepSearch, DeepSearchRequest},
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

enum Command {
    Serve,
    Search(DeepSearchRequest),
    Help,
    Version,
}

struct Args {
    config: Option<PathBuf>,
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;

    match args.command {
        Command::Help => {
            print_usage();
            return Ok(());
        }
        Command::Version => {
            println!("deepsearch-rs {}", deepsearch_rs::VERSION);
            return Ok(());
        }
        _ => {}
    }

    let settings = config::load(args.config)?;
    init_logging(&settings);
    info!("Starting deepsearch-rs v{}", deepsearch_rs::VERSION);

    let metrics = Arc::new(Metrics::new());
    let cache = Arc::new(HitCache::new(
        settings.search.cache_ttl,
        settings.search.cache_capacity,
    ));
    let search = build_search(&settings, cache.clone(), metrics.clone())?;

    match args.command {
        Command::Search(request) => run_once(search, request).await,
        _ => serve(settings, search, metrics, cache).await,
    }
}

fn init_logging(settings: &Settings) {
    let default_level = if settings.general.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_search(
    settings: &Settings,
    cache: Arc<HitCache>,
    metrics: Arc<Metrics>,
) -> Result<Arc<DeepSearch>> {
    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!("HTTP client initialized");

    let registry = EngineLoader::load(settings, client.clone(), Some(cache))?;
    info!("Loaded {} search engines", registry.len());

    let oracle = LlmOracle::new(client, settings.oracle.clone());
    let mut search = DeepSearch::new(
        Arc::new(settings.clone()),
        Arc::new(registry),
        Arc::new(oracle),
    );
    if settings.general.enable_metrics {
        search = search.with_metrics(metrics);
    }
    Ok(Arc::new(search))
}

async fn serve(
    settings: Settings,
    search: Arc<DeepSearch>,
    metrics: Arc<Metrics>,
    cache: Arc<HitCache>,
) -> Result<()> {
    let addr = SocketAddr::new(
        settings
            .server
            .bind_address
            .parse()
            .with_context(|| format!("invalid bind address {}", settings.server.bind_address))?,
        settings.server.port,
    );

    let state = AppState::new(Arc::new(settings), search, metrics).with_cache(cache);
    let app = create_router(state);

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Run a single session, cancelling it on Ctrl-C
async fn run_once(search: Arc<DeepSearch>, request: DeepSearchRequest) -> Result<()> {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping search");
            trigger.cancel();
        }
    });

    let report = search.run(request, cancel).await;
    println!("{}", report.report);

    if !report.ok {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Args> {
    let mut config = None;
    let mut command = None;
    let mut engines = Vec::new();
    let mut engine = None;
    let mut max_iterations = None;
    let mut depth = None;
    let mut timeout = None;
    let mut words = Vec::new();

    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .with_context(|| format!("{} requires a value", name))
        };
        match arg.as_str() {
            "-h" | "--help" => command = Some(Command::Help),
            "-V" | "--version" => command = Some(Command::Version),
            "-c" | "--config" => config = Some(PathBuf::from(value(arg.as_str())?)),
            "-e" | "--engine" => engine = Some(value(arg.as_str())?),
            "--engines" => {
                engines = value(arg.as_str())?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }
            "-n" | "--max-iterations" => max_iterations = Some(value(arg.as_str())?.parse()?),
            "-d" | "--depth" => depth = Some(value(arg.as_str())?.parse()?),
            "-t" | "--timeout" => timeout = Some(value(arg.as_str())?.parse()?),
            "serve" if command.is_none() && words.is_empty() => command = Some(Command::Serve),
            "search" if command.is_none() && words.is_empty() => {
                command = Some(Command::Search(DeepSearchRequest::default()))
            }
            other if other.starts_with('-') => bail!("unknown option {}", other),
            _ => words.push(arg),
        }
    }

    let command = match command {
        Some(Command::Search(_)) => {
            if words.is_empty() {
                bail!("search requires a query");
            }
            Command::Search(DeepSearchRequest {
                query: words.join(" "),
                engine,
                engines,
                max_iterations,
                depth,
                timeout,
            })
        }
        Some(command) => {
            if !words.is_empty() {
                bail!("unexpected argument {}", words[0]);
            }
            command
        }
        None if words.is_empty() => Command::Serve,
        None => bail!("unknown command {}", words[0]),
    };

    Ok(Args { config, command })
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
deepsearch-rs v{}
Iterative multi-engine deep search

USAGE:
    deepsearch-rs [OPTIONS] [serve]
    deepsearch-rs [OPTIONS] search <QUERY>...

OPTIONS:
    -c, --config <FILE>          Path to configuration file
    -e, --engine <ID>            Engine for the search (default from settings)
        --engines <ID,ID>        Query several engines per round
    -n, --max-iterations <N>     Maximum number of rounds
    -d, --depth <N>              Results requested per engine call
    -t, --timeout <SECONDS>      Timeout per engine call
    -h, --help                   Print help information
    -V, --version                Print version information

ENVIRONMENT VARIABLES:
    DEEPSEARCH_SETTINGS_PATH     Path to settings.yml
    DEEPSEARCH_DEBUG             Enable debug logging (true/false)
    DEEPSEARCH_PORT              Server port
    DEEPSEARCH_BIND_ADDRESS      Bind address
    DEEPSEARCH_DEFAULT_ENGINE    Engine used when none is requested
    DEEPSEARCH_LOG_DIR           Directory for per-session logs
    DEEPSEARCH_API_KEY_<ENGINE>  API key for a paid engine
    DEEPSEARCH_ORACLE_ENDPOINT   Chat-completions endpoint of the oracle
    RUST_LOG                     Log filter (overrides DEEPSEARCH_DEBUG)
"#,
        deepsearch_rs::VERSION
    );
}
