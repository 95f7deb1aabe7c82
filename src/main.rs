use std::sync::Arc;

use clap::{Parser, Subcommand};
use fanvise::agent::{build_provider, Orchestrator, Toolbox};
use fanvise::api::{create_router, AppState};
use fanvise::config::AppConfig;
use fanvise::error::Result;
use fanvise::espn::EspnClient;
use fanvise::news::{default_feeds, NewsPipeline};
use fanvise::snapshot_builder::SnapshotBuilder;
use fanvise::store::Store;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fanvise")]
#[command(author = "FanVise Team")]
#[command(version)]
#[command(about = "Fantasy basketball co-manager decision core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config directory or single TOML file.
    #[arg(short, long, default_value = "config")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the axum HTTP server (default).
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run `sqlx::migrate!` against the configured Postgres database.
    Migrate,
    /// Run one RSS ingestion pass and exit.
    IngestNews,
    /// Run one player-status snapshot refresh pass and exit.
    SyncStatus {
        /// League to refresh; defaults to the configured league.
        #[arg(long)]
        league_id: Option<String>,
    },
}

fn init_logging(json: bool, level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},fanvise=debug,sqlx=warn")));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

async fn build_services(config: &AppConfig) -> Result<(Arc<Store>, Arc<EspnClient>, Arc<NewsPipeline>, Arc<SnapshotBuilder>)> {
    let store = Arc::new(Store::new(&config.database.url, config.database.max_connections).await?);
    let espn = Arc::new(EspnClient::new(config.espn.clone())?);
    let llm = build_provider(&config.ai);
    let news = Arc::new(NewsPipeline::new(
        store.clone(),
        espn.clone(),
        llm,
        &config.embedding,
        default_feeds(),
        config.news.clone(),
    ));
    let snapshots = Arc::new(SnapshotBuilder::new(store.clone(), espn.clone()));
    Ok((store, espn, news, snapshots))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;

    init_logging(config.logging.json, &config.logging.level);

    if let Err(problems) = config.validate() {
        for problem in &problems {
            warn!(problem, "config validation failed");
        }
        return Err(fanvise::error::FanViseError::Other(anyhow::anyhow!(
            "invalid configuration: {}",
            problems.join("; ")
        )));
    }

    warn_if_force_cloud_missing(&config);

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            let (store, espn, news, snapshots) = build_services(&config).await?;
            let llm = build_provider(&config.ai);
            let tools = Arc::new(Toolbox::new(
                snapshots.clone(),
                store.clone(),
                espn.clone(),
                news.clone(),
            ));
            let orchestrator = Arc::new(Orchestrator::new(llm, tools, snapshots, store.clone()));
            let state = AppState::new(orchestrator, store);

            let port = port
                .or_else(|| std::env::var("FANVISE_API_PORT").ok().and_then(|v| v.parse().ok()))
                .or(config.api_port)
                .unwrap_or(8081);

            let router = create_router(state);
            let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
            info!(port, "fanvise listening");
            axum::serve(listener, router).await?;
        }
        Commands::Migrate => {
            let store = Store::new(&config.database.url, config.database.max_connections).await?;
            store.migrate().await?;
            info!("migrations applied");
        }
        Commands::IngestNews => {
            let (_, _, news, _) = build_services(&config).await?;
            let count = news.ingest_all().await?;
            info!(count, "news ingestion pass complete");
        }
        Commands::SyncStatus { league_id } => {
            let (_, _, news, _) = build_services(&config).await?;
            let league_id = league_id.unwrap_or_else(|| config.espn.league_id.clone());
            let count = news.sync_status_snapshots(&league_id).await?;
            info!(count, league_id, "status sync pass complete");
        }
    }

    Ok(())
}

fn warn_if_force_cloud_missing(config: &AppConfig) {
    if config.ai.force_cloud && config.ai.google_api_key.is_none() {
        warn!("FANVISE_FORCE_CLOUD_AI is set but GOOGLE_API_KEY is missing");
    }
}
