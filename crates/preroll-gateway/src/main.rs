use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use preroll_activation::ActivationGateway;
use preroll_core::{AssetCatalog, CategoryActivator, PrerollConfig};
use preroll_gateway::app::{self, AppState};
use preroll_scheduler::{ScheduleEngine, ScheduleStore};
use preroll_sync::{MediaServerClient, SyncStrategyChain};
use tracing::info;

/// Rotates media-server preroll categories on a schedule.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to preroll.toml (falls back to PREROLL_CONFIG, then ~/.preroll/preroll.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP gateway and the background scheduler (default)
    Serve,
    /// Evaluate schedules once and print what fired
    Tick,
    /// Activate one category immediately and print the result
    Activate {
        #[arg(value_name = "CATEGORY")]
        category: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "preroll_gateway=info,preroll_scheduler=info,preroll_sync=info,\
                 preroll_activation=info,tower_http=debug"
                    .into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // explicit flag > PREROLL_CONFIG env > ~/.preroll/preroll.toml
    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("PREROLL_CONFIG").ok());
    let config = PrerollConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        PrerollConfig::default()
    });

    let state = build_state(config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state).await,
        Command::Tick => {
            match state.engine.tick(Utc::now()).await {
                Some(outcomes) => println!("{}", serde_json::to_string_pretty(&outcomes)?),
                None => println!("tick skipped: another evaluation is running"),
            }
            Ok(())
        }
        Command::Activate { category } => {
            let result = state.gateway.activate(&category).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}

/// Wire the store, the sync chain, the activation gateway and the engine.
fn build_state(config: PrerollConfig) -> Result<Arc<AppState>> {
    let store_path = config.storage.schedules_path();
    info!(path = %store_path.display(), "opening schedule store");
    let store = Arc::new(ScheduleStore::open(store_path)?);

    let chain =
        SyncStrategyChain::standard(&config.media_server, config.library.public_url.clone())?;
    info!(strategies = ?chain.strategy_names(), "remote sync chain ready");

    let catalog = AssetCatalog::new(config.library.path.clone());
    info!(root = %catalog.root().display(), "preroll library");
    let gateway = Arc::new(ActivationGateway::new(catalog, Arc::new(chain)));

    let activator: Arc<dyn CategoryActivator> = gateway.clone();
    let engine = Arc::new(ScheduleEngine::new(
        store.clone(),
        activator,
        Duration::from_secs(config.scheduler.tick_interval_secs.max(1)),
    ));

    let media_server = Arc::new(MediaServerClient::new(&config.media_server)?);

    Ok(Arc::new(AppState::new(
        config,
        store,
        gateway,
        engine,
        media_server,
    )))
}

async fn serve(state: Arc<AppState>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", state.config.gateway.bind, state.config.gateway.port)
        .parse()?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    if state.config.scheduler.enabled {
        let engine = Arc::clone(&state.engine);
        tokio::spawn(async move { engine.run(shutdown_rx).await });
    } else {
        info!("scheduler disabled; schedules fire only via POST /scheduler/tick");
    }

    let router = app::build_router(state);
    info!("Preroll gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    // signal scheduler to stop
    let _ = shutdown_tx.send(true);
    Ok(())
}
