use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use timetable_core::TimetableConfig;
use timetable_scheduler::{MemoryPersistence, Persistence, RoutineScheduler, SqlitePersistence};
use tracing::{info, warn};

mod app;
mod http;

/// Class-routine conflict scheduler over HTTP.
#[derive(Debug, Parser)]
#[command(name = "timetable-gateway", version, about)]
struct Cli {
    /// Path to timetable.toml (falls back to TIMETABLE_CONFIG, then ~/.timetable/timetable.toml)
    #[arg(long)]
    config: Option<String>,

    /// Address to bind, overrides `gateway.bind`
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on, overrides `gateway.port`
    #[arg(long)]
    port: Option<u16>,

    /// Keep entries in memory only; nothing survives a restart
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "timetable_gateway=info,timetable_scheduler=info,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // config: --config > TIMETABLE_CONFIG env > ~/.timetable/timetable.toml
    let config_path = cli.config.clone().or_else(|| std::env::var("TIMETABLE_CONFIG").ok());
    let mut config = TimetableConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!(code = e.code(), "Config load failed ({}), using defaults", e);
        TimetableConfig::default()
    });
    if let Some(bind) = cli.bind {
        config.gateway.bind = bind;
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    let persistence: Arc<dyn Persistence> = if cli.memory {
        info!("using in-memory storage");
        Arc::new(MemoryPersistence::new())
    } else {
        let db_path = &config.database.path;
        ensure_parent_dir(db_path);
        info!(path = %db_path, "opening SQLite database");
        Arc::new(SqlitePersistence::open(db_path)?)
    };

    let scheduler = RoutineScheduler::from_config(&config.routine, persistence)?;
    info!(
        category = %config.routine.category,
        entries = scheduler.len(),
        days = scheduler.calendar().days().len(),
        slots = scheduler.calendar().time_slots().len(),
        "routine loaded"
    );

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let state = Arc::new(app::AppState::new(config, scheduler));
    let router = app::build_router(state);

    info!(%addr, "timetable gateway listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("timetable gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
