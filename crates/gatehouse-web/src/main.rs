//! Gatehouse server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `GATEHOUSE_*` environment variables, opens the configured store and serves
//! the dashboard over HTTP.
//!
//! ```
//! cargo run -p gatehouse-web -- --print-config
//! GATEHOUSE_DATABASE__SQLITE__PATH=/tmp/dev.db cargo run -p gatehouse-web
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use gatehouse_core::store::DashboardStore;
use gatehouse_store_postgres::PgStore;
use gatehouse_store_sqlite::SqliteStore;
use gatehouse_web::{
  AppState,
  config::{self, DatabaseTarget, LogFormat, ServerConfig},
};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Gatehouse dashboard server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Drop and recreate all tables, then exit.
  #[arg(long)]
  reset_db: bool,

  /// Print the resolved database target and exit.
  #[arg(long)]
  print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let server_cfg = config::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  init_tracing(server_cfg.logging.format);

  let target = server_cfg.database.target();
  if cli.print_config {
    println!("database: {target}");
    println!("listen:   {}:{}", server_cfg.host, server_cfg.port);
    println!("admins:   {}", server_cfg.auth.admin_emails.len());
    println!("analytics enabled: {}", server_cfg.monitoring.enable_analytics);
    return Ok(());
  }

  let shown = target.to_string();
  match target {
    DatabaseTarget::Sqlite { path } => {
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("failed to open store at {shown}"))?;
      run(store, server_cfg, cli.reset_db).await
    }
    DatabaseTarget::Postgres { url } => {
      let store = PgStore::connect(&url)
        .await
        .with_context(|| format!("failed to connect to {shown}"))?;
      run(store, server_cfg, cli.reset_db).await
    }
  }
}

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  match format {
    LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
  }
}

async fn run<S>(store: S, server_cfg: ServerConfig, reset_db: bool) -> anyhow::Result<()>
where
  S: DashboardStore + 'static,
{
  if reset_db {
    store.reset().await.context("failed to reset database")?;
    tracing::info!("database reset");
    return Ok(());
  }

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state   = AppState::new(Arc::new(store), server_cfg);
  let app     = gatehouse_web::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
