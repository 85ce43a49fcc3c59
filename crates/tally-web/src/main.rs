//! tally server binary.
//!
//! Reads `tally.toml` (or the path specified with `--config`) layered under
//! `TALLY_*` environment variables, opens the SQLite database, seeds empty
//! catalogs, and serves the incident form over HTTP.
//!
//! # One-shot export
//!
//! To write the unfiltered consolidated report to a file without starting
//! the server:
//!
//! ```text
//! cargo run -p tally-web -- --export incidents.xlsx
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use tally_core::{report::ReportFilter, store::IncidentStore};
use tally_store_sqlite::SqliteStore;
use tally_web::{AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tally weekly incident server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tally.toml")]
  config: PathBuf,

  /// Write the consolidated report to this XLSX file and exit.
  #[arg(long, value_name = "PATH")]
  export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("TALLY"))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.database_path = expand_tilde(&server_cfg.database_path);
  server_cfg.plant_seed_path = expand_tilde(&server_cfg.plant_seed_path);

  // Open SQLite store.
  let store = SqliteStore::open(&server_cfg.database_path)
    .await
    .with_context(|| format!("failed to open database at {:?}", server_cfg.database_path))?;

  tally_web::seed_catalogs(&store, &server_cfg)
    .await
    .context("failed to seed catalogs")?;

  if let Some(path) = cli.export {
    let report = store
      .build_report(&ReportFilter::default())
      .await
      .context("failed to build report")?;
    tally_xlsx::save(&report, &path)
      .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(rows = report.data.len(), path = %path.display(), "report exported");
    return Ok(());
  }

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  if server_cfg.admin_pin.as_deref().is_none_or(|p| p.trim().is_empty()) {
    tracing::warn!("no admin_pin configured; the report is open to everyone");
  }

  let state = AppState::new(store, server_cfg).context("failed to load templates")?;
  let app = tally_web::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
