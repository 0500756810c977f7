//! verdict-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `VERDICT_*` environment variables, opens the SQLite store, re-arms the
//! deadline of every open collection, and serves the JSON API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use verdict_core::clock::SystemClock;
use verdict_engine::{CollectionLifecycle, LifecycleConfig};
use verdict_server::GeminiSummarizer;
use verdict_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Verdict contest and topic server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = verdict_server::load_config(&cli.config)
    .context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if server_cfg.summarizer.api_key.is_empty() {
    tracing::warn!("no summarizer api key set; collections will close without a best answer");
  }
  let summarizer = GeminiSummarizer::new(&server_cfg.summarizer)
    .context("failed to build summarizer client")?;

  let lifecycle = CollectionLifecycle::new(
    Arc::new(store),
    Arc::new(summarizer),
    Arc::new(SystemClock),
    LifecycleConfig {
      summarize_timeout: Duration::from_secs(server_cfg.summarizer.timeout_secs),
    },
  );
  lifecycle
    .restore_schedules()
    .await
    .context("failed to restore deadline jobs")?;

  let app = verdict_server::app(lifecycle);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

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
