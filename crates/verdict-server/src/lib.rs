//! Wiring for the Verdict HTTP server: configuration, the Gemini-backed
//! summarizer, and the top-level router.

pub mod gemini;

use std::path::{Path, PathBuf};

use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use verdict_core::{store::CollectionStore, summarizer::Summarizer};
use verdict_engine::CollectionLifecycle;

pub use gemini::{GeminiError, GeminiSummarizer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `VERDICT_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub summarizer: SummarizerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SummarizerConfig {
  /// May be empty; every close then ends without a best answer.
  pub api_key:      String,
  pub model:        String,
  pub base_url:     String,
  pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
  fn default() -> Self {
    Self {
      api_key:      String::new(),
      model:        "gemini-1.5-flash".into(),
      base_url:     "https://generativelanguage.googleapis.com".into(),
      timeout_secs: 20,
    }
  }
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 3000 }

fn default_store_path() -> PathBuf { PathBuf::from("verdict.db") }

/// Read `path` (if it exists) layered under `VERDICT_*` environment
/// variables. Nested keys use `__`, e.g. `VERDICT_SUMMARIZER__API_KEY`.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  build_config(path, environment())
}

fn environment() -> config::Environment {
  config::Environment::with_prefix("VERDICT")
    .prefix_separator("_")
    .separator("__")
}

fn build_config(
  path: &Path,
  env: config::Environment,
) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(env)
    .build()?
    .try_deserialize()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API router with request tracing.
pub fn app<S, M>(lifecycle: CollectionLifecycle<S, M>) -> Router
where
  S: CollectionStore + 'static,
  M: Summarizer + 'static,
{
  verdict_api::api_router(lifecycle).layer(TraceLayer::new_for_http())
}
