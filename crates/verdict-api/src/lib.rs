//! JSON REST API for Verdict.
//!
//! Exposes an axum [`Router`] over a [`CollectionLifecycle`]. Contests and
//! topics share one set of handlers; the first path segment picks the kind.
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(verdict_api::api_router(lifecycle.clone()))
//! ```

pub mod answers;
pub mod collections;
pub mod error;

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use verdict_core::{CollectionKind, store::CollectionStore, summarizer::Summarizer};
use verdict_engine::CollectionLifecycle;

pub use error::ApiError;

/// The `{kind}` path segment: `contests` or `topics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindSegment {
  Contests,
  Topics,
}

impl From<KindSegment> for CollectionKind {
  fn from(segment: KindSegment) -> Self {
    match segment {
      KindSegment::Contests => CollectionKind::Contest,
      KindSegment::Topics => CollectionKind::Topic,
    }
  }
}

/// Build a fully-materialised API router over `lifecycle`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, M>(lifecycle: CollectionLifecycle<S, M>) -> Router<()>
where
  S: CollectionStore + 'static,
  M: Summarizer + 'static,
{
  Router::new()
    .route(
      "/{kind}",
      get(collections::list::<S, M>).post(collections::create::<S, M>),
    )
    .route("/{kind}/{id}", get(collections::get_one::<S, M>))
    .route("/{kind}/{id}/answers", post(answers::create::<S, M>))
    .with_state(lifecycle)
}

#[cfg(test)]
mod tests;
