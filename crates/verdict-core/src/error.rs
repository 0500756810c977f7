//! Error types for `verdict-core`.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures surfaced to callers of the lifecycle operations.
///
/// Every variant is scoped to a single operation on a single collection.
#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("collection not found: {0}")]
  NotFound(Uuid),

  #[error("collection {0} is closed")]
  CollectionClosed(Uuid),

  /// The store rejected a write; nothing from this operation is durable and
  /// it is safe to retry.
  #[error("persistence error: {0}")]
  Persistence(#[source] BoxError),
}

impl Error {
  pub fn persistence<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(err))
  }
}

/// A failed summarizer call during closure. Logged, never returned: the
/// collection closes without a best answer.
#[derive(Debug, Error)]
pub enum SummarizationError {
  #[error("summarizer timed out after {0:?}")]
  Timeout(Duration),

  #[error("summarizer failed: {0}")]
  Failed(#[source] BoxError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
