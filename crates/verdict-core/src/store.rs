//! The `CollectionStore` trait.
//!
//! Implemented by storage backends (e.g. `verdict-store-sqlite`). The
//! lifecycle only holds a transient copy of a collection while an operation
//! runs; the store owns the durable state.

use std::future::Future;

use uuid::Uuid;

use crate::collection::{Answer, Collection, CollectionKind};

/// Outcome of [`CollectionStore::append_answer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
  Appended,
  /// The stored collection is already closed; nothing was written.
  Closed,
  /// No collection with that id exists.
  Missing,
}

/// Abstraction over durable collection storage.
///
/// Writes must be atomic at the granularity of one collection's `state`,
/// `best_answer` and `answers`: a reader never sees a closed collection
/// without its best answer attempt, or an answer appended after the close.
///
/// All methods return `Send` futures so the trait can be used from spawned
/// tasks in a multi-threaded runtime.
pub trait CollectionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a newly created collection. Fails if the id is taken.
  fn insert<'a>(
    &'a self,
    collection: &'a Collection,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Retrieve a collection with all of its answers. `None` if not found.
  fn load(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Collection>, Self::Error>> + Send + '_;

  /// All collections, optionally restricted to one kind, oldest first.
  fn list(
    &self,
    kind: Option<CollectionKind>,
  ) -> impl Future<Output = Result<Vec<Collection>, Self::Error>> + Send + '_;

  /// Write back `state`, `best_answer`, `closed_at` and any answers not yet
  /// stored, in one atomic step.
  fn save<'a>(
    &'a self,
    collection: &'a Collection,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Append one answer, re-checking the stored state in the same atomic
  /// step so nothing lands after a close.
  fn append_answer(
    &self,
    id: Uuid,
    answer: Answer,
  ) -> impl Future<Output = Result<AppendOutcome, Self::Error>> + Send + '_;
}
