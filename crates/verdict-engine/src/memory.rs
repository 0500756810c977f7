//! [`MemoryStore`]: a volatile [`CollectionStore`] for tests and demos.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;
use verdict_core::{
  collection::{Answer, Collection, CollectionKind},
  store::{AppendOutcome, CollectionStore},
};

#[derive(Debug, Error)]
pub enum MemoryStoreError {
  #[error("collection {0} already exists")]
  Duplicate(Uuid),

  #[error("collection not found: {0}")]
  NotFound(Uuid),
}

/// Keeps every collection in a vector behind one lock, so each write is
/// trivially atomic. Cloning shares the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  collections: Arc<RwLock<Vec<Collection>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl CollectionStore for MemoryStore {
  type Error = MemoryStoreError;

  async fn insert(&self, collection: &Collection) -> Result<(), Self::Error> {
    let mut all = self.collections.write().await;
    if all.iter().any(|c| c.collection_id == collection.collection_id) {
      return Err(MemoryStoreError::Duplicate(collection.collection_id));
    }
    all.push(collection.clone());
    Ok(())
  }

  async fn load(&self, id: Uuid) -> Result<Option<Collection>, Self::Error> {
    let all = self.collections.read().await;
    Ok(all.iter().find(|c| c.collection_id == id).cloned())
  }

  async fn list(&self, kind: Option<CollectionKind>) -> Result<Vec<Collection>, Self::Error> {
    let all = self.collections.read().await;
    let mut found: Vec<Collection> = all
      .iter()
      .filter(|c| kind.is_none_or(|k| c.kind == k))
      .cloned()
      .collect();
    found.sort_by_key(|c| c.created_at);
    Ok(found)
  }

  async fn save(&self, collection: &Collection) -> Result<(), Self::Error> {
    let mut all = self.collections.write().await;
    let stored = all
      .iter_mut()
      .find(|c| c.collection_id == collection.collection_id)
      .ok_or(MemoryStoreError::NotFound(collection.collection_id))?;

    stored.state = collection.state;
    stored.best_answer = collection.best_answer.clone();
    stored.closed_at = collection.closed_at;
    for answer in &collection.answers {
      if !stored.answers.iter().any(|a| a.answer_id == answer.answer_id) {
        stored.answers.push(answer.clone());
      }
    }
    Ok(())
  }

  async fn append_answer(&self, id: Uuid, answer: Answer) -> Result<AppendOutcome, Self::Error> {
    let mut all = self.collections.write().await;
    let Some(stored) = all.iter_mut().find(|c| c.collection_id == id) else {
      return Ok(AppendOutcome::Missing);
    };
    if !stored.is_active() {
      return Ok(AppendOutcome::Closed);
    }
    stored.answers.push(answer);
    Ok(AppendOutcome::Appended)
  }
}
