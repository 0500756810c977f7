//! Collection types: the deadline-bound unit behind contests and topics.
//!
//! A collection accepts answers while open and closes exactly once. Title,
//! description, deadline and owner never change after creation; the only
//! mutations are appending answers and the Open→Closed transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::similarity::SimilarityResult;

// ─── Kind & state ────────────────────────────────────────────────────────────

/// Which flavour of collection this is. Only the closing prompt differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
  Contest,
  Topic,
}

/// Lifecycle state. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionState {
  Open,
  Closed,
}

// ─── Answer ──────────────────────────────────────────────────────────────────

/// A submitted answer. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
  pub answer_id:    Uuid,
  pub text:         String,
  pub author_id:    Uuid,
  pub submitted_at: DateTime<Utc>,
}

// ─── Collection ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
  pub collection_id: Uuid,
  pub kind:          CollectionKind,
  pub title:         String,
  pub description:   String,
  pub deadline:      DateTime<Utc>,
  pub owner_id:      Uuid,
  pub created_at:    DateTime<Utc>,
  pub state:         CollectionState,
  /// In insertion order.
  pub answers:       Vec<Answer>,
  /// Only ever set by the Open→Closed transition, and only if the summarizer
  /// produced a text.
  pub best_answer:   Option<String>,
  pub closed_at:     Option<DateTime<Utc>>,
}

impl Collection {
  pub fn is_active(&self) -> bool { self.state == CollectionState::Open }

  /// Open but past its deadline: the next access must close it.
  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    self.is_active() && now >= self.deadline
  }

  /// Apply the Open→Closed transition in memory. No-op when already closed,
  /// so `best_answer` can never be overwritten.
  pub fn close(&mut self, best_answer: Option<String>, at: DateTime<Utc>) {
    if !self.is_active() {
      return;
    }
    self.state = CollectionState::Closed;
    self.best_answer = best_answer;
    self.closed_at = Some(at);
  }
}

// ─── NewCollection ───────────────────────────────────────────────────────────

/// Input to [`crate::store::CollectionStore::insert`] via the lifecycle's
/// `create`. Ids and timestamps are assigned by the lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCollection {
  pub kind:        CollectionKind,
  pub title:       String,
  pub description: String,
  pub deadline:    Option<DateTime<Utc>>,
  pub owner_id:    Uuid,
}

// ─── Materialised view ───────────────────────────────────────────────────────

/// The read model for a collection. Derived on every read, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionView {
  #[serde(flatten)]
  pub collection:     Collection,
  /// Always equal to `collection.is_active()`.
  pub is_active:      bool,
  /// The clock time at which this view was materialised.
  pub as_of:          DateTime<Utc>,
  /// The answer closest to `best_answer`, if there is one.
  pub similar_answer: Option<SimilarityResult>,
}

impl CollectionView {
  pub fn materialize(collection: Collection, as_of: DateTime<Utc>) -> Self {
    let similar_answer = collection.best_answer.as_deref().and_then(|best| {
      crate::similarity::best_match(best, &collection.answers)
    });
    Self {
      is_active: collection.is_active(),
      collection,
      as_of,
      similar_answer,
    }
  }
}
