//! [`CollectionLifecycle`]: the Open→Closed state machine.
//!
//! Two triggers close a collection: the scheduler job registered when it is
//! created, and any read that finds it open past its deadline. Both call
//! [`CollectionLifecycle::close_collection`], which takes a per-collection
//! lock and is a no-op on an already closed collection, so whichever runs
//! first wins and the summarizer is called once.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use verdict_core::{
  Error, Result, SummarizationError,
  clock::Clock,
  collection::{Answer, Collection, CollectionKind, CollectionState, CollectionView, NewCollection},
  prompt::build_prompt,
  store::{AppendOutcome, CollectionStore},
  summarizer::Summarizer,
};

use crate::{
  locks::KeyedLocks,
  scheduler::{DeadlineScheduler, ScheduleHandle},
};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
  /// Upper bound on one summarizer call; past it the call counts as failed.
  pub summarize_timeout: Duration,
}

impl Default for LifecycleConfig {
  fn default() -> Self { Self { summarize_timeout: Duration::from_secs(20) } }
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// Drives collections through their lifecycle on top of a
/// [`CollectionStore`] and a [`Summarizer`].
///
/// Cloning is cheap; all state is shared.
pub struct CollectionLifecycle<S, M> {
  inner: Arc<Inner<S, M>>,
}

struct Inner<S, M> {
  store:      Arc<S>,
  summarizer: Arc<M>,
  clock:      Arc<dyn Clock>,
  scheduler:  DeadlineScheduler,
  locks:      KeyedLocks<Uuid>,
  /// Pending close jobs, so a lazy close can cancel the timer it replaced.
  schedules:  DashMap<Uuid, ScheduleHandle>,
  config:     LifecycleConfig,
}

impl<S, M> Clone for CollectionLifecycle<S, M> {
  fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

impl<S, M> CollectionLifecycle<S, M>
where
  S: CollectionStore + 'static,
  M: Summarizer + 'static,
{
  /// Build a lifecycle and start its scheduler on the current tokio runtime.
  pub fn new(
    store: Arc<S>,
    summarizer: Arc<M>,
    clock: Arc<dyn Clock>,
    config: LifecycleConfig,
  ) -> Self {
    let scheduler = DeadlineScheduler::spawn(clock.clone());
    Self {
      inner: Arc::new(Inner {
        store,
        summarizer,
        clock,
        scheduler,
        locks: KeyedLocks::new(),
        schedules: DashMap::new(),
        config,
      }),
    }
  }

  pub fn store(&self) -> &Arc<S> { &self.inner.store }

  pub fn scheduler(&self) -> &DeadlineScheduler { &self.inner.scheduler }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Validate and persist a new open collection, and schedule its close.
  ///
  /// A deadline already in the past is accepted; the collection is still
  /// created open and closes on the first trigger.
  pub async fn create(&self, input: NewCollection) -> Result<Collection> {
    let title = required("title", &input.title)?;
    let description = required("description", &input.description)?;
    let deadline = input
      .deadline
      .ok_or_else(|| Error::Validation("deadline is required".into()))?;

    let collection = Collection {
      collection_id: Uuid::new_v4(),
      kind: input.kind,
      title,
      description,
      deadline,
      owner_id: input.owner_id,
      created_at: self.inner.clock.now(),
      state: CollectionState::Open,
      answers: Vec::new(),
      best_answer: None,
      closed_at: None,
    };

    self
      .inner
      .store
      .insert(&collection)
      .await
      .map_err(Error::persistence)?;
    self.schedule_close(collection.collection_id, collection.deadline);

    info!(
      collection_id = %collection.collection_id,
      kind = ?collection.kind,
      deadline = %collection.deadline,
      "collection created"
    );
    Ok(collection)
  }

  /// Append an answer to an open collection.
  ///
  /// Only the stored state decides: an open collection past its deadline
  /// still accepts answers until something closes it.
  pub async fn add_answer(
    &self,
    id: Uuid,
    text: impl Into<String>,
    author_id: Uuid,
  ) -> Result<Answer> {
    let text = text.into();
    if text.trim().is_empty() {
      return Err(Error::Validation("answer text is required".into()));
    }

    let _guard = self.inner.locks.lock(id).await;

    let answer = Answer {
      answer_id: Uuid::new_v4(),
      text,
      author_id,
      submitted_at: self.inner.clock.now(),
    };
    let outcome = self
      .inner
      .store
      .append_answer(id, answer.clone())
      .await
      .map_err(Error::persistence)?;

    match outcome {
      AppendOutcome::Appended => {
        debug!(collection_id = %id, answer_id = %answer.answer_id, "answer added");
        Ok(answer)
      }
      AppendOutcome::Closed => Err(Error::CollectionClosed(id)),
      AppendOutcome::Missing => Err(Error::NotFound(id)),
    }
  }

  /// Close a collection: ask the summarizer for a best answer and persist the
  /// closed state in one save.
  ///
  /// Idempotent. Concurrent calls for the same id are serialised and only the
  /// first does any work. A summarizer failure or timeout still closes the
  /// collection, without a best answer. A failed save leaves the stored
  /// collection open and is returned as [`Error::Persistence`].
  pub async fn close_collection(&self, id: Uuid) -> Result<Collection> {
    let _guard = self.inner.locks.lock(id).await;

    let mut collection = self.load(id).await?;
    if !collection.is_active() {
      debug!(collection_id = %id, "already closed");
      return Ok(collection);
    }

    let prompt = build_prompt(collection.kind, &collection.title, &collection.answers);
    let best_answer = match self.summarize(&prompt).await {
      Ok(text) => Some(text),
      Err(e) => {
        warn!(collection_id = %id, "closing without a best answer: {e}");
        None
      }
    };

    collection.close(best_answer, self.inner.clock.now());
    self
      .inner
      .store
      .save(&collection)
      .await
      .map_err(Error::persistence)?;

    if let Some((_, handle)) = self.inner.schedules.remove(&id) {
      self.inner.scheduler.cancel(&handle);
    }

    info!(
      collection_id = %id,
      answers = collection.answers.len(),
      has_best_answer = collection.best_answer.is_some(),
      "collection closed"
    );
    Ok(collection)
  }

  /// Re-register close jobs for every open collection in the store. Returns
  /// how many were scheduled.
  pub async fn restore_schedules(&self) -> Result<usize> {
    let open: Vec<Collection> = self
      .inner
      .store
      .list(None)
      .await
      .map_err(Error::persistence)?
      .into_iter()
      .filter(Collection::is_active)
      .collect();

    for collection in &open {
      self.schedule_close(collection.collection_id, collection.deadline);
    }
    info!("restored {} deadline jobs", open.len());
    Ok(open.len())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Materialise the view of a collection, closing it first if its deadline
  /// has passed.
  pub async fn get_collection(&self, id: Uuid) -> Result<CollectionView> {
    let collection = self.load(id).await?;
    let collection = self.settle(collection).await?;
    Ok(CollectionView::materialize(collection, self.inner.clock.now()))
  }

  /// All collections of `kind` (or of every kind), oldest first.
  ///
  /// Overdue collections are closed concurrently before the listing is
  /// returned. One that fails to close is listed as still open; the next
  /// trigger retries it.
  pub async fn list_collections(
    &self,
    kind: Option<CollectionKind>,
  ) -> Result<Vec<CollectionView>> {
    let mut collections = self
      .inner
      .store
      .list(kind)
      .await
      .map_err(Error::persistence)?;

    let now = self.inner.clock.now();
    let mut closing = JoinSet::new();
    for (index, collection) in collections.iter().enumerate() {
      if collection.is_due(now) {
        let lifecycle = self.clone();
        let id = collection.collection_id;
        closing.spawn(async move { (index, lifecycle.close_collection(id).await) });
      }
    }

    while let Some(joined) = closing.join_next().await {
      match joined {
        Ok((index, Ok(closed))) => collections[index] = closed,
        Ok((index, Err(e))) => {
          let id = collections[index].collection_id;
          warn!(collection_id = %id, "listing without closing: {e}");
        }
        Err(e) => error!("close task failed: {e}"),
      }
    }

    let as_of = self.inner.clock.now();
    Ok(
      collections
        .into_iter()
        .map(|c| CollectionView::materialize(c, as_of))
        .collect(),
    )
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  async fn load(&self, id: Uuid) -> Result<Collection> {
    self
      .inner
      .store
      .load(id)
      .await
      .map_err(Error::persistence)?
      .ok_or(Error::NotFound(id))
  }

  /// Lazy closure: never hand out a collection that is open past its
  /// deadline.
  async fn settle(&self, collection: Collection) -> Result<Collection> {
    if collection.is_due(self.inner.clock.now()) {
      self.close_collection(collection.collection_id).await
    } else {
      Ok(collection)
    }
  }

  async fn summarize(&self, prompt: &str) -> Result<String, SummarizationError> {
    let limit = self.inner.config.summarize_timeout;
    let text = tokio::time::timeout(limit, self.inner.summarizer.summarize(prompt))
      .await
      .map_err(|_| SummarizationError::Timeout(limit))?
      .map_err(|e| SummarizationError::Failed(Box::new(e)))?;

    let text = text.trim();
    if text.is_empty() {
      return Err(SummarizationError::Failed("empty response".into()));
    }
    Ok(text.to_owned())
  }

  fn schedule_close(&self, id: Uuid, deadline: chrono::DateTime<chrono::Utc>) {
    // Weak, so pending jobs don't keep a dropped lifecycle alive.
    let weak = Arc::downgrade(&self.inner);
    let handle = self.inner.scheduler.schedule_at(deadline, async move {
      let Some(inner) = weak.upgrade() else {
        return;
      };
      let lifecycle = CollectionLifecycle { inner };
      match lifecycle.close_collection(id).await {
        Ok(_) => {}
        Err(Error::NotFound(_)) => {
          warn!(collection_id = %id, "deadline fired for a missing collection");
        }
        Err(e) => {
          error!(collection_id = %id, "scheduled close failed: {e}");
        }
      }
    });

    if let Some(previous) = self.inner.schedules.insert(id, handle) {
      self.inner.scheduler.cancel(&previous);
    }
  }
}

fn required(field: &str, value: &str) -> Result<String> {
  let value = value.trim();
  if value.is_empty() {
    return Err(Error::Validation(format!("{field} is required")));
  }
  Ok(value.to_owned())
}
