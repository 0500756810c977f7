//! [`SqliteStore`], the SQLite implementation of [`CollectionStore`].

use std::{collections::HashMap, path::Path};

use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;
use verdict_core::{
  collection::{Answer, Collection, CollectionKind, CollectionState},
  store::{AppendOutcome, CollectionStore},
};

use crate::{
  Error, Result,
  encode::{
    ANSWER_COLUMNS, COLLECTION_COLUMNS, RawAnswer, RawCollection, encode_dt, encode_kind,
    encode_state, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A collection store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// An answer flattened to column values, ready to move into a `call`.
struct AnswerRow {
  answer_id:    String,
  text:         String,
  author_id:    String,
  submitted_at: String,
}

impl AnswerRow {
  fn new(answer: &Answer) -> Self {
    Self {
      answer_id:    encode_uuid(answer.answer_id),
      text:         answer.text.clone(),
      author_id:    encode_uuid(answer.author_id),
      submitted_at: encode_dt(answer.submitted_at),
    }
  }

  fn insert(&self, conn: &rusqlite::Connection, collection_id: &str) -> rusqlite::Result<usize> {
    conn.execute(
      "INSERT OR IGNORE INTO answers (answer_id, collection_id, text, author_id, submitted_at)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![
        self.answer_id,
        collection_id,
        self.text,
        self.author_id,
        self.submitted_at,
      ],
    )
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    debug!("opened collection store at {}", path.display());
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn group_answers(raws: Vec<RawAnswer>) -> Result<HashMap<String, Vec<Answer>>> {
  let mut by_collection: HashMap<String, Vec<Answer>> = HashMap::new();
  for raw in raws {
    let key = raw.collection_id.clone();
    by_collection.entry(key).or_default().push(raw.into_answer()?);
  }
  Ok(by_collection)
}

// ─── CollectionStore impl ────────────────────────────────────────────────────

impl CollectionStore for SqliteStore {
  type Error = Error;

  async fn insert(&self, collection: &Collection) -> Result<()> {
    let id_str          = encode_uuid(collection.collection_id);
    let kind_str        = encode_kind(collection.kind).to_owned();
    let title           = collection.title.clone();
    let description     = collection.description.clone();
    let deadline_str    = encode_dt(collection.deadline);
    let owner_str       = encode_uuid(collection.owner_id);
    let created_at_str  = encode_dt(collection.created_at);
    let state_str       = encode_state(collection.state).to_owned();
    let best_answer     = collection.best_answer.clone();
    let closed_at_str   = collection.closed_at.map(encode_dt);
    let answers: Vec<AnswerRow> = collection.answers.iter().map(AnswerRow::new).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO collections (
             collection_id, kind, title, description, deadline,
             owner_id, created_at, state, best_answer, closed_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            kind_str,
            title,
            description,
            deadline_str,
            owner_str,
            created_at_str,
            state_str,
            best_answer,
            closed_at_str,
          ],
        )?;
        for answer in &answers {
          answer.insert(&tx, &id_str)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn load(&self, id: Uuid) -> Result<Option<Collection>> {
    let id_str = encode_uuid(id);

    let (raw, raw_answers): (Option<RawCollection>, Vec<RawAnswer>) = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE collection_id = ?1"),
            rusqlite::params![id_str],
            RawCollection::from_row,
          )
          .optional()?;

        if raw.is_none() {
          return Ok((None, Vec::new()));
        }

        let mut stmt = conn.prepare(&format!(
          "SELECT {ANSWER_COLUMNS} FROM answers WHERE collection_id = ?1 ORDER BY seq"
        ))?;
        let answers = stmt
          .query_map(rusqlite::params![id_str], RawAnswer::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((raw, answers))
      })
      .await?;

    let answers = raw_answers
      .into_iter()
      .map(RawAnswer::into_answer)
      .collect::<Result<Vec<_>>>()?;

    raw.map(|r| r.into_collection(answers)).transpose()
  }

  async fn list(&self, kind: Option<CollectionKind>) -> Result<Vec<Collection>> {
    let kind_str = kind.map(encode_kind).map(str::to_owned);

    let (raws, raw_answers): (Vec<RawCollection>, Vec<RawAnswer>) = self
      .conn
      .call(move |conn| {
        // `?1 IS NULL` disables the kind filter.
        let mut stmt = conn.prepare(&format!(
          "SELECT {COLLECTION_COLUMNS} FROM collections
           WHERE ?1 IS NULL OR kind = ?1
           ORDER BY created_at, rowid"
        ))?;
        let collections = stmt
          .query_map(rusqlite::params![kind_str], RawCollection::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT a.collection_id, a.answer_id, a.text, a.author_id, a.submitted_at
           FROM answers a
           JOIN collections c ON c.collection_id = a.collection_id
           WHERE ?1 IS NULL OR c.kind = ?1
           ORDER BY a.seq",
        )?;
        let answers = stmt
          .query_map(rusqlite::params![kind_str], RawAnswer::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((collections, answers))
      })
      .await?;

    let mut answers = group_answers(raw_answers)?;
    raws
      .into_iter()
      .map(|raw| {
        let own = answers.remove(&raw.collection_id).unwrap_or_default();
        raw.into_collection(own)
      })
      .collect()
  }

  async fn save(&self, collection: &Collection) -> Result<()> {
    let id            = collection.collection_id;
    let id_str        = encode_uuid(id);
    let state_str     = encode_state(collection.state).to_owned();
    let best_answer   = collection.best_answer.clone();
    let closed_at_str = collection.closed_at.map(encode_dt);
    let answers: Vec<AnswerRow> = collection.answers.iter().map(AnswerRow::new).collect();

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let updated = tx.execute(
          "UPDATE collections SET state = ?2, best_answer = ?3, closed_at = ?4
           WHERE collection_id = ?1",
          rusqlite::params![id_str, state_str, best_answer, closed_at_str],
        )?;
        if updated == 0 {
          return Ok(false);
        }
        for answer in &answers {
          answer.insert(&tx, &id_str)?;
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::CollectionNotFound(id));
    }
    Ok(())
  }

  async fn append_answer(&self, id: Uuid, answer: Answer) -> Result<AppendOutcome> {
    let id_str     = encode_uuid(id);
    let row        = AnswerRow::new(&answer);
    let closed_str = encode_state(CollectionState::Closed);

    let outcome = self
      .conn
      .call(move |conn| {
        // Immediate: take the write lock before reading the state, so a close
        // cannot commit between the check and the insert.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let state: Option<String> = tx
          .query_row(
            "SELECT state FROM collections WHERE collection_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        let outcome = match state.as_deref() {
          None => AppendOutcome::Missing,
          Some(s) if s == closed_str => AppendOutcome::Closed,
          Some(_) => {
            row.insert(&tx, &id_str)?;
            AppendOutcome::Appended
          }
        };
        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    Ok(outcome)
  }
}
