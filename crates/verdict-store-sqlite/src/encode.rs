//! Encoding and decoding helpers between Verdict domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 strings (so they sort as text), UUIDs
//! hyphenated lowercase strings, and enums their lowercase names.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;
use verdict_core::collection::{Answer, Collection, CollectionKind, CollectionState};

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── CollectionKind ───────────────────────────────────────────────────────────

pub fn encode_kind(k: CollectionKind) -> &'static str {
  match k {
    CollectionKind::Contest => "contest",
    CollectionKind::Topic => "topic",
  }
}

pub fn decode_kind(s: &str) -> Result<CollectionKind> {
  match s {
    "contest" => Ok(CollectionKind::Contest),
    "topic" => Ok(CollectionKind::Topic),
    other => Err(Error::UnknownValue { column: "kind", value: other.to_owned() }),
  }
}

// ─── CollectionState ──────────────────────────────────────────────────────────

pub fn encode_state(s: CollectionState) -> &'static str {
  match s {
    CollectionState::Open => "open",
    CollectionState::Closed => "closed",
  }
}

pub fn decode_state(s: &str) -> Result<CollectionState> {
  match s {
    "open" => Ok(CollectionState::Open),
    "closed" => Ok(CollectionState::Closed),
    other => Err(Error::UnknownValue { column: "state", value: other.to_owned() }),
  }
}

// ─── Raw rows ─────────────────────────────────────────────────────────────────

/// A `collections` row as read from SQLite, before decoding.
pub struct RawCollection {
  pub collection_id: String,
  pub kind:          String,
  pub title:         String,
  pub description:   String,
  pub deadline:      String,
  pub owner_id:      String,
  pub created_at:    String,
  pub state:         String,
  pub best_answer:   Option<String>,
  pub closed_at:     Option<String>,
}

/// Column list matching [`RawCollection::from_row`].
pub const COLLECTION_COLUMNS: &str = "collection_id, kind, title, description, deadline, \
                                      owner_id, created_at, state, best_answer, closed_at";

impl RawCollection {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      collection_id: row.get(0)?,
      kind:          row.get(1)?,
      title:         row.get(2)?,
      description:   row.get(3)?,
      deadline:      row.get(4)?,
      owner_id:      row.get(5)?,
      created_at:    row.get(6)?,
      state:         row.get(7)?,
      best_answer:   row.get(8)?,
      closed_at:     row.get(9)?,
    })
  }

  pub fn into_collection(self, answers: Vec<Answer>) -> Result<Collection> {
    Ok(Collection {
      collection_id: decode_uuid(&self.collection_id)?,
      kind:          decode_kind(&self.kind)?,
      title:         self.title,
      description:   self.description,
      deadline:      decode_dt(&self.deadline)?,
      owner_id:      decode_uuid(&self.owner_id)?,
      created_at:    decode_dt(&self.created_at)?,
      state:         decode_state(&self.state)?,
      answers,
      best_answer:   self.best_answer,
      closed_at:     self.closed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// An `answers` row as read from SQLite, before decoding.
pub struct RawAnswer {
  pub collection_id: String,
  pub answer_id:     String,
  pub text:          String,
  pub author_id:     String,
  pub submitted_at:  String,
}

/// Column list matching [`RawAnswer::from_row`].
pub const ANSWER_COLUMNS: &str = "collection_id, answer_id, text, author_id, submitted_at";

impl RawAnswer {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      collection_id: row.get(0)?,
      answer_id:     row.get(1)?,
      text:          row.get(2)?,
      author_id:     row.get(3)?,
      submitted_at:  row.get(4)?,
    })
  }

  pub fn into_answer(self) -> Result<Answer> {
    Ok(Answer {
      answer_id:    decode_uuid(&self.answer_id)?,
      text:         self.text,
      author_id:    decode_uuid(&self.author_id)?,
      submitted_at: decode_dt(&self.submitted_at)?,
    })
  }
}
