//! SQL schema for the Verdict SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS collections (
    collection_id TEXT PRIMARY KEY,
    kind          TEXT NOT NULL,   -- 'contest' | 'topic'
    title         TEXT NOT NULL,
    description   TEXT NOT NULL,
    deadline      TEXT NOT NULL,   -- ISO 8601 UTC
    owner_id      TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    state         TEXT NOT NULL DEFAULT 'open',  -- 'open' | 'closed'
    best_answer   TEXT,            -- written only by the close
    closed_at     TEXT,
    CHECK (state = 'closed' OR (best_answer IS NULL AND closed_at IS NULL))
);

-- Answers are append-only; `seq` preserves submission order.
CREATE TABLE IF NOT EXISTS answers (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    answer_id     TEXT NOT NULL UNIQUE,
    collection_id TEXT NOT NULL REFERENCES collections(collection_id),
    text          TEXT NOT NULL,
    author_id     TEXT NOT NULL,
    submitted_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS answers_collection_idx  ON answers(collection_id, seq);
CREATE INDEX IF NOT EXISTS collections_kind_idx    ON collections(kind, created_at);

PRAGMA user_version = 1;
";
