//! Handlers for the collection endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/{kind}` | Every collection of the kind, oldest first |
//! | `POST` | `/{kind}` | Body: `{"title","description","deadline","owner_id"}` |
//! | `GET`  | `/{kind}/:id` | 404 if missing or of the other kind |
//!
//! `{kind}` is `contests` or `topics`. Reads close overdue collections
//! before answering.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use verdict_core::{
  CollectionKind,
  collection::{CollectionView, NewCollection},
  store::CollectionStore,
  summarizer::Summarizer,
};
use verdict_engine::CollectionLifecycle;

use crate::{KindSegment, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /{kind}`
pub async fn list<S, M>(
  State(lifecycle): State<CollectionLifecycle<S, M>>,
  Path(kind): Path<KindSegment>,
) -> Result<Json<Vec<CollectionView>>, ApiError>
where
  S: CollectionStore + 'static,
  M: Summarizer + 'static,
{
  let views = lifecycle.list_collections(Some(kind.into())).await?;
  Ok(Json(views))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// Missing text fields deserialize as empty so they fail validation with a
/// 400 rather than a body rejection.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub title:       String,
  #[serde(default)]
  pub description: String,
  pub deadline:    Option<DateTime<Utc>>,
  pub owner_id:    Uuid,
}

/// `POST /{kind}`
pub async fn create<S, M>(
  State(lifecycle): State<CollectionLifecycle<S, M>>,
  Path(kind): Path<KindSegment>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CollectionStore + 'static,
  M: Summarizer + 'static,
{
  let collection = lifecycle
    .create(NewCollection {
      kind:        kind.into(),
      title:       body.title,
      description: body.description,
      deadline:    body.deadline,
      owner_id:    body.owner_id,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(collection)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /{kind}/:id`
pub async fn get_one<S, M>(
  State(lifecycle): State<CollectionLifecycle<S, M>>,
  Path((kind, id)): Path<(KindSegment, Uuid)>,
) -> Result<Json<CollectionView>, ApiError>
where
  S: CollectionStore + 'static,
  M: Summarizer + 'static,
{
  ensure_kind(&lifecycle, kind, id).await?;
  let view = lifecycle.get_collection(id).await?;
  Ok(Json(view))
}

/// 404 unless `id` is stored with `kind`. Reads the store directly, so a
/// request for the wrong kind never closes an overdue collection.
pub(crate) async fn ensure_kind<S, M>(
  lifecycle: &CollectionLifecycle<S, M>,
  kind: KindSegment,
  id: Uuid,
) -> Result<(), ApiError>
where
  S: CollectionStore + 'static,
  M: Summarizer + 'static,
{
  let stored = lifecycle
    .store()
    .load(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  match stored {
    Some(c) if c.kind == CollectionKind::from(kind) => Ok(()),
    _ => Err(ApiError::NotFound(format!("collection {id} not found"))),
  }
}
