//! Handler for `POST /{kind}/:id/answers`.
//!
//! Body: `{"text":"...","author_id":"<uuid>"}`. Answers to a closed
//! collection are refused with 409.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use verdict_core::{store::CollectionStore, summarizer::Summarizer};
use verdict_engine::CollectionLifecycle;

use crate::{KindSegment, collections::ensure_kind, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct AnswerBody {
  #[serde(default)]
  pub text:      String,
  pub author_id: Uuid,
}

/// `POST /{kind}/:id/answers`
pub async fn create<S, M>(
  State(lifecycle): State<CollectionLifecycle<S, M>>,
  Path((kind, id)): Path<(KindSegment, Uuid)>,
  Json(body): Json<AnswerBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CollectionStore + 'static,
  M: Summarizer + 'static,
{
  ensure_kind(&lifecycle, kind, id).await?;
  let answer = lifecycle.add_answer(id, body.text, body.author_id).await?;
  Ok((StatusCode::CREATED, Json(answer)))
}
