//! [`GeminiSummarizer`], a [`Summarizer`] backed by the Gemini
//! `generateContent` REST endpoint.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use verdict_core::summarizer::Summarizer;

use crate::SummarizerConfig;

#[derive(Debug, Error)]
pub enum GeminiError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("gemini returned {status}: {body}")]
  Status { status: StatusCode, body: String },

  #[error("response contained no text")]
  EmptyResponse,
}

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
  contents: [RequestContent<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
  parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
  text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
  #[serde(default)]
  parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
  text: Option<String>,
}

impl GenerateResponse {
  /// The text parts of the first candidate, concatenated.
  fn into_text(self) -> Result<String, GeminiError> {
    let text: String = self
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
      .unwrap_or_default();

    if text.trim().is_empty() {
      return Err(GeminiError::EmptyResponse);
    }
    Ok(text)
  }
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct GeminiSummarizer {
  client:   Client,
  endpoint: String,
  api_key:  String,
}

impl GeminiSummarizer {
  pub fn new(config: &SummarizerConfig) -> Result<Self, GeminiError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    let endpoint = format!(
      "{}/v1beta/models/{}:generateContent",
      config.base_url.trim_end_matches('/'),
      config.model
    );
    Ok(Self { client, endpoint, api_key: config.api_key.clone() })
  }
}

impl Summarizer for GeminiSummarizer {
  type Error = GeminiError;

  async fn summarize(&self, prompt: &str) -> Result<String, GeminiError> {
    let body = GenerateRequest {
      contents: [RequestContent { parts: [RequestPart { text: prompt }] }],
    };

    let resp = self
      .client
      .post(&self.endpoint)
      .query(&[("key", &self.api_key)])
      .json(&body)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(GeminiError::Status { status, body });
    }

    let text = resp.json::<GenerateResponse>().await?.into_text()?;
    debug!(chars = text.len(), "gemini replied");
    Ok(text)
  }
}
