//! The `Summarizer` trait, which picks a best answer from a prompt.

use std::future::Future;

/// An external text generator. Given a prompt, returns one text.
///
/// Calls may fail or hang; callers bound them with a timeout and treat any
/// failure as "no best answer".
pub trait Summarizer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn summarize<'a>(
    &'a self,
    prompt: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}
