//! Core types and trait definitions for Verdict.
//!
//! Contests and topics are both modelled as a deadline-bound [`Collection`]
//! of answers. This crate holds the domain model, the similar-text scorer and
//! the collaborator traits; it is deliberately free of HTTP, database and
//! runtime dependencies.

// Native `async fn` in traits; `Send` bounds are spelled out on the returned
// futures instead.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod collection;
pub mod error;
pub mod prompt;
pub mod similarity;
pub mod store;
pub mod summarizer;

pub use collection::{Answer, Collection, CollectionKind, CollectionState};
pub use error::{Error, Result, SummarizationError};
