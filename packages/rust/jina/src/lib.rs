//! Search and content acquisition for nightbrief.
//!
//! Talks to a Jina-style API pair: a search endpoint that returns ranked
//! hits and a reader endpoint that turns any URL into markdown. On top of
//! the raw client sit the keyword aggregator and the batched content
//! fetcher used by the nightly pipeline.

pub mod aggregator;
pub mod client;
pub mod fetcher;

pub use aggregator::search_all;
pub use client::{JinaClient, PageContent};
pub use fetcher::{FetchOptions, fetch_documents};
