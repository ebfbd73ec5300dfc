//! Summarization for nightbrief: a DeepSeek chat-completion client plus the
//! narrative/key-point summarization stage built on it.

pub mod client;
pub mod summarizer;

pub use client::DeepSeekClient;
pub use summarizer::summarize;
