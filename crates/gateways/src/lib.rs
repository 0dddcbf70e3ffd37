//! Gateway adapters for Tether.
//!
//! The core crate defines the `CompletionGateway` and `RetrievalGateway`
//! traits; this crate provides the concrete adapters:
//!
//! - [`OpenAiCompatGateway`] — any OpenAI-compatible `/chat/completions`
//!   endpoint (OpenAI, OpenRouter, Ollama, vLLM, …)
//! - [`HttpRetrievalGateway`] — a JSON top-k search endpoint
//! - [`InMemoryRetrieval`] — an in-process keyword-scored index for tests,
//!   demos, and offline sessions

pub mod http_retrieval;
pub mod in_memory_retrieval;
pub mod openai_compat;

pub use http_retrieval::HttpRetrievalGateway;
pub use in_memory_retrieval::InMemoryRetrieval;
pub use openai_compat::OpenAiCompatGateway;
