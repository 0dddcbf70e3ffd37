//! The tool orchestration loop — the heart of Tether.
//!
//! One user turn runs a single model-decides / tool-executes /
//! model-finalizes cycle:
//!
//! 1. **Append** the user turn to the transcript and prune history
//! 2. **Call** the completion gateway with the wire conversation and the
//!    retrieval tool descriptor
//! 3. **If tool requests**: dispatch each to the retrieval gateway, fold
//!    the results back in, call the completion gateway once more
//! 4. **Return** the final text and append it as the assistant turn
//!
//! At most two completion calls and one retrieval call per invocation
//! request — there is deliberately no deeper recursion.

pub mod orchestrator;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use orchestrator::{RETRIEVAL_TOP_K, TurnOrchestrator, fold_documents};
pub use session::ChatSession;
