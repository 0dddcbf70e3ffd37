//! CLI command implementations.

pub mod ask;
pub mod chat;
pub mod onboard;

use std::path::Path;
use std::sync::Arc;
use tether_agent::ChatSession;
use tether_config::AppConfig;
use tether_core::completion::CompletionGateway;
use tether_core::retrieval::RetrievalGateway;
use tether_gateways::{HttpRetrievalGateway, InMemoryRetrieval, OpenAiCompatGateway};

/// Build a session from the loaded config, optionally seeding the
/// in-process index from a corpus directory.
pub async fn build_session(
    config: &AppConfig,
    corpus: Option<&Path>,
) -> Result<ChatSession, Box<dyn std::error::Error>> {
    let Some(api_key) = &config.api_key else {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    TETHER_API_KEY      (generic)");
        eprintln!("    OPENROUTER_API_KEY  (for OpenRouter)");
        eprintln!("    OPENAI_API_KEY      (for OpenAI direct)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    };

    let completion: Arc<dyn CompletionGateway> = Arc::new(OpenAiCompatGateway::new(
        "completion",
        &config.completion.base_url,
        api_key,
    )?);

    let retrieval: Arc<dyn RetrievalGateway> = match &config.retrieval.base_url {
        Some(url) => Arc::new(HttpRetrievalGateway::new(url)?),
        None => {
            let index = InMemoryRetrieval::new();
            if let Some(dir) = corpus {
                let loaded = load_corpus(&index, dir).await?;
                tracing::info!(documents = loaded, dir = %dir.display(), "Corpus loaded");
            }
            Arc::new(index)
        }
    };

    let mut session = ChatSession::new(completion, retrieval, &config.completion.model)
        .with_params(config.generation_params())
        .with_max_turns(config.history.max_turns)
        .with_top_k(config.retrieval.top_k);

    if let Some(prompt) = &config.system_prompt {
        session = session.with_system_prompt(prompt);
    }

    Ok(session)
}

/// Load every .txt/.md file under `dir` into the index, one document per
/// file, file name as the source label.
async fn load_corpus(
    index: &InMemoryRetrieval,
    dir: &Path,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut loaded = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_text = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "txt" || e == "md");
        if !is_text {
            continue;
        }

        let text = std::fs::read_to_string(&path)?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        index.add(text, source).await;
        loaded += 1;
    }
    Ok(loaded)
}
