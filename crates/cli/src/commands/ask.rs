//! `tether ask` — single-question mode.

use std::path::PathBuf;
use tether_config::AppConfig;

pub async fn run(
    question: &str,
    corpus: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let mut session = super::build_session(&config, corpus.as_deref()).await?;

    let answer = session.send(question).await?;
    println!("{answer}");

    Ok(())
}
