//! `tether chat` — interactive grounded chat.

use std::io::Write;
use std::path::PathBuf;
use tether_config::AppConfig;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(corpus: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let mut session = super::build_session(&config, corpus.as_deref()).await?;

    println!();
    println!("  Tether — grounded chat");
    println!();
    println!("  Model:     {}", config.completion.model);
    println!(
        "  Retrieval: {}",
        config
            .retrieval
            .base_url
            .as_deref()
            .unwrap_or("in-process index")
    );
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }
        if text == "exit" {
            break;
        }

        match session.send(text).await {
            Ok(answer) => {
                println!();
                for line in answer.lines() {
                    println!("  Assistant > {line}");
                }
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}
