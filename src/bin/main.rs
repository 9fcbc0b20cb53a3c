//! Command-line front end
//!
//! Usage: `chatbot [DATA_FILE] [QUERY...]`
//!
//! Without a data file the built-in sample is used. With a query the answer
//! is printed once; otherwise queries are read line by line from stdin.

use financial_chatbot::{agent::FinancialChatbot, session::InMemorySessionStore};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1).peekable();
    let chatbot = FinancialChatbot::new(Box::new(InMemorySessionStore::new()));

    let first = args.peek().cloned();
    let summary = match first.as_deref() {
        Some("--sample") => {
            args.next();
            chatbot.load_sample().await?
        }
        // Anything with an extension is a data file, the rest is query text
        Some(path) if Path::new(path).extension().is_some() => {
            args.next();
            chatbot.load_path(Path::new(path)).await?
        }
        _ => chatbot.load_sample().await?,
    };

    info!(source = %summary.source, records = summary.record_count, "Dataset loaded");

    let query: Vec<String> = args.collect();
    if !query.is_empty() {
        let reply = chatbot.query(&query.join(" ")).await?;
        println!("{}", reply.response);
        return Ok(());
    }

    println!(
        "Loaded {} records for {}. Type 'help' for options, 'quit' to exit.",
        summary.record_count,
        summary.companies.join(", ")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let reply = chatbot.query(line).await?;
        println!("{}\n", reply.response);
    }

    Ok(())
}
