pub mod agent;
pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod history;

use agent::QuizAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

/// Starts the quiz service. `api_key` is the trimmed credential returned by
/// `config::credentials::ensure_credential`.
pub async fn run(args: Args, api_key: Option<String>) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Temperature: {}", args.temperature);
    info!("Prompt Path: {}", args.prompt_path.as_deref().unwrap_or("built-in"));
    info!("Data Path: {}", args.data_path.as_deref().unwrap_or("built-in"));
    info!("History Store Type: {}", args.history_type);
    if args.history_type.eq_ignore_ascii_case("redis") {
        info!("History Store Host: {}", args.history_host);
    }
    info!("History Window: {}", match args.history_window {
        0 => "unbounded".to_string(),
        n => n.to_string(),
    });
    info!("Dashboard Enabled: {}", args.dashboard);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let agent = Arc::new(QuizAgent::new(&args, api_key)?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, args);
    server.run().await?;

    Ok(())
}
