pub mod api;

use crate::agent::QuizAgent;
use crate::cli::Args;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

pub struct Server {
    addr: String,
    agent: Arc<QuizAgent>,
    args: Args,
}

impl Server {
    pub fn new(addr: String, agent: Arc<QuizAgent>, args: Args) -> Self {
        Self { addr, agent, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid server address '{}': {}", self.addr, e))?;
        api::start_http_server(addr, Arc::clone(&self.agent), &self.args).await
    }
}
