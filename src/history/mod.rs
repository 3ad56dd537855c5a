mod memory;
mod redis;
use async_trait::async_trait;
use log::info;
use std::error::Error;
use crate::cli::Args;
use std::sync::Arc;
use crate::models::chat::{ ChatMessage, Conversation };

pub use self::memory::MemoryHistoryStore;
pub use self::redis::RedisHistoryStore;

/// Append-only, session-keyed conversation storage.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn add_message(
        &self,
        conversation_id: &str,
        message: &ChatMessage
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Appends every message or none of them.
    async fn add_messages(
        &self,
        conversation_id: &str,
        messages: &[ChatMessage]
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Full conversation in insertion order. Unknown ids yield an empty conversation.
    async fn get_conversation(
        &self,
        conversation_id: &str
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>>;
}

pub fn create_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    match args.history_type.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(MemoryHistoryStore::new())),
        "redis" => {
            let store = RedisHistoryStore::new(&args.history_host, &args.history_redis_prefix)?;
            Ok(Arc::new(store))
        }
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported history store type: {}", args.history_type)
                    )
                )
            ),
    }
}

pub fn initialize_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    if args.history_type.eq_ignore_ascii_case("memory") {
        info!("Chat history will be kept in process memory");
    } else {
        info!("Chat history will be stored in: {} at {}", args.history_type, args.history_host);
    }
    create_history_store(args)
}
