use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use tokio::sync::RwLock;
use crate::history::HistoryStore;
use crate::models::chat::{ ChatMessage, Conversation };

#[derive(Default)]
pub struct MemoryHistoryStore {
    conversations: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn add_message(
        &self,
        conversation_id: &str,
        message: &ChatMessage
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.conversations
            .write().await
            .entry(conversation_id.to_string())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn add_messages(
        &self,
        conversation_id: &str,
        messages: &[ChatMessage]
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.conversations
            .write().await
            .entry(conversation_id.to_string())
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }

    async fn get_conversation(
        &self,
        conversation_id: &str
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>> {
        let messages = self.conversations
            .read().await
            .get(conversation_id)
            .cloned()
            .unwrap_or_default();

        Ok(Conversation {
            id: conversation_id.to_string(),
            messages,
        })
    }
}
