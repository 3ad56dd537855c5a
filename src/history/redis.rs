use async_trait::async_trait;
use crate::models::chat::{ ChatMessage, Conversation };
use crate::history::HistoryStore;
use std::error::Error;
use log::error;
use redis::{ Client, AsyncCommands };

pub struct RedisHistoryStore {
    client: Client,
    key_prefix: String,
}

impl RedisHistoryStore {
    pub fn new(host: &str, key_prefix: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(Self {
            client: Client::open(host)?,
            key_prefix: key_prefix.to_string(),
        })
    }

    fn key(&self, conversation_id: &str) -> String {
        format!("{}{}", self.key_prefix, conversation_id)
    }

    fn decode_entries(
        &self,
        conversation_id: &str,
        json_entries: &[String]
    ) -> Result<Vec<ChatMessage>, Box<dyn Error + Send + Sync>> {
        json_entries
            .iter()
            .enumerate()
            .map(|(index, json_entry)| {
                serde_json::from_str::<ChatMessage>(json_entry).map_err(|e| {
                    error!("Corrupt history entry {} in '{}': {}", index, self.key(conversation_id), e);
                    let message = format!(
                        "Corrupt history entry {} in conversation '{}': {}",
                        index,
                        conversation_id,
                        e
                    );
                    Box::<dyn Error + Send + Sync>::from(message)
                })
            })
            .collect()
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn add_message(
        &self,
        conversation_id: &str,
        message: &ChatMessage
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let json_msg = serde_json::to_string(message)?;
        let _: i64 = conn.rpush(self.key(conversation_id), &json_msg).await?;
        Ok(())
    }

    async fn add_messages(
        &self,
        conversation_id: &str,
        messages: &[ChatMessage]
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        if messages.is_empty() {
            return Ok(());
        }
        let json_msgs = messages
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<String>, _>>()?;
        let mut conn = self.get_connection().await?;
        // A single multi-value RPUSH is atomic on the server.
        let _: i64 = conn.rpush(self.key(conversation_id), json_msgs).await?;
        Ok(())
    }

    async fn get_conversation(
        &self,
        conversation_id: &str
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let json_entries: Vec<String> = conn.lrange(self.key(conversation_id), 0, -1).await?;
        let messages = self.decode_entries(conversation_id, &json_entries)?;

        Ok(Conversation {
            id: conversation_id.to_string(),
            messages,
        })
    }
}
