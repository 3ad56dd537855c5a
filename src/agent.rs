use crate::cli::Args;
use crate::config::prompt;
use crate::history::{ initialize_history_store, HistoryStore };
use crate::llm::{ LlmConfig, LlmType };
use crate::llm::chat::{ ChatClient, new_client as new_chat_client };
use crate::models::chat::{ ChatMessage, Conversation };

use log::{ info, debug, error };
use std::collections::HashMap;
use std::error::Error;
use std::sync::{ Arc, Mutex as StdMutex, PoisonError };
use thiserror::Error;
use tokio::sync::Mutex;

/// Conversation used when a caller does not name one.
pub const DEFAULT_SESSION_ID: &str = "default";

type SessionLocks = StdMutex<HashMap<String, Arc<Mutex<()>>>>;

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("history store error: {0}")]
    History(#[source] Box<dyn Error + Send + Sync>),
    #[error("completion service error: {0}")]
    Completion(#[source] Box<dyn Error + Send + Sync>),
}

/// A claim on one session's turn lock. The table entry is removed when the
/// last claim is dropped.
struct SessionSlot<'a> {
    locks: &'a SessionLocks,
    session_id: &'a str,
    lock: Arc<Mutex<()>>,
}

impl Drop for SessionSlot<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference belongs to the table and one to this slot; any more are queued turns.
        if Arc::strong_count(&self.lock) <= 2 {
            locks.remove(self.session_id);
        }
    }
}

pub struct QuizAgent {
    chat_client: Arc<dyn ChatClient>,
    history_store: Arc<dyn HistoryStore>,
    system_prompt: Arc<str>,
    temperature: f32,
    history_window: usize,
    session_locks: SessionLocks,
}

impl QuizAgent {
    fn initialize_chat_client(
        args: &Args,
        api_key: Option<String>
    ) -> Result<Arc<dyn ChatClient>, Box<dyn Error + Send + Sync>> {
        let chat_llm_type: LlmType = args.chat_llm_type.parse()?;
        let chat_config = LlmConfig {
            api_key,
            llm_type: chat_llm_type,
            base_url: args.chat_base_url.clone(),
            completion_model: args.chat_model.clone(),
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={:?}",
            chat_config.llm_type,
            chat_client.get_model(),
            chat_client.get_base_url().as_deref().unwrap_or("adapter default")
        );
        Ok(chat_client)
    }

    /// `api_key` is the credential already vetted by the startup guard.
    pub fn new(args: &Args, api_key: Option<String>) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let chat_client = Self::initialize_chat_client(args, api_key)?;
        let history_store = initialize_history_store(args)?;
        let system_prompt = prompt::load_system_prompt(
            args.prompt_path.as_deref(),
            args.data_path.as_deref()
        )?;

        Ok(
            Self::with_parts(
                chat_client,
                history_store,
                system_prompt,
                args.temperature,
                args.history_window
            )
        )
    }

    pub fn with_parts(
        chat_client: Arc<dyn ChatClient>,
        history_store: Arc<dyn HistoryStore>,
        system_prompt: impl Into<Arc<str>>,
        temperature: f32,
        history_window: usize
    ) -> Self {
        Self {
            chat_client,
            history_store,
            system_prompt: system_prompt.into(),
            temperature,
            history_window,
            session_locks: StdMutex::new(HashMap::new()),
        }
    }

    fn claim_session<'a>(&'a self, session_id: &'a str) -> SessionSlot<'a> {
        let mut locks = self.session_locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = Arc::clone(locks.entry(session_id.to_string()).or_default());
        SessionSlot { locks: &self.session_locks, session_id, lock }
    }

    /// Runs one turn: the user text and the model reply are appended together
    /// only after the completion call succeeds, so a failed turn leaves the
    /// conversation as it was.
    pub async fn process_message(
        &self,
        session_id: &str,
        message: &str
    ) -> Result<String, TurnError> {
        let slot = self.claim_session(session_id);
        let _turn = slot.lock.lock().await;

        let mut conversation = self.history_store
            .get_conversation(session_id).await
            .map_err(TurnError::History)?;

        if conversation.is_empty() {
            let system = ChatMessage::system(&*self.system_prompt);
            self.history_store
                .add_message(session_id, &system).await
                .map_err(TurnError::History)?;
            conversation.messages.push(system);
            info!("Started conversation '{}'", session_id);
        }

        let user = ChatMessage::user(message);
        let mut request = conversation.windowed(self.history_window);
        request.push(user.clone());
        debug!(
            "Conversation '{}': sending {} of {} messages",
            session_id,
            request.len(),
            conversation.len() + 1
        );

        let reply = self.chat_client
            .complete(&request, self.temperature).await
            .map_err(|e| {
                error!("Completion failed for conversation '{}': {}", session_id, e);
                TurnError::Completion(e)
            })?;

        let assistant = ChatMessage::assistant(reply.response);
        self.history_store
            .add_messages(session_id, &[user, assistant.clone()]).await
            .map_err(|e| {
                error!("Failed to record turn for conversation '{}': {}", session_id, e);
                TurnError::History(e)
            })?;

        Ok(assistant.content)
    }

    pub async fn conversation(&self, session_id: &str) -> Result<Conversation, TurnError> {
        self.history_store.get_conversation(session_id).await.map_err(TurnError::History)
    }
}
