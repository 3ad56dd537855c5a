use clap::Parser;
use crate::llm::LlmType;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (openai, groq, ollama)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "openai")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// Model name for chat completion (e.g., gpt-3.5-turbo, llama3)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    /// OpenAI API key. Required when chat_llm_type is openai.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Groq API key. Required when chat_llm_type is groq.
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Sampling temperature sent with every completion call.
    #[arg(long, env = "QUIZ_TEMPERATURE", default_value = "0.5")]
    pub temperature: f32,

    // --- Prompt Args ---
    /// Optional path to a quiz instruction template. Must contain {nobel_prize_data}.
    #[arg(long, env = "PROMPT_PATH")]
    pub prompt_path: Option<String>,

    /// Optional path to the laureate reference data inlined into the system prompt.
    #[arg(long, env = "DATA_PATH")]
    pub data_path: Option<String>,

    // --- History Store Args ---
    /// History chat store type (memory, redis)
    #[arg(long, env = "HISTORY_TYPE", default_value = "memory")]
    pub history_type: String,

    /// History chat store host endpoint (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "HISTORY_HOST", default_value = "redis://127.0.0.1:6379")]
    pub history_host: String,

    /// Prefix for Redis history keys.
    #[arg(long, env = "HISTORY_REDIS_PREFIX", default_value = "quizbot:history:")]
    pub history_redis_prefix: String,

    /// Number of most recent non-system messages sent to the model. 0 sends everything.
    #[arg(long, env = "HISTORY_WINDOW", default_value = "0")]
    pub history_window: usize,

    // --- General App Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:8080")]
    pub server_addr: String,

    /// Also serve the quiz dashboard page on GET /.
    #[arg(long, env = "QUIZ_DASHBOARD", default_value = "false")]
    pub dashboard: bool,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    /// API key configured for the given provider, if any.
    pub fn api_key_for(&self, llm_type: &LlmType) -> Option<&str> {
        match llm_type {
            LlmType::OpenAI => self.openai_api_key.as_deref(),
            LlmType::Groq => self.groq_api_key.as_deref(),
            LlmType::Ollama => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_key_matching_the_provider() {
        let args = Args::parse_from([
            "nobel-quizbot",
            "--openai-api-key",
            "sk-openai",
            "--groq-api-key",
            "gsk-groq",
        ]);

        assert_eq!(args.api_key_for(&LlmType::OpenAI), Some("sk-openai"));
        assert_eq!(args.api_key_for(&LlmType::Groq), Some("gsk-groq"));
        assert_eq!(args.api_key_for(&LlmType::Ollama), None);
    }

    #[test]
    fn explicit_flags_override_defaults() {
        let args = Args::parse_from([
            "nobel-quizbot",
            "--temperature",
            "0.2",
            "--history-window",
            "6",
            "--dashboard",
        ]);

        assert!((args.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(args.history_window, 6);
        assert!(args.dashboard);
    }
}
