pub mod chat;
use serde::{ Deserialize, Serialize };
use std::str::FromStr;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmType {
    OpenAI,
    Groq,
    Ollama,
}

impl LlmType {
    /// Environment variable holding the provider credential. `None` for keyless providers.
    pub fn credential_env(&self) -> Option<&'static str> {
        match self {
            LlmType::OpenAI => Some("OPENAI_API_KEY"),
            LlmType::Groq => Some("GROQ_API_KEY"),
            LlmType::Ollama => None,
        }
    }
}

impl fmt::Display for LlmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LlmType::OpenAI => "openai",
            LlmType::Groq => "groq",
            LlmType::Ollama => "ollama",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseLlmTypeError {
    message: String,
}

impl fmt::Display for ParseLlmTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseLlmTypeError {}
impl FromStr for LlmType {
    type Err = ParseLlmTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmType::OpenAI),
            "groq" => Ok(LlmType::Groq),
            "ollama" => Ok(LlmType::Ollama),
            _ =>
                Err(ParseLlmTypeError {
                    message: format!("Invalid LLM type: '{}'", s),
                }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub llm_type: LlmType,
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_type: LlmType::OpenAI,
            api_key: None,
            completion_model: None,
            base_url: None,
        }
    }
}

/// Joins a provider base URL and an API route, rejecting bases that are not absolute URLs.
pub fn endpoint(base_url: &str, route: &str) -> Result<String, url::ParseError> {
    let base = Url::parse(base_url)?;
    Ok(format!("{}{}", base.as_str().trim_end_matches('/'), route))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_names_case_insensitively() {
        assert_eq!("OpenAI".parse::<LlmType>(), Ok(LlmType::OpenAI));
        assert_eq!(" groq ".parse::<LlmType>(), Ok(LlmType::Groq));
        assert_eq!("ollama".parse::<LlmType>(), Ok(LlmType::Ollama));
        assert!("anthropic".parse::<LlmType>().is_err());
    }

    #[test]
    fn only_hosted_providers_need_a_credential() {
        assert_eq!(LlmType::OpenAI.credential_env(), Some("OPENAI_API_KEY"));
        assert_eq!(LlmType::Groq.credential_env(), Some("GROQ_API_KEY"));
        assert_eq!(LlmType::Ollama.credential_env(), None);
    }

    #[test]
    fn endpoint_joins_without_double_slashes() {
        assert_eq!(
            endpoint("https://api.openai.com/", "/v1/chat/completions").unwrap(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint("http://localhost:11434", "/api/chat").unwrap(),
            "http://localhost:11434/api/chat"
        );
        assert!(endpoint("not a url", "/api/chat").is_err());
    }
}
