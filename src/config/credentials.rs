use crate::llm::LlmType;
use log::info;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("{env_var} is not set; the {provider} provider cannot be used without it")]
    Missing { provider: LlmType, env_var: &'static str },
}

impl CredentialError {
    /// Operator-facing help printed before the process exits.
    pub fn guidance(&self) -> String {
        match self {
            CredentialError::Missing { provider, env_var } =>
                format!(
                    "{provider} API key is not set\n\n\
                     Please set the {env_var} environment variable to your {provider} API key using the following or similar syntax:\n\
                     >export {env_var}=\"your-api-key\""
                ),
        }
    }
}

/// Checks that the selected provider has a usable credential.
///
/// Returns the key for hosted providers and `None` for keyless ones (Ollama).
/// A blank value counts as missing.
pub fn ensure_credential(
    llm_type: &LlmType,
    provided: Option<&str>
) -> Result<Option<String>, CredentialError> {
    let Some(env_var) = llm_type.credential_env() else {
        info!("{} provider does not require an API key", llm_type);
        return Ok(None);
    };

    match provided.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => {
            info!("{} API key is set", llm_type);
            Ok(Some(key.to_string()))
        }
        None => Err(CredentialError::Missing { provider: llm_type.clone(), env_var }),
    }
}
