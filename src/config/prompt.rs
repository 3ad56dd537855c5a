use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use log::info;

pub const DATA_PLACEHOLDER: &str = "{nobel_prize_data}";

const DEFAULT_INSTRUCTIONS: &str = include_str!("../../prompts/quizbot_instructions.txt");
const DEFAULT_DATA: &str = include_str!("../../prompts/nobel_prize_data.txt");

#[derive(Debug)]
pub enum PromptError {
    PlaceholderMissing(String),
    IoError(std::io::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::PlaceholderMissing(source) =>
                write!(f, "Prompt template '{}' has no {} placeholder", source, DATA_PLACEHOLDER),
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

/// Inlines the reference data into the instruction template.
///
/// The data is opaque text and is inserted verbatim.
pub fn render_system_prompt(
    template: &str,
    data: &str,
    source: &str
) -> Result<String, PromptError> {
    if !template.contains(DATA_PLACEHOLDER) {
        return Err(PromptError::PlaceholderMissing(source.to_string()));
    }
    Ok(template.replace(DATA_PLACEHOLDER, data))
}

fn read_or_default<P: AsRef<Path>>(
    path: Option<P>,
    default: &'static str
) -> Result<(String, String), PromptError> {
    match path {
        Some(p) => {
            let p = p.as_ref();
            let text = fs::read_to_string(p)?;
            info!("Loaded prompt file: {}", p.display());
            Ok((text, p.display().to_string()))
        }
        None => Ok((default.to_string(), "built-in".to_string())),
    }
}

/// Builds the system message from the built-in template and data, either of
/// which may be replaced by a file on disk.
pub fn load_system_prompt(
    prompt_path: Option<&str>,
    data_path: Option<&str>
) -> Result<String, PromptError> {
    let (template, source) = read_or_default(prompt_path, DEFAULT_INSTRUCTIONS)?;
    let (data, _) = read_or_default(data_path, DEFAULT_DATA)?;
    let prompt = render_system_prompt(&template, &data, &source)?;
    info!("System prompt ready ({} template, {} chars)", source, prompt.len());
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use uuid::Uuid;

    fn temp_file(contents: &str) -> std::path::PathBuf {
        let path = env::temp_dir().join(format!("quizbot-prompt-{}.txt", Uuid::new_v4()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn built_in_prompt_inlines_the_laureate_table() {
        let prompt = load_system_prompt(None, None).unwrap();

        assert!(prompt.starts_with("You are QuizBot"));
        assert!(!prompt.contains(DATA_PLACEHOLDER));
        assert!(prompt.contains("\"prizes\""));
        assert!(prompt.contains("Hassabis"));
        assert!(prompt.contains("Exit Quiz"));
    }

    #[test]
    fn data_is_passed_through_verbatim() {
        let rendered = render_system_prompt("data = {nobel_prize_data}", "{ \"x\": ,, }\n", "t").unwrap();
        assert_eq!(rendered, "data = { \"x\": ,, }\n");
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let err = render_system_prompt("no data here", "{}", "custom.txt").unwrap_err();
        assert!(matches!(err, PromptError::PlaceholderMissing(ref s) if s == "custom.txt"));
    }

    #[test]
    fn files_override_built_in_defaults() {
        let template = temp_file("Quiz me on: {nobel_prize_data}");
        let data = temp_file("[physics 2024]");

        let prompt = load_system_prompt(template.to_str(), data.to_str()).unwrap();
        assert_eq!(prompt, "Quiz me on: [physics 2024]");

        let _ = fs::remove_file(template);
        let _ = fs::remove_file(data);
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let missing = env::temp_dir().join(format!("quizbot-missing-{}.txt", Uuid::new_v4()));
        let err = load_system_prompt(missing.to_str(), None).unwrap_err();
        assert!(matches!(err, PromptError::IoError(_)));
    }
}
