use serde::{ Serialize, Deserialize };

/// Body of `POST /quiz`. A missing or null prompt is read as an empty string.
#[derive(Debug, Default, Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    prompt: Option<String>,
}

impl QuizRequest {
    pub fn into_prompt(self) -> String {
        self.prompt.unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_null_prompt_becomes_empty() {
        let missing: QuizRequest = serde_json::from_str("{}").unwrap();
        let null: QuizRequest = serde_json::from_str(r#"{"prompt": null}"#).unwrap();
        let given: QuizRequest = serde_json::from_str(r#"{"prompt": "Go"}"#).unwrap();

        assert_eq!(missing.into_prompt(), "");
        assert_eq!(null.into_prompt(), "");
        assert_eq!(given.into_prompt(), "Go");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let req: QuizRequest = serde_json::from_str(r#"{"prompt": "4", "extra": 1}"#).unwrap();
        assert_eq!(req.into_prompt(), "4");
    }
}
