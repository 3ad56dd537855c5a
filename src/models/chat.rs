use chrono::Utc;
use serde::{ Serialize, Deserialize };
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages to send upstream: the system message plus at most `window`
    /// of the most recent other messages. A window of 0 keeps everything.
    pub fn windowed(&self, window: usize) -> Vec<ChatMessage> {
        if window == 0 {
            return self.messages.clone();
        }
        let (system, rest): (Vec<&ChatMessage>, Vec<&ChatMessage>) = self.messages
            .iter()
            .partition(|m| m.role == Role::System);
        let start = rest.len().saturating_sub(window);
        system
            .into_iter()
            .chain(rest[start..].iter().copied())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(turns: usize) -> Conversation {
        let mut messages = vec![ChatMessage::system("instructions")];
        for i in 0..turns {
            messages.push(ChatMessage::user(format!("q{}", i)));
            messages.push(ChatMessage::assistant(format!("a{}", i)));
        }
        Conversation { id: "s".to_string(), messages }
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_value(ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn zero_window_keeps_everything() {
        let conv = conversation(3);
        assert_eq!(conv.windowed(0).len(), 7);
    }

    #[test]
    fn window_keeps_system_first_and_latest_messages() {
        let conv = conversation(3);
        let trimmed = conv.windowed(2);

        let contents: Vec<&str> = trimmed.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["instructions", "q2", "a2"]);
        assert_eq!(trimmed[0].role, Role::System);
    }

    #[test]
    fn window_larger_than_history_is_a_no_op() {
        let conv = conversation(1);
        assert_eq!(conv.windowed(50).len(), 3);
    }
}
