use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Difficulty reported by the service: either a label ("Medium") or a raw score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Difficulty {
    Label(String),
    Score(f64),
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Label(label) => write!(f, "{}", label),
            Difficulty::Score(score) => write!(f, "{}", score),
        }
    }
}

impl From<&str> for Difficulty {
    fn from(label: &str) -> Self {
        Difficulty::Label(label.to_string())
    }
}

impl From<f64> for Difficulty {
    fn from(score: f64) -> Self {
        Difficulty::Score(score)
    }
}

/// One conversational turn. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modelo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            modelo: None,
            difficulty: None,
            category: None,
        }
    }

    /// Assistant turn without metadata
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            modelo: None,
            difficulty: None,
            category: None,
        }
    }

    pub fn with_modelo(mut self, modelo: impl Into<String>) -> Self {
        self.modelo = Some(modelo.into());
        self
    }

    pub fn with_difficulty(mut self, difficulty: impl Into<Difficulty>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn modelo(&self) -> Option<&str> {
        self.modelo.as_deref()
    }

    pub fn difficulty(&self) -> Option<&Difficulty> {
        self.difficulty.as_ref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// True when any of model, difficulty or category is present
    pub fn has_metadata(&self) -> bool {
        self.modelo.is_some() || self.difficulty.is_some() || self.category.is_some()
    }
}

/// Ordered, append-only conversation history.
///
/// Insertion order is the turn order and the display order; nothing is ever
/// removed or reordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    /// Index of the last message, if it is an assistant turn
    pub fn latest_assistant_index(&self) -> Option<usize> {
        match self.messages.last() {
            Some(message) if message.is_assistant() => Some(self.messages.len() - 1),
            _ => None,
        }
    }
}
