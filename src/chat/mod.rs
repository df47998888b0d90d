use chrono::{DateTime, Local};
use uuid::Uuid;

pub mod session;
pub mod stream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Plain,
    Analysis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub created_at: DateTime<Local>,
    pub kind: MessageKind,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender: Sender::User,
            created_at: Local::now(),
            kind: MessageKind::Plain,
        }
    }

    /// Empty assistant entry that a stream reveals text into.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: Uuid::new_v4(),
            text: String::new(),
            sender: Sender::Assistant,
            created_at: Local::now(),
            kind: MessageKind::Analysis,
        }
    }

    pub fn sender_label(&self) -> &'static str {
        match (self.sender, self.kind) {
            (Sender::User, _) => "You",
            (Sender::Assistant, MessageKind::Analysis) => "Analyzing",
            (Sender::Assistant, MessageKind::Plain) => "AI Assistant",
        }
    }

    pub fn time_label(&self) -> String {
        self.created_at.format("%H:%M:%S").to_string()
    }
}
