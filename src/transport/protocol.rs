//! Display protocol message types
//!
//! One plain-text UTF-8 message per TCP connection:
//!
//! ```text
//! CLEAR               reset the display
//! PING                liveness probe, no display effect
//! QUESTION:<text>     show the current question
//! ANSWER:<text>       append one answer line
//! ```

use std::fmt;

use serde::Serialize;

const QUESTION_PREFIX: &str = "QUESTION:";
const ANSWER_PREFIX: &str = "ANSWER:";

/// Message kind without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Clear,
    Question,
    Answer,
    Ping,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "CLEAR",
            Self::Question => "QUESTION",
            Self::Answer => "ANSWER",
            Self::Ping => "PING",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Clear,
    Ping,
    Question(String),
    Answer(String),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Clear => MessageKind::Clear,
            Self::Ping => MessageKind::Ping,
            Self::Question(_) => MessageKind::Question,
            Self::Answer(_) => MessageKind::Answer,
        }
    }

    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Clear | Self::Ping => None,
            Self::Question(text) | Self::Answer(text) => Some(text),
        }
    }

    /// Wire form of the message
    pub fn encode(&self) -> String {
        match self {
            Self::Clear => "CLEAR".to_string(),
            Self::Ping => "PING".to_string(),
            Self::Question(text) => format!("{}{}", QUESTION_PREFIX, text),
            Self::Answer(text) => format!("{}{}", ANSWER_PREFIX, text),
        }
    }

    /// Parse a received message.
    ///
    /// Input is trimmed first. Unknown text and prefixed messages with an
    /// empty payload return `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim();
        match text {
            "CLEAR" => return Some(Self::Clear),
            "PING" => return Some(Self::Ping),
            _ => {}
        }

        if let Some(payload) = text.strip_prefix(QUESTION_PREFIX) {
            return non_empty(payload).map(Self::Question);
        }
        if let Some(payload) = text.strip_prefix(ANSWER_PREFIX) {
            return non_empty(payload).map(Self::Answer);
        }

        let preview: String = text.chars().take(50).collect();
        tracing::warn!("Unknown message: {}", preview);
        None
    }
}

fn non_empty(payload: &str) -> Option<String> {
    let payload = payload.trim();
    if payload.is_empty() {
        tracing::debug!("Dropping message with empty payload");
        None
    } else {
        Some(payload.to_string())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
