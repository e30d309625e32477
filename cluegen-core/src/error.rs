//! Configuration errors shared by every layer that accepts user input.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown scheme: {0}")]
    UnknownScheme(String),

    #[error("Invalid answer: {0}")]
    InvalidAnswer(String),

    #[error("Invalid decoy {slot_id}: {reason}")]
    InvalidDecoy { slot_id: String, reason: String },

    #[error("Invalid scheme {name}: {reason}")]
    InvalidScheme { name: String, reason: String },

    #[error("Invalid style option: {0}")]
    InvalidStyle(String),

    #[error("Invalid identifier {0:?}: {1}")]
    InvalidIdentifier(String, String),

    #[error("Invalid chapter file: {0}")]
    InvalidChapter(String),
}

impl ConfigError {
    pub fn style(msg: impl Into<String>) -> Self {
        Self::InvalidStyle(msg.into())
    }

    pub fn answer(msg: impl Into<String>) -> Self {
        Self::InvalidAnswer(msg.into())
    }
}
