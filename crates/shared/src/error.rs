use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// No response reached the client.
    Transport,
    Validation,
    Conflict,
    Unauthorized,
    NotFound,
    Internal,
    /// A success response whose body could not be decoded.
    Decode,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            409 => Self::Conflict,
            400..=499 => Self::Validation,
            _ => Self::Internal,
        }
    }

    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::Transport => "Unable to reach the server. Please check your connection.",
            Self::Validation => "Invalid request data.",
            Self::Conflict => "The request conflicts with the current state.",
            Self::Unauthorized => "Invalid credentials.",
            Self::NotFound => "The requested record was not found.",
            Self::Internal => "Server error. Please try again later.",
            Self::Decode => "Unexpected response from the server.",
        }
    }
}

/// Body shape the backend uses for most failures: `{"error": "..."}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Pulls a human-readable message out of a raw failure body. Accepts the
    /// JSON object form, a bare JSON string, or plain text.
    pub fn extract_message(raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(body) = serde_json::from_str::<ErrorBody>(trimmed) {
            if let Some(message) = body.error.or(body.message) {
                let message = message.trim().to_string();
                return (!message.is_empty()).then_some(message);
            }
            if trimmed.starts_with('{') {
                return None;
            }
        }
        if let Ok(text) = serde_json::from_str::<String>(trimmed) {
            let text = text.trim().to_string();
            return (!text.is_empty()).then_some(text);
        }
        Some(trimmed.to_string())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", describe(.code, .message))]
pub struct ApiError {
    pub code: ErrorCode,
    pub status: Option<u16>,
    pub message: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status: None,
            message: Some(message.into()),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transport, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Decode, message)
    }

    pub fn from_status(status: u16, raw_body: &str) -> Self {
        Self {
            code: ErrorCode::from_status(status),
            status: Some(status),
            message: ErrorBody::extract_message(raw_body),
        }
    }

    pub fn server_message(&self) -> Option<&str> {
        match self.code {
            // Transport and decode messages come from the client, not the server.
            ErrorCode::Transport | ErrorCode::Decode => None,
            _ => self.message.as_deref(),
        }
    }

    /// Short display string: the server's message when it sent one,
    /// otherwise the per-code fallback.
    pub fn user_message(&self) -> String {
        self.server_message()
            .unwrap_or_else(|| self.code.fallback_message())
            .to_string()
    }

    pub fn user_message_or(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }
}

fn describe(code: &ErrorCode, message: &Option<String>) -> String {
    match message {
        Some(message) => format!("{code:?}: {message}"),
        None => format!("{code:?}: {}", code.fallback_message()),
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
