use thiserror::Error;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::forms::FormErrors;

pub const GENERIC_FAILURE: &str = "Something went wrong, please try again later";
pub const LOGIN_REQUIRED: &str = "You must be logged in";
pub const NOT_VERIFIED: &str = "Account is not verified, please check your email";

/// A failed backend call.
///
/// `Clone` so one failure can be handed to every subscriber of a shared
/// in-flight request. Message fields hold the server's `{"error": ...}` text
/// when the response carried one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Bad request{}", detail(.0))]
    BadRequest(Option<String>),

    #[error("Unauthorized{}", detail(.0))]
    Unauthorized(Option<String>),

    #[error("Forbidden{}", detail(.0))]
    Forbidden(Option<String>),

    #[error("Not found{}", detail(.0))]
    NotFound(Option<String>),

    #[error("Conflict{}", detail(.0))]
    Conflict(Option<String>),

    #[error("HTTP {status}{}", detail(.message))]
    Status {
        status: u16,
        message: Option<String>,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

fn detail(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {}", m),
        None => String::new(),
    }
}

impl ApiError {
    /// Classify a non-2xx response.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = server_message(body);
        match status {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            _ => ApiError::Status { status, message },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest(_) => Some(400),
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Conflict(_) => Some(409),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(_) | ApiError::Decode(_) => None,
        }
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::BadRequest(m)
            | ApiError::Unauthorized(m)
            | ApiError::Forbidden(m)
            | ApiError::NotFound(m)
            | ApiError::Conflict(m)
            | ApiError::Status { message: m, .. } => m.as_deref(),
            ApiError::Transport(_) | ApiError::Decode(_) => None,
        }
    }

    /// Text shown to the user for a failed read.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized(_) => LOGIN_REQUIRED.to_string(),
            ApiError::Forbidden(_) => NOT_VERIFIED.to_string(),
            ApiError::Transport(_) | ApiError::Decode(_) => GENERIC_FAILURE.to_string(),
            other => other
                .server_message()
                .map(String::from)
                .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        }
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    error: String,
}

fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|m| !m.trim().is_empty())
}

#[derive(Error, Debug)]
pub enum PlazaError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Settings(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    Form(#[from] FormErrors),

    #[error("You must be logged in")]
    NotLoggedIn,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl PlazaError {
    /// Text suitable for a status-bar notice.
    pub fn user_message(&self) -> String {
        match self {
            PlazaError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlazaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from_status(401, r#"{"error":"bad token"}"#),
            ApiError::Unauthorized(Some("bad token".into()))
        );
        assert_eq!(ApiError::from_status(403, ""), ApiError::Forbidden(None));
        assert_eq!(ApiError::from_status(409, "not json"), ApiError::Conflict(None));
        assert_eq!(
            ApiError::from_status(502, "{}"),
            ApiError::Status {
                status: 502,
                message: None
            }
        );
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let e = ApiError::from_status(400, r#"{"error":"limit must be at most 50"}"#);
        assert_eq!(e.user_message(), "limit must be at most 50");

        let e = ApiError::from_status(500, "");
        assert_eq!(e.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_auth_classes_have_fixed_messages() {
        assert_eq!(ApiError::Unauthorized(None).user_message(), LOGIN_REQUIRED);
        assert_eq!(
            ApiError::Forbidden(Some("x".into())).user_message(),
            NOT_VERIFIED
        );
        assert_eq!(
            ApiError::Transport("connection refused".into()).user_message(),
            GENERIC_FAILURE
        );
    }

    #[test]
    fn test_display_includes_detail() {
        assert_eq!(
            ApiError::NotFound(Some("post".into())).to_string(),
            "Not found: post"
        );
        assert_eq!(ApiError::NotFound(None).to_string(), "Not found");
    }
}
