use thiserror::Error;

/// Everything that can go wrong on the client side of a call
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Session expired. Please log in again.")]
    SessionExpired,

    #[error("{0}")]
    Validation(String),

    #[error("Server returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Session storage failed: {0:#}")]
    Storage(anyhow::Error),
}

impl ClientError {
    /// Message the server put in the response body, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Server {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }

    /// Text for the user: session and validation errors speak for
    /// themselves, server errors use the body message, anything else
    /// gets `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::SessionExpired | ClientError::Validation(_) => self.to_string(),
            _ => self
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
