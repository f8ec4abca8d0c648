//! Error types for Turnstile verification.

/// Turnstile errors.
///
/// Only `Config` ever leaves the crate as an error. Every other variant is a transport
/// failure that the siteverify client logs and collapses into an untrusted decision.
#[derive(Debug, thiserror::Error)]
pub enum TurnstileError {
    /// Missing or malformed configuration (fatal at startup).
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Connection failure, timeout or unexpected HTTP status.
    #[error("network error: {message}")]
    Network { message: String },

    /// Body could not be decoded as a JSON object.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// The enclosing request was cancelled before the exchange completed.
    #[error("verification cancelled")]
    Cancelled,
}

impl TurnstileError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Stable label used as the `category` field of diagnostic log events.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Network { .. } => "network",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the error happened during the remote exchange.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Config { .. })
    }
}

impl From<reqwest::Error> for TurnstileError {
    fn from(err: reqwest::Error) -> Self {
        // Token and secret travel in the form body, never in the URL reqwest prints.
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_body() {
            format!("failed to read siteverify body: {}", err)
        } else {
            err.to_string()
        };
        Self::Network { message }
    }
}

/// Result type for Turnstile operations.
pub type TurnstileResult<T> = Result<T, TurnstileError>;
