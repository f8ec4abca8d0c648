//! User-facing message identifiers attached to rejected submissions.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MISSING_RESPONSE: &str = "turnstile.missing_response";
pub const DEFAULT_VERIFICATION_FAILED: &str = "turnstile.verification_failed";

/// Messages surfaced for the two rejection outcomes.
///
/// Values are translation identifiers by default; callers may override them per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessages {
    /// Used when the submission carried no token.
    #[serde(default = "default_missing_response")]
    pub missing_response_message: String,

    /// Used when the token was not confirmed by the remote service.
    #[serde(default = "default_verification_failed")]
    pub verification_failed_message: String,
}

fn default_missing_response() -> String {
    DEFAULT_MISSING_RESPONSE.to_string()
}

fn default_verification_failed() -> String {
    DEFAULT_VERIFICATION_FAILED.to_string()
}

impl Default for ValidationMessages {
    fn default() -> Self {
        Self {
            missing_response_message: default_missing_response(),
            verification_failed_message: default_verification_failed(),
        }
    }
}

impl ValidationMessages {
    pub fn new(
        missing_response_message: impl Into<String>,
        verification_failed_message: impl Into<String>,
    ) -> Self {
        Self {
            missing_response_message: missing_response_message.into(),
            verification_failed_message: verification_failed_message.into(),
        }
    }

    pub fn with_missing_response_message(mut self, message: impl Into<String>) -> Self {
        self.missing_response_message = message.into();
        self
    }

    pub fn with_verification_failed_message(mut self, message: impl Into<String>) -> Self {
        self.verification_failed_message = message.into();
        self
    }
}
