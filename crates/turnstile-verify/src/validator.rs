//! Submission validator: decides bypass, missing, invalid or accepted per submission.
//!
//! The enable flag and token presence are checked before any network access, so the
//! remote endpoint only ever sees non-empty tokens from an enabled validator.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::client::{log_transport_failure, SiteverifyClient, VerificationClient};
use crate::config::TurnstileConfig;
use crate::error::{TurnstileError, TurnstileResult};
use crate::form::token_from_fields;
use crate::messages::ValidationMessages;

/// Result of validating one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum Outcome {
    /// The remote service confirmed the token.
    Accepted,
    /// Verification is disabled; the submission passes untouched.
    Bypassed,
    /// No token was submitted.
    RejectedMissing(String),
    /// The token was not confirmed, or confirmation could not be obtained.
    RejectedInvalid(String),
}

impl Outcome {
    /// Whether the submission may proceed. `Bypassed` counts as accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted | Self::Bypassed)
    }

    /// The single violation message of a rejection.
    pub fn violation(&self) -> Option<&str> {
        match self {
            Self::Accepted | Self::Bypassed => None,
            Self::RejectedMissing(message) | Self::RejectedInvalid(message) => {
                Some(message.as_str())
            }
        }
    }
}

#[derive(Clone)]
pub struct SubmissionValidator {
    enable: bool,
    client: Arc<dyn VerificationClient>,
    messages: ValidationMessages,
}

impl fmt::Debug for SubmissionValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionValidator")
            .field("enable", &self.enable)
            .field("messages", &self.messages)
            .finish_non_exhaustive()
    }
}

impl SubmissionValidator {
    pub fn new(enable: bool, client: Arc<dyn VerificationClient>) -> Self {
        Self {
            enable,
            client,
            messages: ValidationMessages::default(),
        }
    }

    /// Validator backed by a [`SiteverifyClient`] built from `config`.
    pub fn from_config(config: &TurnstileConfig) -> TurnstileResult<Self> {
        let client = SiteverifyClient::new(config)?;
        Ok(Self::new(config.enable, Arc::new(client)))
    }

    pub fn with_messages(mut self, messages: ValidationMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn messages(&self) -> &ValidationMessages {
        &self.messages
    }

    pub fn is_enabled(&self) -> bool {
        self.enable
    }

    /// Validate one submission with the configured enable flag.
    pub async fn validate(&self, token: Option<&str>) -> Outcome {
        self.validate_with_enable(token, self.enable).await
    }

    /// Validate one submission with an explicit enable flag.
    pub async fn validate_with_enable(&self, token: Option<&str>, enabled: bool) -> Outcome {
        match self.precheck(token, enabled) {
            Ok(token) => self.decide(self.client.verify(token).await),
            Err(outcome) => outcome,
        }
    }

    /// Validate the token found in parsed form fields.
    pub async fn validate_form<S>(&self, fields: &HashMap<String, String, S>) -> Outcome
    where
        S: std::hash::BuildHasher,
    {
        self.validate(token_from_fields(fields)).await
    }

    /// Validate, giving up when `cancel` completes first.
    ///
    /// A cancelled exchange is dropped mid-flight and resolves to `RejectedInvalid`.
    pub async fn validate_until<F>(&self, token: Option<&str>, cancel: F) -> Outcome
    where
        F: Future,
    {
        let token = match self.precheck(token, self.enable) {
            Ok(token) => token,
            Err(outcome) => return outcome,
        };

        tokio::select! {
            biased;
            trusted = self.client.verify(token) => self.decide(trusted),
            _ = cancel => {
                log_transport_failure(&TurnstileError::Cancelled);
                self.decide(false)
            }
        }
    }

    /// Everything that happens before the network: bypass and missing-token checks.
    fn precheck<'a>(&self, token: Option<&'a str>, enabled: bool) -> Result<&'a str, Outcome> {
        if !enabled {
            debug!("turnstile disabled, submission bypassed");
            return Err(Outcome::Bypassed);
        }

        match token.filter(|t| !t.is_empty()) {
            Some(token) => Ok(token),
            None => {
                debug!("turnstile response missing");
                Err(Outcome::RejectedMissing(
                    self.messages.missing_response_message.clone(),
                ))
            }
        }
    }

    fn decide(&self, trusted: bool) -> Outcome {
        if trusted {
            Outcome::Accepted
        } else {
            Outcome::RejectedInvalid(self.messages.verification_failed_message.clone())
        }
    }
}
