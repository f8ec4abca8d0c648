//! Values a template needs to render the Turnstile widget for one form field.
//!
//! No markup is produced here; the view only carries the public site key and the enable
//! flag, plus the messages that field's validator will report.

use std::sync::Arc;

use serde::Serialize;

use crate::client::VerificationClient;
use crate::config::TurnstileConfig;
use crate::messages::ValidationMessages;
use crate::validator::SubmissionValidator;

/// Template block prefix for the widget.
pub const BLOCK_PREFIX: &str = "turnstile";

/// Read-only variables handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub block_prefix: &'static str,
    /// Public site key for the widget.
    pub key: String,
    pub enable: bool,
    /// The field never maps onto the submitted model.
    pub mapped: bool,
    pub messages: ValidationMessages,
}

/// One Turnstile field instance.
#[derive(Debug, Clone)]
pub struct TurnstileField {
    key: String,
    enable: bool,
    messages: ValidationMessages,
}

impl TurnstileField {
    /// Field using the site key and enable flag of `config`. The secret is not kept.
    pub fn new(config: &TurnstileConfig) -> Self {
        Self {
            key: config.key.clone(),
            enable: config.enable,
            messages: ValidationMessages::default(),
        }
    }

    pub fn with_messages(mut self, messages: ValidationMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn view(&self) -> FieldView {
        FieldView {
            block_prefix: BLOCK_PREFIX,
            key: self.key.clone(),
            enable: self.enable,
            mapped: false,
            messages: self.messages.clone(),
        }
    }

    /// Validator for submissions of this field, reporting this field's messages.
    pub fn validator(&self, client: Arc<dyn VerificationClient>) -> SubmissionValidator {
        SubmissionValidator::new(self.enable, client).with_messages(self.messages.clone())
    }
}
