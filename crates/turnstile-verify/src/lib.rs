//! Server-side verification of Cloudflare Turnstile proof tokens.
//!
//! This crate decides, per form submission, whether the proof token produced by the
//! Turnstile widget was issued to a human. It provides:
//!
//! - A siteverify client that exchanges a token for a trust decision (fail closed)
//! - A submission validator gating the remote call behind the enable flag and token presence
//! - Layered configuration with `%env(NAME)%` placeholders
//! - Read-only field values for the presentation layer
//!
//! # Quick Start
//!
//! ```no_run
//! use turnstile_verify::{ConfigLayer, SubmissionValidator};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ConfigLayer::from_env().resolve()?;
//! let validator = SubmissionValidator::from_config(&config)?;
//!
//! let outcome = validator.validate(Some("token-from-the-form")).await;
//! if let Some(message) = outcome.violation() {
//!     println!("rejected: {message}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `TURNSTILE_ENABLE` | Enable verification (default: `true`) |
//! | `TURNSTILE_KEY` | Public site key |
//! | `TURNSTILE_SECRET` | Server secret |
//! | `TURNSTILE_ENDPOINT` | Siteverify URL (default: Cloudflare) |
//! | `TURNSTILE_TIMEOUT` | Request timeout in seconds (default: 10) |

pub mod client;
pub mod config;
pub mod error;
pub mod field;
pub mod form;
pub mod messages;
pub mod validator;

pub use client::{SiteverifyClient, SiteverifyReply, VerificationClient, TURNSTILE_USER_AGENT};
pub use config::{
    escape_placeholders, ConfigLayer, Secret, TurnstileConfig, SITEVERIFY_ENDPOINT,
};
pub use error::{TurnstileError, TurnstileResult};
pub use field::{FieldView, TurnstileField, BLOCK_PREFIX};
pub use form::{token_from_fields, token_from_urlencoded, RESPONSE_FIELD};
pub use messages::{ValidationMessages, DEFAULT_MISSING_RESPONSE, DEFAULT_VERIFICATION_FAILED};
pub use validator::{Outcome, SubmissionValidator};
