use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use turnstile_verify::{
    escape_placeholders, ConfigLayer, TurnstileConfig, TurnstileResult, ValidationMessages,
};

#[derive(Parser)]
#[command(
    name = "turnstile",
    version,
    about = "Verify Cloudflare Turnstile proof tokens against siteverify"
)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate one submission and print the outcome as JSON
    Verify(VerifyArgs),
    /// Print the resolved configuration (secret redacted)
    Config(ConfigArgs),
}

/// Where configuration comes from: file < environment < flags.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// YAML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Public site key (overrides TURNSTILE_KEY)
    #[arg(long)]
    pub key: Option<String>,

    /// Server secret; prefer TURNSTILE_SECRET, flags end up in shell history
    #[arg(long)]
    pub secret: Option<String>,

    /// Siteverify URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Bypass verification entirely
    #[arg(long)]
    pub disable: bool,
}

impl SourceArgs {
    pub fn layer(&self) -> TurnstileResult<ConfigLayer> {
        let mut layer = ConfigLayer::default();
        if let Some(path) = &self.config {
            layer = layer.merge(ConfigLayer::from_file(path)?);
        }
        layer = layer.merge(ConfigLayer::from_env());

        let mut flags = ConfigLayer::default();
        if let Some(key) = &self.key {
            flags = flags.with_key(escape_placeholders(key));
        }
        if let Some(secret) = &self.secret {
            flags = flags.with_secret(escape_placeholders(secret));
        }
        if let Some(endpoint) = &self.endpoint {
            flags = flags.with_endpoint(escape_placeholders(endpoint));
        }
        if let Some(timeout) = self.timeout {
            flags = flags.with_timeout_secs(timeout);
        }
        if self.disable {
            flags = flags.with_enable(false);
        }

        Ok(layer.merge(flags))
    }

    pub fn resolve(&self) -> TurnstileResult<TurnstileConfig> {
        self.layer()?.resolve()
    }
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Proof token as produced by the widget
    #[arg(long, conflicts_with = "form")]
    pub token: Option<String>,

    /// File holding a urlencoded form body to read cf-turnstile-response from
    #[arg(long)]
    pub form: Option<PathBuf>,

    /// Message reported when the token is missing
    #[arg(long)]
    pub missing_message: Option<String>,

    /// Message reported when verification fails
    #[arg(long)]
    pub failed_message: Option<String>,
}

impl VerifyArgs {
    pub fn messages(&self) -> ValidationMessages {
        let mut messages = ValidationMessages::default();
        if let Some(m) = &self.missing_message {
            messages = messages.with_missing_response_message(m.as_str());
        }
        if let Some(m) = &self.failed_message {
            messages = messages.with_verification_failed_message(m.as_str());
        }
        messages
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}
