//! Configuration: the immutable settings injected into the client and validator.
//!
//! Settings are assembled from [`ConfigLayer`]s (defaults, files, environment, flags)
//! merged left to right, then resolved once into a [`TurnstileConfig`].
//!
//! String values may contain `%env(NAME)%` placeholders, resolved against the process
//! environment at resolution time; `%%` stands for a literal `%`. The site key and
//! secret default to `%env(TURNSTILE_KEY)%` and `%env(TURNSTILE_SECRET)%`.
//! Values read from the environment are taken literally.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;

use crate::error::{TurnstileError, TurnstileResult};

/// Cloudflare siteverify endpoint.
pub const SITEVERIFY_ENDPOINT: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Default site key: read from `TURNSTILE_KEY`.
pub const KEY_PLACEHOLDER: &str = "%env(TURNSTILE_KEY)%";

/// Default secret: read from `TURNSTILE_SECRET`.
pub const SECRET_PLACEHOLDER: &str = "%env(TURNSTILE_SECRET)%";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const REDACTED: &str = "***";

/// Server-held credential for siteverify calls.
///
/// `Debug`, `Display` and `Serialize` never reveal the value.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw credential. Only the outbound form body should need this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Resolved Turnstile configuration.
#[derive(Debug, Clone, Serialize)]
pub struct TurnstileConfig {
    /// When false, every submission is accepted without looking at the token.
    pub enable: bool,

    /// Public site key, safe to hand to the client-side widget.
    pub key: String,

    /// Server secret for siteverify.
    pub secret: Secret,

    /// Siteverify URL.
    pub endpoint: String,

    /// Request timeout in seconds, used when the client builds its own transport.
    pub timeout_secs: u64,
}

impl Default for TurnstileConfig {
    fn default() -> Self {
        Self {
            enable: true,
            key: String::new(),
            secret: Secret::default(),
            endpoint: SITEVERIFY_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TurnstileConfig {
    pub fn with_enable(mut self, enable: bool) -> Self {
        self.enable = enable;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_secret(mut self, secret: impl Into<Secret>) -> Self {
        self.secret = secret.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check the invariants a verifying process needs before serving requests.
    ///
    /// Key and secret are only required while verification is enabled.
    pub fn validate(&self) -> TurnstileResult<()> {
        if self.enable {
            if self.key.trim().is_empty() {
                return Err(TurnstileError::config("site key is empty"));
            }
            if self.secret.expose().trim().is_empty() {
                return Err(TurnstileError::config("secret is empty"));
            }
        }

        let url = url::Url::parse(&self.endpoint).map_err(|e| {
            TurnstileError::config(format!("invalid endpoint '{}': {}", self.endpoint, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TurnstileError::config(format!(
                "endpoint must be http(s), got '{}'",
                url.scheme()
            )));
        }

        if self.timeout_secs == 0 {
            return Err(TurnstileError::config("timeout must be at least 1 second"));
        }

        Ok(())
    }
}

/// Enable flag as written in a layer: a real boolean or a string such as `"off"` or
/// `"%env(TURNSTILE_ENABLE)%"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Text(String),
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A partial configuration. Unset fields fall through to earlier layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default)]
    pub enable: Option<FlagValue>,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub secret: Option<Secret>,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ConfigLayer {
    /// The built-in defaults every resolution starts from.
    pub fn defaults() -> Self {
        Self {
            enable: Some(FlagValue::Bool(true)),
            key: Some(KEY_PLACEHOLDER.to_string()),
            secret: Some(Secret::new(SECRET_PLACEHOLDER)),
            endpoint: Some(SITEVERIFY_ENDPOINT.to_string()),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Layer from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `TURNSTILE_ENABLE` | `1/0/true/false/yes/no/on/off` |
    /// | `TURNSTILE_KEY` | Public site key |
    /// | `TURNSTILE_SECRET` | Server secret |
    /// | `TURNSTILE_ENDPOINT` | Siteverify URL |
    /// | `TURNSTILE_TIMEOUT` | Timeout in seconds |
    pub fn from_env() -> Self {
        let timeout_secs = std::env::var("TURNSTILE_TIMEOUT").ok().and_then(|v| {
            let parsed: Option<u64> = v.trim().parse().ok();
            if parsed.is_none() {
                warn!(value = %v, "ignoring unparsable TURNSTILE_TIMEOUT");
            }
            parsed
        });

        let literal = |name: &str| std::env::var(name).ok().map(|v| escape_placeholders(&v));

        Self {
            enable: literal("TURNSTILE_ENABLE").map(FlagValue::Text),
            key: literal("TURNSTILE_KEY"),
            secret: literal("TURNSTILE_SECRET").map(Secret::from),
            endpoint: literal("TURNSTILE_ENDPOINT"),
            timeout_secs,
        }
    }

    /// Parse a YAML (or JSON) document holding the layer's fields at top level.
    pub fn from_yaml_str(content: &str) -> TurnstileResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| TurnstileError::config(format!("failed to parse configuration: {}", e)))
    }

    pub fn from_file(path: impl AsRef<Path>) -> TurnstileResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TurnstileError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn with_enable(mut self, enable: bool) -> Self {
        self.enable = Some(FlagValue::Bool(enable));
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_secret(mut self, secret: impl Into<Secret>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            enable: other.enable.or(self.enable),
            key: other.key.or(self.key),
            secret: other.secret.or(self.secret),
            endpoint: other.endpoint.or(self.endpoint),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
        }
    }

    /// Resolve on top of the defaults against the process environment.
    pub fn resolve(&self) -> TurnstileResult<TurnstileConfig> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve with an explicit variable lookup.
    pub fn resolve_with<F>(&self, lookup: F) -> TurnstileResult<TurnstileConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let layer = Self::defaults().merge(self.clone());

        let enable = match layer.enable.unwrap_or(FlagValue::Bool(true)) {
            FlagValue::Bool(b) => b,
            FlagValue::Text(raw) => {
                let text = substitute_env(&raw, &lookup, true)?;
                parse_flag(&text).ok_or_else(|| {
                    TurnstileError::config(format!("invalid boolean for enable: '{}'", text))
                })?
            }
        };

        // A disabled check may run without credentials, e.g. on a laptop.
        let strict = enable;
        let key = substitute_env(&layer.key.unwrap_or_default(), &lookup, strict)?;
        let secret = substitute_env(
            layer.secret.unwrap_or_default().expose(),
            &lookup,
            strict,
        )?;
        let endpoint = substitute_env(
            &layer
                .endpoint
                .unwrap_or_else(|| SITEVERIFY_ENDPOINT.to_string()),
            &lookup,
            true,
        )?;

        let config = TurnstileConfig {
            enable,
            key,
            secret: Secret::new(secret),
            endpoint,
            timeout_secs: layer.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Parse a boolean flag written as text.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Escape `%` so that `value` survives resolution unchanged.
pub fn escape_placeholders(value: &str) -> String {
    value.replace('%', "%%")
}

/// Replace every `%env(NAME)%` in `value` and unescape `%%`.
///
/// A processor prefix such as `%env(bool:NAME)%` is accepted and ignored. An unset
/// variable is an error when `strict`, and expands to the empty string otherwise.
fn substitute_env<F>(value: &str, lookup: &F, strict: bool) -> TurnstileResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    const OPEN: &str = "%env(";
    const CLOSE: &str = ")%";

    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        if let Some(after) = tail.strip_prefix("%%") {
            out.push('%');
            rest = after;
            continue;
        }
        let Some(after) = tail.strip_prefix(OPEN) else {
            out.push('%');
            rest = &tail[1..];
            continue;
        };

        let end = after.find(CLOSE).ok_or_else(|| {
            TurnstileError::config(format!("unterminated placeholder in '{}'", value))
        })?;

        let inner = &after[..end];
        let name = inner.rsplit(':').next().unwrap_or(inner).trim();
        if name.is_empty() {
            return Err(TurnstileError::config(format!(
                "empty placeholder in '{}'",
                value
            )));
        }

        match lookup(name) {
            Some(v) => out.push_str(&v),
            None if strict => {
                return Err(TurnstileError::config(format!(
                    "environment variable {} is not set",
                    name
                )))
            }
            None => {}
        }

        rest = &after[end + CLOSE.len()..];
    }

    out.push_str(rest);
    Ok(out)
}
