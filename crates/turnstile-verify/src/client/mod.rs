//! Siteverify client: one token in, one trust decision out.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, error};

use crate::config::TurnstileConfig;
use crate::error::{TurnstileError, TurnstileResult};

mod helpers;
mod http;

pub use helpers::SiteverifyReply;

use helpers::parse_reply;
use http::HttpBackend;

/// User-Agent sent with every siteverify request.
pub const TURNSTILE_USER_AGENT: &str = concat!("turnstile-verify/", env!("CARGO_PKG_VERSION"));

/// Something that can tell whether a proof token is trusted.
///
/// Implementations never fail: any doubt is `false`.
#[async_trait]
pub trait VerificationClient: Send + Sync {
    async fn verify(&self, token: &str) -> bool;
}

/// Siteverify client backed by reqwest.
#[derive(Debug, Clone)]
pub struct SiteverifyClient {
    http: HttpBackend,
}

impl SiteverifyClient {
    /// Build a client with its own transport, bounded by `config.timeout_secs`.
    pub fn new(config: &TurnstileConfig) -> TurnstileResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(TURNSTILE_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(default_headers)
            .build()
            .map_err(|e| TurnstileError::Config {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Self::with_http_client(config, client)
    }

    /// Build a client on the embedding application's transport (and its timeout).
    pub fn with_http_client(
        config: &TurnstileConfig,
        client: reqwest::Client,
    ) -> TurnstileResult<Self> {
        config.validate()?;

        Ok(Self {
            http: HttpBackend {
                client,
                endpoint: config.endpoint.clone(),
                secret: config.secret.clone(),
            },
        })
    }

    /// Perform the exchange and keep the failure, if any.
    pub async fn exchange(&self, token: &str) -> TurnstileResult<SiteverifyReply> {
        debug!(endpoint = %self.http.endpoint, "calling siteverify");
        let body = self.http.post_token(token).await?;
        parse_reply(&body)
    }

    pub fn endpoint(&self) -> &str {
        &self.http.endpoint
    }
}

#[async_trait]
impl VerificationClient for SiteverifyClient {
    async fn verify(&self, token: &str) -> bool {
        match self.exchange(token).await {
            Ok(reply) => {
                debug!(
                    success = reply.success,
                    error_codes = ?reply.error_codes,
                    hostname = ?reply.hostname,
                    "siteverify answered"
                );
                reply.success
            }
            Err(e) => {
                log_transport_failure(&e);
                false
            }
        }
    }
}

/// The one diagnostic record per failed exchange. Carries no token and no secret.
pub(crate) fn log_transport_failure(err: &TurnstileError) {
    error!(
        category = err.category(),
        error = %err,
        "turnstile verification could not complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TurnstileConfig {
        TurnstileConfig::default()
            .with_key("site-key")
            .with_secret("s1")
            .with_endpoint("http://127.0.0.1:9/siteverify")
    }

    #[test]
    fn test_new_keeps_endpoint() {
        let client = SiteverifyClient::new(&config()).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:9/siteverify");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = SiteverifyClient::new(&config().with_secret(""));
        assert!(matches!(result, Err(TurnstileError::Config { .. })));
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let client = SiteverifyClient::new(&config().with_secret("do-not-print")).unwrap();
        assert!(!format!("{:?}", client).contains("do-not-print"));
    }

    #[test]
    fn test_user_agent() {
        assert!(TURNSTILE_USER_AGENT.starts_with("turnstile-verify/"));
    }
}
