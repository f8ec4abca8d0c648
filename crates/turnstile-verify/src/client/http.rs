//! HTTP layer: the single siteverify POST and its status handling.
//!
//! This is the ONLY place that touches the wire. client/mod.rs never interprets
//! status codes.

use crate::config::Secret;
use crate::error::{TurnstileError, TurnstileResult};

/// HTTP backend for siteverify (holds reqwest client, endpoint, secret).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) endpoint: String,
    pub(crate) secret: Secret,
}

impl HttpBackend {
    /// POST the token and secret form-encoded; return the raw body bytes of a 2xx answer.
    ///
    /// Exactly one request, no retries: tokens are single-use on the remote side.
    pub(crate) async fn post_token(&self, token: &str) -> TurnstileResult<Vec<u8>> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("response", token), ("secret", self.secret.expose())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TurnstileError::Network {
                message: format!("HTTP {} from siteverify", status.as_u16()),
            });
        }

        // Raw bytes: lossy text decoding would let invalid UTF-8 pass as JSON.
        Ok(response.bytes().await?.to_vec())
    }
}
