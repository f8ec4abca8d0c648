//! Integration tests for SiteverifyClient and SubmissionValidator against a mock endpoint.
//!
//! Uses wiremock for HTTP mocking. Covers the request shape, the success/failure
//! decision, fail-closed handling of transport failures, and the diagnostic log record.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;
use turnstile_verify::{
    Outcome, SiteverifyClient, SubmissionValidator, TurnstileConfig, TurnstileError,
    VerificationClient, TURNSTILE_USER_AGENT,
};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> TurnstileConfig {
    TurnstileConfig::default()
        .with_key("site-key")
        .with_secret("s1")
        .with_endpoint(format!("{}/siteverify", server.uri()))
}

fn create_test_client(server: &MockServer) -> SiteverifyClient {
    SiteverifyClient::new(&config_for(server)).expect("failed to create client")
}

async fn mount_reply(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .respond_with(template)
        .expect(1)
        .mount(server)
        .await;
}

/// An address nothing listens on.
fn refused_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/siteverify", port)
}

#[derive(Clone)]
struct MockWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl std::io::Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for MockWriter {
    type Writer = MockWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn setup_capture() -> (MockWriter, tracing::subscriber::DefaultGuard) {
    let writer = MockWriter {
        buf: Arc::new(Mutex::new(Vec::new())),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_max_level(tracing::Level::DEBUG)
        .json()
        .finish();

    (writer, tracing::subscriber::set_default(subscriber))
}

impl MockWriter {
    fn text(&self) -> String {
        String::from_utf8(self.buf.lock().unwrap().clone()).unwrap()
    }

    /// ERROR events emitted by this crate, parsed.
    fn crate_errors(&self) -> Vec<serde_json::Value> {
        self.text()
            .lines()
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .filter(|v| v["level"] == "ERROR")
            .filter(|v| {
                v["target"]
                    .as_str()
                    .is_some_and(|t| t.starts_with("turnstile_verify"))
            })
            .collect()
    }
}

// ==================== VerificationClient ====================

#[tokio::test]
async fn test_request_is_form_encoded_post() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(header("user-agent", TURNSTILE_USER_AGENT))
        .and(body_string("response=tok-abc&secret=s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    assert!(client.verify("tok-abc").await);
}

#[tokio::test]
async fn test_token_is_form_escaped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string("response=0.a%2Bb%3Dc%26d&secret=s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(create_test_client(&server).verify("0.a+b=c&d").await);
}

#[tokio::test]
async fn test_verify_success_false() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error-codes": ["invalid-input-response"]
        })),
    )
    .await;

    assert!(!create_test_client(&server).verify("tok-xyz").await);
}

#[tokio::test]
async fn test_verify_success_field_absent() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"hostname": "example.com"})),
    )
    .await;

    assert!(!create_test_client(&server).verify("tok").await);
}

#[tokio::test]
async fn test_verify_success_not_boolean() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"success": "true"})),
    )
    .await;

    assert!(!create_test_client(&server).verify("tok").await);
}

#[tokio::test]
async fn test_extra_fields_are_ignored() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "challenge_ts": "2026-10-16T08:00:00.000Z",
            "hostname": "example.com",
            "error-codes": [],
            "action": "login",
            "cdata": "session-1",
            "metadata": {"interactive": false}
        })),
    )
    .await;

    let reply = create_test_client(&server)
        .exchange("tok")
        .await
        .expect("exchange failed");
    assert!(reply.success);
    assert_eq!(reply.hostname.as_deref(), Some("example.com"));
}

#[tokio::test]
async fn test_undecodable_body_is_false_and_logged() {
    let (writer, _guard) = setup_capture();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>bad gateway</html>"))
        .expect(2)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    assert!(matches!(
        client.exchange("tok").await,
        Err(TurnstileError::InvalidResponse { .. })
    ));
    // exchange() hands the error back; only verify() records it.
    assert!(writer.crate_errors().is_empty());

    assert!(!client.verify("tok").await);
    let errors = writer.crate_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["fields"]["category"], "invalid_response");
}

#[tokio::test]
async fn test_invalid_utf8_body_is_false_and_logged() {
    let (writer, _guard) = setup_capture();
    let server = MockServer::start().await;

    let body = b"{\"success\": true, \"hostname\": \"\xff\"}".to_vec();
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_raw(body, "application/json"),
    )
    .await;

    assert!(!create_test_client(&server).verify("tok").await);

    let errors = writer.crate_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["fields"]["category"], "invalid_response");
}

#[tokio::test]
async fn test_empty_token_is_still_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .and(body_string("response=&secret=s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!create_test_client(&server).verify("").await);
}

#[tokio::test]
async fn test_server_error_is_false() {
    let (writer, _guard) = setup_capture();
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(500).set_body_json(json!({"success": true})),
    )
    .await;

    assert!(!create_test_client(&server).verify("tok").await);

    let errors = writer.crate_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["fields"]["category"], "network");
    assert!(errors[0]["fields"]["error"]
        .as_str()
        .unwrap()
        .contains("HTTP 500"));
}

#[tokio::test]
async fn test_timeout_is_false() {
    let (writer, _guard) = setup_capture();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    // The embedding application's transport owns the timeout.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let client = SiteverifyClient::with_http_client(&config_for(&server), http).unwrap();

    assert!(!client.verify("tok").await);

    let errors = writer.crate_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["fields"]["category"], "network");
    assert!(errors[0]["fields"]["error"]
        .as_str()
        .unwrap()
        .contains("timed out"));
}

#[tokio::test]
async fn test_connection_refused_is_false_with_one_log_entry() {
    let (writer, _guard) = setup_capture();

    let config = TurnstileConfig::default()
        .with_key("site-key")
        .with_secret("s1-super-secret")
        .with_endpoint(refused_endpoint());
    let client = SiteverifyClient::new(&config).unwrap();

    assert!(!client.verify("tok-refused-123").await);

    let errors = writer.crate_errors();
    assert_eq!(errors.len(), 1, "expected exactly one diagnostic");
    assert_eq!(errors[0]["fields"]["category"], "network");

    let all = writer.text();
    assert!(!all.contains("s1-super-secret"), "secret leaked into logs");
    assert!(!all.contains("tok-refused-123"), "token leaked into logs");
}

// ==================== SubmissionValidator end to end ====================

#[tokio::test]
async fn test_scenario_trusted_token_is_accepted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .and(body_string("response=tok-abc&secret=s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let validator = SubmissionValidator::from_config(&config_for(&server)).unwrap();
    assert_eq!(validator.validate(Some("tok-abc")).await, Outcome::Accepted);
}

#[tokio::test]
async fn test_scenario_empty_token_never_reaches_network() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&server)
        .await;

    let validator = SubmissionValidator::from_config(&config_for(&server)).unwrap();
    assert_eq!(
        validator.validate(Some("")).await,
        Outcome::RejectedMissing("turnstile.missing_response".into())
    );
}

#[tokio::test]
async fn test_scenario_untrusted_token_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string("response=tok-xyz&secret=s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .expect(1)
        .mount(&server)
        .await;

    let validator = SubmissionValidator::from_config(&config_for(&server)).unwrap();
    assert_eq!(
        validator.validate(Some("tok-xyz")).await,
        Outcome::RejectedInvalid("turnstile.verification_failed".into())
    );
}

#[tokio::test]
async fn test_scenario_unreachable_remote_is_rejected() {
    let (writer, _guard) = setup_capture();

    let config = TurnstileConfig::default()
        .with_key("site-key")
        .with_secret("s1")
        .with_endpoint(refused_endpoint());
    let validator = SubmissionValidator::from_config(&config).unwrap();

    let outcome = validator.validate(Some("tok-abc")).await;
    assert_eq!(
        outcome,
        Outcome::RejectedInvalid("turnstile.verification_failed".into())
    );
    assert_eq!(writer.crate_errors().len(), 1);
}

#[tokio::test]
async fn test_disabled_validator_never_reaches_network() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .expect(0)
        .mount(&server)
        .await;

    let validator =
        SubmissionValidator::from_config(&config_for(&server).with_enable(false)).unwrap();
    assert_eq!(validator.validate(Some("tok-abc")).await, Outcome::Bypassed);
    assert_eq!(validator.validate(None).await, Outcome::Bypassed);
}

#[tokio::test]
async fn test_cancellation_aborts_exchange() {
    let (writer, _guard) = setup_capture();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let validator = SubmissionValidator::from_config(&config_for(&server)).unwrap();
    let outcome = validator
        .validate_until(
            Some("tok-abc"),
            tokio::time::sleep(Duration::from_millis(100)),
        )
        .await;

    assert_eq!(
        outcome,
        Outcome::RejectedInvalid("turnstile.verification_failed".into())
    );

    let errors = writer.crate_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["fields"]["category"], "cancelled");
}

#[tokio::test]
async fn test_no_retry_on_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let validator = SubmissionValidator::from_config(&config_for(&server)).unwrap();
    assert!(matches!(
        validator.validate(Some("tok")).await,
        Outcome::RejectedInvalid(_)
    ));
}
