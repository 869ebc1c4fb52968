use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::{is_local_address, AppConfig, Environment},
    outcome::{FailureCategory, VerificationOutcome},
};

const SUBMIT_TIMEOUT_SECS: u64 = 30;
const HEALTH_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Serialize)]
struct ConfirmRequest<'a> {
    token: &'a str,
    wallet: &'a str,
    signature: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ConfirmResponse {
    status: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// HTTP client for the bot backend's confirmation endpoint.
///
/// Never returns a transport error to the caller: every response shape,
/// status code, and connection failure is classified into a
/// `VerificationOutcome`. Retrying is the caller's concern.
#[derive(Debug, Clone)]
pub struct VerificationClient {
    client: Client,
    base_url: String,
    environment: Environment,
}

impl VerificationClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(SUBMIT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            environment: config.environment,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submits a signed challenge for verification.
    pub async fn submit(
        &self,
        token: &str,
        wallet: &str,
        signature: &str,
    ) -> VerificationOutcome {
        if token.is_empty() || wallet.is_empty() || signature.is_empty() {
            return VerificationOutcome::failure_with_details(
                FailureCategory::InvalidRequest,
                "Invalid request data",
                "Missing required verification parameters.",
            );
        }

        let url = format!("{}/api/confirm", self.base_url);
        debug!("Submitting verification to {}", url);

        let request = ConfirmRequest {
            token,
            wallet,
            signature,
        };

        let response = match self.client.post(&url).json(&request).send().await {
            Ok(response) => response,
            Err(err) => return self.classify_transport_error(err),
        };

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let payload: ConfirmResponse = serde_json::from_str(&text).unwrap_or_default();

        if status.is_success() {
            return classify_success_payload(payload);
        }

        debug!("Verification request failed with HTTP {}", status);
        match status.as_u16() {
            400 => VerificationOutcome::failure_with_details(
                FailureCategory::InvalidRequest,
                payload
                    .message
                    .unwrap_or_else(|| "Invalid verification data".to_string()),
                payload.details.unwrap_or_else(|| {
                    "Please check your verification link and try again.".to_string()
                }),
            ),
            429 => VerificationOutcome::failure_with_details(
                FailureCategory::RateLimited,
                "Rate limit exceeded",
                "Too many verification attempts. Please wait a moment and try again.",
            ),
            500 => VerificationOutcome::failure_with_details(
                FailureCategory::ServerError,
                "Server error",
                "The verification server is experiencing issues. Please try again later.",
            ),
            code => VerificationOutcome::failure_with_details(
                FailureCategory::ServerError,
                format!("Server error ({})", code),
                payload
                    .message
                    .unwrap_or_else(|| "An unexpected server error occurred.".to_string()),
            ),
        }
    }

    /// Liveness probe against the backend. Failures are swallowed; this is
    /// a diagnostic boolean, never surfaced to the end user directly.
    pub async fn check_health(&self) -> bool {
        let url = format!("{}/api/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .send()
            .await;

        match response {
            Ok(response) => response
                .json::<HealthResponse>()
                .await
                .map(|health| health.status == "healthy")
                .unwrap_or(false),
            Err(err) => {
                debug!("Health check failed: {}", err);
                false
            }
        }
    }

    // No response received at all. A localhost backend in a production
    // deployment is a deployment bug, not a user connectivity problem.
    fn classify_transport_error(&self, err: reqwest::Error) -> VerificationOutcome {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            warn!("No response from verification backend: {}", err);
            if self.environment.is_production() && is_local_address(&self.base_url) {
                return VerificationOutcome::failure_with_details(
                    FailureCategory::Misconfigured,
                    "Configuration error",
                    "The verification system is not properly configured for production. \
                     Please contact support.",
                );
            }
            return VerificationOutcome::failure_with_details(
                FailureCategory::ConnectionFailed,
                "Connection failed",
                "Unable to connect to the verification server. Please check your \
                 internet connection and try again.",
            );
        }

        VerificationOutcome::failure(FailureCategory::Unknown, err.to_string())
    }
}

fn classify_success_payload(payload: ConfirmResponse) -> VerificationOutcome {
    match payload.status.as_deref() {
        Some("success") => VerificationOutcome::Success {
            message: payload.message,
        },
        Some("error") => VerificationOutcome::Failure(crate::outcome::VerificationFailure {
            category: FailureCategory::ServerRejected,
            message: payload
                .message
                .unwrap_or_else(|| "Verification failed".to_string()),
            details: payload.details,
        }),
        _ => VerificationOutcome::failure_with_details(
            FailureCategory::UnexpectedResponse,
            "Unexpected response format",
            "The server returned an unexpected response format.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, AppConfig, Environment};
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn client_for(base_url: String, environment: Environment) -> VerificationClient {
        let config = AppConfig {
            api: ApiConfig { base_url },
            environment,
            ..AppConfig::default()
        };
        VerificationClient::new(&config)
    }

    async fn mock_client(server: &MockServer) -> VerificationClient {
        client_for(server.uri(), Environment::Development)
    }

    #[tokio::test]
    async fn test_submit_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/confirm"))
            .and(body_json(json!({
                "token": "tok",
                "wallet": "addr",
                "signature": "sig",
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "success", "message": "Wallet linked"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = mock_client(&server).await.submit("tok", "addr", "sig").await;
        assert_eq!(
            outcome,
            VerificationOutcome::Success {
                message: Some("Wallet linked".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_submit_server_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/confirm"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "error",
                "message": "Signature mismatch",
                "details": "The signature does not match the wallet.",
            })))
            .mount(&server)
            .await;

        let outcome = mock_client(&server).await.submit("tok", "addr", "sig").await;
        match outcome {
            VerificationOutcome::Failure(failure) => {
                assert_eq!(failure.category, FailureCategory::ServerRejected);
                assert_eq!(failure.message, "Signature mismatch");
                assert_eq!(
                    failure.details.as_deref(),
                    Some("The signature does not match the wallet.")
                );
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_unexpected_payload_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/confirm"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let outcome = mock_client(&server).await.submit("tok", "addr", "sig").await;
        assert_eq!(outcome.category(), Some(FailureCategory::UnexpectedResponse));
    }

    #[tokio::test]
    async fn test_submit_non_json_2xx_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/confirm"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
            .mount(&server)
            .await;

        let outcome = mock_client(&server).await.submit("tok", "addr", "sig").await;
        assert_eq!(outcome.category(), Some(FailureCategory::UnexpectedResponse));
    }

    #[tokio::test]
    async fn test_submit_bad_request_surfaces_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/confirm"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": "error",
                "message": "Token already used",
                "details": "Request a new verification link.",
            })))
            .mount(&server)
            .await;

        let outcome = mock_client(&server).await.submit("tok", "addr", "sig").await;
        match outcome {
            VerificationOutcome::Failure(failure) => {
                assert_eq!(failure.category, FailureCategory::InvalidRequest);
                assert_eq!(failure.message, "Token already used");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/confirm"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let outcome = mock_client(&server).await.submit("tok", "addr", "sig").await;
        assert_eq!(outcome.category(), Some(FailureCategory::RateLimited));
    }

    #[tokio::test]
    async fn test_submit_server_error_codes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/confirm"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let outcome = mock_client(&server).await.submit("tok", "addr", "sig").await;
        assert_eq!(outcome.category(), Some(FailureCategory::ServerError));
    }

    #[tokio::test]
    async fn test_submit_other_error_code_embeds_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/confirm"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let outcome = mock_client(&server).await.submit("tok", "addr", "sig").await;
        match outcome {
            VerificationOutcome::Failure(failure) => {
                assert_eq!(failure.category, FailureCategory::ServerError);
                assert!(failure.message.contains("503"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_fields_fail_without_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/confirm"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = mock_client(&server).await;
        for (token, wallet, signature) in
            [("", "addr", "sig"), ("tok", "", "sig"), ("tok", "addr", "")]
        {
            let outcome = client.submit(token, wallet, signature).await;
            assert_eq!(outcome.category(), Some(FailureCategory::InvalidRequest));
        }
    }

    #[tokio::test]
    async fn test_failure_classification_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/confirm"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = mock_client(&server).await;
        let first = client.submit("tok", "addr", "sig").await;
        let second = client.submit("tok", "addr", "sig").await;
        assert_eq!(first.category(), second.category());
    }

    #[tokio::test]
    async fn test_no_response_is_connection_failed_in_development() {
        // Nothing listens on this port
        let client = client_for("http://127.0.0.1:9".to_string(), Environment::Development);
        let outcome = client.submit("tok", "addr", "sig").await;
        assert_eq!(outcome.category(), Some(FailureCategory::ConnectionFailed));
    }

    #[tokio::test]
    async fn test_local_backend_in_production_is_misconfigured() {
        let client = client_for("http://localhost:9".to_string(), Environment::Production);
        let outcome = client.submit("tok", "addr", "sig").await;
        assert_eq!(outcome.category(), Some(FailureCategory::Misconfigured));
    }

    #[tokio::test]
    async fn test_remote_backend_down_in_production_is_connection_failed() {
        // Unreachable but not a local development address
        let client = client_for(
            "http://verification.invalid".to_string(),
            Environment::Production,
        );
        let outcome = client.submit("tok", "addr", "sig").await;
        assert_eq!(outcome.category(), Some(FailureCategory::ConnectionFailed));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
            .mount(&server)
            .await;

        assert!(mock_client(&server).await.check_health().await);
    }

    #[tokio::test]
    async fn test_health_check_swallows_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(!mock_client(&server).await.check_health().await);

        let unreachable = client_for("http://127.0.0.1:9".to_string(), Environment::Development);
        assert!(!unreachable.check_health().await);
    }
}
