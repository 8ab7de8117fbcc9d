//! Fire-one-webhook-with-retry: attempt, classify the outcome, sleep, and
//! retry on transient failures.

use reqwest::{Client as HttpClient, Method, StatusCode};
use switchboard_core::RetryPolicy;

use crate::envelope::WebhookEnvelope;
use crate::error::WebhookError;

const WEBHOOK_SOURCE: &str = "ai-service";

#[derive(Clone)]
pub struct WebhookDispatcher {
    http: HttpClient,
    secret: String,
    user_agent: String,
    retry: RetryPolicy,
}

impl WebhookDispatcher {
    pub fn new(secret: impl Into<String>, service_version: &str, retry: RetryPolicy) -> Self {
        Self {
            http: HttpClient::new(),
            secret: secret.into(),
            user_agent: format!("switchboard/{service_version}"),
            retry,
        }
    }

    /// Sends `envelope` to `url` with `method`, retrying 5xx/network errors
    /// per the configured [`RetryPolicy`]. 4xx is terminal and does not
    /// consume a retry attempt's worth of backoff.
    #[tracing::instrument(skip(self, envelope), fields(event = %envelope.event, url = %url))]
    pub async fn dispatch(
        &self,
        method: Method,
        url: &str,
        envelope: &WebhookEnvelope,
    ) -> Result<(), WebhookError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let result = self
                .http
                .request(method.clone(), url)
                .header("X-Webhook-Source", WEBHOOK_SOURCE)
                .header("X-Webhook-Secret", &self.secret)
                .header("User-Agent", &self.user_agent)
                .json(envelope)
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        tracing::info!(attempt, %status, "webhook delivered");
                        return Ok(());
                    }

                    if is_terminal(status) {
                        let body = response.text().await.unwrap_or_default();
                        tracing::warn!(attempt, %status, "webhook rejected, not retrying");
                        return Err(WebhookError::Rejected {
                            url: url.to_string(),
                            status: status.as_u16(),
                            body,
                        });
                    }

                    tracing::warn!(attempt, %status, "webhook failed, will retry if attempts remain");
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "webhook request error, will retry if attempts remain");
                }
            }

            if !self.retry.should_retry(attempt) {
                return Err(WebhookError::DeliveryFailed {
                    url: url.to_string(),
                    attempts: attempt,
                    message: "exhausted retry attempts".to_string(),
                });
            }

            tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
        }
    }
}

/// HTTP 4xx is terminal per spec §4.5; everything else (5xx, and the caller
/// treats transport errors as retryable too) is retried.
fn is_terminal(status: StatusCode) -> bool {
    status.is_client_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_terminal() {
        assert!(is_terminal(StatusCode::BAD_REQUEST));
        assert!(is_terminal(StatusCode::NOT_FOUND));
    }

    #[test]
    fn server_errors_are_not_terminal() {
        assert!(!is_terminal(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_terminal(StatusCode::BAD_GATEWAY));
    }
}
