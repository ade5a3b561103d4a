//! The outbound HTTP calls behind every adapter.

use super::NotifyError;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Hard limit for one delivery, measured from request start.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Posts JSON envelopes (and token requests) to a chat backend.
///
/// Every call is attempted exactly once; there are no retries.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with the standard request timeout.
    pub fn new() -> Result<Self, NotifyError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NotifyError::Client)?;
        Ok(Self { client })
    }

    /// Serializes `body` and POSTs it to `url`.
    ///
    /// # Returns
    /// * `Ok(String)` with the full response body on HTTP 200
    /// * `Err(NotifyError::Status)` for any other status
    /// * `Err(NotifyError::Transport)` for connection failures and timeouts
    #[instrument(skip(self, bearer, body))]
    pub async fn post_json<T: Serialize>(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &T,
    ) -> Result<String, NotifyError> {
        let payload = serde_json::to_vec(body)?;

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body(payload);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        Self::read_ok_body(request).await
    }

    /// POSTs an url-encoded form, with the same response handling as
    /// [`post_json`](Self::post_json).
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<String, NotifyError> {
        Self::read_ok_body(self.client.post(url).form(form)).await
    }

    async fn read_ok_body(request: reqwest::RequestBuilder) -> Result<String, NotifyError> {
        let response = request.send().await.map_err(NotifyError::Transport)?;
        let status = response.status();
        debug!(%status, "Chat backend responded");

        if status != StatusCode::OK {
            return Err(NotifyError::Status(status));
        }

        response.text().await.map_err(NotifyError::Transport)
    }
}
