//! Telemetry publisher
//!
//! High-level API for pushing readings to a relay over HTTP.

use reqwest::{Client, Response};

use crate::error::{Error, Result};
use crate::server::Credentials;
use crate::telemetry::Event;

/// HTTP producer for a telemetry relay
///
/// # Example
/// ```no_run
/// use telemetry_relay::client::TelemetryPublisher;
/// use telemetry_relay::telemetry::Event;
///
/// # async fn example() -> telemetry_relay::error::Result<()> {
/// let publisher = TelemetryPublisher::new("http://localhost:8080")
///     .with_basic_auth("admin", "mojo2024");
///
/// publisher
///     .publish(&Event::new(1717000000, 12.5, 4.1, 24.0, "lipo", false))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TelemetryPublisher {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl TelemetryPublisher {
    /// Create a publisher for the relay at `base_url` (e.g. `http://host:8080`)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            credentials: None,
        }
    }

    /// Authenticate every request with HTTP Basic credentials
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    /// Relay base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Post one reading to `/webhook`
    pub async fn publish(&self, event: &Event) -> Result<()> {
        let request = self.client.post(self.url("/webhook")).json(event);
        let response = self.authorize(request).send().await?;
        Self::check(response).await?;

        tracing::debug!(timestamp = event.timestamp, "Published reading");
        Ok(())
    }

    /// Ask the relay to clear its history via `/api/reset`
    pub async fn reset(&self) -> Result<()> {
        let request = self.client.post(self.url("/api/reset"));
        let response = self.authorize(request).send().await?;
        Self::check(response).await?;

        tracing::debug!("Requested reset");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some(credentials) => {
                request.header(reqwest::header::AUTHORIZATION, credentials.header_value())
            }
            None => request,
        }
    }

    async fn check(response: Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
