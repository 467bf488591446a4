//! HTTP transport for sending hits.

use crate::config::Config;
use crate::types::{AnalyticsCall, CollectPayload};
use crate::Error;
use tracing::{debug, warn};

/// Posts hits to the measurement protocol collection endpoint.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    tracking_id: String,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.collect_url(),
            tracking_id: config.tracking_id().to_owned(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one hit.
    pub async fn send(&self, call: &AnalyticsCall) -> Result<(), Error> {
        debug!(
            endpoint = %self.endpoint,
            action = %call.event_action,
            "sending hit"
        );

        let payload = CollectPayload::new(&self.tracking_id, call);
        let response = self
            .client
            .post(&self.endpoint)
            .form(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".into());
            warn!(status = %status, body = %body, "collection request failed");
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(action = %call.event_action, "hit sent");
        Ok(())
    }
}
