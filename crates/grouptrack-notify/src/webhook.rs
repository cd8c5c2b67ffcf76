//! Webhook notification adapter
//!
//! Posts notifications as chat-webhook JSON:
//!
//! ```json
//! { "content": "Member **Bob** (2) left group **alpha**" }
//! { "content": "<@&role>", "embeds": [ { "title": "...", "fields": [ { "name": "...", "value": "...", "inline": false } ] } ] }
//! ```
//!
//! A single attempt is made per notification. Non-success responses are
//! returned as errors for the dispatcher to log.

use std::time::Duration;

use anyhow::Context;
use grouptrack_core::ports::{AlertField, INotifier, Notification};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::rate_limit::{parse_retry_after, TokenBucket};
use crate::NotifyError;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<Embed<'a>>,
}

#[derive(Debug, Serialize)]
struct Embed<'a> {
    title: &'a str,
    fields: &'a [AlertField],
}

impl<'a> From<&'a Notification> for WebhookPayload<'a> {
    fn from(notification: &'a Notification) -> Self {
        match notification {
            Notification::PlainText { content } => Self {
                content,
                embeds: Vec::new(),
            },
            Notification::StructuredAlert {
                content,
                title,
                fields,
            } => Self {
                content,
                embeds: vec![Embed { title, fields }],
            },
        }
    }
}

/// Delivers notifications by POSTing to a webhook URL
pub struct WebhookNotifier {
    client: Client,
    url: String,
    limiter: TokenBucket,
}

impl WebhookNotifier {
    /// Creates a notifier for `url`
    ///
    /// # Arguments
    /// * `url` - Webhook endpoint
    /// * `requests_per_minute` - Proactive delivery budget
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(
        url: impl Into<String>,
        requests_per_minute: u32,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("grouptrack/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
            limiter: TokenBucket::per_minute(requests_per_minute),
        })
    }

    /// Posts one notification and maps the response status
    pub async fn post(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.limiter.acquire().await;

        let payload = WebhookPayload::from(notification);
        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();

        if status.is_success() {
            debug!(status = status.as_u16(), "Webhook accepted notification");
            return Ok(());
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            warn!(?retry_after, "Webhook rate limit hit");
            return Err(NotifyError::RateLimited { retry_after });
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait::async_trait]
impl INotifier for WebhookNotifier {
    #[instrument(skip(self, notification), fields(alert = notification.is_alert()))]
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        self.post(notification).await?;
        Ok(())
    }
}
