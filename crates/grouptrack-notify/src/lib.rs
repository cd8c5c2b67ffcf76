//! GroupTrack Notify - Outbound notifications
//!
//! Provides:
//! - Rendering of membership events into plain messages and alerts
//! - A webhook adapter posting chat-style JSON payloads
//! - A log-only adapter for setups without a webhook
//! - A queued, fire-and-forget dispatcher
//!
//! ## Modules
//!
//! - [`message`] - `MembershipEvent` → `Notification` rendering
//! - [`webhook`] - HTTP delivery with proactive rate limiting
//! - [`log`] - tracing-only delivery
//! - [`dispatcher`] - background delivery queue
//! - [`rate_limit`] - token bucket used by the webhook adapter
//! - [`collect`] - in-memory sink for tests

pub mod collect;
pub mod dispatcher;
pub mod log;
pub mod message;
pub mod rate_limit;
pub mod webhook;

pub use collect::CollectingNotifier;
pub use dispatcher::NotificationDispatcher;
pub use log::LogNotifier;
pub use message::{render, MessageOptions};
pub use webhook::WebhookNotifier;

use thiserror::Error;

/// Errors that can occur while delivering a notification
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The request could not be sent or timed out
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The sink answered 429 Too Many Requests
    #[error("Rate limited by notification sink (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<f64> },

    /// The sink answered with another non-success status
    #[error("Notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
