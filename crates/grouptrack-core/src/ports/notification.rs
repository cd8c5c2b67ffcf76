//! Notification sink port (driven/secondary port)
//!
//! This module defines the outbound message model and the interface for
//! delivering it. Implementations may post to a chat webhook, write to the
//! log, or record messages for tests.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because delivery is adapter-specific.
//! - Notifications are fire-and-forget: callers hand them to a dispatcher
//!   and never wait on delivery, and failures are logged, not retried.

use serde::{Deserialize, Serialize};

/// One titled block of an alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

impl AlertField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: false,
        }
    }
}

/// An outbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A single line of text (create, join, leave, delete)
    PlainText { content: String },
    /// A flagged alert with a title and structured fields (transfers)
    StructuredAlert {
        /// Leading text, typically a mention of who to alert
        content: String,
        title: String,
        fields: Vec<AlertField>,
    },
}

impl Notification {
    pub fn text(content: impl Into<String>) -> Self {
        Notification::PlainText {
            content: content.into(),
        }
    }

    pub fn alert(
        content: impl Into<String>,
        title: impl Into<String>,
        fields: Vec<AlertField>,
    ) -> Self {
        Notification::StructuredAlert {
            content: content.into(),
            title: title.into(),
            fields,
        }
    }

    /// One-line summary suitable for log output
    pub fn summary(&self) -> &str {
        match self {
            Notification::PlainText { content } => content,
            Notification::StructuredAlert { title, .. } => title,
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, Notification::StructuredAlert { .. })
    }
}

/// Port trait for delivering notifications to an external sink
#[async_trait::async_trait]
pub trait INotifier: Send + Sync {
    /// Delivers a single notification
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}
