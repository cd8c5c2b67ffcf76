//! Log-only notification adapter
//!
//! Used when no webhook is configured: every notification becomes an
//! `info!` line so the daemon is still useful from its log output.

use grouptrack_core::ports::{INotifier, Notification};
use tracing::info;

/// Writes notifications to the tracing log instead of delivering them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl INotifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        match notification {
            Notification::PlainText { content } => {
                info!(target: "grouptrack::notification", "{content}");
            }
            Notification::StructuredAlert {
                content,
                title,
                fields,
            } => {
                info!(target: "grouptrack::notification", mention = %content, "{title}");
                for field in fields {
                    info!(target: "grouptrack::notification", "  {}: {}", field.name, field.value);
                }
            }
        }
        Ok(())
    }
}
