//! Check command - Validate a snapshot file offline
//!
//! Parses the file exactly as the daemon would and reports the group tag it
//! maps to, its display name and members, or why it would be rejected.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use grouptrack_core::domain::{GroupTag, Snapshot, SnapshotError};
use grouptrack_sync::source::group_tag_for_path;
use serde::Serialize;
use tracing::debug;

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Snapshot file to check
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct CheckedMember {
    id: String,
    name: String,
    online: bool,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    /// Group the daemon would track this file as, if the name qualifies
    group: Option<String>,
    display_name: String,
    members: Vec<CheckedMember>,
}

impl CheckReport {
    fn new(group: Option<GroupTag>, snapshot: &Snapshot) -> Self {
        Self {
            group: group.map(|g| g.to_string()),
            display_name: snapshot.display_name().to_string(),
            members: snapshot
                .members()
                .iter()
                .map(|(id, m)| CheckedMember {
                    id: id.to_string(),
                    name: m.name.clone(),
                    online: m.online,
                })
                .collect(),
        }
    }
}

/// Parses `content` as the snapshot stored at `file`
fn check(file: &std::path::Path, content: &str) -> Result<CheckReport, SnapshotError> {
    let snapshot = Snapshot::parse(content)?;
    Ok(CheckReport::new(group_tag_for_path(file), &snapshot))
}

impl CheckCommand {
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        debug!(file = %self.file.display(), "Checking snapshot");

        let content = match tokio::fs::read_to_string(&self.file).await {
            Ok(content) => content,
            Err(e) => {
                formatter.error(&format!("Cannot read {}: {e}", self.file.display()));
                anyhow::bail!("unreadable snapshot");
            }
        };

        let report = match check(&self.file, &content) {
            Ok(report) => report,
            Err(e) => {
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "file": self.file.display().to_string(),
                        "error": e.to_string(),
                    }));
                } else {
                    formatter.error(&e.to_string());
                }
                anyhow::bail!("snapshot rejected");
            }
        };

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "valid": true,
                "file": self.file.display().to_string(),
                "snapshot": report,
            }));
            return Ok(());
        }

        match &report.group {
            Some(group) => formatter.success(&format!(
                "Valid snapshot for group {group} ({})",
                report.display_name
            )),
            None => {
                formatter.success(&format!("Valid snapshot ({})", report.display_name));
                formatter.warn("File name is not <group>.json; the daemon will ignore it");
            }
        }
        formatter.info(&format!("{} members", report.members.len()));
        formatter.info("");
        for member in &report.members {
            let state = if member.online { "online" } else { "offline" };
            formatter.row(&format!("{} [{}]", member.name, member.id), state);
        }
        Ok(())
    }
}
