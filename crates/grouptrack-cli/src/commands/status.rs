//! Status command - Display the persisted membership indexes
//!
//! Provides the `grouptrack status` CLI command which:
//! 1. Lists every tracked group with member and online counts
//! 2. Shows one group's members with their online flag and attribution
//! 3. Flags member attributions that point at untracked groups

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use grouptrack_core::config::Config;
use grouptrack_core::domain::{GroupTag, MembershipIndex};
use grouptrack_core::ports::IIndexStore;
use grouptrack_store::JsonIndexStore;
use serde::Serialize;
use tracing::info;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Show the members of this group only
    pub group: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct GroupSummary {
    group: String,
    members: usize,
    online: usize,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct MemberRow {
    id: String,
    name: String,
    online: bool,
    /// Group the member index attributes this member to
    attributed_to: Option<String>,
}

impl StatusCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);

        let config = Config::load_or_default(config_path);
        let store = JsonIndexStore::new(&config.storage.state_dir);
        info!(state_dir = %store.dir().display(), "Reading membership indexes");

        let index = store
            .load()
            .await
            .with_context(|| format!("Failed to read indexes from {}", store.dir().display()))?;

        match &self.group {
            Some(group) => {
                let tag = GroupTag::new(group.as_str())
                    .with_context(|| format!("Invalid group name '{group}'"))?;
                show_group(&index, &tag, format, &*formatter)
            }
            None => {
                show_overview(&index, format, &*formatter);
                Ok(())
            }
        }
    }
}

fn summarize(index: &MembershipIndex) -> Vec<GroupSummary> {
    index
        .groups
        .iter()
        .map(|(tag, group)| GroupSummary {
            group: tag.to_string(),
            members: group.len(),
            online: group.online_count(),
        })
        .collect()
}

fn member_rows(index: &MembershipIndex, tag: &GroupTag) -> Option<Vec<MemberRow>> {
    let group = index.group(tag)?;
    Some(
        group
            .iter()
            .map(|(id, member)| MemberRow {
                id: id.to_string(),
                name: member.name.clone(),
                online: member.online,
                attributed_to: index.group_of(id).map(ToString::to_string),
            })
            .collect(),
    )
}

fn show_overview(index: &MembershipIndex, format: OutputFormat, formatter: &dyn OutputFormatter) {
    let groups = summarize(index);
    let dangling: Vec<String> = index
        .dangling_attributions()
        .into_iter()
        .map(|(id, tag)| format!("{id} -> {tag}"))
        .collect();

    if format.is_json() {
        formatter.print_json(&serde_json::json!({
            "groups": groups,
            "attributed_members": index.members.len(),
            "dangling_attributions": dangling,
        }));
        return;
    }

    if groups.is_empty() {
        formatter.info("No groups tracked yet");
        return;
    }

    formatter.success(&format!(
        "{} group{} tracked, {} member{} attributed",
        groups.len(),
        if groups.len() == 1 { "" } else { "s" },
        index.members.len(),
        if index.members.len() == 1 { "" } else { "s" },
    ));
    formatter.info("");
    for summary in &groups {
        formatter.row(
            &summary.group,
            &format!("{} members, {} online", summary.members, summary.online),
        );
    }
    for entry in &dangling {
        formatter.warn(&format!("Attribution to untracked group: {entry}"));
    }
}

fn show_group(
    index: &MembershipIndex,
    tag: &GroupTag,
    format: OutputFormat,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let Some(rows) = member_rows(index, tag) else {
        formatter.error(&format!("Group '{tag}' is not tracked"));
        anyhow::bail!("unknown group '{tag}'");
    };

    if format.is_json() {
        formatter.print_json(&serde_json::json!({
            "group": tag.as_str(),
            "members": rows,
        }));
        return Ok(());
    }

    formatter.success(&format!("Group {tag} ({} members)", rows.len()));
    formatter.info("");
    for row in &rows {
        let state = if row.online { "online" } else { "offline" };
        let attribution = match row.attributed_to.as_deref() {
            Some(g) if g == tag.as_str() => String::new(),
            Some(other) => format!(" (attributed to {other})"),
            None => " (unattributed)".to_string(),
        };
        formatter.row(
            &format!("{} [{}]", row.name, row.id),
            &format!("{state}{attribution}"),
        );
    }
    Ok(())
}
