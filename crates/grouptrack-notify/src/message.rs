//! Rendering membership events into notifications
//!
//! Plain events become one Markdown line each. Group transfers become a
//! structured alert that mentions the configured role and lists both
//! groups with per-member online markers.

use grouptrack_core::domain::{Group, MembershipEvent};
use grouptrack_core::ports::{AlertField, Notification};

const ONLINE_MARKER: &str = "\u{1F7E2}";
const OFFLINE_MARKER: &str = "\u{1F534}";

/// Rendering options that are passed through from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageOptions {
    /// Role id mentioned at the top of transfer alerts
    pub alert_role: Option<String>,
}

impl MessageOptions {
    pub fn with_alert_role(role: impl Into<String>) -> Self {
        Self {
            alert_role: Some(role.into()),
        }
    }

    fn mention(&self) -> String {
        self.alert_role
            .as_deref()
            .map(|role| format!("<@&{role}>"))
            .unwrap_or_default()
    }
}

/// Renders a single event
pub fn render(event: &MembershipEvent, options: &MessageOptions) -> Notification {
    match event {
        MembershipEvent::GroupCreated {
            group,
            display_name,
            member_names,
        } => Notification::text(format!(
            "New group **{group}** ({display_name}) has been created with members: **{}**",
            member_names.join(", ")
        )),
        MembershipEvent::MemberJoined {
            member,
            name,
            group,
        } => Notification::text(format!(
            "Member **{name}** ({member}) joined group **{group}**"
        )),
        MembershipEvent::MemberLeft {
            member,
            name,
            group,
        } => Notification::text(format!(
            "Member **{name}** ({member}) left group **{group}**"
        )),
        MembershipEvent::GroupTransfer {
            member,
            name,
            from,
            from_members,
            to,
            to_members,
        } => Notification::alert(
            options.mention(),
            format!("Group Change Detected for {name} ({member})"),
            vec![
                AlertField::new(format!("Old Group: {from}"), roster_line(from_members)),
                AlertField::new(format!("New Group: {to}"), roster_line(to_members)),
            ],
        ),
        MembershipEvent::GroupDeleted { group } => {
            Notification::text(format!("Group **{group}** has been deleted."))
        }
    }
}

/// Comma-separated member names, each followed by an online/offline marker
pub fn roster_line(group: &Group) -> String {
    if group.is_empty() {
        return "(no members)".to_string();
    }
    group
        .iter()
        .map(|(_, m)| {
            let marker = if m.online { ONLINE_MARKER } else { OFFLINE_MARKER };
            format!("{}{marker}", m.name)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
