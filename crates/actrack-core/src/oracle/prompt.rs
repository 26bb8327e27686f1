//! Chat messages sent to the oracle.

use super::{ChatMessage, Role};
use crate::model::ActionItem;

const SYSTEM_PROMPT: &str = "\
You track project action items found in meeting notes and discussions. \
An action item has a task description, an optional owner, an optional deadline, \
and a status: open, in_progress, completed, or cancelled. \
When asked to extract or update action items, reply with a JSON list of item \
objects and nothing else; reply with [] when there is nothing to report. \
When asked for a summary, reply in concise plain prose. \
Only use information stated or clearly implied by the provided text.";

/// Messages asking the oracle for new and updated items in `notes`.
#[must_use]
pub fn extraction_messages(
    project_id: &str,
    open_items: &[&ActionItem],
    notes: &str,
) -> Vec<ChatMessage> {
    let context = render_items(open_items);
    let user = format!(
        "Project: {project_id}\n\n\
         Open action items:\n{context}\n\n\
         Notes:\n\"\"\"\n{notes}\n\"\"\"\n\n\
         Find every new action item in the notes, and every open item above that the \
         notes update (completed, cancelled, progress made, owner or deadline changed). \
         Reply only with a JSON list. For an update, include the existing \"id\" and only \
         the fields that changed. For a new item, omit \"id\" and give \"task\", plus \
         \"owner\", \"deadline\" and \"status\" when known. If the notes mention an \
         existing item by some other token, put that token in \"reference\". \
         Reply [] if nothing applies."
    );
    vec![
        ChatMessage::new(Role::System, SYSTEM_PROMPT),
        ChatMessage::new(Role::User, user),
    ]
}

/// Messages asking the oracle for a human-readable status summary.
#[must_use]
pub fn summary_messages(project_id: &str, items: &[ActionItem]) -> Vec<ChatMessage> {
    let refs: Vec<&ActionItem> = items.iter().collect();
    let context = render_items(&refs);
    let user = format!(
        "Project: {project_id}\n\n\
         All action items:\n{context}\n\n\
         Write a concise summary of these action items grouped by status \
         (open, in progress, completed, cancelled), naming owners and deadlines."
    );
    vec![
        ChatMessage::new(Role::System, SYSTEM_PROMPT),
        ChatMessage::new(Role::User, user),
    ]
}

fn render_items(items: &[&ActionItem]) -> String {
    if items.is_empty() {
        return "None".to_string();
    }
    serde_json::to_string_pretty(items).unwrap_or_else(|_| "None".to_string())
}
