//! Conversation view composition
//!
//! Decides between the greeting layout and the history layout, and marks the
//! single message allowed to animate: the last one, when it is an assistant
//! turn.

use crate::chat::{Conversation, Role};
use crate::identity::Profile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealMode {
    Animate,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub index: usize,
    pub role: Role,
    pub reveal: RevealMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    pub title: String,
    pub subtitle: String,
}

impl Greeting {
    pub fn for_profile(profile: Option<&Profile>) -> Self {
        let name = profile.map(|p| p.name.as_str()).unwrap_or("there");
        Self {
            title: format!("Welcome back, {}!", name),
            subtitle: "How can I help you make greener choices today?".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// Centered greeting plus input, shown until the first message exists
    Empty { greeting: Greeting },
    /// Scrolling history plus pinned input
    History { entries: Vec<Entry> },
}

pub fn compose(conversation: &Conversation, profile: Option<&Profile>) -> Layout {
    if conversation.is_empty() {
        return Layout::Empty {
            greeting: Greeting::for_profile(profile),
        };
    }

    Layout::History {
        entries: entries_from(conversation, 0),
    }
}

fn entries_from(conversation: &Conversation, start: usize) -> Vec<Entry> {
    let animated = conversation.latest_assistant_index();
    conversation
        .all()
        .iter()
        .enumerate()
        .skip(start)
        .map(|(index, message)| Entry {
            index,
            role: message.role(),
            reveal: if Some(index) == animated {
                RevealMode::Animate
            } else {
                RevealMode::Full
            },
        })
        .collect()
}

/// Result of syncing the view with the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewUpdate {
    /// The layout switched from greeting to history on this sync
    pub entered_history: bool,
    /// Messages appended since the previous sync, oldest first
    pub new_entries: Vec<Entry>,
    /// Newest message, which must end up in view
    pub scroll_to: Option<usize>,
}

/// Tracks what has already been shown so each store mutation only brings the
/// new messages into view.
#[derive(Debug, Default)]
pub struct ConversationView {
    shown: usize,
}

impl ConversationView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(&mut self, conversation: &Conversation) -> ViewUpdate {
        let start = self.shown.min(conversation.len());
        let new_entries = entries_from(conversation, start);
        let entered_history = self.shown == 0 && !conversation.is_empty();

        self.shown = conversation.len();

        ViewUpdate {
            entered_history,
            scroll_to: if new_entries.is_empty() {
                None
            } else {
                conversation.len().checked_sub(1)
            },
            new_entries,
        }
    }

    pub fn shown(&self) -> usize {
        self.shown
    }
}
